use crate::config::{IntervalType, Termination};
use crate::error::{ReliabilityError, Result};
use crate::model::Estimate;
use crate::quantile::{chi_square_quantile, tail_probabilities};

use super::pin;

/// Crow-AMSAA quantity bounded by [`crow_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrowMetric {
    /// Shape parameter beta.
    Shape,
    /// Scale parameter alpha (lambda).
    Scale,
    /// Cumulative failure intensity `N/T`.
    CumulativeIntensity,
}

/// Crow chi-square bounds for a Crow-AMSAA metric.
///
/// With `N` failures observed by `T` and tail probabilities `p` from the
/// confidence level:
///
/// | metric | time terminated | failure terminated |
/// |---|---|---|
/// | shape | `β·χ²(p, 2N)/(2N)` | `β·χ²(p, 2(N−1))/(2N)` |
/// | scale, lower | `χ²(p, 2N)/(2T^β)` | `χ²(p, 2N)/(2T^β)` |
/// | scale, upper | `χ²(p, 2(N+1))/(2T^β)` | `χ²(p, 2N)/(2T^β)` |
/// | cumulative intensity | as scale with `T` for `T^β` | as scale with `T` for `T^β` |
///
/// # Errors
/// - [`ReliabilityError::InsufficientData`] with no failures, or fewer than
///   two for a failure-terminated shape bound.
/// - [`ReliabilityError::DegenerateParameter`] for a non-positive `T` or
///   parameter.
///
/// # Examples
///
/// ```
/// use u_reliability::bounds::{crow_bounds, CrowMetric};
/// use u_reliability::config::{IntervalType, Termination};
///
/// let b = crow_bounds(
///     CrowMetric::Shape, 8, 100.0, 0.06, 0.7, 0.8,
///     Termination::TimeTerminated, IntervalType::TwoSided,
/// ).unwrap();
/// assert!(b.lower < 0.7 && 0.7 < b.upper);
/// ```
///
/// # References
/// - Crow, L.H. (1974). "Reliability analysis for complex, repairable
///   systems". *Reliability and Biometry*, SIAM, pp. 379-410.
/// - Bain, L.J. & Engelhardt, M. (1991). *Statistical Analysis of
///   Reliability and Life-Testing Models*, 2nd ed., Dekker, Ch. 9.
#[allow(clippy::too_many_arguments)]
pub fn crow_bounds(
    metric: CrowMetric,
    n_failures: usize,
    t_star: f64,
    alpha: f64,
    beta: f64,
    confidence: f64,
    termination: Termination,
    interval: IntervalType,
) -> Result<Estimate> {
    if n_failures == 0 {
        return Err(ReliabilityError::insufficient(1, 0));
    }
    if !(t_star > 0.0) || !(alpha > 0.0) || !(beta > 0.0) {
        return Err(ReliabilityError::degenerate(format!(
            "Crow bounds need positive T, alpha and beta \
             (T = {t_star}, alpha = {alpha}, beta = {beta})"
        )));
    }

    let n = n_failures as f64;
    let (p_lo, p_hi) = tail_probabilities(confidence, interval);
    let time_terminated = termination == Termination::TimeTerminated;

    let (lower, point, upper) = match metric {
        CrowMetric::Shape => {
            let df = if time_terminated {
                2.0 * n
            } else {
                if n_failures < 2 {
                    return Err(ReliabilityError::insufficient(2, n_failures));
                }
                2.0 * (n - 1.0)
            };
            (
                beta * chi_square_quantile(p_lo, df)? / (2.0 * n),
                beta,
                beta * chi_square_quantile(p_hi, df)? / (2.0 * n),
            )
        }
        CrowMetric::Scale | CrowMetric::CumulativeIntensity => {
            let exposure = if metric == CrowMetric::Scale {
                t_star.powf(beta)
            } else {
                t_star
            };
            let upper_df = if time_terminated {
                2.0 * (n + 1.0)
            } else {
                2.0 * n
            };
            (
                chi_square_quantile(p_lo, 2.0 * n)? / (2.0 * exposure),
                n / exposure,
                chi_square_quantile(p_hi, upper_df)? / (2.0 * exposure),
            )
        }
    };

    Ok(pin(lower, point, upper, interval))
}

use crate::config::IntervalType;
use crate::error::{ReliabilityError, Result};
use crate::model::Estimate;
use crate::quantile::chi_square_quantile;
use crate::solver::{expand_bracket, Solver};

use super::pin;

/// Log-likelihood drop `χ²(1, c)/2` defining the likelihood-ratio region.
///
/// One-sided intervals use the two-sided level `2c − 1`, which is zero for
/// `c <= 0.5` (the bound collapses onto the point estimate).
pub fn likelihood_ratio_threshold(confidence: f64, interval: IntervalType) -> Result<f64> {
    let level = match interval {
        IntervalType::TwoSided => confidence,
        IntervalType::LowerOneSided | IntervalType::UpperOneSided => 2.0 * confidence - 1.0,
    };
    if level <= 0.0 {
        return Ok(0.0);
    }
    Ok(chi_square_quantile(level, 1.0)? / 2.0)
}

/// Likelihood-ratio bounds on one parameter.
///
/// `profile(θ)` is the log-likelihood maximized over the remaining
/// parameters with this one fixed at `θ`. Candidate values are searched
/// outward from `point` (doubling the step) until the profile falls below
/// `max_log_likelihood − χ²(1, c)/2`; the crossing is then refined with
/// `solver`. When no crossing exists on a side, that bound is the domain
/// limit (`lower_limit` below, `+∞` above).
///
/// # Examples
///
/// ```
/// use u_reliability::bounds::likelihood_ratio_bounds;
/// use u_reliability::config::IntervalType;
/// use u_reliability::solver::Newton;
///
/// // Normal mean with unit variance, n = 4: exact interval x̄ ∓ z/√n.
/// let profile = |mu: f64| -2.0 * (mu - 1.0).powi(2);
/// let b = likelihood_ratio_bounds(
///     &profile, 1.0, 0.0, 0.95, IntervalType::TwoSided, f64::NEG_INFINITY, &Newton::default(),
/// ).unwrap();
/// assert!((b.lower - (1.0 - 1.959964 / 2.0)).abs() < 1e-4);
/// assert!((b.upper - (1.0 + 1.959964 / 2.0)).abs() < 1e-4);
/// ```
pub fn likelihood_ratio_bounds(
    profile: &dyn Fn(f64) -> f64,
    point: f64,
    max_log_likelihood: f64,
    confidence: f64,
    interval: IntervalType,
    lower_limit: f64,
    solver: &dyn Solver,
) -> Result<Estimate> {
    if !point.is_finite() || !max_log_likelihood.is_finite() {
        return Err(ReliabilityError::degenerate(
            "likelihood-ratio bounds need a finite estimate and log-likelihood",
        ));
    }
    let drop = likelihood_ratio_threshold(confidence, interval)?;
    if drop == 0.0 {
        return Ok(Estimate::point(point));
    }

    let target = max_log_likelihood - drop;
    let g = |theta: f64| profile(theta) - target;
    let step = if point == 0.0 { 0.1 } else { 0.1 * point.abs() };

    let upper = match expand_bracket(&g, point, step, true, lower_limit, 60) {
        Some((lo, hi)) => solver.find_root(&g, 0.5 * (lo + hi), Some((lo, hi)))?,
        None => f64::INFINITY,
    };
    let lower = match expand_bracket(&g, point, step, false, lower_limit, 60) {
        Some((lo, hi)) => solver.find_root(&g, 0.5 * (lo + hi), Some((lo, hi)))?,
        None => lower_limit,
    };

    Ok(pin(lower, point, upper, interval))
}

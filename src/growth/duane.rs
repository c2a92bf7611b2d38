//! Duane postulate: log cumulative MTBF is linear in log cumulative time.
//!
//! ```text
//! ln(Tᵢ / Nᵢ) = a + b·ln Tᵢ
//! ```
//!
//! The fit is reported in power-law form, `α = exp(−a)` and `β = 1 − b`,
//! so the cumulative failure intensity `α·T^(β−1)` agrees with
//! [`crow_amsaa`](super::crow_amsaa). Bounds use Student t quantiles on
//! the regression coefficients.
//!
//! # Reference
//! Duane, J.T. (1964). "Learning curve approach to reliability
//! monitoring". *IEEE Transactions on Aerospace* 2(2), 563-566.

use tracing::debug;

use super::crow_amsaa::GrowthData;
use crate::bounds::pin;
use crate::config::{AnalysisConfig, FitMethod};
use crate::error::{ReliabilityError, Result};
use crate::model::{FittedModel, ModelKind, Parameter};
use crate::quantile::{t_quantile, tail_probabilities};
use crate::regression::ordinary_least_squares;

/// Fits the Duane model to cumulative failure times.
///
/// Grouped data use the interval end points with cumulative counts.
///
/// # Errors
/// - [`ReliabilityError::InsufficientData`] with fewer than three distinct
///   cumulative times.
/// - [`ReliabilityError::DegenerateParameter`] when the regression is
///   degenerate.
///
/// # Examples
///
/// ```
/// use u_reliability::config::AnalysisConfig;
/// use u_reliability::growth::{duane, GrowthData};
///
/// let times = vec![5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
/// let data = GrowthData::new(times, vec![1; 8], Some(100.0), false).unwrap();
/// let model = duane(&data, &AnalysisConfig::default()).unwrap();
/// assert!(model.point_estimates()[1] > 0.0);
/// ```
pub fn duane(data: &GrowthData, config: &AnalysisConfig) -> Result<FittedModel> {
    let config = config.clone().validate()?;
    let mut cumulative = 0.0;
    let mut x = Vec::with_capacity(data.times().len());
    let mut y = Vec::with_capacity(data.times().len());
    for (&t, &k) in data.times().iter().zip(data.failures()) {
        cumulative += f64::from(k);
        if k == 0 {
            continue;
        }
        x.push(t.ln());
        y.push((t / cumulative).ln());
    }
    if x.len() < 3 {
        return Err(ReliabilityError::insufficient(3, x.len()));
    }

    let fit = ordinary_least_squares(&x, &y, false)?;
    let (a, b) = (fit.intercept, fit.slope);
    let alpha = (-a).exp();
    let beta = 1.0 - b;
    if !(beta > 0.0) {
        return Err(ReliabilityError::degenerate(format!(
            "Duane slope {b} implies a non-positive shape"
        )));
    }

    let df = (x.len() - 2) as f64;
    let (p_lo, p_hi) = tail_probabilities(config.confidence, config.interval);
    let (t_lo, t_hi) = (t_quantile(p_lo, df)?, t_quantile(p_hi, df)?);
    let (se_a, se_b) = (fit.covariance[0][0].sqrt(), fit.covariance[1][1].sqrt());
    // Both parameters decrease as their coefficient grows.
    let alpha_est = pin(
        (-(a + t_hi * se_a)).exp(),
        alpha,
        (-(a + t_lo * se_a)).exp(),
        config.interval,
    );
    let beta_est = pin(
        1.0 - (b + t_hi * se_b),
        beta,
        1.0 - (b + t_lo * se_b),
        config.interval,
    );

    // (α, β) = (exp(−a), 1 − b)
    let c = fit.covariance;
    let covariance = [
        [alpha * alpha * c[0][0], alpha * c[0][1]],
        [alpha * c[1][0], c[1][1]],
    ];
    debug!(alpha, beta, r = fit.correlation, "fitted Duane model");

    Ok(FittedModel {
        kind: ModelKind::Duane,
        method: FitMethod::RankRegression,
        parameters: vec![
            Parameter {
                name: "alpha",
                estimate: alpha_est,
            },
            Parameter {
                name: "beta",
                estimate: beta_est,
            },
        ],
        covariance,
        log_likelihood: None,
        aic: None,
        bic: None,
        correlation: Some(fit.correlation),
        n_failures: data.n_failures().round() as usize,
        n_suspensions: 0,
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntervalType;
    use crate::growth::{PowerLaw, MtbfKind};

    #[test]
    fn exact_power_law_is_recovered() {
        // Cumulative MTBF exactly T^(1−β)/α with α = 0.4, β = 0.7.
        let (alpha, beta) = (0.4_f64, 0.7_f64);
        let times: Vec<f64> = (1..=12).map(|i| (i as f64 / alpha).powf(1.0 / beta)).collect();
        let data = GrowthData::new(times, vec![1; 12], None, false).unwrap();
        let m = duane(&data, &AnalysisConfig::default()).unwrap();
        let p = m.point_estimates();
        assert!((p[0] - alpha).abs() < 1e-9, "alpha = {}", p[0]);
        assert!((p[1] - beta).abs() < 1e-9, "beta = {}", p[1]);
        assert!((m.correlation.unwrap() - 1.0).abs() < 1e-9);
        let law = PowerLaw::from_model(&m).unwrap();
        let t = 50.0_f64;
        assert!((law.mtbf(MtbfKind::Cumulative, t) - t.powf(1.0 - beta) / alpha).abs() < 1e-6);
    }

    #[test]
    fn bounds_are_ordered() {
        let times = vec![5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
        let data = GrowthData::new(times, vec![1; 8], Some(100.0), false).unwrap();
        for interval in [
            IntervalType::TwoSided,
            IntervalType::LowerOneSided,
            IntervalType::UpperOneSided,
        ] {
            let config = AnalysisConfig {
                interval,
                confidence: 0.9,
                ..AnalysisConfig::default()
            };
            let m = duane(&data, &config).unwrap();
            assert!(m.is_consistent(), "{interval:?}: {:?}", m.parameters);
        }
    }

    #[test]
    fn needs_three_points() {
        let data = GrowthData::new(vec![5.0, 9.0], vec![1, 1], None, false).unwrap();
        assert_eq!(
            duane(&data, &AnalysisConfig::default()).unwrap_err(),
            ReliabilityError::insufficient(3, 2)
        );
    }
}

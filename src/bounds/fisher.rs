use crate::config::IntervalType;
use crate::error::{ReliabilityError, Result};
use crate::model::Estimate;
use crate::quantile::z_value;

use super::pin;

/// Fisher-matrix bounds for a positive metric.
///
/// ```text
/// lower = m·exp(−z·√v/m),  upper = m·exp(z·√v/m)
/// ```
///
/// # Errors
/// [`ReliabilityError::DegenerateParameter`] when `m <= 0` (the log
/// transform is undefined) or the variance is negative or not finite.
///
/// # Examples
///
/// ```
/// use u_reliability::bounds::fisher_bounds;
/// use u_reliability::config::IntervalType;
///
/// let b = fisher_bounds(10.0, 4.0, 0.95, IntervalType::TwoSided).unwrap();
/// let d = (1.959964_f64 * 2.0 / 10.0).exp();
/// assert!((b.lower - 10.0 / d).abs() < 1e-3);
/// assert!((b.upper - 10.0 * d).abs() < 1e-3);
/// assert!(fisher_bounds(0.0, 1.0, 0.9, IntervalType::TwoSided).is_err());
/// ```
pub fn fisher_bounds(
    metric: f64,
    variance: f64,
    confidence: f64,
    interval: IntervalType,
) -> Result<Estimate> {
    if !(metric > 0.0) || !metric.is_finite() {
        return Err(ReliabilityError::degenerate(format!(
            "Fisher bounds need a positive metric, got {metric}"
        )));
    }
    check_variance(variance)?;
    let spread = (z_value(confidence, interval) * variance.sqrt() / metric).exp();
    Ok(pin(metric / spread, metric, metric * spread, interval))
}

/// Normal-approximation bounds `m ∓ z·√v` for parameters that may be zero
/// or negative (location parameters).
pub fn fisher_bounds_linear(
    metric: f64,
    variance: f64,
    confidence: f64,
    interval: IntervalType,
) -> Result<Estimate> {
    if !metric.is_finite() {
        return Err(ReliabilityError::degenerate("metric is not finite"));
    }
    check_variance(variance)?;
    let half = z_value(confidence, interval) * variance.sqrt();
    Ok(pin(metric - half, metric, metric + half, interval))
}

fn check_variance(variance: f64) -> Result<()> {
    if variance.is_finite() && variance >= 0.0 {
        Ok(())
    } else {
        Err(ReliabilityError::degenerate(format!(
            "variance {variance} is negative or not finite"
        )))
    }
}

use crate::config::IntervalType;
use crate::error::{ReliabilityError, Result};
use crate::quantile::z_value;

use super::pin;

/// Beta/PERT three-point estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PertEstimate {
    /// Lower bound `mean − z·sd`.
    pub lower: f64,
    /// PERT mean `(a + 4m + b)/6`.
    pub mean: f64,
    /// Upper bound `mean + z·sd`.
    pub upper: f64,
    /// Standard deviation `(b − a)/6`.
    pub sd: f64,
}

/// Beta/PERT mean, standard deviation and bounds from a (min, most likely,
/// max) estimate.
///
/// # Errors
/// [`ReliabilityError::InvalidInput`] unless `min <= likely <= max` with
/// all values finite.
///
/// # Examples
///
/// ```
/// use u_reliability::bounds::beta_pert;
/// use u_reliability::config::IntervalType;
///
/// let e = beta_pert(1.0, 2.0, 3.0, 0.90, IntervalType::TwoSided).unwrap();
/// assert!((e.mean - 2.0).abs() < 1e-12);
/// assert!((e.lower - 1.4517154576828426).abs() < 1e-6);
/// assert!((e.upper - 2.5482845423171572).abs() < 1e-6);
/// ```
pub fn beta_pert(
    min: f64,
    likely: f64,
    max: f64,
    confidence: f64,
    interval: IntervalType,
) -> Result<PertEstimate> {
    if !(min.is_finite() && likely.is_finite() && max.is_finite()) || min > likely || likely > max
    {
        return Err(ReliabilityError::invalid(format!(
            "PERT estimate needs min <= likely <= max, got ({min}, {likely}, {max})"
        )));
    }
    let mean = (min + 4.0 * likely + max) / 6.0;
    let sd = (max - min) / 6.0;
    let half = z_value(confidence, interval) * sd;
    let b = pin(mean - half, mean, mean + half, interval);
    Ok(PertEstimate {
        lower: b.lower,
        mean,
        upper: b.upper,
        sd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_points_collapse() {
        let e = beta_pert(1.0, 1.0, 1.0, 0.95, IntervalType::TwoSided).unwrap();
        assert_eq!((e.lower, e.mean, e.upper, e.sd), (1.0, 1.0, 1.0, 0.0));
    }

    #[test]
    fn negative_values_allowed() {
        let e = beta_pert(-10.0, -5.0, 0.0, 0.8, IntervalType::UpperOneSided).unwrap();
        assert_eq!(e.lower, e.mean);
        assert!(e.upper > e.mean);
    }

    #[test]
    fn unordered_points_rejected() {
        assert!(beta_pert(3.0, 2.0, 1.0, 0.9, IntervalType::TwoSided).is_err());
        assert!(beta_pert(1.0, f64::NAN, 3.0, 0.9, IntervalType::TwoSided).is_err());
    }
}

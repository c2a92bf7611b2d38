//! Quantiles and tail helpers built on `u_numflow::special`.
//!
//! `u-numflow` supplies the normal, chi-square and Student t quantiles; this
//! module adds input checks and the confidence-level plumbing.

use u_numflow::special;

use crate::config::IntervalType;
use crate::error::{ReliabilityError, Result};

/// Standard normal quantile for a confidence level and interval type.
///
/// Two-sided intervals use `Φ⁻¹(1 − (1 − c)/2)`; one-sided intervals use
/// `Φ⁻¹(c)`.
///
/// # Examples
///
/// ```
/// use u_reliability::config::IntervalType;
/// use u_reliability::quantile::z_value;
///
/// let z = z_value(0.95, IntervalType::TwoSided);
/// assert!((z - 1.959964).abs() < 1e-4);
/// let z = z_value(0.95, IntervalType::LowerOneSided);
/// assert!((z - 1.644854).abs() < 1e-4);
/// ```
pub fn z_value(confidence: f64, interval: IntervalType) -> f64 {
    match interval {
        IntervalType::TwoSided => special::inverse_normal_cdf(1.0 - (1.0 - confidence) / 2.0),
        IntervalType::LowerOneSided | IntervalType::UpperOneSided => {
            special::inverse_normal_cdf(confidence)
        }
    }
}

/// Lower and upper tail probabilities for chi-square based bounds.
///
/// Two-sided: `((1 − c)/2, 1 − (1 − c)/2)`. One-sided: `(1 − c, c)`; the
/// side that is not bounded is pinned to the point estimate by the caller.
pub fn tail_probabilities(confidence: f64, interval: IntervalType) -> (f64, f64) {
    match interval {
        IntervalType::TwoSided => {
            let a = (1.0 - confidence) / 2.0;
            (a, 1.0 - a)
        }
        IntervalType::LowerOneSided | IntervalType::UpperOneSided => {
            (1.0 - confidence, confidence)
        }
    }
}

/// Chi-square quantile: the `x` with `P(χ²(df) ≤ x) = p`.
///
/// # Errors
/// [`ReliabilityError::InvalidInput`] for `p` outside (0, 1) or a
/// non-positive `df`.
///
/// # Examples
///
/// ```
/// use u_reliability::quantile::chi_square_quantile;
/// // χ²(0.95, 1) = 3.841459
/// let x = chi_square_quantile(0.95, 1.0).unwrap();
/// assert!((x - 3.841459).abs() < 1e-4);
/// ```
pub fn chi_square_quantile(p: f64, df: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(ReliabilityError::invalid(format!(
            "chi-square probability {p} must lie in (0, 1)"
        )));
    }
    if !(df > 0.0) || !df.is_finite() {
        return Err(ReliabilityError::invalid(format!(
            "chi-square degrees of freedom {df} must be positive"
        )));
    }

    finite_quantile(special::chi_squared_quantile(p, df), "chi-square", p, df)
}

/// Student t quantile: the `x` with `P(T(df) ≤ x) = p`.
pub fn t_quantile(p: f64, df: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) || !(df > 0.0) {
        return Err(ReliabilityError::invalid(format!(
            "t quantile needs p in (0, 1) and df > 0, got p = {p}, df = {df}"
        )));
    }
    finite_quantile(special::t_distribution_quantile(p, df), "t", p, df)
}

fn finite_quantile(x: f64, name: &str, p: f64, df: f64) -> Result<f64> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(ReliabilityError::degenerate(format!(
            "{name} quantile at p = {p}, df = {df} is not finite"
        )))
    }
}

/// Standard normal density.
pub fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Standard normal survival function `1 − Φ(z)`.
pub fn normal_sf(z: f64) -> f64 {
    special::standard_normal_cdf(-z)
}

/// Standard normal hazard `φ(z)/(1 − Φ(z))` (inverse Mills ratio).
///
/// Far in the upper tail the survival function underflows; there the
/// asymptotic expansion `z + 1/z` is used.
pub fn normal_hazard(z: f64) -> f64 {
    let sf = normal_sf(z);
    if z > 8.0 || sf < 1e-300 {
        z + 1.0 / z
    } else {
        normal_pdf(z) / sf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi_square_reference_values() {
        // Abramowitz & Stegun table 26.8
        let cases = [
            (0.10, 16.0, 9.312236),
            (0.90, 16.0, 23.541828),
            (0.05, 2.0, 0.102587),
            (0.975, 10.0, 20.483177),
        ];
        for (p, df, expected) in cases {
            let x = chi_square_quantile(p, df).unwrap();
            assert!((x - expected).abs() < 1e-3, "χ²({p}, {df}) = {x}, expected {expected}");
        }
    }

    #[test]
    fn chi_square_rejects_bad_input() {
        assert!(chi_square_quantile(0.0, 2.0).is_err());
        assert!(chi_square_quantile(0.5, 0.0).is_err());
    }

    #[test]
    fn t_quantile_reference() {
        let x = t_quantile(0.975, 10.0).unwrap();
        assert!((x - 2.228139).abs() < 1e-3, "t = {x}");
        let x = t_quantile(0.5, 4.0).unwrap();
        assert!(x.abs() < 1e-6);
    }

    #[test]
    fn tails() {
        let (lo, hi) = tail_probabilities(0.8, IntervalType::TwoSided);
        assert!((lo - 0.1).abs() < 1e-12 && (hi - 0.9).abs() < 1e-12);
        let (lo, hi) = tail_probabilities(0.8, IntervalType::LowerOneSided);
        assert!((lo - 0.2).abs() < 1e-12 && (hi - 0.8).abs() < 1e-12);
    }

    #[test]
    fn hazard_is_continuous_in_tail() {
        let a = normal_hazard(7.99);
        let b = normal_hazard(8.01);
        assert!((a - b).abs() < 0.05, "{a} vs {b}");
        assert!((normal_hazard(0.0) - 0.797_884_56).abs() < 1e-6);
    }
}

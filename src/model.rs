//! Result value objects: fitted models and test outcomes.
//!
//! These are returned to the caller and never mutated by the engine after
//! return.

use std::fmt;

use crate::config::FitMethod;
use crate::distributions::DistributionKind;
use crate::error::ReliabilityError;
use crate::matrix::{is_symmetric, Matrix2};

/// Which model a [`FittedModel`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelKind {
    /// A life distribution.
    Distribution(DistributionKind),
    /// Crow-AMSAA NHPP power law.
    CrowAmsaa,
    /// Duane log-log regression, reported in power-law form.
    Duane,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Distribution(kind) => write!(f, "{kind}"),
            ModelKind::CrowAmsaa => f.write_str("Crow-AMSAA"),
            ModelKind::Duane => f.write_str("Duane"),
        }
    }
}

/// A `[lower, point, upper]` triple for one parameter or metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    /// Lower bound.
    pub lower: f64,
    /// Point estimate.
    pub point: f64,
    /// Upper bound.
    pub upper: f64,
}

impl Estimate {
    /// Point estimate with degenerate bounds.
    pub fn point(value: f64) -> Self {
        Self {
            lower: value,
            point: value,
            upper: value,
        }
    }

    /// Triple from explicit bounds.
    pub fn new(lower: f64, point: f64, upper: f64) -> Self {
        Self {
            lower,
            point,
            upper,
        }
    }

    /// Whether `lower <= point <= upper`.
    pub fn is_ordered(&self) -> bool {
        self.lower <= self.point && self.point <= self.upper
    }
}

/// A named model parameter with bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Parameter {
    /// Parameter name, e.g. `"shape"`.
    pub name: &'static str,
    /// Bounds and point estimate.
    pub estimate: Estimate,
}

/// Result of any fitting method.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FittedModel {
    /// Model family.
    pub kind: ModelKind,
    /// How the parameters were estimated.
    pub method: FitMethod,
    /// Parameters in the family's canonical order.
    pub parameters: Vec<Parameter>,
    /// Parameter variance-covariance (leading `k×k` block used).
    pub covariance: Matrix2,
    /// Log-likelihood at the estimate (maximum likelihood only).
    pub log_likelihood: Option<f64>,
    /// Akaike information criterion.
    pub aic: Option<f64>,
    /// Bayesian information criterion.
    pub bic: Option<f64>,
    /// Correlation coefficient of the linearized fit (regression only).
    pub correlation: Option<f64>,
    /// Number of failures used.
    pub n_failures: usize,
    /// Number of suspensions used.
    pub n_suspensions: usize,
    /// Recoverable conditions met while fitting, with the fallback applied.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub warnings: Vec<ReliabilityError>,
}

impl FittedModel {
    /// Point estimates in canonical order.
    pub fn point_estimates(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.estimate.point).collect()
    }

    /// Parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Estimate> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.estimate)
    }

    /// Variance of parameter `i`.
    pub fn variance(&self, i: usize) -> f64 {
        self.covariance[i.min(1)][i.min(1)]
    }

    /// Whether every parameter triple is ordered and the covariance is
    /// symmetric.
    pub fn is_consistent(&self) -> bool {
        self.parameters.iter().all(|p| p.estimate.is_ordered())
            && is_symmetric(&self.covariance, 1e-9)
    }
}

/// Named test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrendTest {
    /// MIL-HDBK-189 `2·Σ ln(T/tᵢ)`.
    MilHdbk,
    /// Laplace `Zlp`.
    Laplace,
    /// Lewis-Robinson `Zlr`.
    LewisRobinson,
    /// Lag-k serial correlation of interarrival times.
    SerialCorrelation,
    /// Chi-square goodness of fit.
    ChiSquare,
    /// Cramer-von Mises goodness of fit.
    CramerVonMises,
}

impl fmt::Display for TrendTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrendTest::MilHdbk => "MIL-HDBK",
            TrendTest::Laplace => "Laplace",
            TrendTest::LewisRobinson => "Lewis-Robinson",
            TrendTest::SerialCorrelation => "serial correlation",
            TrendTest::ChiSquare => "chi-square",
            TrendTest::CramerVonMises => "Cramer-von Mises",
        };
        f.write_str(name)
    }
}

/// How a statistic is compared with its critical value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rejection {
    /// Reject when the statistic exceeds the critical value.
    Above,
    /// Reject when `|statistic|` exceeds the critical value.
    AbsoluteAbove,
    /// Reject when the statistic falls outside `[lower, critical_value]`.
    Outside {
        /// Lower critical value.
        lower: f64,
    },
}

/// A test statistic paired with its critical value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrendTestResult {
    /// Which test.
    pub test: TrendTest,
    /// Observed statistic.
    pub statistic: f64,
    /// (Upper) critical value at `confidence`.
    pub critical_value: f64,
    /// Comparison rule.
    pub rejection: Rejection,
    /// Confidence level of the critical value.
    pub confidence: f64,
}

impl TrendTestResult {
    /// Whether the null hypothesis (no trend / adequate fit) is rejected.
    pub fn reject(&self) -> bool {
        match self.rejection {
            Rejection::Above => self.statistic > self.critical_value,
            Rejection::AbsoluteAbove => self.statistic.abs() > self.critical_value,
            Rejection::Outside { lower } => {
                self.statistic < lower || self.statistic > self.critical_value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_rules() {
        let mut r = TrendTestResult {
            test: TrendTest::Laplace,
            statistic: -2.5,
            critical_value: 1.96,
            rejection: Rejection::AbsoluteAbove,
            confidence: 0.95,
        };
        assert!(r.reject());
        r.rejection = Rejection::Above;
        assert!(!r.reject());
        r.rejection = Rejection::Outside { lower: -3.0 };
        assert!(!r.reject());
        r.statistic = 2.0;
        assert!(r.reject());
    }

    #[test]
    fn estimate_ordering() {
        assert!(Estimate::point(3.0).is_ordered());
        assert!(!Estimate::new(2.0, 1.0, 3.0).is_ordered());
        assert_eq!(ModelKind::CrowAmsaa.to_string(), "Crow-AMSAA");
    }
}

//! Method selection and analysis configuration.
//!
//! Callers pick the fit method, bound method, interval type and test
//! termination per analysis. [`AnalysisConfig`] bundles these with the
//! confidence level, analysis window and solver budget.
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::{AnalysisConfig, BoundMethod, IntervalType};
//!
//! let config = AnalysisConfig {
//!     bound_method: BoundMethod::Crow,
//!     interval: IntervalType::TwoSided,
//!     confidence: 90.0, // percent inputs are normalized
//!     ..AnalysisConfig::default()
//! };
//! let config = config.validate().unwrap();
//! assert!((config.confidence - 0.90).abs() < 1e-12);
//! ```

use crate::error::{ReliabilityError, Result};
use crate::solver::Newton;

/// Parameter estimation method for life distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitMethod {
    /// Maximum likelihood.
    #[default]
    Mle,
    /// Median-rank regression on the linearized CDF.
    RankRegression,
}

/// Confidence bound strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundMethod {
    /// Fisher information matrix with a log-normal approximation.
    #[default]
    Fisher,
    /// Crow chi-square bounds (growth models only).
    Crow,
    /// Profile likelihood ratio.
    LikelihoodRatio,
    /// Beta/PERT three-point estimate.
    BetaPert,
}

/// Which side(s) of the interval are bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntervalType {
    /// Lower bound only; the upper bound is the point estimate.
    LowerOneSided,
    /// Upper bound only; the lower bound is the point estimate.
    UpperOneSided,
    /// Both bounds, splitting the tail probability evenly.
    #[default]
    TwoSided,
}

/// How a reliability growth test was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Type I: stopped at a predetermined time.
    #[default]
    TimeTerminated,
    /// Type II: stopped at a failure.
    FailureTerminated,
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisConfig {
    /// Parameter estimation method.
    pub fit_method: FitMethod,
    /// Confidence bound strategy.
    pub bound_method: BoundMethod,
    /// Interval sidedness.
    pub interval: IntervalType,
    /// Growth test termination type.
    pub termination: Termination,
    /// Whether growth data are grouped into intervals.
    pub grouped: bool,
    /// Confidence level in (0, 1). Values in (1, 100) are read as percent.
    pub confidence: f64,
    /// Start of the analysis window.
    pub start_time: f64,
    /// End of the analysis window; `None` means unbounded.
    pub end_time: Option<f64>,
    /// Iteration budget for every root-finder.
    pub max_iterations: usize,
    /// Convergence tolerance for every root-finder.
    pub tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fit_method: FitMethod::Mle,
            bound_method: BoundMethod::Fisher,
            interval: IntervalType::TwoSided,
            termination: Termination::TimeTerminated,
            grouped: false,
            confidence: 0.75,
            start_time: 0.0,
            end_time: None,
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

impl AnalysisConfig {
    /// Normalizes the confidence level and checks the window and budget.
    ///
    /// # Errors
    /// [`ReliabilityError::InvalidInput`] when the confidence is outside
    /// (0, 1) after normalization, the window is inverted, or the solver
    /// budget is zero.
    pub fn validate(mut self) -> Result<Self> {
        self.confidence = normalize_confidence(self.confidence)?;
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(ReliabilityError::invalid(format!(
                "start time {} must be finite and non-negative",
                self.start_time
            )));
        }
        if let Some(end) = self.end_time {
            if end.is_nan() || end < self.start_time {
                return Err(ReliabilityError::invalid(format!(
                    "end time {end} precedes start time {}",
                    self.start_time
                )));
            }
        }
        if self.max_iterations == 0 || self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(ReliabilityError::invalid(
                "solver budget needs a positive iteration count and tolerance",
            ));
        }
        Ok(self)
    }

    /// Default Newton solver with this configuration's budget.
    pub fn solver(&self) -> Newton {
        Newton {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }

    /// Upper end of the analysis window.
    pub fn end(&self) -> f64 {
        self.end_time.unwrap_or(f64::INFINITY)
    }
}

/// Maps a confidence level to (0, 1), reading values in (1, 100) as percent.
///
/// # Examples
///
/// ```
/// use u_reliability::config::normalize_confidence;
/// assert_eq!(normalize_confidence(0.9).unwrap(), 0.9);
/// assert!((normalize_confidence(95.0).unwrap() - 0.95).abs() < 1e-12);
/// assert!(normalize_confidence(0.0).is_err());
/// assert!(normalize_confidence(100.0).is_err());
/// ```
pub fn normalize_confidence(confidence: f64) -> Result<f64> {
    let c = if confidence > 1.0 && confidence < 100.0 {
        confidence / 100.0
    } else {
        confidence
    };
    if c > 0.0 && c < 1.0 {
        Ok(c)
    } else {
        Err(ReliabilityError::invalid(format!(
            "confidence {confidence} must lie strictly between 0 and 1"
        )))
    }
}

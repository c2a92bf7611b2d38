//! Error type shared by every analysis in the crate.
//!
//! All fallible operations return [`Result<T>`]. Recoverable conditions
//! (a grouped Crow-AMSAA solve that fails to converge, a clamped table
//! lookup) are not raised; the computation falls back and the error is
//! recorded on the returned value instead.

use thiserror::Error;

/// Errors produced by the reliability analysis engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReliabilityError {
    /// The dataset is empty or below the minimum size for the chosen method.
    #[error("insufficient data: need at least {min_required} observations, got {actual}")]
    InsufficientData {
        /// Minimum number of observations the method needs.
        min_required: usize,
        /// Number of observations supplied.
        actual: usize,
    },

    /// A root-finder exhausted its iteration budget.
    #[error("{method} did not converge within {iterations} iterations")]
    NonConvergence {
        /// Name of the solver or estimation step.
        method: &'static str,
        /// Iteration budget that was exhausted.
        iterations: usize,
    },

    /// Division by zero, a non-positive log argument, or an all-censored
    /// dataset for a method that needs exact failures.
    #[error("degenerate parameter: {0}")]
    DegenerateParameter(String),

    /// A critical-value lookup key fell outside the tabulated domain.
    #[error("lookup key {key} outside tabulated range [{min}, {max}]")]
    InterpolationOutOfRange {
        /// Requested key.
        key: f64,
        /// Smallest tabulated key.
        min: f64,
        /// Largest tabulated key.
        max: f64,
    },

    /// Malformed caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ReliabilityError {
    /// Shorthand for [`ReliabilityError::DegenerateParameter`].
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateParameter(msg.into())
    }

    /// Shorthand for [`ReliabilityError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Shorthand for [`ReliabilityError::InsufficientData`].
    pub fn insufficient(min_required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            min_required,
            actual,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReliabilityError>;

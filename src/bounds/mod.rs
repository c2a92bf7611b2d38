//! Confidence bound calculators.
//!
//! Four interchangeable strategies, selected per analysis through
//! [`BoundMethod`](crate::config::BoundMethod):
//!
//! - [`fisher_bounds`]: log-normal approximation `m·exp(∓z·√v/m)` from a
//!   Fisher-matrix variance, with [`fisher_bounds_linear`] for unbounded
//!   location parameters
//! - [`crow_bounds`]: chi-square bounds for Crow-AMSAA shape, scale and
//!   cumulative failure intensity
//! - [`likelihood_ratio_bounds`]: profile likelihood crossings at
//!   `χ²(1, c)/2` below the maximum
//! - [`beta_pert`]: three-point (min, most likely, max) estimates
//!
//! Every calculator returns an [`Estimate`] with `lower <= point <= upper`.
//! For one-sided intervals the open side is pinned to the point estimate.
//!
//! # References
//!
//! - Meeker, W.Q. & Escobar, L.A. (1998). *Statistical Methods for
//!   Reliability Data*, Wiley, Ch. 8.
//! - MIL-HDBK-189C (2011). *Reliability Growth Management*, §5.

mod crow;
mod fisher;
mod likelihood;
mod pert;

pub use crow::{crow_bounds, CrowMetric};
pub use fisher::{fisher_bounds, fisher_bounds_linear};
pub use likelihood::{likelihood_ratio_bounds, likelihood_ratio_threshold};
pub use pert::{beta_pert, PertEstimate};

use crate::config::IntervalType;
use crate::model::Estimate;

/// Applies interval sidedness and guarantees the point lies inside.
pub(crate) fn pin(lower: f64, point: f64, upper: f64, interval: IntervalType) -> Estimate {
    let (lower, upper) = match interval {
        IntervalType::TwoSided => (lower, upper),
        IntervalType::LowerOneSided => (lower, point),
        IntervalType::UpperOneSided => (point, upper),
    };
    Estimate::new(lower.min(point), point, upper.max(point))
}

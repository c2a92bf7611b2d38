//! Non-parametric survival and repairable-system analysis.
//!
//! - [`kaplan_meier`]: product-limit survivor function with Greenwood
//!   bounds, hazard bounds and the Lee & Wang mean
//! - [`turnbull`]: NPMLE for interval-censored data
//! - [`mean_cumulative_function`]: MCF over per-unit recurrence data
//! - trend tests ([`mil_hdbk`], [`laplace`], [`lewis_robinson`],
//!   [`serial_correlation`]) on failure times and per-unit times between
//!   failures

mod kaplan_meier;
mod mcf;
mod trend;
mod turnbull;

pub use kaplan_meier::{kaplan_meier, KaplanMeier, KaplanMeierStep};
pub use mcf::{mean_cumulative_function, Mcf, McfPoint};
pub use trend::{
    laplace, lewis_robinson, mil_hdbk, serial_correlation, times_between_failures, trend_tests,
};
pub use turnbull::{turnbull, Turnbull, TurnbullInterval};

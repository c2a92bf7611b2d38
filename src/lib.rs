//! # u-reliability
//!
//! Reliability life-data analysis and reliability-growth analysis.
//!
//! The crate fits life distributions to censored failure data, computes
//! confidence bounds, estimates Crow-AMSAA growth models, plans growth
//! tests and provides non-parametric survival estimators. It is a pure
//! computational core: no I/O, no global state, every call takes an
//! immutable [`Dataset`](dataset::Dataset) (or plain vectors) and returns a
//! fresh result value.
//!
//! ## Modules
//!
//! - [`dataset`]: raw observation tuples to a sorted, windowed dataset
//! - [`distributions`]: Exponential, Weibull, Lognormal and Gaussian fits by
//!   MLE or rank regression, with life metrics
//! - [`regression`]: median-rank regression
//! - [`bounds`]: Fisher, Crow, likelihood-ratio and Beta/PERT bounds
//! - [`growth`]: Crow-AMSAA, Duane, goodness of fit and growth test planning
//! - [`survival`]: Kaplan-Meier, Turnbull, mean cumulative function and trend
//!   tests
//! - [`config`], [`model`], [`error`]: method selection, result values and
//!   the error taxonomy
//! - [`solver`], [`quantile`], [`matrix`]: numeric building blocks
//!
//! ## Example
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::dataset::Dataset;
//! use u_reliability::distributions::{fit_distribution, DistributionKind, LifeMetrics};
//!
//! let data = Dataset::from_failures(&[16.0, 34.0, 53.0, 75.0, 93.0, 120.0]).unwrap();
//! let model = fit_distribution(&data, DistributionKind::Weibull, &AnalysisConfig::default()).unwrap();
//! let life = LifeMetrics::new(&model).unwrap();
//! let r = life.reliability(50.0);
//! assert!(r.lower <= r.point && r.point <= r.upper);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Explicit errors**: every fallible call returns
//!   [`Result`](error::Result); recoverable conditions travel with the
//!   result as warnings
//! - **Injectable solvers**: nonlinear equations go through
//!   [`Solver`](solver::Solver)
//! - **Numerical primitives**: special functions and descriptive statistics
//!   come from `u-numflow`

pub mod bounds;
pub mod config;
pub mod dataset;
pub mod distributions;
pub mod error;
pub mod growth;
pub mod matrix;
pub mod model;
pub mod quantile;
pub mod regression;
pub mod solver;
pub mod survival;

pub use config::AnalysisConfig;
pub use dataset::Dataset;
pub use error::{ReliabilityError, Result};
pub use model::{Estimate, FittedModel};

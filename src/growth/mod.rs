//! Reliability growth: Crow-AMSAA estimation, goodness of fit, the Duane
//! model and test planning.
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::growth::{crow_amsaa, mtbf_bounds, GrowthData, MtbfKind};
//!
//! let times = vec![5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
//! let data = GrowthData::new(times, vec![1; 8], Some(100.0), false).unwrap();
//! let config = AnalysisConfig::default();
//! let model = crow_amsaa(&data, &config).unwrap();
//!
//! let mtbf = mtbf_bounds(&model, MtbfKind::Cumulative, 100.0, 0.9, config.interval).unwrap();
//! assert!((mtbf.point - 12.5).abs() < 1e-9);
//! ```

mod crow_amsaa;
mod duane;
mod gof;
mod planner;

pub use crow_amsaa::{
    crow_amsaa, crow_amsaa_with_solver, growth_rate, mtbf_bounds, variance_covariance,
    GrowthData, MtbfKind, PowerLaw,
};
pub use duane::duane;
pub use gof::{
    chi_square_test, cramer_von_mises_statistic, cramer_von_mises_test, cvm_critical_value,
    try_cvm_critical_value, CVM_SIGNIFICANCE, CVM_TABLE,
};
pub use planner::{
    check_feasibility, plan_phases, Criterion, FeasibilityReport, GrowthPhase, GrowthPlan,
    IdealizedCurve, PhaseInput, Violation,
};

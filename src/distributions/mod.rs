//! Life distributions fitted to censored data.
//!
//! Four families share the [`Distribution`] trait and are selected through
//! [`DistributionKind`]:
//!
//! | kind | parameters | support |
//! |---|---|---|
//! | [`Exponential`] | rate λ | t ≥ 0 |
//! | [`Weibull`] | scale η, shape β | t ≥ 0 |
//! | [`LogNormal`] | μ, σ of ln t | t > 0 |
//! | [`Gaussian`] | μ, σ | all t |
//!
//! The log-likelihood sums separate contributions per censoring partition:
//! `ln f(t)` for exact failures, `ln S(t)` for suspensions, `ln F(r)` for
//! left-censored and `ln(F(r) − F(l))` for interval-censored rows. The
//! maximum-likelihood solve itself uses the score equations with censored
//! failures placed at their interval midpoints.
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::dataset::Dataset;
//! use u_reliability::distributions::{fit_distribution, DistributionKind};
//!
//! let data = Dataset::from_failures(&[16.0, 34.0, 53.0, 75.0, 93.0, 120.0]).unwrap();
//! let model = fit_distribution(&data, DistributionKind::Weibull, &AnalysisConfig::default()).unwrap();
//! let shape = model.parameter("shape").unwrap();
//! assert!(shape.lower < shape.point && shape.point < shape.upper);
//! assert!(model.aic.is_some());
//! ```
//!
//! # References
//!
//! - Lawless, J.F. (2003). *Statistical Models and Methods for Lifetime
//!   Data*, 2nd ed., Wiley.
//! - Meeker, W.Q. & Escobar, L.A. (1998). *Statistical Methods for
//!   Reliability Data*, Wiley.

mod exponential;
mod gaussian;
mod life;
mod lognormal;
mod mle;
mod weibull;

use std::fmt;

pub use exponential::Exponential;
pub use gaussian::Gaussian;
pub use life::LifeMetrics;
pub use lognormal::LogNormal;
pub use mle::{fit_model, information_matrix, profile_log_likelihood};
pub use weibull::Weibull;

use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, Observation, Status};
use crate::error::Result;
use crate::model::FittedModel;
use crate::solver::Solver;

/// Life distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistributionKind {
    /// Constant hazard.
    Exponential,
    /// Two-parameter Weibull.
    Weibull,
    /// Log-normal.
    LogNormal,
    /// Normal.
    Gaussian,
}

impl DistributionKind {
    /// All families.
    pub const ALL: [DistributionKind; 4] = [
        DistributionKind::Exponential,
        DistributionKind::Weibull,
        DistributionKind::LogNormal,
        DistributionKind::Gaussian,
    ];

    /// The family's implementation.
    pub fn model(self) -> &'static dyn Distribution {
        match self {
            DistributionKind::Exponential => &Exponential,
            DistributionKind::Weibull => &Weibull,
            DistributionKind::LogNormal => &LogNormal,
            DistributionKind::Gaussian => &Gaussian,
        }
    }

    /// Number of parameters.
    pub fn n_params(self) -> usize {
        self.model().parameter_names().len()
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionKind::Exponential => "Exponential",
            DistributionKind::Weibull => "Weibull",
            DistributionKind::LogNormal => "Lognormal",
            DistributionKind::Gaussian => "Gaussian",
        };
        f.write_str(name)
    }
}

/// Capabilities shared by every life distribution.
///
/// Parameters are passed as slices in the order of
/// [`parameter_names`](Distribution::parameter_names).
pub trait Distribution {
    /// Family tag.
    fn kind(&self) -> DistributionKind;

    /// Parameter names in canonical order.
    fn parameter_names(&self) -> &'static [&'static str];

    /// Whether parameter `index` is a location that may be zero or negative.
    fn is_location(&self, _index: usize) -> bool {
        false
    }

    /// Log density at `x`.
    fn log_pdf(&self, x: f64, params: &[f64]) -> f64;

    /// Cumulative distribution function.
    fn cdf(&self, x: f64, params: &[f64]) -> f64;

    /// Survival function `1 − F(x)`.
    fn sf(&self, x: f64, params: &[f64]) -> f64 {
        1.0 - self.cdf(x, params)
    }

    /// Mean life.
    fn mean(&self, params: &[f64]) -> f64;

    /// Time by which a fraction `p` has failed.
    fn quantile(&self, p: f64, params: &[f64]) -> f64;

    /// One observation's log-likelihood term, per unit of quantity.
    fn log_contribution(&self, obs: &Observation, params: &[f64]) -> f64 {
        match obs.status {
            Status::Event => self.log_pdf(obs.right, params),
            Status::RightCensored => self.sf(obs.right, params).ln(),
            Status::LeftCensored => self.cdf(obs.right, params).ln(),
            Status::IntervalCensored if obs.right <= obs.left => self.log_pdf(obs.right, params),
            Status::IntervalCensored => {
                (self.cdf(obs.right, params) - self.cdf(obs.left, params)).ln()
            }
        }
    }

    /// Log-likelihood summed over the event, right-censored and
    /// interval-censored partitions.
    fn log_likelihood(&self, params: &[f64], data: &Dataset) -> f64 {
        data.events()
            .chain(data.right_censored())
            .chain(data.interval_censored())
            .map(|o| o.weight() * self.log_contribution(o, params))
            .sum()
    }

    /// Score vector with left/interval-censored failures at their midpoints.
    fn partial_derivatives(&self, params: &[f64], data: &Dataset) -> Vec<f64>;

    /// Initial approximation refined by [`Distribution::mle`].
    fn point_estimate(&self, data: &Dataset) -> Result<Vec<f64>>;

    /// Maximum-likelihood parameters.
    fn mle(&self, data: &Dataset, solver: &dyn Solver) -> Result<Vec<f64>>;

    /// Fits the distribution with the configured fit and bound methods.
    fn fit(&self, data: &Dataset, config: &AnalysisConfig) -> Result<FittedModel>;

    /// CDF over a grid of times.
    fn theoretical_cdf(&self, times: &[f64], params: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.cdf(t, params)).collect()
    }
}

/// Fits `kind` to `data` with the configured fit and bound methods.
///
/// # Errors
/// See [`fit_model`].
pub fn fit_distribution(
    data: &Dataset,
    kind: DistributionKind,
    config: &AnalysisConfig,
) -> Result<FittedModel> {
    kind.model().fit(data, config)
}

/// Failures at representative times and suspensions, as `(time, weight)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScoreData {
    pub failures: Vec<(f64, f64)>,
    pub suspensions: Vec<(f64, f64)>,
}

impl ScoreData {
    /// Splits `data`, applying `transform` to every time.
    pub fn new(data: &Dataset, transform: impl Fn(f64) -> f64) -> Self {
        let mut out = ScoreData::default();
        for o in data.observations() {
            let entry = (transform(o.time()), o.weight());
            if o.status.is_failure() {
                out.failures.push(entry);
            } else {
                out.suspensions.push(entry);
            }
        }
        out
    }

    pub fn n_failures(&self) -> f64 {
        self.failures.iter().map(|&(_, w)| w).sum()
    }

    pub fn all(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.failures.iter().chain(self.suspensions.iter())
    }

    /// Failure times, one per unit of weight.
    pub fn failure_times(&self) -> Vec<f64> {
        self.failures
            .iter()
            .flat_map(|&(t, w)| std::iter::repeat(t).take(w as usize))
            .collect()
    }

    pub fn distinct_failures(&self) -> usize {
        let mut ts: Vec<f64> = self.failures.iter().map(|&(t, _)| t).collect();
        ts.sort_by(f64::total_cmp);
        ts.dedup();
        ts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundMethod, FitMethod};
    use crate::dataset::{format_dataset, RawRecord};

    #[test]
    fn kinds_dispatch() {
        for kind in DistributionKind::ALL {
            assert_eq!(kind.model().kind(), kind);
        }
        assert_eq!(DistributionKind::Exponential.n_params(), 1);
        assert_eq!(DistributionKind::Gaussian.n_params(), 2);
        assert_eq!(DistributionKind::LogNormal.to_string(), "Lognormal");
    }

    #[test]
    fn likelihood_partitions() {
        let records = vec![
            RawRecord::new("a", 0.0, 10.0, "event", 1),
            RawRecord::new("b", 0.0, 20.0, "suspension", 1),
            RawRecord::new("c", 5.0, 15.0, "interval", 1),
            RawRecord::new("d", 0.0, 8.0, "left", 1),
        ];
        let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
        let lambda = 0.05_f64;
        let expected = (lambda.ln() - lambda * 10.0)
            + (-lambda * 20.0)
            + ((-lambda * 5.0_f64).exp() - (-lambda * 15.0_f64).exp()).ln()
            + (1.0 - (-lambda * 8.0_f64).exp()).ln();
        let ll = Exponential.log_likelihood(&[lambda], &data);
        assert!((ll - expected).abs() < 1e-12, "{ll} vs {expected}");
    }

    #[test]
    fn every_family_fits_censored_data() {
        let records = vec![
            RawRecord::new("1", 0.0, 12.0, "event", 1),
            RawRecord::new("2", 0.0, 25.0, "event", 2),
            RawRecord::new("3", 0.0, 31.0, "suspension", 1),
            RawRecord::new("4", 0.0, 44.0, "event", 1),
            RawRecord::new("5", 40.0, 60.0, "interval", 1),
            RawRecord::new("6", 0.0, 71.0, "event", 1),
            RawRecord::new("7", 0.0, 90.0, "suspension", 3),
        ];
        let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
        for kind in DistributionKind::ALL {
            for bound_method in [BoundMethod::Fisher, BoundMethod::LikelihoodRatio] {
                for fit_method in [FitMethod::Mle, FitMethod::RankRegression] {
                    let config = AnalysisConfig {
                        fit_method,
                        bound_method,
                        confidence: 0.9,
                        ..AnalysisConfig::default()
                    };
                    let model = fit_distribution(&data, kind, &config)
                        .unwrap_or_else(|e| panic!("{kind} {fit_method:?} {bound_method:?}: {e}"));
                    assert!(model.is_consistent(), "{kind}: {model:?}");
                    assert_eq!(model.n_failures, 6);
                    assert_eq!(model.n_suspensions, 4);
                }
            }
        }
    }
}

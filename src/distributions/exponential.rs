//! Exponential life distribution.

use super::{fit_model, Distribution, DistributionKind, ScoreData};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::FittedModel;
use crate::solver::Solver;

/// Exponential distribution with rate λ: `f(t) = λ·exp(−λt)`.
///
/// The single parameter λ is the failure rate (called the scale in much of
/// the reliability literature); mean life is `1/λ`.
///
/// # Examples
///
/// ```
/// use u_reliability::config::AnalysisConfig;
/// use u_reliability::dataset::Dataset;
/// use u_reliability::distributions::{Distribution, Exponential};
///
/// let data = Dataset::from_failures(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
/// let model = Exponential.fit(&data, &AnalysisConfig::default()).unwrap();
/// assert!((model.point_estimates()[0] - 5.0 / 150.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Exponential;

impl Distribution for Exponential {
    fn kind(&self) -> DistributionKind {
        DistributionKind::Exponential
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        &["rate"]
    }

    fn log_pdf(&self, x: f64, params: &[f64]) -> f64 {
        let lambda = params[0];
        if x < 0.0 || lambda <= 0.0 {
            return f64::NEG_INFINITY;
        }
        lambda.ln() - lambda * x
    }

    fn cdf(&self, x: f64, params: &[f64]) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        -(-params[0] * x).exp_m1()
    }

    fn sf(&self, x: f64, params: &[f64]) -> f64 {
        if x <= 0.0 {
            return 1.0;
        }
        (-params[0] * x).exp()
    }

    fn mean(&self, params: &[f64]) -> f64 {
        1.0 / params[0]
    }

    fn quantile(&self, p: f64, params: &[f64]) -> f64 {
        -(-p).ln_1p() / params[0]
    }

    /// `∂ℓ/∂λ = r/λ − Σ tᵢ` over all rows.
    fn partial_derivatives(&self, params: &[f64], data: &Dataset) -> Vec<f64> {
        let s = ScoreData::new(data, |t| t);
        let exposure: f64 = s.all().map(|&(t, w)| w * t).sum();
        vec![s.n_failures() / params[0] - exposure]
    }

    /// Closed form `r / Σ tᵢ`.
    fn point_estimate(&self, data: &Dataset) -> Result<Vec<f64>> {
        let s = ScoreData::new(data, |t| t);
        let r = s.n_failures();
        let exposure: f64 = s.all().map(|&(t, w)| w * t).sum();
        if r == 0.0 {
            return Err(ReliabilityError::degenerate("no failures to estimate a rate"));
        }
        if !(exposure > 0.0) {
            return Err(ReliabilityError::degenerate("total time on test is zero"));
        }
        Ok(vec![r / exposure])
    }

    fn mle(&self, data: &Dataset, solver: &dyn Solver) -> Result<Vec<f64>> {
        let seed = self.point_estimate(data)?[0];
        let score = |lambda: f64| self.partial_derivatives(&[lambda], data)[0];
        let lambda = solver.find_root(&score, seed, Some((seed * 1e-3, seed * 1e3)))?;
        Ok(vec![lambda])
    }

    fn fit(&self, data: &Dataset, config: &AnalysisConfig) -> Result<FittedModel> {
        fit_model(self, data, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundMethod, IntervalType};
    use crate::dataset::{format_dataset, RawRecord};
    use crate::solver::Newton;

    #[test]
    fn mle_rate_equals_failures_over_total_time() {
        let times = [12.0, 47.0, 85.0, 130.0, 211.0];
        let data = Dataset::from_failures(&times).unwrap();
        let m = Exponential.fit(&data, &AnalysisConfig::default()).unwrap();
        let expected = 5.0 / times.iter().sum::<f64>();
        assert!((m.point_estimates()[0] - expected).abs() < 1e-12);
        assert_eq!(m.n_failures, 5);
        assert!(m.is_consistent());
    }

    #[test]
    fn suspensions_add_exposure() {
        let records = vec![
            RawRecord::new("a", 0.0, 100.0, "event", 1),
            RawRecord::new("b", 0.0, 300.0, "suspension", 2),
        ];
        let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
        let p = Exponential.mle(&data, &Newton::default()).unwrap();
        assert!((p[0] - 1.0 / 700.0).abs() < 1e-12);
    }

    #[test]
    fn likelihood_ratio_bounds_bracket_rate() {
        let data = Dataset::from_failures(&[5.0, 8.0, 13.0, 21.0, 34.0, 55.0]).unwrap();
        let config = AnalysisConfig {
            bound_method: BoundMethod::LikelihoodRatio,
            interval: IntervalType::TwoSided,
            confidence: 0.9,
            ..AnalysisConfig::default()
        };
        let m = Exponential.fit(&data, &config).unwrap();
        let rate = m.parameter("rate").unwrap();
        assert!(rate.lower > 0.0 && rate.lower < rate.point && rate.point < rate.upper);
    }

    #[test]
    fn quantile_inverts_cdf() {
        let p = [0.02];
        let t = Exponential.quantile(0.1, &p);
        assert!((Exponential.cdf(t, &p) - 0.1).abs() < 1e-12);
        assert!((Exponential.mean(&p) - 50.0).abs() < 1e-12);
        assert_eq!(Exponential.theoretical_cdf(&[0.0], &p), vec![0.0]);
    }
}

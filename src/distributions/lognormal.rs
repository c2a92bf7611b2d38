//! Log-normal life distribution.

use u_numflow::special;

use super::gaussian::{normal_mle, normal_score, normal_seed};
use super::{fit_model, Distribution, DistributionKind, ScoreData};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::FittedModel;
use crate::solver::Solver;

/// Log-normal distribution: `ln t ~ N(μ, σ²)`.
///
/// Estimation runs the censored-normal estimator on log times; the
/// Jacobian `1/t` does not depend on the parameters.
///
/// # Examples
///
/// ```
/// use u_reliability::distributions::{Distribution, LogNormal};
///
/// let p = [3.0, 0.5];
/// assert!((LogNormal.cdf(3.0_f64.exp(), &p) - 0.5).abs() < 1e-9);
/// assert!((LogNormal.mean(&p) - (3.0_f64 + 0.125).exp()).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNormal;

fn log_scores(data: &Dataset) -> Result<ScoreData> {
    if data.observations().iter().any(|o| !(o.time() > 0.0)) {
        return Err(ReliabilityError::degenerate(
            "log-normal times must be positive",
        ));
    }
    Ok(ScoreData::new(data, f64::ln))
}

impl Distribution for LogNormal {
    fn kind(&self) -> DistributionKind {
        DistributionKind::LogNormal
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        &["mu", "sigma"]
    }

    fn is_location(&self, index: usize) -> bool {
        index == 0
    }

    fn log_pdf(&self, x: f64, params: &[f64]) -> f64 {
        let (mu, sigma) = (params[0], params[1]);
        if x <= 0.0 || sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let z = (x.ln() - mu) / sigma;
        -x.ln() - sigma.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln() - 0.5 * z * z
    }

    fn cdf(&self, x: f64, params: &[f64]) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        special::standard_normal_cdf((x.ln() - params[0]) / params[1])
    }

    fn sf(&self, x: f64, params: &[f64]) -> f64 {
        if x <= 0.0 {
            return 1.0;
        }
        special::standard_normal_cdf((params[0] - x.ln()) / params[1])
    }

    fn mean(&self, params: &[f64]) -> f64 {
        (params[0] + 0.5 * params[1] * params[1]).exp()
    }

    fn quantile(&self, p: f64, params: &[f64]) -> f64 {
        (params[0] + params[1] * special::inverse_normal_cdf(p)).exp()
    }

    fn partial_derivatives(&self, params: &[f64], data: &Dataset) -> Vec<f64> {
        let s = ScoreData::new(data, |t| t.max(f64::MIN_POSITIVE).ln());
        let sigma = params[1];
        normal_score(&s, params[0], sigma)
            .iter()
            .map(|g| g / sigma)
            .collect()
    }

    fn point_estimate(&self, data: &Dataset) -> Result<Vec<f64>> {
        Ok(normal_seed(&log_scores(data)?)?.to_vec())
    }

    fn mle(&self, data: &Dataset, solver: &dyn Solver) -> Result<Vec<f64>> {
        Ok(normal_mle(&log_scores(data)?, solver)?.to_vec())
    }

    fn fit(&self, data: &Dataset, config: &AnalysisConfig) -> Result<FittedModel> {
        fit_model(self, data, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{format_dataset, RawRecord};
    use crate::solver::Newton;

    #[test]
    fn complete_data_uses_log_moments() {
        let times = [10.0, 20.0, 40.0, 80.0];
        let data = Dataset::from_failures(&times).unwrap();
        let p = LogNormal.mle(&data, &Newton::default()).unwrap();
        let logs: Vec<f64> = times.iter().map(|t: &f64| t.ln()).collect();
        let mu = logs.iter().sum::<f64>() / 4.0;
        let sigma = (logs.iter().map(|l| (l - mu).powi(2)).sum::<f64>() / 4.0).sqrt();
        assert!((p[0] - mu).abs() < 1e-12);
        assert!((p[1] - sigma).abs() < 1e-12);
    }

    #[test]
    fn interval_rows_use_midpoints_in_score() {
        let records = vec![
            RawRecord::new("1", 0.0, 100.0, "event", 1),
            RawRecord::new("2", 150.0, 250.0, "interval", 1),
            RawRecord::new("3", 0.0, 400.0, "event", 1),
            RawRecord::new("4", 0.0, 500.0, "suspension", 1),
        ];
        let data = format_dataset(&records, &AnalysisConfig::default())
            .unwrap()
            .expanded();
        let p = LogNormal.mle(&data, &Newton::default()).unwrap();
        let g = LogNormal.partial_derivatives(&p, &data);
        assert!(g.iter().all(|v| v.abs() < 1e-6), "{g:?}");
        assert!(LogNormal.log_likelihood(&p, &data).is_finite());
    }

    #[test]
    fn rejects_non_positive_times() {
        let data = Dataset::from_failures(&[0.0, 5.0, 9.0]).unwrap();
        assert!(LogNormal.mle(&data, &Newton::default()).is_err());
    }
}

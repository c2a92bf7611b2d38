//! Normal life distribution and the censored-normal estimator it shares
//! with [`LogNormal`](super::LogNormal).

use u_numflow::{special, stats};

use super::{fit_model, Distribution, DistributionKind, ScoreData};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::FittedModel;
use crate::quantile::normal_hazard;
use crate::solver::Solver;

/// Gaussian distribution with mean μ and standard deviation σ.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gaussian;

/// `σ·[∂ℓ/∂μ, ∂ℓ/∂σ]` for failures `y` and suspensions `c` on the normal
/// scale.
pub(crate) fn normal_score(s: &ScoreData, mu: f64, sigma: f64) -> [f64; 2] {
    let mut d_mu = 0.0;
    let mut d_sigma = 0.0;
    for &(y, w) in &s.failures {
        let z = (y - mu) / sigma;
        d_mu += w * z;
        d_sigma += w * (z * z - 1.0);
    }
    for &(c, w) in &s.suspensions {
        let z = (c - mu) / sigma;
        let h = normal_hazard(z);
        d_mu += w * h;
        d_sigma += w * z * h;
    }
    [d_mu, d_sigma]
}

/// Moment seed `(mean, sd)` of the failure values.
pub(crate) fn normal_seed(s: &ScoreData) -> Result<[f64; 2]> {
    let ys = s.failure_times();
    let mu = stats::mean(&ys)
        .ok_or_else(|| ReliabilityError::degenerate("no failures to seed the location"))?;
    let all: Vec<f64> = s.all().map(|&(y, _)| y).collect();
    let sigma = stats::std_dev(&ys)
        .filter(|v| *v > 0.0)
        .or_else(|| stats::std_dev(&all).filter(|v| *v > 0.0))
        .ok_or_else(|| ReliabilityError::degenerate("all observed values are identical"))?;
    Ok([mu, sigma])
}

/// Maximum likelihood `(μ, σ)` for right-censored normal data.
///
/// Without suspensions the estimates are the weighted mean and population
/// standard deviation. Otherwise `μ̂(σ)` solves the location score for each
/// trial σ, and σ solves the profile scale score.
pub(crate) fn normal_mle(s: &ScoreData, solver: &dyn Solver) -> Result<[f64; 2]> {
    if s.distinct_failures() < 2 {
        return Err(ReliabilityError::degenerate(
            "normal scale is zero; fewer than two distinct failure values",
        ));
    }
    let r = s.n_failures();

    if s.suspensions.is_empty() {
        let mu = s.failures.iter().map(|&(y, w)| w * y).sum::<f64>() / r;
        let var = s.failures.iter().map(|&(y, w)| w * (y - mu).powi(2)).sum::<f64>() / r;
        return Ok([mu, var.sqrt()]);
    }

    let [mu0, sigma0] = normal_seed(s)?;
    let (y_min, y_max) = s
        .all()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(y, _)| {
            (lo.min(y), hi.max(y))
        });

    let location = |sigma: f64| -> Result<f64> {
        let f = |mu: f64| normal_score(s, mu, sigma)[0];
        let span = 50.0 * sigma;
        solver.find_root(&f, mu0, Some((y_min - span, y_max + span)))
    };

    let profile = |sigma: f64| match location(sigma) {
        Ok(mu) => normal_score(s, mu, sigma)[1],
        Err(_) => f64::NAN,
    };
    let sigma = solver.find_root(&profile, sigma0, Some((sigma0 * 1e-3, sigma0 * 1e3)))?;
    let mu = location(sigma)?;
    Ok([mu, sigma])
}

impl Distribution for Gaussian {
    fn kind(&self) -> DistributionKind {
        DistributionKind::Gaussian
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        &["mu", "sigma"]
    }

    fn is_location(&self, index: usize) -> bool {
        index == 0
    }

    fn log_pdf(&self, x: f64, params: &[f64]) -> f64 {
        let (mu, sigma) = (params[0], params[1]);
        if sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let z = (x - mu) / sigma;
        -sigma.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln() - 0.5 * z * z
    }

    fn cdf(&self, x: f64, params: &[f64]) -> f64 {
        special::standard_normal_cdf((x - params[0]) / params[1])
    }

    fn sf(&self, x: f64, params: &[f64]) -> f64 {
        special::standard_normal_cdf((params[0] - x) / params[1])
    }

    fn mean(&self, params: &[f64]) -> f64 {
        params[0]
    }

    fn quantile(&self, p: f64, params: &[f64]) -> f64 {
        params[0] + params[1] * special::inverse_normal_cdf(p)
    }

    fn partial_derivatives(&self, params: &[f64], data: &Dataset) -> Vec<f64> {
        let s = ScoreData::new(data, |t| t);
        let sigma = params[1];
        normal_score(&s, params[0], sigma)
            .iter()
            .map(|g| g / sigma)
            .collect()
    }

    fn point_estimate(&self, data: &Dataset) -> Result<Vec<f64>> {
        Ok(normal_seed(&ScoreData::new(data, |t| t))?.to_vec())
    }

    fn mle(&self, data: &Dataset, solver: &dyn Solver) -> Result<Vec<f64>> {
        Ok(normal_mle(&ScoreData::new(data, |t| t), solver)?.to_vec())
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
    fn complete_data_closed_form() {
        let data = Dataset::from_failures(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        let p = Gaussian.mle(&data, &Newton::default()).unwrap();
        assert!((p[0] - 5.0).abs() < 1e-12);
        assert!((p[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn censored_estimate_solves_score() {
        let records = vec![
            RawRecord::new("1", 0.0, 48.0, "event", 1),
            RawRecord::new("2", 0.0, 52.0, "event", 1),
            RawRecord::new("3", 0.0, 55.0, "event", 1),
            RawRecord::new("4", 0.0, 57.0, "suspension", 1),
            RawRecord::new("5", 0.0, 61.0, "event", 1),
            RawRecord::new("6", 0.0, 65.0, "suspension", 2),
        ];
        let data = format_dataset(&records, &AnalysisConfig::default())
            .unwrap()
            .expanded();
        let p = Gaussian.mle(&data, &Newton::default()).unwrap();
        let g = Gaussian.partial_derivatives(&p, &data);
        assert!(g.iter().all(|v| v.abs() < 1e-6), "{g:?}");
        // Suspensions beyond the failures pull the mean upward.
        let complete: f64 = [48.0, 52.0, 55.0, 61.0].iter().sum::<f64>() / 4.0;
        assert!(p[0] > complete);
    }

    #[test]
    fn location_bounds_are_symmetric() {
        let data = Dataset::from_failures(&[7.0, 9.0, 10.5, 11.0, 12.5]).unwrap();
        let m = Gaussian.fit(&data, &AnalysisConfig::default()).unwrap();
        let mu = m.parameter("mu").unwrap();
        assert!(((mu.point - mu.lower) - (mu.upper - mu.point)).abs() < 1e-9);
        let sigma = m.parameter("sigma").unwrap();
        assert!(sigma.lower > 0.0);
        assert!(m.is_consistent());
    }

    #[test]
    fn quantile_and_cdf() {
        let p = [10.0, 2.0];
        assert!((Gaussian.cdf(10.0, &p) - 0.5).abs() < 1e-9);
        assert!((Gaussian.quantile(0.975, &p) - 13.919928).abs() < 1e-4);
        assert!((Gaussian.sf(12.0, &p) + Gaussian.cdf(12.0, &p) - 1.0).abs() < 1e-12);
    }
}

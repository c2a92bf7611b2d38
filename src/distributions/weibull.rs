//! Two-parameter Weibull life distribution.
//!
//! Maximum likelihood uses the shape profile equation. With failures `F`,
//! all rows `A` (failures and suspensions) and `r` failures, the scale
//! that maximizes the likelihood for a given shape is
//!
//! ```text
//! eta(beta)^beta = Σ_A tᵢ^beta / r
//! ```
//!
//! and substituting it leaves one equation in beta:
//!
//! ```text
//! h(beta) = r/beta + Σ_F ln(tᵢ) − r·Σ_A tᵢ^beta·ln(tᵢ) / Σ_A tᵢ^beta = 0
//! ```
//!
//! Times are divided by the largest time before powering, which leaves
//! `h` unchanged and keeps `tᵢ^beta` finite for large shapes.

use u_numflow::{special, stats};

use super::{fit_model, Distribution, DistributionKind, ScoreData};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::FittedModel;
use crate::solver::Solver;

/// Shape search interval.
const SHAPE_RANGE: (f64, f64) = (1e-3, 200.0);

/// Shape used when percentiles cannot seed the solve.
const DEFAULT_SHAPE: f64 = 1.2;

/// Weibull distribution with scale η and shape β:
/// `F(t) = 1 − exp(−(t/η)^β)`.
///
/// # Examples
///
/// ```
/// use u_reliability::distributions::{Distribution, Weibull};
///
/// let p = [100.0, 2.0];
/// assert!((Weibull.sf(100.0, &p) - (-1.0_f64).exp()).abs() < 1e-12);
/// // Mean life η·Γ(1 + 1/β)
/// assert!((Weibull.mean(&p) - 88.622_692_5).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Weibull;

impl Weibull {
    /// Profile equation `h(beta)` on normalized times.
    fn shape_equation(s: &ScoreData, beta: f64) -> f64 {
        let r = s.n_failures();
        let sum_ln_failures: f64 = s.failures.iter().map(|&(u, w)| w * u.ln()).sum();
        let (mut s0, mut s1) = (0.0, 0.0);
        for &(u, w) in s.all() {
            let ub = u.powf(beta);
            s0 += w * ub;
            s1 += w * ub * u.ln();
        }
        r / beta + sum_ln_failures - r * s1 / s0
    }
}

impl Distribution for Weibull {
    fn kind(&self) -> DistributionKind {
        DistributionKind::Weibull
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        &["scale", "shape"]
    }

    fn log_pdf(&self, x: f64, params: &[f64]) -> f64 {
        let (eta, beta) = (params[0], params[1]);
        if x <= 0.0 || eta <= 0.0 || beta <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let z = x / eta;
        beta.ln() - eta.ln() + (beta - 1.0) * z.ln() - z.powf(beta)
    }

    fn cdf(&self, x: f64, params: &[f64]) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        -(-(x / params[0]).powf(params[1])).exp_m1()
    }

    fn sf(&self, x: f64, params: &[f64]) -> f64 {
        if x <= 0.0 {
            return 1.0;
        }
        (-(x / params[0]).powf(params[1])).exp()
    }

    fn mean(&self, params: &[f64]) -> f64 {
        params[0] * special::ln_gamma(1.0 + 1.0 / params[1]).exp()
    }

    fn quantile(&self, p: f64, params: &[f64]) -> f64 {
        params[0] * (-(-p).ln_1p()).powf(1.0 / params[1])
    }

    /// `[∂ℓ/∂η, ∂ℓ/∂β]` with censored failures at their midpoints.
    fn partial_derivatives(&self, params: &[f64], data: &Dataset) -> Vec<f64> {
        let (eta, beta) = (params[0], params[1]);
        let s = ScoreData::new(data, |t| t / eta);
        let r = s.n_failures();
        let sum_z: f64 = s.all().map(|&(z, w)| w * z.powf(beta)).sum();
        let sum_z_ln: f64 = s.all().map(|&(z, w)| w * z.powf(beta) * z.ln()).sum();
        let sum_ln_f: f64 = s.failures.iter().map(|&(z, w)| w * z.ln()).sum();
        vec![
            beta / eta * (sum_z - r),
            r / beta + sum_ln_f - sum_z_ln,
        ]
    }

    /// Percentile seed: the 10th and 90th failure percentiles fix the shape
    /// through `ln(−ln(1 − p)) = β·ln t − β·ln η`; the 63.2th fixes the scale.
    fn point_estimate(&self, data: &Dataset) -> Result<Vec<f64>> {
        let s = ScoreData::new(data, |t| t);
        let times = s.failure_times();
        if times.is_empty() {
            return Err(ReliabilityError::degenerate("no failures to seed Weibull"));
        }
        let eta0 = stats::quantile(&times, 0.632)
            .filter(|v| *v > 0.0)
            .ok_or_else(|| ReliabilityError::degenerate("Weibull needs positive failure times"))?;
        let beta0 = match (stats::quantile(&times, 0.1), stats::quantile(&times, 0.9)) {
            (Some(t10), Some(t90)) if t10 > 0.0 && t90 > t10 => {
                ((-(0.1_f64).ln()).ln() - (-(0.9_f64).ln()).ln()) / (t90 / t10).ln()
            }
            _ => DEFAULT_SHAPE,
        };
        Ok(vec![eta0, beta0.clamp(SHAPE_RANGE.0 * 10.0, SHAPE_RANGE.1 / 10.0)])
    }

    fn mle(&self, data: &Dataset, solver: &dyn Solver) -> Result<Vec<f64>> {
        let raw = ScoreData::new(data, |t| t);
        if raw.all().any(|&(t, _)| !(t > 0.0)) {
            return Err(ReliabilityError::degenerate(
                "Weibull times must be positive",
            ));
        }
        let t_max = raw.all().map(|&(t, _)| t).fold(0.0_f64, f64::max);
        let s = ScoreData::new(data, |t| t / t_max);
        let r = s.n_failures();

        let h = |beta: f64| Self::shape_equation(&s, beta);
        if h(SHAPE_RANGE.1) > 0.0 {
            return Err(ReliabilityError::degenerate(
                "Weibull shape is unbounded; failure times are identical",
            ));
        }

        let seed = self.point_estimate(data)?[1];
        let beta = solver.find_root(&h, seed, Some(SHAPE_RANGE))?;
        let s0: f64 = s.all().map(|&(u, w)| w * u.powf(beta)).sum();
        let eta = t_max * (s0 / r).powf(1.0 / beta);

        if !eta.is_finite() || eta <= 0.0 {
            return Err(ReliabilityError::degenerate(format!(
                "Weibull scale {eta} is not positive"
            )));
        }
        Ok(vec![eta, beta])
    }

    fn fit(&self, data: &Dataset, config: &AnalysisConfig) -> Result<FittedModel> {
        fit_model(self, data, config)
    }
}

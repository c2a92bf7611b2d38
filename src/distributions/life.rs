//! Reliability metrics from a fitted life distribution.
//!
//! Provides the reliability function, hazard rate, mean life and B-life of
//! a [`FittedModel`]. Bounds on each metric are the extremes of the metric
//! over the corners of the parameter bound box, so they carry the confidence
//! level used when the model was fitted. The corners mix lower and upper
//! parameter bounds, so metric bounds are two-sided unless
//! [`LifeMetrics::with_interval`] pins one side to the point estimate.

use super::Distribution;
use crate::bounds::pin;
use crate::config::IntervalType;
use crate::error::{ReliabilityError, Result};
use crate::model::{Estimate, FittedModel, ModelKind};

/// Reliability metrics for a fitted life distribution.
///
/// # Examples
///
/// ```
/// use u_reliability::config::AnalysisConfig;
/// use u_reliability::dataset::Dataset;
/// use u_reliability::distributions::{fit_distribution, DistributionKind, LifeMetrics};
///
/// let data = Dataset::from_failures(&[16.0, 34.0, 53.0, 75.0, 93.0, 120.0]).unwrap();
/// let model = fit_distribution(&data, DistributionKind::Weibull, &AnalysisConfig::default()).unwrap();
/// let life = LifeMetrics::new(&model).unwrap();
///
/// assert!((life.reliability(0.0).point - 1.0).abs() < 1e-12);
/// let r = life.reliability(50.0);
/// assert!(r.lower <= r.point && r.point <= r.upper);
/// let b10 = life.b_life(0.10).unwrap();
/// assert!(b10.point > 0.0 && b10.point < model.point_estimates()[0]);
/// ```
///
/// # Reference
/// Meeker & Escobar (1998), *Statistical Methods for Reliability Data*, Ch. 4.
#[derive(Clone, Copy)]
pub struct LifeMetrics<'a> {
    model: &'a FittedModel,
    dist: &'static dyn Distribution,
    interval: IntervalType,
}

impl std::fmt::Debug for LifeMetrics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifeMetrics")
            .field("kind", &self.model.kind)
            .field("params", &self.model.point_estimates())
            .field("interval", &self.interval)
            .finish()
    }
}

impl<'a> LifeMetrics<'a> {
    /// Wraps a fitted life distribution.
    ///
    /// # Errors
    /// [`ReliabilityError::InvalidInput`] for growth models.
    pub fn new(model: &'a FittedModel) -> Result<Self> {
        match model.kind {
            ModelKind::Distribution(kind) => Ok(Self {
                model,
                dist: kind.model(),
                interval: IntervalType::TwoSided,
            }),
            other => Err(ReliabilityError::invalid(format!(
                "{other} is not a life distribution"
            ))),
        }
    }

    /// Reports metric bounds with the given sidedness.
    pub fn with_interval(self, interval: IntervalType) -> Self {
        Self { interval, ..self }
    }

    /// Evaluates `f` at the point estimate and at every corner of the
    /// parameter bound box.
    fn bounded(&self, f: impl Fn(&[f64]) -> f64) -> Estimate {
        let point = f(&self.model.point_estimates());
        let k = self.model.parameters.len();
        let (mut lo, mut hi) = (point, point);
        for mask in 0..(1_usize << k) {
            let corner: Vec<f64> = self
                .model
                .parameters
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    if mask & (1 << i) == 0 {
                        p.estimate.lower
                    } else {
                        p.estimate.upper
                    }
                })
                .collect();
            let v = f(&corner);
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        pin(lo, point, hi, self.interval)
    }

    /// Reliability `R(t) = 1 − F(t)`.
    pub fn reliability(&self, t: f64) -> Estimate {
        self.bounded(|p| self.dist.sf(t, p))
    }

    /// Unreliability `F(t)`.
    pub fn unreliability(&self, t: f64) -> Estimate {
        self.bounded(|p| self.dist.cdf(t, p))
    }

    /// Hazard rate `f(t)/R(t)` at the point estimate.
    pub fn hazard_rate(&self, t: f64) -> f64 {
        let p = self.model.point_estimates();
        let sf = self.dist.sf(t, &p);
        if sf <= 0.0 {
            return f64::INFINITY;
        }
        self.dist.log_pdf(t, &p).exp() / sf
    }

    /// Mean life (MTBF for a renewal process).
    pub fn mean_life(&self) -> Estimate {
        self.bounded(|p| self.dist.mean(p))
    }

    /// Time by which `fraction` of the population has failed (B-life).
    ///
    /// # Errors
    /// [`ReliabilityError::InvalidInput`] unless `0 < fraction < 1`.
    pub fn b_life(&self, fraction: f64) -> Result<Estimate> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ReliabilityError::invalid(format!(
                "B-life fraction {fraction} must lie in (0, 1)"
            )));
        }
        Ok(self.bounded(|p| self.dist.quantile(fraction, p)))
    }

    /// Reliability over a grid of times.
    pub fn reliability_curve(&self, times: &[f64]) -> Vec<(f64, Estimate)> {
        times.iter().map(|&t| (t, self.reliability(t))).collect()
    }
}

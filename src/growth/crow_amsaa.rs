//! Crow-AMSAA (NHPP power law) estimation and derived growth metrics.
//!
//! The failure intensity of a repairable system under development is
//! modelled as `ρ(t) = α·β·t^(β−1)`, so the expected number of failures by
//! `t` is `α·t^β`.
//!
//! # Algorithm
//!
//! Exact failure times have the closed-form MLE
//!
//! ```text
//! β̂ = N / (N·ln T − Σ nᵢ·ln tᵢ),    α̂ = N / T^β̂
//! ```
//!
//! Grouped counts have no closed form; `β̂` is the root of
//!
//! ```text
//! Σ nᵢ·[(tᵢ^β·ln tᵢ − tᵢ₋₁^β·ln tᵢ₋₁) / (tᵢ^β − tᵢ₋₁^β) − ln T] = 0
//! ```
//!
//! started from the exact-data closed form. If the solver fails, `β = 1`
//! is used and the [`ReliabilityError::NonConvergence`] is recorded in the
//! model's warnings.
//!
//! # References
//!
//! - Crow, L.H. (1974). "Reliability analysis for complex, repairable
//!   systems". *Reliability and Biometry*, SIAM, pp. 379-410.
//! - MIL-HDBK-189C (2011). *Reliability Growth Management*, §5.

use std::f64::consts::PI;

use tracing::{debug, warn};
use u_numflow::special;

use crate::bounds::{crow_bounds, fisher_bounds, likelihood_ratio_bounds, CrowMetric};
use crate::config::{AnalysisConfig, BoundMethod, FitMethod, IntervalType, Termination};
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::matrix::{invert, quadratic_form, symmetrize, Matrix2};
use crate::model::{Estimate, FittedModel, ModelKind, Parameter};
use crate::solver::{maximize_golden, Solver};

// ---------------------------------------------------------------------------
// Growth data
// ---------------------------------------------------------------------------

/// Cumulative test times with the failures observed at (or up to) each.
///
/// For exact data `times` are failure times; for grouped data they are
/// interval end points and `failures[i]` counts failures in
/// `(times[i−1], times[i]]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrowthData {
    times: Vec<f64>,
    failures: Vec<u32>,
    end: f64,
    grouped: bool,
}

impl GrowthData {
    /// Builds growth data from parallel vectors.
    ///
    /// `end` defaults to the last time.
    ///
    /// # Errors
    /// - [`ReliabilityError::InvalidInput`] for mismatched lengths,
    ///   unsorted or non-positive times, or an `end` before the last time.
    /// - [`ReliabilityError::InsufficientData`] for empty input.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_reliability::growth::GrowthData;
    ///
    /// let data = GrowthData::new(vec![5.0, 12.0, 19.0], vec![1, 1, 1], Some(25.0), false).unwrap();
    /// assert_eq!(data.n_failures(), 3.0);
    /// assert_eq!(data.end(), 25.0);
    /// ```
    pub fn new(
        times: Vec<f64>,
        failures: Vec<u32>,
        end: Option<f64>,
        grouped: bool,
    ) -> Result<Self> {
        if times.is_empty() {
            return Err(ReliabilityError::insufficient(1, 0));
        }
        if times.len() != failures.len() {
            return Err(ReliabilityError::invalid(format!(
                "{} times but {} failure counts",
                times.len(),
                failures.len()
            )));
        }
        if times.iter().any(|t| !(*t > 0.0) || !t.is_finite()) {
            return Err(ReliabilityError::invalid(
                "growth times must be positive and finite",
            ));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(ReliabilityError::invalid(
                "growth times must be non-decreasing",
            ));
        }
        let last = times[times.len() - 1];
        let end = end.unwrap_or(last);
        if !(end >= last) || !end.is_finite() {
            return Err(ReliabilityError::invalid(format!(
                "end of test {end} precedes the last time {last}"
            )));
        }
        Ok(Self {
            times,
            failures,
            end,
            grouped,
        })
    }

    /// Pools the failures of every unit onto one cumulative time axis.
    ///
    /// Equal times are merged. The end of test is the configured end time
    /// for time-terminated tests (the latest observed time when unset) and
    /// the last failure for failure-terminated tests.
    ///
    /// # Errors
    /// [`ReliabilityError::DegenerateParameter`] when the dataset holds no
    /// failures, plus the errors of [`GrowthData::new`].
    pub fn from_dataset(data: &Dataset, config: &AnalysisConfig) -> Result<Self> {
        let grouped = config.grouped || data.is_grouped();
        let mut points: Vec<(f64, u32)> = data
            .observations()
            .iter()
            .filter(|o| o.status.is_failure())
            .map(|o| (if grouped { o.right } else { o.time() }, o.quantity))
            .collect();
        if points.is_empty() {
            return Err(ReliabilityError::degenerate(
                "growth analysis needs at least one failure",
            ));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut times: Vec<f64> = Vec::with_capacity(points.len());
        let mut failures: Vec<u32> = Vec::with_capacity(points.len());
        for (t, q) in points {
            match times.last() {
                Some(&last) if last == t => {
                    if let Some(n) = failures.last_mut() {
                        *n += q;
                    }
                }
                _ => {
                    times.push(t);
                    failures.push(q);
                }
            }
        }

        let end = match config.termination {
            Termination::FailureTerminated => None,
            Termination::TimeTerminated => Some(config.end_time.unwrap_or_else(|| {
                data.observations()
                    .iter()
                    .map(|o| o.right)
                    .fold(f64::NEG_INFINITY, f64::max)
            })),
        };
        Self::new(times, failures, end, grouped)
    }

    /// Failure (or interval end) times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Failure counts per time.
    pub fn failures(&self) -> &[u32] {
        &self.failures
    }

    /// End of test `T`.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Whether the counts are grouped into intervals.
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    /// Total failures `N`.
    pub fn n_failures(&self) -> f64 {
        self.failures.iter().map(|&n| f64::from(n)).sum()
    }

    /// Exact-data closed form for `β̂`.
    fn closed_form_beta(&self) -> Result<f64> {
        let n = self.n_failures();
        let sum_log: f64 = self
            .times
            .iter()
            .zip(&self.failures)
            .map(|(t, &k)| f64::from(k) * t.ln())
            .sum();
        let denom = n * self.end.ln() - sum_log;
        if !(denom > 0.0) {
            return Err(ReliabilityError::degenerate(format!(
                "N·ln T − Σ ln tᵢ = {denom} is not positive; \
                 every failure occurred at the end of test"
            )));
        }
        Ok(n / denom)
    }

    /// Left-hand side of the grouped shape equation.
    fn grouped_score(&self, beta: f64) -> f64 {
        let ln_end = self.end.ln();
        let mut prev = 0.0_f64;
        let mut acc = 0.0;
        for (&t, &k) in self.times.iter().zip(&self.failures) {
            let (a, b) = (t.powf(beta), prev.powf(beta));
            // 0·ln 0 = 0 at the origin.
            let b_log = if prev > 0.0 { b * prev.ln() } else { 0.0 };
            acc += f64::from(k) * ((a * t.ln() - b_log) / (a - b) - ln_end);
            prev = t;
        }
        acc
    }

    /// Poisson log-likelihood of `(α, β)`.
    pub fn log_likelihood(&self, alpha: f64, beta: f64) -> f64 {
        if !(alpha > 0.0) || !(beta > 0.0) {
            return f64::NEG_INFINITY;
        }
        let expected_total = alpha * self.end.powf(beta);
        if self.grouped {
            let mut prev = 0.0_f64;
            let mut acc = 0.0;
            for (&t, &k) in self.times.iter().zip(&self.failures) {
                let theta = alpha * (t.powf(beta) - prev.powf(beta));
                if k > 0 {
                    let k = f64::from(k);
                    acc += k * theta.ln() - special::ln_gamma(k + 1.0);
                }
                prev = t;
            }
            acc - expected_total
        } else {
            let n = self.n_failures();
            let sum_log: f64 = self
                .times
                .iter()
                .zip(&self.failures)
                .map(|(t, &k)| f64::from(k) * t.ln())
                .sum();
            n * (alpha.ln() + beta.ln()) + (beta - 1.0) * sum_log - expected_total
        }
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Fits the Crow-AMSAA model with the default solver from `config`.
///
/// # Examples
///
/// ```
/// use u_reliability::config::{AnalysisConfig, BoundMethod};
/// use u_reliability::growth::{crow_amsaa, GrowthData};
///
/// let times = vec![5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
/// let data = GrowthData::new(times, vec![1; 8], Some(100.0), false).unwrap();
/// let config = AnalysisConfig { bound_method: BoundMethod::Crow, ..AnalysisConfig::default() };
/// let model = crow_amsaa(&data, &config).unwrap();
/// assert!(model.is_consistent());
/// ```
pub fn crow_amsaa(data: &GrowthData, config: &AnalysisConfig) -> Result<FittedModel> {
    let solver = config.clone().validate()?.solver();
    crow_amsaa_with_solver(data, config, &solver)
}

/// Fits the Crow-AMSAA model using `solver` for the grouped shape equation
/// and likelihood-ratio bounds.
///
/// # Errors
/// - [`ReliabilityError::DegenerateParameter`] with no failures or when
///   the closed form has a non-positive denominator.
/// - Bound calculator errors.
pub fn crow_amsaa_with_solver(
    data: &GrowthData,
    config: &AnalysisConfig,
    solver: &dyn Solver,
) -> Result<FittedModel> {
    let config = config.clone().validate()?;
    let n = data.n_failures();
    if n == 0.0 {
        return Err(ReliabilityError::degenerate(
            "Crow-AMSAA needs at least one failure",
        ));
    }

    let mut warnings = Vec::new();
    let beta = if data.grouped {
        let guess = data.closed_form_beta().unwrap_or(1.0);
        let score = |b: f64| data.grouped_score(b);
        match solver.find_root(&score, guess, Some((1e-3, 20.0))) {
            Ok(b) if b > 0.0 && b.is_finite() => b,
            Ok(b) => {
                warn!(beta = b, "grouped shape root is not positive; using beta = 1");
                warnings.push(ReliabilityError::degenerate(format!(
                    "grouped shape root {b} is not positive; beta = 1 used"
                )));
                1.0
            }
            Err(e) => {
                warn!(error = %e, "grouped shape equation did not converge; using beta = 1");
                warnings.push(e);
                1.0
            }
        }
    } else {
        data.closed_form_beta()?
    };
    let alpha = n / data.end.powf(beta);
    let ll = data.log_likelihood(alpha, beta);
    let covariance = variance_covariance(n, data.end, alpha, beta)?;
    debug!(alpha, beta, grouped = data.grouped, "fitted Crow-AMSAA");

    let method = match config.bound_method {
        BoundMethod::BetaPert => {
            warn!("Beta/PERT bounds do not apply to growth models; using Fisher");
            warnings.push(ReliabilityError::invalid(
                "BetaPert bounds do not apply to growth models; Fisher bounds used",
            ));
            BoundMethod::Fisher
        }
        other => other,
    };

    let (alpha_est, beta_est) = match method {
        BoundMethod::Crow => (
            crow_bounds(
                CrowMetric::Scale,
                n.round() as usize,
                data.end,
                alpha,
                beta,
                config.confidence,
                config.termination,
                config.interval,
            )?,
            crow_bounds(
                CrowMetric::Shape,
                n.round() as usize,
                data.end,
                alpha,
                beta,
                config.confidence,
                config.termination,
                config.interval,
            )?,
        ),
        BoundMethod::LikelihoodRatio => {
            let end = data.end;
            let profile_beta = |b: f64| data.log_likelihood(n / end.powf(b), b);
            let profile_alpha = |a: f64| {
                let ll = |u: f64| data.log_likelihood(a, u.exp());
                let c = beta.ln();
                maximize_golden(&ll, c - 4.0, c + 4.0, 200, 1e-10)
                    .map_or(f64::NEG_INFINITY, |u| ll(u))
            };
            (
                likelihood_ratio_bounds(
                    &profile_alpha,
                    alpha,
                    ll,
                    config.confidence,
                    config.interval,
                    0.0,
                    solver,
                )?,
                likelihood_ratio_bounds(
                    &profile_beta,
                    beta,
                    ll,
                    config.confidence,
                    config.interval,
                    0.0,
                    solver,
                )?,
            )
        }
        _ => (
            fisher_bounds(alpha, covariance[0][0], config.confidence, config.interval)?,
            fisher_bounds(beta, covariance[1][1], config.confidence, config.interval)?,
        ),
    };

    Ok(FittedModel {
        kind: ModelKind::CrowAmsaa,
        method: FitMethod::Mle,
        parameters: vec![
            Parameter {
                name: "alpha",
                estimate: alpha_est,
            },
            Parameter {
                name: "beta",
                estimate: beta_est,
            },
        ],
        covariance,
        log_likelihood: Some(ll),
        aic: Some(-2.0 * ll + 4.0),
        bic: Some(-2.0 * ll + (n.ln() - PI.ln())),
        correlation: None,
        n_failures: n.round() as usize,
        n_suspensions: 0,
        warnings,
    })
}

/// Crow-AMSAA parameter variance-covariance from the observed information
///
/// ```text
/// | N/α²         T^β·ln T            |⁻¹
/// | T^β·ln T     N/β² + α·T^β·ln² T  |
/// ```
pub fn variance_covariance(n: f64, end: f64, alpha: f64, beta: f64) -> Result<Matrix2> {
    let tb = end.powf(beta);
    let ln_t = end.ln();
    let info = [
        [n / (alpha * alpha), tb * ln_t],
        [tb * ln_t, n / (beta * beta) + alpha * tb * ln_t * ln_t],
    ];
    Ok(symmetrize(&invert(&info)?))
}

// ---------------------------------------------------------------------------
// Power-law metrics
// ---------------------------------------------------------------------------

/// Which mean time between failures to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtbfKind {
    /// `T / N(T) = T^(1−β)/α`.
    Cumulative,
    /// `1/ρ(T) = 1/(α·β·T^(β−1))`.
    Instantaneous,
}

/// Point evaluation of the NHPP power law `N(t) = α·t^β`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerLaw {
    /// Scale α.
    pub alpha: f64,
    /// Shape β.
    pub beta: f64,
}

impl PowerLaw {
    /// Power law from the point estimates of a Crow-AMSAA or Duane model.
    ///
    /// # Errors
    /// [`ReliabilityError::InvalidInput`] for a life-distribution model.
    pub fn from_model(model: &FittedModel) -> Result<Self> {
        match model.kind {
            ModelKind::CrowAmsaa | ModelKind::Duane => {
                let p = model.point_estimates();
                Ok(Self {
                    alpha: p[0],
                    beta: p[1],
                })
            }
            ModelKind::Distribution(kind) => Err(ReliabilityError::invalid(format!(
                "{kind} is not a growth model"
            ))),
        }
    }

    /// Expected cumulative failures `α·t^β`.
    pub fn expected_failures(&self, t: f64) -> f64 {
        self.alpha * t.powf(self.beta)
    }

    /// Cumulative failure intensity `α·t^(β−1)`.
    pub fn cumulative_intensity(&self, t: f64) -> f64 {
        self.alpha * t.powf(self.beta - 1.0)
    }

    /// Instantaneous failure intensity `α·β·t^(β−1)`.
    pub fn instantaneous_intensity(&self, t: f64) -> f64 {
        self.alpha * self.beta * t.powf(self.beta - 1.0)
    }

    /// Cumulative or instantaneous MTBF at `t`.
    pub fn mtbf(&self, kind: MtbfKind, t: f64) -> f64 {
        match kind {
            MtbfKind::Cumulative => 1.0 / self.cumulative_intensity(t),
            MtbfKind::Instantaneous => 1.0 / self.instantaneous_intensity(t),
        }
    }

    /// Growth rate `1 − β`.
    pub fn growth_rate(&self) -> f64 {
        1.0 - self.beta
    }
}

/// MTBF at `t` with delta-method Fisher bounds.
///
/// The variance is `∇ᵀ·Σ·∇` with the gradient of the mean with respect to
/// `(α, β)` and `Σ` the model covariance.
///
/// # Errors
/// [`ReliabilityError::DegenerateParameter`] for `t ≤ 0` or a non-positive
/// mean, plus the errors of [`PowerLaw::from_model`].
pub fn mtbf_bounds(
    model: &FittedModel,
    kind: MtbfKind,
    t: f64,
    confidence: f64,
    interval: IntervalType,
) -> Result<Estimate> {
    let law = PowerLaw::from_model(model)?;
    if !(t > 0.0) {
        return Err(ReliabilityError::degenerate(format!(
            "MTBF needs a positive time, got {t}"
        )));
    }
    let PowerLaw { alpha, beta } = law;
    let s = t.powf(1.0 - beta);
    let ln_t = t.ln();
    let gradient = match kind {
        MtbfKind::Cumulative => [-s / (alpha * alpha), -s * ln_t / alpha],
        MtbfKind::Instantaneous => [
            -s / (alpha * alpha * beta),
            -s / (alpha * beta * beta) - s * ln_t / (alpha * beta),
        ],
    };
    let variance = quadratic_form(&gradient, &model.covariance);
    fisher_bounds(law.mtbf(kind, t), variance.max(0.0), confidence, interval)
}

/// Observed growth rate `1 − β` with bounds mirrored from the β bounds.
///
/// # Errors
/// Same as [`PowerLaw::from_model`].
pub fn growth_rate(model: &FittedModel) -> Result<Estimate> {
    PowerLaw::from_model(model)?;
    let beta = model.parameters[1].estimate;
    Ok(Estimate::new(
        1.0 - beta.upper,
        1.0 - beta.point,
        1.0 - beta.lower,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{format_dataset, RawRecord};

    struct FailingSolver;

    impl Solver for FailingSolver {
        fn find_root(
            &self,
            _f: &dyn Fn(f64) -> f64,
            _guess: f64,
            _bracket: Option<(f64, f64)>,
        ) -> Result<f64> {
            Err(ReliabilityError::NonConvergence {
                method: "mock",
                iterations: 0,
            })
        }
    }

    fn exact(times: &[f64], end: f64) -> GrowthData {
        GrowthData::new(times.to_vec(), vec![1; times.len()], Some(end), false).unwrap()
    }

    #[test]
    fn closed_form_ten_failures() {
        let times = [3.0, 9.0, 15.0, 22.0, 31.0, 42.0, 54.0, 66.0, 80.0, 95.0];
        let data = exact(&times, 100.0);
        let m = crow_amsaa(&data, &AnalysisConfig::default()).unwrap();
        let sum_log: f64 = times.iter().map(|t: &f64| t.ln()).sum();
        let beta = 10.0 / (10.0 * 100.0_f64.ln() - sum_log);
        let alpha = 10.0 / 100.0_f64.powf(beta);
        let p = m.point_estimates();
        assert!((p[0] - alpha).abs() < 1e-12, "alpha = {}", p[0]);
        assert!((p[1] - beta).abs() < 1e-12, "beta = {}", p[1]);
        assert!(m.is_consistent());
    }

    #[test]
    fn eight_failures_with_crow_bounds() {
        let times = [5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
        let data = exact(&times, 100.0);
        let config = AnalysisConfig {
            bound_method: BoundMethod::Crow,
            confidence: 0.80,
            ..AnalysisConfig::default()
        };
        let m = crow_amsaa(&data, &config).unwrap();
        let sum_log: f64 = times.iter().map(|t: &f64| t.ln()).sum();
        let beta = 8.0 / (8.0 * 100.0_f64.ln() - sum_log);
        let p = m.point_estimates();
        assert!((p[1] - beta).abs() < 1e-12);
        assert!((p[0] - 8.0 / 100.0_f64.powf(beta)).abs() < 1e-12);
        for param in &m.parameters {
            let e = param.estimate;
            assert!(e.lower < e.point && e.point < e.upper, "{}: {e:?}", param.name);
        }
    }

    #[test]
    fn recovers_parameters_from_expected_times() {
        // tᵢ solves α·t^β = i, so the sample follows the mean function.
        let (alpha, beta) = (0.5_f64, 0.6_f64);
        let n = 1000;
        let times: Vec<f64> = (1..=n)
            .map(|i| (i as f64 / alpha).powf(1.0 / beta))
            .collect();
        let end = times[n - 1];
        let m = crow_amsaa(&exact(&times, end), &AnalysisConfig::default()).unwrap();
        let p = m.point_estimates();
        assert!((p[1] - beta).abs() / beta < 0.01, "beta = {}", p[1]);
        assert!((p[0] - alpha).abs() / alpha < 0.05, "alpha = {}", p[0]);
    }

    #[test]
    fn grouped_counts_at_expectation_give_exact_fit() {
        // α = 1, β = 0.5: t^β = 2, 4, 6, 8, 10, two expected failures each.
        let data = GrowthData::new(
            vec![4.0, 16.0, 36.0, 64.0, 100.0],
            vec![2; 5],
            Some(100.0),
            true,
        )
        .unwrap();
        let m = crow_amsaa(&data, &AnalysisConfig::default()).unwrap();
        let p = m.point_estimates();
        assert!((p[1] - 0.5).abs() < 1e-8, "beta = {}", p[1]);
        assert!((p[0] - 1.0).abs() < 1e-6, "alpha = {}", p[0]);
        assert!(m.warnings.is_empty());
    }

    #[test]
    fn grouped_non_convergence_falls_back_to_unit_shape() {
        let data = GrowthData::new(vec![10.0, 20.0, 30.0], vec![4, 3, 2], None, true).unwrap();
        let m = crow_amsaa_with_solver(&data, &AnalysisConfig::default(), &FailingSolver).unwrap();
        let p = m.point_estimates();
        assert_eq!(p[1], 1.0);
        assert!((p[0] - 9.0 / 30.0).abs() < 1e-12);
        assert!(matches!(
            m.warnings.as_slice(),
            [ReliabilityError::NonConvergence { .. }]
        ));
    }

    #[test]
    fn from_dataset_merges_units_and_uses_window_end() {
        let records = vec![
            RawRecord::new("a", 0.0, 5.0, "event", 1),
            RawRecord::new("b", 0.0, 5.0, "event", 1),
            RawRecord::new("a", 5.0, 12.0, "event", 1),
            RawRecord::new("b", 5.0, 40.0, "suspension", 1),
        ];
        let config = AnalysisConfig::default();
        let data = GrowthData::from_dataset(&format_dataset(&records, &config).unwrap(), &config)
            .unwrap();
        assert_eq!(data.times(), &[5.0, 12.0]);
        assert_eq!(data.failures(), &[2, 1]);
        assert_eq!(data.end(), 40.0);

        let config = AnalysisConfig {
            termination: Termination::FailureTerminated,
            ..AnalysisConfig::default()
        };
        let data = GrowthData::from_dataset(&format_dataset(&records, &config).unwrap(), &config)
            .unwrap();
        assert_eq!(data.end(), 12.0);
    }

    #[test]
    fn likelihood_ratio_bounds_are_ordered() {
        let data = exact(&[5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0], 100.0);
        let config = AnalysisConfig {
            bound_method: BoundMethod::LikelihoodRatio,
            confidence: 0.9,
            ..AnalysisConfig::default()
        };
        let m = crow_amsaa(&data, &config).unwrap();
        assert!(m.is_consistent());
        let b = m.parameter("beta").unwrap();
        assert!(b.lower < b.point && b.point < b.upper);
    }

    #[test]
    fn mtbf_bounds_bracket_point() {
        let data = exact(&[5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0], 100.0);
        let m = crow_amsaa(&data, &AnalysisConfig::default()).unwrap();
        let law = PowerLaw::from_model(&m).unwrap();
        // Cumulative MTBF at the end of test is T/N.
        assert!((law.mtbf(MtbfKind::Cumulative, 100.0) - 12.5).abs() < 1e-9);
        assert!(
            (law.mtbf(MtbfKind::Instantaneous, 100.0) - 12.5 / law.beta).abs() < 1e-9
        );
        for kind in [MtbfKind::Cumulative, MtbfKind::Instantaneous] {
            let e = mtbf_bounds(&m, kind, 100.0, 0.9, IntervalType::TwoSided).unwrap();
            assert!(e.lower < e.point && e.point < e.upper, "{kind:?}: {e:?}");
        }
        let g = growth_rate(&m).unwrap();
        assert!(g.is_ordered());
        assert!((g.point - law.growth_rate()).abs() < 1e-12);
    }

    #[test]
    fn covariance_is_symmetric_positive() {
        let v = variance_covariance(8.0, 100.0, 0.1, 0.7).unwrap();
        assert!(v[0][0] > 0.0 && v[1][1] > 0.0);
        assert_eq!(v[0][1], v[1][0]);
    }

    #[test]
    fn rejects_bad_growth_data() {
        assert!(GrowthData::new(vec![], vec![], None, false).is_err());
        assert!(GrowthData::new(vec![1.0, 2.0], vec![1], None, false).is_err());
        assert!(GrowthData::new(vec![2.0, 1.0], vec![1, 1], None, false).is_err());
        assert!(GrowthData::new(vec![1.0, 2.0], vec![1, 1], Some(1.5), false).is_err());
        let zero = GrowthData::new(vec![1.0], vec![0], None, false).unwrap();
        assert!(crow_amsaa(&zero, &AnalysisConfig::default()).is_err());
    }
}

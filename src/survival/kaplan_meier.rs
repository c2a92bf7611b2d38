//! Kaplan-Meier product-limit estimator.
//!
//! # Algorithm
//!
//! At every distinct time `tⱼ` with `nⱼ` units at risk and `dⱼ` failures,
//!
//! ```text
//! S(tⱼ) = S(tⱼ₋₁)·(1 − dⱼ/nⱼ)
//! ```
//!
//! Failures sort before censorings at tied times, so a unit censored at
//! `tⱼ` is still at risk there. Bounds use Greenwood's variance on the
//! log-log scale, which keeps them inside [0, 1]:
//!
//! ```text
//! se = √(Σ d/(n·(n − d))) / |ln S|,   S^exp(±z·se)
//! ```
//!
//! The cumulative hazard `H = −ln S`, the hazard rate `H/t` and `ln H` take
//! their bounds from the survival bounds, which map monotonically.
//!
//! The mean is the area under the step function up to the last time, with
//! the Lee & Wang variance `Σ Aⱼ²·dⱼ/(nⱼ·(nⱼ − dⱼ))`, where `Aⱼ` is the area
//! beyond `tⱼ`.
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::dataset::Dataset;
//! use u_reliability::survival::kaplan_meier;
//!
//! let data = Dataset::from_failures(&[2.0, 4.0, 6.0, 8.0]).unwrap();
//! let km = kaplan_meier(&data, &AnalysisConfig::default()).unwrap();
//! assert_eq!(km.steps.len(), 4);
//! assert!((km.steps[1].survival.point - 0.5).abs() < 1e-12);
//! assert!((km.mean.point - 5.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Kaplan, E.L. & Meier, P. (1958). "Nonparametric estimation from
//!   incomplete observations". *JASA* 53(282), 457-481.
//! - Lee, E.T. & Wang, J.W. (2003). *Statistical Methods for Survival Data
//!   Analysis*, 3rd ed., Wiley, §4.1.

use tracing::debug;

use crate::bounds::{fisher_bounds_linear, pin};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::Estimate;
use crate::quantile::z_value;

/// One step of the survivor function.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KaplanMeierStep {
    /// Distinct observation time.
    pub time: f64,
    /// Units at risk just before `time`.
    pub at_risk: f64,
    /// Failures at `time`.
    pub failures: f64,
    /// Censorings at `time`.
    pub censored: f64,
    /// `S(time)` with log-log Greenwood bounds.
    pub survival: Estimate,
    /// `H = −ln S` with bounds; `None` once `S` reaches zero.
    pub cumulative_hazard: Option<Estimate>,
    /// `H / time` with bounds; `None` once `S` reaches zero or at time zero.
    pub hazard_rate: Option<Estimate>,
    /// `ln H` with bounds; `None` while `H` is zero or once `S` reaches zero.
    pub log_cumulative_hazard: Option<Estimate>,
}

/// Kaplan-Meier estimate with the restricted mean.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KaplanMeier {
    /// One step per distinct time, ascending.
    pub steps: Vec<KaplanMeierStep>,
    /// Mean time to failure (area under `S`) with normal bounds.
    pub mean: Estimate,
    /// Lee & Wang variance of the mean.
    pub mean_variance: f64,
}

impl KaplanMeier {
    /// `S(t)`: the last step at or before `t`, or 1 before the first.
    pub fn survival_at(&self, t: f64) -> f64 {
        self.steps
            .iter()
            .take_while(|s| s.time <= t)
            .last()
            .map_or(1.0, |s| s.survival.point)
    }
}

/// Fits the product-limit estimator to `data`.
///
/// Left- and interval-censored failures are placed at their midpoints.
///
/// # Errors
/// [`ReliabilityError::InsufficientData`] for an empty dataset, plus
/// configuration errors.
pub fn kaplan_meier(data: &Dataset, config: &AnalysisConfig) -> Result<KaplanMeier> {
    let config = config.clone().validate()?;
    if data.is_empty() {
        return Err(ReliabilityError::insufficient(1, 0));
    }

    // (time, is_failure, weight), failures first on ties.
    let mut rows: Vec<(f64, bool, f64)> = data
        .observations()
        .iter()
        .map(|o| (o.time(), o.status.is_failure(), o.weight()))
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));

    let z = z_value(config.confidence, config.interval);
    let mut at_risk: f64 = rows.iter().map(|r| r.2).sum();
    let mut survival = 1.0_f64;
    let mut greenwood = 0.0_f64;
    let mut steps: Vec<KaplanMeierStep> = Vec::new();

    let mut i = 0;
    while i < rows.len() {
        let time = rows[i].0;
        let (mut failures, mut censored) = (0.0, 0.0);
        while i < rows.len() && rows[i].0 == time {
            if rows[i].1 {
                failures += rows[i].2;
            } else {
                censored += rows[i].2;
            }
            i += 1;
        }

        if failures > 0.0 {
            survival *= 1.0 - failures / at_risk;
            if at_risk > failures {
                greenwood += failures / (at_risk * (at_risk - failures));
            }
        }
        let survival_est = log_log_bounds(survival, greenwood, z, &config);
        let cumulative_hazard = cumulative_hazard(&survival_est);

        steps.push(KaplanMeierStep {
            time,
            at_risk,
            failures,
            censored,
            survival: survival_est,
            cumulative_hazard,
            hazard_rate: cumulative_hazard.filter(|_| time > 0.0).map(|h| {
                Estimate::new(h.lower / time, h.point / time, h.upper / time)
            }),
            log_cumulative_hazard: cumulative_hazard
                .filter(|h| h.lower > 0.0)
                .map(|h| Estimate::new(h.lower.ln(), h.point.ln(), h.upper.ln())),
        });
        at_risk -= failures + censored;
    }

    let (mean, mean_variance) = lee_wang_mean(&steps);
    let mean_est = fisher_bounds_linear(mean, mean_variance, config.confidence, config.interval)?;
    debug!(steps = steps.len(), mean, "fitted Kaplan-Meier");

    Ok(KaplanMeier {
        steps,
        mean: mean_est,
        mean_variance,
    })
}

fn log_log_bounds(s: f64, greenwood: f64, z: f64, config: &AnalysisConfig) -> Estimate {
    if s <= 0.0 || s >= 1.0 {
        return Estimate::point(s.clamp(0.0, 1.0));
    }
    let se = greenwood.sqrt() / s.ln().abs();
    pin(
        s.powf((z * se).exp()),
        s,
        s.powf((-z * se).exp()),
        config.interval,
    )
}

/// `−ln S`; the upper survival bound gives the lower hazard bound.
fn cumulative_hazard(s: &Estimate) -> Option<Estimate> {
    (s.point > 0.0).then(|| Estimate::new(-s.upper.ln(), -s.point.ln(), -s.lower.ln()))
}

/// Area under the step function and its Lee & Wang variance.
fn lee_wang_mean(steps: &[KaplanMeierStep]) -> (f64, f64) {
    // Area of each step interval [t_{j−1}, t_j) at height S(t_{j−1}).
    let mut areas = Vec::with_capacity(steps.len());
    let (mut prev_t, mut prev_s) = (0.0, 1.0);
    for s in steps {
        areas.push(prev_s * (s.time - prev_t));
        prev_t = s.time;
        prev_s = s.survival.point;
    }
    let total: f64 = areas.iter().sum();

    let mut variance = 0.0;
    let mut before = 0.0;
    for (s, area) in steps.iter().zip(&areas) {
        before += area;
        let beyond = total - before;
        if s.failures > 0.0 && s.at_risk > s.failures {
            variance += beyond * beyond * s.failures / (s.at_risk * (s.at_risk - s.failures));
        }
    }
    (total, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntervalType;
    use crate::dataset::{format_dataset, RawRecord};

    fn remission() -> Dataset {
        let rows = [
            (3.0, "event"),
            (4.0, "right censored"),
            (5.7, "right censored"),
            (6.5, "event"),
            (6.5, "event"),
            (8.4, "right censored"),
            (10.0, "event"),
            (10.0, "right censored"),
            (12.0, "event"),
            (15.0, "event"),
        ];
        let records: Vec<RawRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, (t, s))| RawRecord::new(i.to_string(), 0.0, *t, *s, 1))
            .collect();
        format_dataset(&records, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn remission_reference_values() {
        let km = kaplan_meier(&remission(), &AnalysisConfig::default()).unwrap();
        let expected = [
            (3.0, 0.9, 0.71673988, 0.96721776),
            (6.5, 0.64285714, 0.41799026, 0.79947861),
            (10.0, 0.48214286, 0.25977887, 0.67379915),
            (12.0, 0.24107143, 0.06505397, 0.47678419),
        ];
        for (t, s, lo, hi) in expected {
            let step = km.steps.iter().find(|st| st.time == t).unwrap();
            let e = step.survival;
            assert!((e.point - s).abs() < 1e-7, "S({t}) = {}", e.point);
            assert!((e.lower - lo).abs() < 1e-6, "lower({t}) = {}", e.lower);
            assert!((e.upper - hi).abs() < 1e-6, "upper({t}) = {}", e.upper);
        }
        let last = km.steps.last().unwrap();
        assert_eq!(last.survival, Estimate::point(0.0));
        assert_eq!(last.cumulative_hazard, None);

        assert!((km.mean.point - 10.0875).abs() < 1e-10);
        assert!((km.mean_variance - 1.942_902_264_030_622_8).abs() < 1e-9);
    }

    #[test]
    fn ties_count_censored_units_at_risk() {
        let km = kaplan_meier(&remission(), &AnalysisConfig::default()).unwrap();
        let step = km.steps.iter().find(|s| s.time == 10.0).unwrap();
        assert_eq!(step.at_risk, 4.0);
        assert_eq!((step.failures, step.censored), (1.0, 1.0));
        assert_eq!(km.survival_at(9.0), km.survival_at(8.4));
        assert_eq!(km.survival_at(1.0), 1.0);
    }

    #[test]
    fn hazard_follows_survival() {
        let km = kaplan_meier(&remission(), &AnalysisConfig::default()).unwrap();
        let first = &km.steps[0];
        let h = first.cumulative_hazard.unwrap();
        assert!((h.point + 0.9_f64.ln()).abs() < 1e-12);
        assert!((h.lower - 0.033_331_617_5).abs() < 1e-6, "{h:?}");
        assert!((h.upper - 0.333_042_291_2).abs() < 1e-6, "{h:?}");

        let rate = first.hazard_rate.unwrap();
        assert!((rate.point - h.point / 3.0).abs() < 1e-12);
        assert!((rate.lower - h.lower / 3.0).abs() < 1e-12);
        assert!((rate.upper - h.upper / 3.0).abs() < 1e-12);

        let log_h = first.log_cumulative_hazard.unwrap();
        assert!((log_h.point - h.point.ln()).abs() < 1e-12);
        assert!(log_h.is_ordered());

        let at_12 = km.steps.iter().find(|s| s.time == 12.0).unwrap();
        let h = at_12.cumulative_hazard.unwrap();
        assert!((h.point - 1.422_662_005_3).abs() < 1e-8);
        assert!((h.lower - 0.740_691_315_7).abs() < 1e-6);
        assert!((h.upper - 2.732_538_020_3).abs() < 1e-5);
    }

    #[test]
    fn hazard_is_undefined_after_survival_reaches_zero() {
        let km = kaplan_meier(&remission(), &AnalysisConfig::default()).unwrap();
        let last = km.steps.last().unwrap();
        assert_eq!(last.hazard_rate, None);
        assert_eq!(last.log_cumulative_hazard, None);
        for s in km.steps.iter().filter(|s| s.survival.point > 0.0) {
            let h = s.cumulative_hazard.unwrap();
            assert!(h.is_ordered(), "{h:?}");
        }
    }

    #[test]
    fn one_sided_bounds_pin_open_side() {
        let config = AnalysisConfig {
            interval: IntervalType::LowerOneSided,
            ..AnalysisConfig::default()
        };
        let km = kaplan_meier(&remission(), &config).unwrap();
        for s in &km.steps {
            assert_eq!(s.survival.upper, s.survival.point);
            assert!(s.survival.lower <= s.survival.point);
        }
    }

    #[test]
    fn grouped_quantities_weight_the_risk_set() {
        let records = vec![
            RawRecord::new("a", 0.0, 10.0, "event", 3),
            RawRecord::new("b", 0.0, 20.0, "suspension", 2),
            RawRecord::new("c", 0.0, 30.0, "event", 5),
        ];
        let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
        let km = kaplan_meier(&data, &AnalysisConfig::default()).unwrap();
        assert_eq!(km.steps[0].at_risk, 10.0);
        assert!((km.steps[0].survival.point - 0.7).abs() < 1e-12);
        assert_eq!(km.steps[2].at_risk, 5.0);
        assert_eq!(km.steps[2].survival.point, 0.0);
    }
}

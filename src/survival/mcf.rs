//! Mean cumulative function for repairable-system populations.
//!
//! Each unit is observed from time zero to its last recorded time and may
//! fail repeatedly. At every distinct failure time `tⱼ` the increment is the
//! number of failures divided by the number of units still under
//! observation; the MCF is the running sum of increments.
//!
//! The variance is the cumulative estimator of Meeker & Escobar (§16.5):
//!
//! ```text
//! Var[MCF(tⱼ)] = Σᵤ ( Σ_{k≤j} δᵤₖ/nₖ · (dᵤₖ − d̄ₖ) )²
//! ```
//!
//! with `δᵤₖ` the at-risk indicator, `dᵤₖ` unit `u`'s failures at `tₖ` and
//! `d̄ₖ = dₖ/nₖ`. Bounds are `MCF·exp(∓z·√Var/MCF)`.
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::dataset::{format_dataset, RawRecord};
//! use u_reliability::survival::mean_cumulative_function;
//!
//! let records = vec![
//!     RawRecord::new("a", 0.0, 5.0, "event", 1),
//!     RawRecord::new("a", 5.0, 10.0, "suspension", 1),
//!     RawRecord::new("b", 0.0, 10.0, "suspension", 1),
//! ];
//! let config = AnalysisConfig::default();
//! let data = format_dataset(&records, &config).unwrap();
//! let mcf = mean_cumulative_function(&data, &config).unwrap();
//! assert!((mcf.points[0].mcf.point - 0.5).abs() < 1e-12);
//! ```
//!
//! # Reference
//! Meeker, W.Q. & Escobar, L.A. (1998). *Statistical Methods for
//! Reliability Data*, Wiley, Ch. 16.

use tracing::debug;

use crate::bounds::fisher_bounds;
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::Estimate;

/// MCF at one distinct failure time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct McfPoint {
    /// Failure time.
    pub time: f64,
    /// Failures at `time` across all units.
    pub failures: f64,
    /// Units under observation at `time`.
    pub at_risk: f64,
    /// Mean cumulative failures per unit with bounds.
    pub mcf: Estimate,
    /// Variance of the MCF.
    pub variance: f64,
    /// `time / MCF`.
    pub cumulative_mtbf: f64,
    /// Time since the previous point divided by the MCF increment.
    pub instantaneous_mtbf: f64,
}

/// MCF together with the matrices it was built from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mcf {
    /// Unit identifiers (rows of the matrices).
    pub units: Vec<String>,
    /// Distinct failure times (columns of the matrices).
    pub times: Vec<f64>,
    /// `recurrences[u][j]`: failures of unit `u` at `times[j]`.
    pub recurrences: Vec<Vec<f64>>,
    /// `at_risk[u][j]`: whether unit `u` is observed at `times[j]`.
    pub at_risk: Vec<Vec<bool>>,
    /// One point per distinct failure time.
    pub points: Vec<McfPoint>,
}

/// Estimates the MCF of the units in `data`.
///
/// A unit is at risk at `t` when its last recorded time is at least `t`.
///
/// # Errors
/// [`ReliabilityError::DegenerateParameter`] when there are no failures.
pub fn mean_cumulative_function(data: &Dataset, config: &AnalysisConfig) -> Result<Mcf> {
    let config = config.clone().validate()?;
    let units: Vec<String> = data.units().into_iter().map(str::to_owned).collect();
    let mut times = data.failure_times();
    times.dedup();
    if times.is_empty() {
        return Err(ReliabilityError::degenerate(
            "MCF needs at least one recurrence",
        ));
    }

    let mut recurrences = vec![vec![0.0; times.len()]; units.len()];
    let mut last_seen = vec![f64::NEG_INFINITY; units.len()];
    for o in data.observations() {
        let Some(u) = units.iter().position(|name| *name == o.unit) else {
            continue;
        };
        last_seen[u] = last_seen[u].max(o.right);
        if o.status.is_failure() {
            let t = o.time();
            if let Some(j) = times.iter().position(|&x| x == t) {
                recurrences[u][j] += o.weight();
            }
        }
    }
    let at_risk: Vec<Vec<bool>> = last_seen
        .iter()
        .map(|&end| times.iter().map(|&t| end >= t).collect())
        .collect();

    let mut points = Vec::with_capacity(times.len());
    let mut mcf = 0.0;
    let mut per_unit = vec![0.0; units.len()];
    let (mut prev_t, mut prev_mcf) = (0.0, 0.0);

    for (j, &t) in times.iter().enumerate() {
        let n: f64 = at_risk.iter().filter(|row| row[j]).count() as f64;
        let d: f64 = recurrences.iter().map(|row| row[j]).sum();
        if n == 0.0 {
            continue;
        }
        let d_bar = d / n;
        mcf += d_bar;
        for u in 0..units.len() {
            if at_risk[u][j] {
                per_unit[u] += (recurrences[u][j] - d_bar) / n;
            }
        }
        let variance: f64 = per_unit.iter().map(|v| v * v).sum();

        points.push(McfPoint {
            time: t,
            failures: d,
            at_risk: n,
            mcf: fisher_bounds(mcf, variance, config.confidence, config.interval)?,
            variance,
            cumulative_mtbf: t / mcf,
            instantaneous_mtbf: (t - prev_t) / (mcf - prev_mcf),
        });
        prev_t = t;
        prev_mcf = mcf;
    }
    debug!(units = units.len(), points = points.len(), "estimated MCF");

    Ok(Mcf {
        units,
        times,
        recurrences,
        at_risk,
        points,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::dataset::{format_dataset, RawRecord};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mcf_is_non_decreasing(
            units in proptest::collection::vec(
                (proptest::collection::vec(0.5f64..10.0, 0..5), 0.5f64..20.0),
                1..8,
            ),
        ) {
            let mut records = Vec::new();
            for (u, (gaps, tail)) in units.iter().enumerate() {
                let mut t = 0.0;
                for gap in gaps {
                    records.push(RawRecord::new(u.to_string(), t, t + gap, "event", 1));
                    t += gap;
                }
                records.push(RawRecord::new(u.to_string(), t, t + tail, "suspension", 1));
            }
            prop_assume!(units.iter().any(|(gaps, _)| !gaps.is_empty()));
            let config = AnalysisConfig::default();
            let data = format_dataset(&records, &config).unwrap();
            let mcf = mean_cumulative_function(&data, &config).unwrap();
            let mut prev = 0.0;
            for p in &mcf.points {
                prop_assert!(p.mcf.point >= prev);
                prop_assert!(p.mcf.is_ordered());
                prev = p.mcf.point;
            }
        }
    }
}

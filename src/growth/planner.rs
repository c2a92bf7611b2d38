//! Reliability growth test planning (MIL-HDBK-189C idealized curve).
//!
//! The idealized growth curve is flat at the initial MTBF `Mi` through the
//! first phase `t1` and then follows
//!
//! ```text
//! M(t) = Mi·(t/t1)^α / (1 − α),    t > t1
//! ```
//!
//! where `α` is the growth rate. Reaching the final MTBF `Mf` at the total
//! test time `T` ties the five planning quantities together:
//!
//! ```text
//! (T/t1)^α + (Mf/Mi)·(α − 1) = 0
//! ```
//!
//! Given any four of {Mi, Mf, T, α, t1}, [`GrowthPlan::solve`] finds the
//! fifth (closed form for all but `α`, which is root-found on (0, 1)).
//!
//! # Examples
//!
//! ```
//! use u_reliability::growth::GrowthPlan;
//!
//! let plan = GrowthPlan {
//!     initial_mtbf: Some(50.0),
//!     final_mtbf: Some(200.0),
//!     total_time: Some(10_000.0),
//!     growth_rate: None,
//!     first_phase_time: Some(500.0),
//!     ..GrowthPlan::default()
//! };
//! let curve = plan.solve().unwrap();
//! assert!(curve.growth_rate > 0.0 && curve.growth_rate < 1.0);
//! assert!((curve.mtbf(10_000.0) - 200.0).abs() < 1e-6);
//! ```
//!
//! # Reference
//! MIL-HDBK-189C (2011). *Reliability Growth Management*, §5.2.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{ReliabilityError, Result};
use crate::solver::{Bisection, Solver};

// ---------------------------------------------------------------------------
// Plan inputs and the idealized curve
// ---------------------------------------------------------------------------

/// Planning inputs; exactly one of the five curve quantities may be `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrowthPlan {
    /// Average MTBF over the first phase, `Mi`.
    pub initial_mtbf: Option<f64>,
    /// Goal MTBF at the end of testing, `Mf`.
    pub final_mtbf: Option<f64>,
    /// Total test time `T`.
    pub total_time: Option<f64>,
    /// Growth rate `α` in (0, 1).
    pub growth_rate: Option<f64>,
    /// Length of the first phase, `t1`.
    pub first_phase_time: Option<f64>,
    /// Management strategy: fraction of the initial failure intensity
    /// addressed by corrective action.
    pub management_strategy: f64,
    /// Average fix effectiveness factor.
    pub fef: f64,
}

impl Default for GrowthPlan {
    fn default() -> Self {
        Self {
            initial_mtbf: None,
            final_mtbf: None,
            total_time: None,
            growth_rate: None,
            first_phase_time: None,
            management_strategy: 0.95,
            fef: 0.70,
        }
    }
}

/// A fully determined idealized growth curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdealizedCurve {
    /// `Mi`.
    pub initial_mtbf: f64,
    /// `Mf`.
    pub final_mtbf: f64,
    /// `T`.
    pub total_time: f64,
    /// `α`.
    pub growth_rate: f64,
    /// `t1`.
    pub first_phase_time: f64,
}

impl GrowthPlan {
    /// Solves the missing quantity with the default bisection solver.
    ///
    /// # Errors
    /// See [`GrowthPlan::solve_with`].
    pub fn solve(&self) -> Result<IdealizedCurve> {
        self.solve_with(&Bisection::default())
    }

    /// Solves the missing quantity, using `solver` for the growth rate.
    ///
    /// # Errors
    /// - [`ReliabilityError::InsufficientData`] when more than one of the
    ///   five quantities is missing.
    /// - [`ReliabilityError::InvalidInput`] for non-positive inputs, a
    ///   growth rate outside (0, 1), or `Mf ≤ Mi` when solving for `α`.
    /// - Solver errors.
    pub fn solve_with(&self, solver: &dyn Solver) -> Result<IdealizedCurve> {
        let known = [
            self.initial_mtbf,
            self.final_mtbf,
            self.total_time,
            self.growth_rate,
            self.first_phase_time,
        ];
        let present = known.iter().filter(|v| v.is_some()).count();
        if present < 4 {
            return Err(ReliabilityError::insufficient(4, present));
        }
        for v in known.iter().flatten() {
            if !(*v > 0.0) || !v.is_finite() {
                return Err(ReliabilityError::invalid(format!(
                    "planning quantities must be positive and finite, got {v}"
                )));
            }
        }
        if let Some(a) = self.growth_rate {
            if a >= 1.0 {
                return Err(ReliabilityError::invalid(format!(
                    "growth rate {a} must be below 1"
                )));
            }
        }

        let curve = match (
            self.initial_mtbf,
            self.final_mtbf,
            self.total_time,
            self.growth_rate,
            self.first_phase_time,
        ) {
            (None, Some(mf), Some(tt), Some(a), Some(t1)) => IdealizedCurve {
                initial_mtbf: mf * (1.0 - a) / (tt / t1).powf(a),
                final_mtbf: mf,
                total_time: tt,
                growth_rate: a,
                first_phase_time: t1,
            },
            (Some(mi), None, Some(tt), Some(a), Some(t1)) => IdealizedCurve {
                initial_mtbf: mi,
                final_mtbf: mi * (tt / t1).powf(a) / (1.0 - a),
                total_time: tt,
                growth_rate: a,
                first_phase_time: t1,
            },
            (Some(mi), Some(mf), None, Some(a), Some(t1)) => IdealizedCurve {
                initial_mtbf: mi,
                final_mtbf: mf,
                total_time: t1 * (mf * (1.0 - a) / mi).powf(1.0 / a),
                growth_rate: a,
                first_phase_time: t1,
            },
            (Some(mi), Some(mf), Some(tt), Some(a), None) => IdealizedCurve {
                initial_mtbf: mi,
                final_mtbf: mf,
                total_time: tt,
                growth_rate: a,
                first_phase_time: tt / (mf * (1.0 - a) / mi).powf(1.0 / a),
            },
            (Some(mi), Some(mf), Some(tt), None, Some(t1)) => IdealizedCurve {
                initial_mtbf: mi,
                final_mtbf: mf,
                total_time: tt,
                growth_rate: solve_growth_rate(mi, mf, tt, t1, solver)?,
                first_phase_time: t1,
            },
            (Some(mi), Some(mf), Some(tt), Some(a), Some(t1)) => IdealizedCurve {
                initial_mtbf: mi,
                final_mtbf: mf,
                total_time: tt,
                growth_rate: a,
                first_phase_time: t1,
            },
            _ => return Err(ReliabilityError::insufficient(4, present)),
        };
        debug!(?curve, "solved growth plan");
        Ok(curve)
    }

    /// Growth potential `Mgp = Mi / (1 − MS·FEF)` for the solved curve.
    ///
    /// # Errors
    /// [`ReliabilityError::DegenerateParameter`] when `MS·FEF ≥ 1`.
    pub fn growth_potential(&self, curve: &IdealizedCurve) -> Result<f64> {
        let addressed = self.management_strategy * self.fef;
        if addressed >= 1.0 {
            return Err(ReliabilityError::degenerate(format!(
                "MS·FEF = {addressed} leaves no residual failure intensity"
            )));
        }
        Ok(curve.initial_mtbf / (1.0 - addressed))
    }
}

/// Root of `(T/t1)^α + (Mf/Mi)·(α − 1)` on (0, 1).
fn solve_growth_rate(mi: f64, mf: f64, tt: f64, t1: f64, solver: &dyn Solver) -> Result<f64> {
    if !(mf > mi) || !(tt > t1) {
        return Err(ReliabilityError::invalid(format!(
            "growth needs Mf > Mi and T > t1 (Mi = {mi}, Mf = {mf}, T = {tt}, t1 = {t1})"
        )));
    }
    let ratio = tt / t1;
    let f = |a: f64| ratio.powf(a) + (mf / mi) * (a - 1.0);
    solver.find_root(&f, 0.5, Some((1e-12, 1.0 - 1e-12)))
}

impl IdealizedCurve {
    /// Idealized MTBF at cumulative time `t`.
    pub fn mtbf(&self, t: f64) -> f64 {
        if t <= self.first_phase_time {
            self.initial_mtbf
        } else {
            self.initial_mtbf * (t / self.first_phase_time).powf(self.growth_rate)
                / (1.0 - self.growth_rate)
        }
    }

    /// Expected cumulative failures by `t`: `t/Mi` through the first phase,
    /// `(t1/Mi)·(t/t1)^(1−α)` after.
    pub fn expected_failures(&self, t: f64) -> f64 {
        let t1 = self.first_phase_time;
        if t <= t1 {
            t.max(0.0) / self.initial_mtbf
        } else {
            t1 / self.initial_mtbf * (t / t1).powf(1.0 - self.growth_rate)
        }
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// One test phase as supplied by the planner's caller.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseInput {
    /// Test time accumulated in this phase.
    pub test_time: f64,
    /// Overrides the initial MTBF (otherwise the previous phase's final).
    pub initial_mtbf: Option<f64>,
    /// Failures actually observed, if the phase has run.
    pub observed_failures: Option<u32>,
    /// Calendar start.
    pub start_date: Option<NaiveDate>,
    /// Calendar end.
    pub end_date: Option<NaiveDate>,
}

/// Planned figures for one test phase.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrowthPhase {
    /// Zero-based phase index.
    pub index: usize,
    /// Cumulative test time at the start of the phase.
    pub start_time: f64,
    /// Cumulative test time at the end of the phase.
    pub end_time: f64,
    /// MTBF entering the phase.
    pub initial_mtbf: f64,
    /// Idealized MTBF at the end of the phase.
    pub final_mtbf: f64,
    /// Test time divided by expected failures.
    pub average_mtbf: f64,
    /// Expected failures during the phase.
    pub expected_failures: f64,
    /// Required management strategy `(1 − Ma/Mgp)/FEF` from the average
    /// MTBF `Ma`, clamped to `[0, 1]`.
    pub management_strategy: f64,
    /// Whether the average MTBF reaches the growth potential, leaving no
    /// failure modes for management to address.
    pub above_potential: bool,
    /// Probability of at least one failure, `1 − exp(−t·MS/Mi)`.
    pub probability_of_failure: f64,
    /// Failures actually observed.
    pub observed_failures: Option<u32>,
    /// Calendar start.
    pub start_date: Option<NaiveDate>,
    /// Calendar end.
    pub end_date: Option<NaiveDate>,
}

/// Lays out the phases of a solved plan.
///
/// # Errors
/// - [`ReliabilityError::InvalidInput`] for a non-positive phase length or
///   an end date before its start date.
/// - Errors of [`GrowthPlan::growth_potential`].
pub fn plan_phases(
    plan: &GrowthPlan,
    curve: &IdealizedCurve,
    phases: &[PhaseInput],
) -> Result<Vec<GrowthPhase>> {
    let potential = plan.growth_potential(curve)?;
    let mut out = Vec::with_capacity(phases.len());
    let mut cumulative = 0.0;
    let mut previous_final = curve.initial_mtbf;

    for (index, phase) in phases.iter().enumerate() {
        if !(phase.test_time > 0.0) {
            return Err(ReliabilityError::invalid(format!(
                "phase {index} has non-positive test time {}",
                phase.test_time
            )));
        }
        if let (Some(s), Some(e)) = (phase.start_date, phase.end_date) {
            if e < s {
                return Err(ReliabilityError::invalid(format!(
                    "phase {index} ends ({e}) before it starts ({s})"
                )));
            }
        }

        let start_time = cumulative;
        cumulative += phase.test_time;
        let initial_mtbf = phase.initial_mtbf.unwrap_or(previous_final);
        let final_mtbf = curve.mtbf(cumulative);
        let expected_failures =
            curve.expected_failures(cumulative) - curve.expected_failures(start_time);
        let average_mtbf = if expected_failures > 0.0 {
            phase.test_time / expected_failures
        } else {
            0.5 * (initial_mtbf + final_mtbf)
        };
        let above_potential = average_mtbf >= potential;
        if above_potential {
            warn!(
                phase = index,
                average_mtbf,
                potential,
                "phase average MTBF at or above growth potential"
            );
        }
        let management_strategy =
            ((1.0 - average_mtbf / potential) / plan.fef).clamp(0.0, 1.0);
        let probability_of_failure =
            1.0 - (-phase.test_time * management_strategy / initial_mtbf).exp();

        out.push(GrowthPhase {
            index,
            start_time,
            end_time: cumulative,
            initial_mtbf,
            final_mtbf,
            average_mtbf,
            expected_failures,
            management_strategy,
            above_potential,
            probability_of_failure,
            observed_failures: phase.observed_failures,
            start_date: phase.start_date,
            end_date: phase.end_date,
        });
        previous_final = final_mtbf;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Feasibility
// ---------------------------------------------------------------------------

/// A planning ratio checked against its historical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    /// `Mi / Mf`.
    InitialToGoal,
    /// Fix effectiveness factor.
    FixEffectiveness,
    /// `Mf / Mgp`.
    GoalToPotential,
    /// Growth rate `α`.
    GrowthRate,
}

impl Criterion {
    /// Acceptable `[min, max]` range.
    pub fn range(self) -> (f64, f64) {
        match self {
            Criterion::InitialToGoal => (0.15, 0.47),
            Criterion::FixEffectiveness => (0.55, 0.85),
            Criterion::GoalToPotential => (0.60, 0.80),
            Criterion::GrowthRate => (0.23, 0.64),
        }
    }
}

/// One out-of-range planning ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    /// Which ratio.
    pub criterion: Criterion,
    /// Its value.
    pub value: f64,
    /// Lower acceptable value.
    pub min: f64,
    /// Upper acceptable value.
    pub max: f64,
}

/// Feasibility of a plan against MIL-HDBK-189C historical ranges.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeasibilityReport {
    /// Growth potential `Mgp`.
    pub growth_potential: f64,
    /// Every criterion outside its range.
    pub violations: Vec<Violation>,
}

impl FeasibilityReport {
    /// Whether every criterion is in range.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks the plan's ratios; violations are reported, never fatal.
///
/// # Errors
/// Errors of [`GrowthPlan::growth_potential`].
pub fn check_feasibility(plan: &GrowthPlan, curve: &IdealizedCurve) -> Result<FeasibilityReport> {
    let growth_potential = plan.growth_potential(curve)?;
    let checks = [
        (Criterion::InitialToGoal, curve.initial_mtbf / curve.final_mtbf),
        (Criterion::FixEffectiveness, plan.fef),
        (Criterion::GoalToPotential, curve.final_mtbf / growth_potential),
        (Criterion::GrowthRate, curve.growth_rate),
    ];
    let violations = checks
        .into_iter()
        .filter_map(|(criterion, value)| {
            let (min, max) = criterion.range();
            if value < min || value > max {
                warn!(
                    ?criterion,
                    value,
                    min,
                    max,
                    "growth plan outside historical range"
                );
                Some(Violation {
                    criterion,
                    value,
                    min,
                    max,
                })
            } else {
                None
            }
        })
        .collect();
    Ok(FeasibilityReport {
        growth_potential,
        violations,
    })
}

//! One-dimensional root finding behind an injectable [`Solver`] trait.
//!
//! Every nonlinear equation in the crate (profile likelihood scores, the
//! grouped Crow-AMSAA shape equation, the growth-rate planning constraint,
//! likelihood-ratio bound crossings, distribution quantiles) is solved
//! through this trait, so estimators can be driven by a mock solver in
//! tests. Both implementations carry a fixed iteration budget and return
//! [`ReliabilityError::NonConvergence`] when it is exhausted.
//!
//! # Examples
//!
//! ```
//! use u_reliability::solver::{Bisection, Newton, Solver};
//!
//! let f = |x: f64| x * x - 2.0;
//! let r = Newton::default().find_root(&f, 1.0, Some((0.0, 2.0))).unwrap();
//! assert!((r - 2.0_f64.sqrt()).abs() < 1e-9);
//!
//! let r = Bisection::default().find_root(&f, 1.0, Some((0.0, 2.0))).unwrap();
//! assert!((r - 2.0_f64.sqrt()).abs() < 1e-9);
//! ```

use tracing::debug;

use crate::error::{ReliabilityError, Result};

/// A scalar root-finder.
pub trait Solver {
    /// Finds `x` with `f(x) = 0`, starting from `guess`.
    ///
    /// When `bracket` is given and `f` changes sign across it, the root is
    /// kept inside the bracket.
    fn find_root(&self, f: &dyn Fn(f64) -> f64, guess: f64, bracket: Option<(f64, f64)>)
        -> Result<f64>;
}

/// Safeguarded Newton-Raphson with a forward-difference derivative.
///
/// Inside a sign-changing bracket, any step that leaves the bracket or
/// produces a non-finite value is replaced by a bisection step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Newton {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Relative step tolerance.
    pub tolerance: f64,
}

impl Default for Newton {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

/// Plain bisection. Requires a sign-changing bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Absolute bracket-width tolerance, scaled by `1 + |x|`.
    pub tolerance: f64,
}

impl Default for Bisection {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-12,
        }
    }
}

/// Sign-changing bracket `(lo, f(lo), hi, f(hi))`, if `bracket` is one.
fn signed_bracket(
    f: &dyn Fn(f64) -> f64,
    bracket: Option<(f64, f64)>,
) -> Option<(f64, f64, f64, f64)> {
    let (lo, hi) = bracket?;
    if !(lo < hi) {
        return None;
    }
    let (flo, fhi) = (f(lo), f(hi));
    if flo.is_finite() && fhi.is_finite() && flo * fhi <= 0.0 {
        Some((lo, flo, hi, fhi))
    } else {
        None
    }
}

impl Solver for Newton {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        guess: f64,
        bracket: Option<(f64, f64)>,
    ) -> Result<f64> {
        let mut br = signed_bracket(f, bracket);
        if let Some((lo, flo, hi, fhi)) = br {
            if flo == 0.0 {
                return Ok(lo);
            }
            if fhi == 0.0 {
                return Ok(hi);
            }
        }

        let mut x = match br {
            Some((lo, _, hi, _)) if !(guess > lo && guess < hi) => 0.5 * (lo + hi),
            _ => guess,
        };

        for iter in 0..self.max_iterations {
            let fx = f(x);
            if fx == 0.0 {
                return Ok(x);
            }

            if let Some((lo, flo, hi, fhi)) = br {
                if fx.is_finite() {
                    br = if flo * fx < 0.0 {
                        Some((lo, flo, x, fx))
                    } else {
                        Some((x, fx, hi, fhi))
                    };
                }
            } else if !fx.is_finite() {
                return Err(ReliabilityError::degenerate(format!(
                    "objective is not finite at x = {x}"
                )));
            }

            let h = 1e-7 * x.abs().max(1e-7);
            let slope = (f(x + h) - fx) / h;
            let mut next = x - fx / slope;

            match br {
                Some((lo, _, hi, _)) => {
                    if !fx.is_finite() || !next.is_finite() || next <= lo || next >= hi {
                        next = 0.5 * (lo + hi);
                    }
                    if hi - lo <= self.tolerance * (1.0 + x.abs()) {
                        debug!(iterations = iter + 1, root = next, "newton converged on bracket");
                        return Ok(next);
                    }
                }
                None => {
                    if !next.is_finite() {
                        return Err(ReliabilityError::degenerate(
                            "newton step produced a non-finite iterate",
                        ));
                    }
                }
            }

            if (next - x).abs() <= self.tolerance * (1.0 + x.abs()) {
                debug!(iterations = iter + 1, root = next, "newton converged");
                return Ok(next);
            }
            x = next;
        }

        Err(ReliabilityError::NonConvergence {
            method: "newton",
            iterations: self.max_iterations,
        })
    }
}

impl Solver for Bisection {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> f64,
        _guess: f64,
        bracket: Option<(f64, f64)>,
    ) -> Result<f64> {
        let Some((mut lo, mut flo, mut hi, fhi)) = signed_bracket(f, bracket) else {
            return Err(ReliabilityError::invalid(
                "bisection needs a bracket across which the function changes sign",
            ));
        };
        if flo == 0.0 {
            return Ok(lo);
        }
        if fhi == 0.0 {
            return Ok(hi);
        }

        for _ in 0..self.max_iterations {
            let mid = 0.5 * (lo + hi);
            if hi - lo <= self.tolerance * (1.0 + mid.abs()) {
                return Ok(mid);
            }
            let fm = f(mid);
            if fm == 0.0 {
                return Ok(mid);
            }
            if flo * fm < 0.0 {
                hi = mid;
            } else {
                lo = mid;
                flo = fm;
            }
        }

        Err(ReliabilityError::NonConvergence {
            method: "bisection",
            iterations: self.max_iterations,
        })
    }
}

/// Widens `(lo, hi)` geometrically away from `anchor` until `f` changes
/// sign, giving up after `max_expansions` doublings.
///
/// `lower_limit` keeps the expansion inside the domain of `f` (use
/// `f64::NEG_INFINITY` for unbounded parameters).
pub fn expand_bracket(
    f: &dyn Fn(f64) -> f64,
    anchor: f64,
    mut step: f64,
    upward: bool,
    lower_limit: f64,
    max_expansions: usize,
) -> Option<(f64, f64)> {
    let fa = f(anchor);
    if !fa.is_finite() {
        return None;
    }
    for _ in 0..max_expansions {
        let trial = if upward {
            anchor + step
        } else {
            let p = anchor - step;
            if p <= lower_limit {
                // Approach the limit geometrically instead of crossing it.
                lower_limit + (anchor - lower_limit) * 1e-6
            } else {
                p
            }
        };
        let fp = f(trial);
        if fp.is_finite() && fp * fa <= 0.0 {
            return Some(if upward { (anchor, trial) } else { (trial, anchor) });
        }
        if !upward && trial <= lower_limit + (anchor - lower_limit) * 1e-6 {
            return None;
        }
        step *= 2.0;
    }
    None
}

/// Maximizes a unimodal `f` on `[lo, hi]` by golden-section search.
pub fn maximize_golden(
    f: &dyn Fn(f64) -> f64,
    mut lo: f64,
    mut hi: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<f64> {
    const INV_PHI: f64 = 0.618_033_988_749_894_8;
    let mut c = hi - INV_PHI * (hi - lo);
    let mut d = lo + INV_PHI * (hi - lo);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..max_iterations {
        if (hi - lo).abs() <= tolerance * (1.0 + c.abs()) {
            return Ok(0.5 * (lo + hi));
        }
        if fc > fd || fd.is_nan() {
            hi = d;
            d = c;
            fd = fc;
            c = hi - INV_PHI * (hi - lo);
            fc = f(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + INV_PHI * (hi - lo);
            fd = f(d);
        }
    }

    Err(ReliabilityError::NonConvergence {
        method: "golden-section search",
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newton_without_bracket() {
        let f = |x: f64| x.exp() - 3.0;
        let r = Newton::default().find_root(&f, 0.0, None).unwrap();
        assert!((r - 3.0_f64.ln()).abs() < 1e-9, "root = {r}");
    }

    #[test]
    fn newton_stays_in_bracket() {
        // Starting far from the root with a flat region; bisection steps keep
        // the iterate inside (0.01, 10).
        let f = |x: f64| x.ln() - 1.0;
        let r = Newton::default().find_root(&f, 9.9, Some((0.01, 10.0))).unwrap();
        assert!((r - std::f64::consts::E).abs() < 1e-8, "root = {r}");
    }

    #[test]
    fn newton_budget_exhausted() {
        let solver = Newton {
            max_iterations: 2,
            tolerance: 1e-15,
        };
        let f = |x: f64| x.powi(3) - 1000.0;
        let err = solver.find_root(&f, 1.0, None).unwrap_err();
        assert!(matches!(err, ReliabilityError::NonConvergence { .. }));
    }

    #[test]
    fn bisection_requires_sign_change() {
        let f = |x: f64| x * x + 1.0;
        assert!(Bisection::default()
            .find_root(&f, 0.0, Some((-1.0, 1.0)))
            .is_err());
        assert!(Bisection::default().find_root(&f, 0.0, None).is_err());
    }

    #[test]
    fn bracket_expansion() {
        let f = |x: f64| x - 37.0;
        let (lo, hi) = expand_bracket(&f, 1.0, 1.0, true, 0.0, 20).unwrap();
        assert!(lo <= 37.0 && hi >= 37.0);

        let g = |x: f64| x - 0.001;
        let (lo, hi) = expand_bracket(&g, 1.0, 0.5, false, 0.0, 60).unwrap();
        assert!(lo <= 0.001 && hi >= 0.001 && lo > 0.0);
    }

    #[test]
    fn golden_section_max() {
        let f = |x: f64| -(x - 2.5).powi(2);
        let m = maximize_golden(&f, 0.0, 10.0, 200, 1e-10).unwrap();
        assert!((m - 2.5).abs() < 1e-6);
    }
}

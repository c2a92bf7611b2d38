//! Rank regression: median-rank linearization and least squares.
//!
//! Failures receive Johnson's adjusted ranks, which shift each rank to
//! account for suspensions ordered before it:
//!
//! ```text
//! increment = (N + 1 − previous rank) / (1 + units remaining)
//! ```
//!
//! Ranks are converted to plotting positions with Bernard's approximation
//! `F = (rank − 0.3)/(N + 0.4)`, linearized per distribution, and fitted with
//! ordinary least squares. Grouped data rank each group at its cumulative
//! failure count.
//!
//! | family | x | y | parameters |
//! |---|---|---|---|
//! | Exponential | t | −ln(1 − F) | λ = slope (line through the origin) |
//! | Weibull | ln t | ln(−ln(1 − F)) | β = b, η = exp(−a/b) |
//! | Lognormal | ln t | Φ⁻¹(F) | σ = 1/b, μ = −a/b |
//! | Gaussian | t | Φ⁻¹(F) | σ = 1/b, μ = −a/b |
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::dataset::Dataset;
//! use u_reliability::distributions::DistributionKind;
//! use u_reliability::regression::rank_regression;
//!
//! let data = Dataset::from_failures(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]).unwrap();
//! let model = rank_regression(&data, DistributionKind::Weibull, &AnalysisConfig::default()).unwrap();
//! assert!(model.point_estimates()[1] > 0.0);
//! assert!(model.correlation.unwrap() > 0.95);
//! ```
//!
//! # References
//!
//! - Johnson, L.G. (1964). *The Statistical Treatment of Fatigue
//!   Experiments*, Elsevier.
//! - Abernethy, R.B. (2006). *The New Weibull Handbook*, 5th ed.

use u_numflow::{special, stats};

use crate::config::{AnalysisConfig, FitMethod};
use crate::dataset::{Dataset, Observation};
use crate::distributions::DistributionKind;
use crate::error::{ReliabilityError, Result};
use crate::matrix::{invert, symmetrize, Matrix2};
use crate::model::{Estimate, FittedModel, ModelKind, Parameter};

/// One plotted failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedPoint {
    /// Failure time (midpoint for interval-censored rows).
    pub time: f64,
    /// Adjusted (or cumulative, for grouped data) rank.
    pub rank: f64,
    /// Bernard median rank.
    pub median_rank: f64,
}

/// Least-squares line `y = a + b·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Intercept `a` (zero for a line through the origin).
    pub intercept: f64,
    /// Slope `b`.
    pub slope: f64,
    /// Pearson correlation of `x` and `y`.
    pub correlation: f64,
    /// Residual mean square.
    pub mse: f64,
    /// `MSE·(XᵗX)⁻¹` for `(a, b)`; only `[1][1]` is used through the origin.
    pub covariance: Matrix2,
}

/// Bernard's median rank approximation.
///
/// ```
/// use u_reliability::regression::bernard;
/// assert!((bernard(1.0, 5.0) - 0.7 / 5.4).abs() < 1e-12);
/// ```
pub fn bernard(rank: f64, n: f64) -> f64 {
    (rank - 0.3) / (n + 0.4)
}

/// Plotting positions for the failures in `data`.
///
/// Exact data are expanded to unit rows, ordered by representative time
/// and ranked with Johnson's adjustment; grouped data rank each failure row at the running total of
/// failure quantities.
pub fn plotting_positions(data: &Dataset, grouped: bool) -> Vec<RankedPoint> {
    let mut points = Vec::new();
    if grouped {
        let n = data.total_quantity() as f64;
        let mut cumulative = 0.0;
        for o in data.observations().iter().filter(|o| o.status.is_failure()) {
            cumulative += o.weight();
            points.push(RankedPoint {
                time: o.time(),
                rank: cumulative,
                median_rank: bernard(cumulative, n),
            });
        }
        return points;
    }

    let expanded = data.expanded();
    let mut rows: Vec<&Observation> = expanded.observations().iter().collect();
    rows.sort_by(|a, b| a.time().total_cmp(&b.time()).then(a.status.cmp(&b.status)));
    let n = rows.len();
    let n_f = n as f64;
    let mut previous = 0.0;
    for (i, o) in rows.into_iter().enumerate() {
        if !o.status.is_failure() {
            continue;
        }
        let rank = previous + (n_f + 1.0 - previous) / (1.0 + (n - i) as f64);
        previous = rank;
        points.push(RankedPoint {
            time: o.time(),
            rank,
            median_rank: bernard(rank, n_f),
        });
    }
    points
}

/// Ordinary least squares, optionally through the origin.
///
/// # Errors
/// - [`ReliabilityError::InsufficientData`] with fewer than two points.
/// - [`ReliabilityError::DegenerateParameter`] when `x` has no spread.
pub fn ordinary_least_squares(x: &[f64], y: &[f64], through_origin: bool) -> Result<LinearFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return Err(ReliabilityError::insufficient(2, n.min(y.len())));
    }
    let n_f = n as f64;
    let x_mean = stats::mean(x).ok_or_else(|| ReliabilityError::insufficient(2, 0))?;
    let y_mean = stats::mean(y).ok_or_else(|| ReliabilityError::insufficient(2, 0))?;
    let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
    let syy: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - x_mean) * (b - y_mean))
        .sum();
    if sxx <= 1e-300 {
        return Err(ReliabilityError::degenerate(
            "regression abscissae are identical",
        ));
    }
    let correlation = if syy > 0.0 {
        sxy / (sxx * syy).sqrt()
    } else {
        0.0
    };

    if through_origin {
        let sum_x2: f64 = x.iter().map(|v| v * v).sum();
        let slope = x.iter().zip(y).map(|(a, b)| a * b).sum::<f64>() / sum_x2;
        let sse: f64 = x.iter().zip(y).map(|(a, b)| (b - slope * a).powi(2)).sum();
        let mse = sse / (n_f - 1.0);
        return Ok(LinearFit {
            intercept: 0.0,
            slope,
            correlation,
            mse,
            covariance: [[0.0, 0.0], [0.0, mse / sum_x2]],
        });
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (b - intercept - slope * a).powi(2))
        .sum();
    let mse = if n > 2 { sse / (n_f - 2.0) } else { 0.0 };

    let sum_x: f64 = x.iter().sum();
    let sum_x2: f64 = x.iter().map(|v| v * v).sum();
    let xtx_inv = invert(&[[n_f, sum_x], [sum_x, sum_x2]])?;
    let mut covariance = [[0.0; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            covariance[i][j] = mse * xtx_inv[i][j];
        }
    }

    Ok(LinearFit {
        intercept,
        slope,
        correlation,
        mse,
        covariance: symmetrize(&covariance),
    })
}

/// `J·Σ·Jᵀ` for a 2×2 Jacobian.
fn transform_covariance(j: &Matrix2, cov: &Matrix2) -> Matrix2 {
    let mut out = [[0.0; 2]; 2];
    for r in 0..2 {
        for c in 0..2 {
            let mut acc = 0.0;
            for a in 0..2 {
                for b in 0..2 {
                    acc += j[r][a] * cov[a][b] * j[c][b];
                }
            }
            out[r][c] = acc;
        }
    }
    symmetrize(&out)
}

/// Fits `kind` by median-rank regression.
///
/// The returned model carries point estimates only in its parameter
/// triples; [`fit_model`](crate::distributions::fit_model) attaches bounds.
///
/// # Errors
/// - [`ReliabilityError::DegenerateParameter`] with no failures or a
///   non-positive fitted slope.
/// - [`ReliabilityError::InsufficientData`] with a single failure.
pub fn rank_regression(
    data: &Dataset,
    kind: DistributionKind,
    config: &AnalysisConfig,
) -> Result<FittedModel> {
    let grouped = config.grouped || data.is_grouped();
    let points = plotting_positions(data, grouped);
    if points.is_empty() {
        return Err(ReliabilityError::degenerate(
            "rank regression needs at least one exact failure",
        ));
    }
    if points.len() < 2 {
        return Err(ReliabilityError::insufficient(2, points.len()));
    }

    let log_time = matches!(kind, DistributionKind::Weibull | DistributionKind::LogNormal);
    if log_time && points.iter().any(|p| !(p.time > 0.0)) {
        return Err(ReliabilityError::degenerate(format!(
            "{kind} regression needs positive failure times"
        )));
    }

    let x: Vec<f64> = points
        .iter()
        .map(|p| if log_time { p.time.ln() } else { p.time })
        .collect();
    let y: Vec<f64> = points
        .iter()
        .map(|p| {
            let f = p.median_rank;
            match kind {
                DistributionKind::Exponential => -(-f).ln_1p(),
                DistributionKind::Weibull => (-(-f).ln_1p()).ln(),
                DistributionKind::LogNormal | DistributionKind::Gaussian => {
                    special::inverse_normal_cdf(f)
                }
            }
        })
        .collect();

    let fit = ordinary_least_squares(&x, &y, kind == DistributionKind::Exponential)?;
    let (a, b) = (fit.intercept, fit.slope);
    if !(b > 0.0) || !b.is_finite() {
        return Err(ReliabilityError::degenerate(format!(
            "{kind} regression slope {b} is not positive"
        )));
    }

    let (params, covariance) = match kind {
        DistributionKind::Exponential => (vec![b], [[fit.covariance[1][1], 0.0], [0.0, 0.0]]),
        DistributionKind::Weibull => {
            let eta = (-a / b).exp();
            let j = [[-eta / b, eta * a / (b * b)], [0.0, 1.0]];
            (vec![eta, b], transform_covariance(&j, &fit.covariance))
        }
        DistributionKind::LogNormal | DistributionKind::Gaussian => {
            let j = [[-1.0 / b, a / (b * b)], [0.0, -1.0 / (b * b)]];
            (vec![-a / b, 1.0 / b], transform_covariance(&j, &fit.covariance))
        }
    };

    let names = kind.model().parameter_names();
    Ok(FittedModel {
        kind: ModelKind::Distribution(kind),
        method: FitMethod::RankRegression,
        parameters: names
            .iter()
            .zip(&params)
            .map(|(&name, &p)| Parameter {
                name,
                estimate: Estimate::point(p),
            })
            .collect(),
        covariance,
        log_likelihood: None,
        aic: None,
        bic: None,
        correlation: Some(fit.correlation),
        n_failures: data.n_failures(),
        n_suspensions: data.n_suspensions(),
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{format_dataset, RawRecord};

    fn ranks_of(data: &Dataset) -> Vec<f64> {
        plotting_positions(data, false).iter().map(|p| p.rank).collect()
    }

    #[test]
    fn johnson_adjusted_ranks_with_suspensions() {
        // Eight units, suspensions in positions 1, 3 and 8 (1-based).
        let status = [
            "suspension", "event", "suspension", "event", "event", "event", "event", "suspension",
        ];
        let records: Vec<RawRecord> = status
            .iter()
            .enumerate()
            .map(|(i, s)| RawRecord::new(i.to_string(), 0.0, 10.0 * (i + 1) as f64, *s, 1))
            .collect();
        let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
        let ranks = ranks_of(&data);
        let expected = [1.125, 2.4375, 3.75, 5.0625, 6.375];
        assert_eq!(ranks.len(), expected.len());
        for (r, e) in ranks.iter().zip(expected) {
            assert!((r - e).abs() < 1e-12, "{ranks:?}");
        }
        let mr: Vec<f64> = plotting_positions(&data, false)
            .iter()
            .map(|p| p.median_rank)
            .collect();
        let expected_mr = [0.0982143, 0.2544643, 0.4107143, 0.5669643, 0.7232143];
        for (m, e) in mr.iter().zip(expected_mr) {
            assert!((m - e).abs() < 1e-6, "{mr:?}");
        }
    }

    #[test]
    fn exact_data_ranks_are_ordinal() {
        let data = Dataset::from_failures(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(ranks_of(&data), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn grouped_ranks_accumulate_quantities() {
        let quantities = [7, 5, 3, 2, 1, 2];
        let records: Vec<RawRecord> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| RawRecord::new("sys", 0.0, 100.0 * (i + 1) as f64, "event", q))
            .collect();
        let config = AnalysisConfig {
            grouped: true,
            ..AnalysisConfig::default()
        };
        let data = format_dataset(&records, &config).unwrap();
        let mr: Vec<f64> = plotting_positions(&data, true)
            .iter()
            .map(|p| p.median_rank)
            .collect();
        let expected = [0.3284314, 0.5735294, 0.7205882, 0.8186275, 0.8676471, 0.9656863];
        for (m, e) in mr.iter().zip(expected) {
            assert!((m - e).abs() < 1e-6, "{mr:?}");
        }
    }

    #[test]
    fn ols_recovers_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let fit = ordinary_least_squares(&x, &y, false).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!((fit.correlation - 1.0).abs() < 1e-12);
        assert!(fit.mse.abs() < 1e-20);

        let fit = ordinary_least_squares(&x, &y, true).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(ordinary_least_squares(&[1.0, 1.0], &[1.0, 2.0], false).is_err());
    }

    #[test]
    fn weibull_line_recovers_parameters() {
        // Times placed exactly at Bernard positions of Weibull(η = 1000, β = 2).
        let n = 10;
        let times: Vec<f64> = (1..=n)
            .map(|i| {
                let f = bernard(i as f64, n as f64);
                1000.0 * (-(1.0 - f).ln()).powf(0.5)
            })
            .collect();
        let data = Dataset::from_failures(&times).unwrap();
        let m = rank_regression(&data, DistributionKind::Weibull, &AnalysisConfig::default())
            .unwrap();
        let p = m.point_estimates();
        assert!((p[0] - 1000.0).abs() < 1e-6, "{p:?}");
        assert!((p[1] - 2.0).abs() < 1e-9, "{p:?}");
        assert!((m.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normal_line_recovers_parameters() {
        let n = 12;
        let times: Vec<f64> = (1..=n)
            .map(|i| 50.0 + 4.0 * special::inverse_normal_cdf(bernard(i as f64, n as f64)))
            .collect();
        let data = Dataset::from_failures(&times).unwrap();
        let m = rank_regression(&data, DistributionKind::Gaussian, &AnalysisConfig::default())
            .unwrap();
        let p = m.point_estimates();
        assert!((p[0] - 50.0).abs() < 1e-6 && (p[1] - 4.0).abs() < 1e-6, "{p:?}");
    }

    #[test]
    fn failure_count_checks() {
        let records = vec![RawRecord::new("a", 0.0, 5.0, "suspension", 1)];
        let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
        assert!(matches!(
            rank_regression(&data, DistributionKind::Weibull, &AnalysisConfig::default()),
            Err(ReliabilityError::DegenerateParameter(_))
        ));
        let data = Dataset::from_failures(&[5.0]).unwrap();
        assert_eq!(
            rank_regression(&data, DistributionKind::Weibull, &AnalysisConfig::default())
                .unwrap_err(),
            ReliabilityError::insufficient(2, 1)
        );
    }
}

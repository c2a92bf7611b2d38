//! Trend tests on the failure times of repairable units.
//!
//! Each test asks whether the failure process is a homogeneous Poisson
//! process (no trend). All four statistics are closed form.
//!
//! | test | statistic | reference distribution |
//! |---|---|---|
//! | MIL-HDBK-189 | `2·Σ ln(T/tᵢ)` | `χ²(2n)`, two-sided |
//! | Laplace | `(Σtᵢ/n − T/2) / (T·√(1/(12n)))` | standard normal |
//! | Lewis-Robinson | `Zlp · mean(X)/sd(X)` | standard normal |
//! | Serial correlation | `√(n−k)·ρₖ` | standard normal |
//!
//! `X` are the times between failures of each unit, the first measured from
//! zero, and `T` is the end of observation. For a single system they are the
//! gaps of the pooled times, [`times_between_failures`].
//!
//! # Examples
//!
//! ```
//! use u_reliability::survival::laplace;
//!
//! let times = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
//! let test = laplace(&times, 10.0, 0.9).unwrap();
//! assert!(!test.reject());
//! ```
//!
//! # Reference
//! Ascher, H. & Feingold, H. (1984). *Repairable Systems Reliability*,
//! Marcel Dekker.

use u_numflow::stats;

use crate::config::{AnalysisConfig, IntervalType};
use crate::dataset::Dataset;
use crate::error::{ReliabilityError, Result};
use crate::model::{Rejection, TrendTest, TrendTestResult};
use crate::quantile::{chi_square_quantile, tail_probabilities, z_value};

fn check_times(times: &[f64], end: f64, min: usize) -> Result<()> {
    if times.len() < min {
        return Err(ReliabilityError::insufficient(min, times.len()));
    }
    if times.iter().any(|&t| !(t > 0.0) || t > end) {
        return Err(ReliabilityError::degenerate(format!(
            "failure times must lie in (0, {end}]"
        )));
    }
    Ok(())
}

fn normal_test(test: TrendTest, statistic: f64, confidence: f64) -> TrendTestResult {
    TrendTestResult {
        test,
        statistic,
        critical_value: z_value(confidence, IntervalType::TwoSided),
        rejection: Rejection::AbsoluteAbove,
        confidence,
    }
}

/// Times between successive failures, the first measured from zero.
pub fn times_between_failures(times: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    times
        .iter()
        .map(|&t| {
            let gap = t - prev;
            prev = t;
            gap
        })
        .collect()
}

/// MIL-HDBK-189 test, `2·Σ ln(T/tᵢ)` against two-sided `χ²(2n)` limits.
///
/// # Errors
/// [`ReliabilityError::InsufficientData`] without failures;
/// [`ReliabilityError::DegenerateParameter`] for times outside `(0, T]`.
pub fn mil_hdbk(times: &[f64], end: f64, confidence: f64) -> Result<TrendTestResult> {
    check_times(times, end, 1)?;
    let statistic = 2.0 * times.iter().map(|t| (end / t).ln()).sum::<f64>();
    let df = 2.0 * times.len() as f64;
    let (p_lo, p_hi) = tail_probabilities(confidence, IntervalType::TwoSided);
    Ok(TrendTestResult {
        test: TrendTest::MilHdbk,
        statistic,
        critical_value: chi_square_quantile(p_hi, df)?,
        rejection: Rejection::Outside {
            lower: chi_square_quantile(p_lo, df)?,
        },
        confidence,
    })
}

/// Laplace centroid test.
///
/// # Errors
/// Same as [`mil_hdbk`].
pub fn laplace(times: &[f64], end: f64, confidence: f64) -> Result<TrendTestResult> {
    check_times(times, end, 1)?;
    Ok(normal_test(
        TrendTest::Laplace,
        laplace_statistic(times, end),
        confidence,
    ))
}

fn laplace_statistic(times: &[f64], end: f64) -> f64 {
    let n = times.len() as f64;
    let centroid = times.iter().sum::<f64>() / n;
    (centroid - end / 2.0) / (end * (1.0 / (12.0 * n)).sqrt())
}

/// Lewis-Robinson test: the Laplace statistic of `times` scaled by the
/// inverse coefficient of variation of the times between failures `gaps`.
///
/// # Errors
/// [`ReliabilityError::InsufficientData`] with fewer than two failures or
/// gaps; [`ReliabilityError::DegenerateParameter`] when every gap is equal.
pub fn lewis_robinson(
    times: &[f64],
    gaps: &[f64],
    end: f64,
    confidence: f64,
) -> Result<TrendTestResult> {
    check_times(times, end, 2)?;
    let (mean, sd) = spread(gaps, 2)?;
    Ok(normal_test(
        TrendTest::LewisRobinson,
        laplace_statistic(times, end) * mean / sd,
        confidence,
    ))
}

fn spread(gaps: &[f64], min: usize) -> Result<(f64, f64)> {
    if gaps.len() < min {
        return Err(ReliabilityError::insufficient(min, gaps.len()));
    }
    if gaps.iter().any(|g| !g.is_finite() || *g < 0.0) {
        return Err(ReliabilityError::invalid(
            "times between failures must be finite and non-negative",
        ));
    }
    let mean = stats::mean(gaps).ok_or_else(|| ReliabilityError::insufficient(min, 0))?;
    let sd = (gaps.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / gaps.len() as f64).sqrt();
    if !(sd > 0.0) {
        return Err(ReliabilityError::degenerate(
            "times between failures have zero spread",
        ));
    }
    Ok((mean, sd))
}

/// Lag-`k` serial correlation of the times between failures,
/// `√(n−k)·cov(Xᵢ, Xᵢ₊ₖ)/var(X)`.
///
/// # Errors
/// [`ReliabilityError::InsufficientData`] unless `n > k + 1`;
/// [`ReliabilityError::DegenerateParameter`] when every gap is equal.
pub fn serial_correlation(gaps: &[f64], lag: usize, confidence: f64) -> Result<TrendTestResult> {
    let lag = lag.max(1);
    let n = gaps.len();
    let (_, sd) = spread(gaps, lag + 2)?;
    let (head, tail) = (&gaps[..n - lag], &gaps[lag..]);
    let m = (n - lag) as f64;
    let (mh, mt) = (head.iter().sum::<f64>() / m, tail.iter().sum::<f64>() / m);
    let cov = head
        .iter()
        .zip(tail)
        .map(|(a, b)| (a - mh) * (b - mt))
        .sum::<f64>()
        / m;
    Ok(normal_test(
        TrendTest::SerialCorrelation,
        m.sqrt() * cov / (sd * sd),
        confidence,
    ))
}

/// Runs every trend test on the pooled failures of `data`.
///
/// The end of observation is the configured end time, or the last failure
/// when unset. Lewis-Robinson and serial correlation (lag 1) use each unit's
/// times between failures.
///
/// # Errors
/// Errors of the individual tests.
pub fn trend_tests(data: &Dataset, config: &AnalysisConfig) -> Result<Vec<TrendTestResult>> {
    let config = config.clone().validate()?;
    let times = data.failure_times();
    let last = times.last().copied().unwrap_or(0.0);
    let end = config.end_time.unwrap_or(last);
    let gaps = data.times_between_failures();
    let c = config.confidence;
    Ok(vec![
        mil_hdbk(&times, end, c)?,
        laplace(&times, end, c)?,
        lewis_robinson(&times, &gaps, end, c)?,
        serial_correlation(&gaps, 1, c)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{format_dataset, RawRecord};

    const GRAMPUS: [f64; 57] = [
        0.860, 1.258, 1.317, 1.442, 1.897, 2.011, 2.122, 2.439, 3.203, 3.298, 3.902, 3.910,
        4.000, 4.247, 4.411, 4.456, 4.517, 4.899, 4.910, 5.676, 5.755, 6.137, 6.221, 6.311,
        6.613, 6.975, 7.335, 8.158, 8.498, 8.690, 9.042, 9.330, 9.394, 9.426, 9.872, 10.191,
        11.511, 11.575, 12.1, 12.126, 12.368, 12.681, 12.795, 13.399, 13.668, 13.78, 13.877,
        14.007, 14.028, 14.035, 14.173, 14.173, 14.449, 14.587, 14.610, 15.07, 16.0,
    ];

    #[test]
    fn grampus_statistics() {
        let end = 16.0;
        let t = mil_hdbk(&GRAMPUS, end, 0.9).unwrap();
        assert!((t.statistic - 98.672_261_258_074_68).abs() < 1e-9);
        assert!(matches!(t.rejection, Rejection::Outside { lower } if lower < t.critical_value));

        let t = laplace(&GRAMPUS, end, 0.9).unwrap();
        assert!((t.statistic - 0.623_293_871_959_584_4).abs() < 1e-12);
        assert!(!t.reject());

        let gaps = times_between_failures(&GRAMPUS);
        let t = lewis_robinson(&GRAMPUS, &gaps, end, 0.9).unwrap();
        assert!((t.statistic - 0.639_040_948_051_665_4).abs() < 1e-10);
    }

    #[test]
    fn mil_hdbk_limits_are_chi_square() {
        let t = mil_hdbk(&GRAMPUS, 16.0, 0.9).unwrap();
        let upper = chi_square_quantile(0.95, 114.0).unwrap();
        let lower = chi_square_quantile(0.05, 114.0).unwrap();
        assert!((t.critical_value - upper).abs() < 1e-9);
        assert_eq!(t.rejection, Rejection::Outside { lower });
        // 98.7 lies inside [χ²(0.05), χ²(0.95)] at 114 df.
        assert!(!t.reject());
    }

    #[test]
    fn strong_deterioration_is_detected() {
        // Failures bunched toward the end of observation.
        let times: Vec<f64> = (1..=20).map(|i| 100.0 * (i as f64 / 20.0).sqrt().sqrt()).collect();
        let t = laplace(&times, 100.0, 0.95).unwrap();
        assert!(t.statistic > 0.0 && t.reject());
    }

    #[test]
    fn serial_correlation_of_alternating_gaps_is_negative() {
        let mut t = 0.0;
        let times: Vec<f64> = (0..20)
            .map(|i| {
                t += if i % 2 == 0 { 1.0 } else { 3.0 };
                t
            })
            .collect();
        let s = serial_correlation(&times_between_failures(&times), 1, 0.9).unwrap();
        assert!(s.statistic < -1.0, "{}", s.statistic);
        assert!(s.reject());
    }

    #[test]
    fn gaps_start_from_zero() {
        assert_eq!(times_between_failures(&[2.0, 5.0, 9.0]), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn input_checks() {
        assert!(laplace(&[], 10.0, 0.9).is_err());
        assert!(laplace(&[5.0, 12.0], 10.0, 0.9).is_err());
        assert!(lewis_robinson(&[2.0, 4.0, 6.0], &[2.0, 2.0, 2.0], 6.0, 0.9).is_err());
        assert!(serial_correlation(&[1.0, 1.0], 1, 0.9).is_err());
    }

    fn single_system(times: &[f64]) -> Dataset {
        let records: Vec<RawRecord> = times
            .iter()
            .map(|&t| RawRecord::new("grampus", 0.0, t, "event", 1))
            .collect();
        format_dataset(&records, &AnalysisConfig::default()).unwrap()
    }

    fn two_systems(a: &[f64], b: &[f64]) -> Dataset {
        let records: Vec<RawRecord> = a
            .iter()
            .map(|&t| RawRecord::new("a", 0.0, t, "event", 1))
            .chain(b.iter().map(|&t| RawRecord::new("b", 0.0, t, "event", 1)))
            .collect();
        format_dataset(&records, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn gaps_come_from_each_unit() {
        // Per-unit gaps [5, 10, 20, 20]; pooled gaps would be [5, 5, 15, 5].
        let data = two_systems(&[10.0, 30.0], &[5.0, 25.0]);
        assert_eq!(data.times_between_failures(), vec![5.0, 10.0, 20.0, 20.0]);
        let results = trend_tests(&data, &AnalysisConfig::default()).unwrap();
        assert!((results[2].statistic - 11.0 / 9.0).abs() < 1e-10, "{}", results[2].statistic);
    }

    #[test]
    fn identical_units_have_zero_spread() {
        let data = two_systems(&[10.0, 20.0], &[10.0, 20.0]);
        assert_eq!(data.times_between_failures(), vec![10.0; 4]);
        assert!(matches!(
            trend_tests(&data, &AnalysisConfig::default()),
            Err(ReliabilityError::DegenerateParameter(_))
        ));
    }

    #[test]
    fn runs_all_tests_on_a_dataset() {
        let data = single_system(&GRAMPUS);
        let results = trend_tests(&data, &AnalysisConfig::default()).unwrap();
        let names: Vec<TrendTest> = results.iter().map(|r| r.test).collect();
        assert_eq!(
            names,
            vec![
                TrendTest::MilHdbk,
                TrendTest::Laplace,
                TrendTest::LewisRobinson,
                TrendTest::SerialCorrelation
            ]
        );
        assert!((results[1].statistic - 0.623_293_871_959_584_4).abs() < 1e-12);
        assert!((results[2].statistic - 0.639_040_948_051_665_4).abs() < 1e-10);
    }
}

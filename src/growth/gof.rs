//! Goodness-of-fit tests for the Crow-AMSAA model.
//!
//! - Cramer-von Mises for exact failure times, compared against the
//!   tabulated critical values of MIL-HDBK-189C with bilinear interpolation
//!   in (failure count, significance level).
//! - Chi-square for grouped counts (observed vs expected failures per
//!   interval), or `2N/β` for exact data, against `χ²(c, 2N)`.
//!
//! # Examples
//!
//! ```
//! use u_reliability::growth::cvm_critical_value;
//!
//! // Tabulated entry.
//! assert_eq!(cvm_critical_value(10, 0.10), 0.167);
//! // Between df 20 and 30.
//! let v = cvm_critical_value(25, 0.05);
//! assert!(v > 0.217 && v < 0.218);
//! ```

use tracing::warn;

use super::crow_amsaa::{GrowthData, PowerLaw};
use crate::config::Termination;
use crate::error::{ReliabilityError, Result};
use crate::model::{FittedModel, Rejection, TrendTest, TrendTestResult};
use crate::quantile::chi_square_quantile;

/// Significance levels (columns) of [`CVM_TABLE`], descending.
pub const CVM_SIGNIFICANCE: [f64; 5] = [0.20, 0.15, 0.10, 0.05, 0.01];

/// Cramer-von Mises critical values keyed by failure count.
///
/// Each row is `(count, [value at each of CVM_SIGNIFICANCE])`.
pub static CVM_TABLE: [(u32, [f64; 5]); 22] = [
    (2, [0.138, 0.149, 0.162, 0.175, 0.186]),
    (3, [0.121, 0.135, 0.154, 0.184, 0.230]),
    (4, [0.121, 0.134, 0.155, 0.191, 0.280]),
    (5, [0.121, 0.137, 0.160, 0.199, 0.300]),
    (6, [0.123, 0.139, 0.162, 0.204, 0.310]),
    (7, [0.124, 0.140, 0.165, 0.208, 0.320]),
    (8, [0.124, 0.141, 0.165, 0.210, 0.320]),
    (9, [0.125, 0.142, 0.167, 0.212, 0.320]),
    (10, [0.125, 0.142, 0.167, 0.212, 0.320]),
    (11, [0.126, 0.143, 0.169, 0.214, 0.320]),
    (12, [0.126, 0.144, 0.169, 0.214, 0.320]),
    (13, [0.126, 0.144, 0.169, 0.214, 0.330]),
    (14, [0.126, 0.144, 0.169, 0.214, 0.330]),
    (15, [0.126, 0.144, 0.169, 0.215, 0.330]),
    (16, [0.127, 0.145, 0.171, 0.216, 0.330]),
    (17, [0.127, 0.145, 0.171, 0.217, 0.330]),
    (18, [0.127, 0.146, 0.171, 0.217, 0.330]),
    (19, [0.127, 0.146, 0.171, 0.217, 0.330]),
    (20, [0.128, 0.146, 0.172, 0.217, 0.330]),
    (30, [0.128, 0.146, 0.172, 0.218, 0.330]),
    (60, [0.128, 0.147, 0.173, 0.220, 0.330]),
    (100, [0.129, 0.147, 0.173, 0.220, 0.340]),
];

/// Interpolation weight of `x` between `a` and `b`.
fn fraction(x: f64, a: f64, b: f64) -> f64 {
    if a == b {
        0.0
    } else {
        (x - a) / (b - a)
    }
}

/// Brackets `key` in an ascending slice: `(i, j, weight)`.
fn bracket(keys: &[f64], key: f64) -> (usize, usize, f64) {
    const SNAP: f64 = 1e-9;
    let last = keys.len() - 1;
    match keys.iter().position(|&k| k >= key - SNAP) {
        Some(j) if (keys[j] - key).abs() <= SNAP => (j, j, 0.0),
        Some(0) => (0, 0, 0.0),
        Some(j) => (j - 1, j, fraction(key, keys[j - 1], keys[j])),
        None => (last, last, 0.0),
    }
}

fn interpolate(df: f64, significance: f64) -> f64 {
    let counts: Vec<f64> = CVM_TABLE.iter().map(|(n, _)| f64::from(*n)).collect();
    // Significance columns are stored descending; interpolate on the reversed axis.
    let levels: Vec<f64> = CVM_SIGNIFICANCE.iter().rev().copied().collect();
    let (r0, r1, wr) = bracket(&counts, df);
    let (c0, c1, wc) = bracket(&levels, significance);
    let col = |row: usize, c: usize| CVM_TABLE[row].1[CVM_SIGNIFICANCE.len() - 1 - c];
    let at_row = |row: usize| col(row, c0) + wc * (col(row, c1) - col(row, c0));
    at_row(r0) + wr * (at_row(r1) - at_row(r0))
}

/// Critical value for `df` failures at `significance`, clamped to the
/// table's range.
///
/// Keys outside the table are moved to the nearest edge and a warning is
/// logged.
pub fn cvm_critical_value(df: u32, significance: f64) -> f64 {
    if let Err(e) = try_cvm_critical_value(df, significance) {
        warn!(error = %e, "Cramer-von Mises lookup clamped to the table edge");
    }
    interpolate(f64::from(df), significance)
}

/// Critical value for `df` failures at `significance`.
///
/// # Errors
/// [`ReliabilityError::InterpolationOutOfRange`] when `df` is outside
/// 2..=100 or `significance` outside [0.01, 0.20].
pub fn try_cvm_critical_value(df: u32, significance: f64) -> Result<f64> {
    let (min_df, max_df) = (CVM_TABLE[0].0, CVM_TABLE[CVM_TABLE.len() - 1].0);
    if df < min_df || df > max_df {
        return Err(ReliabilityError::InterpolationOutOfRange {
            key: f64::from(df),
            min: f64::from(min_df),
            max: f64::from(max_df),
        });
    }
    let (lo, hi) = (CVM_SIGNIFICANCE[4], CVM_SIGNIFICANCE[0]);
    if !(significance >= lo - 1e-12 && significance <= hi + 1e-12) {
        return Err(ReliabilityError::InterpolationOutOfRange {
            key: significance,
            min: lo,
            max: hi,
        });
    }
    Ok(interpolate(f64::from(df), significance))
}

/// Cramer-von Mises statistic for exact failure times.
///
/// ```text
/// C²_M = 1/(12M) + Σ_{i=1..M} ((tᵢ/T)^β̄ − (2i − 1)/(2M))²
/// ```
///
/// Time-terminated tests use `M = N`, `β̄ = β`. Failure-terminated tests
/// drop the terminating failure (`M = N − 1`) and unbias the shape,
/// `β̄ = (N − 1)·β/N`.
///
/// # Errors
/// - [`ReliabilityError::InvalidInput`] for grouped data.
/// - [`ReliabilityError::InsufficientData`] with fewer than two failures.
pub fn cramer_von_mises_statistic(
    data: &GrowthData,
    beta: f64,
    termination: Termination,
) -> Result<f64> {
    if data.is_grouped() {
        return Err(ReliabilityError::invalid(
            "Cramer-von Mises needs exact failure times; use the chi-square test for grouped data",
        ));
    }
    let times: Vec<f64> = data
        .times()
        .iter()
        .zip(data.failures())
        .flat_map(|(&t, &k)| std::iter::repeat(t).take(k as usize))
        .collect();
    let n = times.len();
    if n < 2 {
        return Err(ReliabilityError::insufficient(2, n));
    }

    let (m, beta_bar, end) = match termination {
        Termination::TimeTerminated => (n, beta, data.end()),
        Termination::FailureTerminated => (
            n - 1,
            (n as f64 - 1.0) * beta / n as f64,
            times[n - 1],
        ),
    };
    let m_f = m as f64;
    let sum: f64 = times[..m]
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let expected = (2.0 * (i + 1) as f64 - 1.0) / (2.0 * m_f);
            ((t / end).powf(beta_bar) - expected).powi(2)
        })
        .sum();
    Ok(sum + 1.0 / (12.0 * m_f))
}

/// Cramer-von Mises test of a fitted Crow-AMSAA model at `confidence`.
///
/// # Errors
/// Same as [`cramer_von_mises_statistic`].
pub fn cramer_von_mises_test(
    data: &GrowthData,
    model: &FittedModel,
    termination: Termination,
    confidence: f64,
) -> Result<TrendTestResult> {
    let law = PowerLaw::from_model(model)?;
    let statistic = cramer_von_mises_statistic(data, law.beta, termination)?;
    let m = match termination {
        Termination::TimeTerminated => data.n_failures(),
        Termination::FailureTerminated => data.n_failures() - 1.0,
    };
    Ok(TrendTestResult {
        test: TrendTest::CramerVonMises,
        statistic,
        critical_value: cvm_critical_value(m.round() as u32, 1.0 - confidence),
        rejection: Rejection::Above,
        confidence,
    })
}

/// Chi-square goodness-of-fit test at `confidence`.
///
/// Grouped data compare the observed count `Nᵢ` in each interval with the
/// expected `θᵢ = α·(tᵢ^β − tᵢ₋₁^β)`, giving `Σ (Nᵢ − θᵢ)²/θᵢ`; exact data
/// use `2N/β`. The critical value is `χ²(c, 2N)`.
///
/// # Errors
/// [`ReliabilityError::DegenerateParameter`] with no failures or a
/// non-positive shape, plus quantile errors.
pub fn chi_square_test(
    data: &GrowthData,
    model: &FittedModel,
    confidence: f64,
) -> Result<TrendTestResult> {
    let law = PowerLaw::from_model(model)?;
    let n = data.n_failures();
    if n == 0.0 || !(law.beta > 0.0) {
        return Err(ReliabilityError::degenerate(
            "chi-square test needs failures and a positive shape",
        ));
    }

    let statistic = if data.is_grouped() {
        let mut prev = 0.0;
        let mut acc = 0.0;
        for (&t, &k) in data.times().iter().zip(data.failures()) {
            let theta = law.expected_failures(t) - law.expected_failures(prev);
            if theta > 0.0 {
                acc += (f64::from(k) - theta).powi(2) / theta;
            }
            prev = t;
        }
        acc
    } else {
        2.0 * n / law.beta
    };

    Ok(TrendTestResult {
        test: TrendTest::ChiSquare,
        statistic,
        critical_value: chi_square_quantile(confidence, 2.0 * n)?,
        rejection: Rejection::Above,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::growth::crow_amsaa;

    #[test]
    fn tabulated_entries_are_exact() {
        for (df, row) in CVM_TABLE.iter() {
            for (sig, expected) in CVM_SIGNIFICANCE.iter().zip(row) {
                let v = try_cvm_critical_value(*df, *sig).unwrap();
                assert!((v - expected).abs() < 1e-12, "df {df}, sig {sig}: {v}");
            }
        }
    }

    #[test]
    fn off_table_keys_interpolate_between_neighbours() {
        // df 25 lies halfway between 20 and 30.
        let v = cvm_critical_value(25, 0.05);
        assert!((v - 0.2175).abs() < 1e-12);
        // Significance 0.075 lies halfway between 0.10 and 0.05.
        let v = cvm_critical_value(10, 0.075);
        assert!((v - 0.5 * (0.167 + 0.212)).abs() < 1e-12);
        let v = cvm_critical_value(45, 0.03);
        assert!(v > 0.172 && v < 0.33);
    }

    #[test]
    fn out_of_range_keys_clamp() {
        assert_eq!(cvm_critical_value(1, 0.10), 0.162);
        assert_eq!(cvm_critical_value(500, 0.10), 0.173);
        assert_eq!(cvm_critical_value(10, 0.5), 0.125);
        assert_eq!(cvm_critical_value(10, 0.001), 0.320);
        assert!(matches!(
            try_cvm_critical_value(500, 0.10),
            Err(ReliabilityError::InterpolationOutOfRange { .. })
        ));
        assert!(try_cvm_critical_value(10, 0.5).is_err());
    }

    #[test]
    fn cvm_statistic_time_terminated() {
        let times = vec![5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
        let data = GrowthData::new(times.clone(), vec![1; 8], Some(100.0), false).unwrap();
        let beta = 0.8;
        let stat = cramer_von_mises_statistic(&data, beta, Termination::TimeTerminated).unwrap();
        let expected: f64 = times
            .iter()
            .enumerate()
            .map(|(i, t)| ((t / 100.0_f64).powf(beta) - (2.0 * i as f64 + 1.0) / 16.0).powi(2))
            .sum::<f64>()
            + 1.0 / 96.0;
        assert!((stat - expected).abs() < 1e-12);
    }

    #[test]
    fn cvm_statistic_failure_terminated_drops_last() {
        let times = vec![2.0, 6.0, 11.0, 20.0];
        let data = GrowthData::new(times, vec![1; 4], None, false).unwrap();
        let stat = cramer_von_mises_statistic(&data, 0.8, Termination::FailureTerminated).unwrap();
        let b = 0.6;
        let expected = ((0.1_f64).powf(b) - 1.0 / 6.0).powi(2)
            + ((0.3_f64).powf(b) - 0.5).powi(2)
            + ((0.55_f64).powf(b) - 5.0 / 6.0).powi(2)
            + 1.0 / 36.0;
        assert!((stat - expected).abs() < 1e-12);
    }

    #[test]
    fn fitted_model_tests() {
        let times = vec![5.0, 12.0, 19.0, 28.0, 41.0, 55.0, 70.0, 90.0];
        let data = GrowthData::new(times, vec![1; 8], Some(100.0), false).unwrap();
        let model = crow_amsaa(&data, &AnalysisConfig::default()).unwrap();
        let cvm = cramer_von_mises_test(&data, &model, Termination::TimeTerminated, 0.9).unwrap();
        assert_eq!(cvm.critical_value, 0.165);
        assert!(!cvm.reject());

        let chi = chi_square_test(&data, &model, 0.9).unwrap();
        assert!((chi.statistic - 16.0 / model.point_estimates()[1]).abs() < 1e-9);
        assert!(chi.critical_value > 20.0);
    }

    #[test]
    fn grouped_chi_square_is_zero_at_expectation() {
        let data = GrowthData::new(
            vec![4.0, 16.0, 36.0, 64.0, 100.0],
            vec![2; 5],
            Some(100.0),
            true,
        )
        .unwrap();
        let model = crow_amsaa(&data, &AnalysisConfig::default()).unwrap();
        let chi = chi_square_test(&data, &model, 0.9).unwrap();
        assert!(chi.statistic < 1e-10, "{}", chi.statistic);
        assert!(!chi.reject());
        assert!(cramer_von_mises_statistic(&data, 0.5, Termination::TimeTerminated).is_err());
    }
}

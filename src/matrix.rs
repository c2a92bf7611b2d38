//! Small fixed-size matrix algebra.
//!
//! Every model in the crate has one or two parameters, so covariance
//! matrices are stored as [`Matrix2`]; a one-parameter model uses only the
//! top-left entry. Inversion is Gauss-Jordan with partial pivoting over
//! any `N×N` array.

use crate::error::{ReliabilityError, Result};

/// Square `N×N` matrix stored row-major.
pub type Matrix<const N: usize> = [[f64; N]; N];

/// Two-by-two matrix used for parameter covariance.
pub type Matrix2 = Matrix<2>;

/// Inverts a square matrix.
///
/// # Errors
/// [`ReliabilityError::DegenerateParameter`] when the matrix is singular or
/// contains non-finite entries.
///
/// # Examples
///
/// ```
/// use u_reliability::matrix::invert;
/// let inv = invert(&[[4.0, 2.0], [2.0, 3.0]]).unwrap();
/// assert!((inv[0][0] - 0.375).abs() < 1e-12);
/// assert!((inv[0][1] + 0.25).abs() < 1e-12);
/// assert!(invert(&[[1.0, 2.0], [2.0, 4.0]]).is_err());
/// ```
pub fn invert<const N: usize>(m: &Matrix<N>) -> Result<Matrix<N>> {
    let mut a = *m;
    let mut inv = [[0.0; N]; N];
    for (i, row) in inv.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    let scale = m
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !scale.is_finite() || scale == 0.0 {
        return Err(ReliabilityError::degenerate("matrix is zero or not finite"));
    }

    for col in 0..N {
        let pivot = (col..N)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= 1e-14 * scale {
            return Err(ReliabilityError::degenerate("matrix is singular"));
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let p = a[col][col];
        for k in 0..N {
            a[col][k] /= p;
            inv[col][k] /= p;
        }
        for row in 0..N {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..N {
                a[row][k] -= factor * a[col][k];
                inv[row][k] -= factor * inv[col][k];
            }
        }
    }
    Ok(inv)
}

/// Whether `m` equals its transpose within `tol`.
pub fn is_symmetric<const N: usize>(m: &Matrix<N>, tol: f64) -> bool {
    (0..N).all(|i| (0..i).all(|j| (m[i][j] - m[j][i]).abs() <= tol * (1.0 + m[i][j].abs())))
}

/// Averages `m` with its transpose.
pub fn symmetrize<const N: usize>(m: &Matrix<N>) -> Matrix<N> {
    let mut out = *m;
    for i in 0..N {
        for j in 0..i {
            let v = 0.5 * (m[i][j] + m[j][i]);
            out[i][j] = v;
            out[j][i] = v;
        }
    }
    out
}

/// Quadratic form `gᵀ·M·g`, the delta-method variance for gradient `g`.
pub fn quadratic_form<const N: usize>(g: &[f64; N], m: &Matrix<N>) -> f64 {
    let mut acc = 0.0;
    for i in 0..N {
        for j in 0..N {
            acc += g[i] * m[i][j] * g[j];
        }
    }
    acc
}

/// Fisher information from outer products of per-observation scores.
///
/// `contribution(i, params)` is observation `i`'s log-likelihood term and
/// `weight(i)` its multiplicity. Each score is a central difference in every
/// parameter; the weighted outer products are summed. Only the leading
/// `params.len()` (one or two) rows and columns are filled.
pub fn outer_product_information(
    params: &[f64],
    n_obs: usize,
    weight: impl Fn(usize) -> f64,
    contribution: impl Fn(usize, &[f64]) -> f64,
) -> Matrix2 {
    let k = params.len().min(2);
    let mut info = [[0.0; 2]; 2];
    let mut shifted = params.to_vec();

    for i in 0..n_obs {
        let mut grad = [0.0; 2];
        for (p, g) in grad.iter_mut().enumerate().take(k) {
            let h = 1e-5 * params[p].abs().max(1e-3);
            shifted[p] = params[p] + h;
            let up = contribution(i, &shifted);
            shifted[p] = params[p] - h;
            let down = contribution(i, &shifted);
            shifted[p] = params[p];
            *g = (up - down) / (2.0 * h);
        }
        let w = weight(i);
        for a in 0..k {
            for b in 0..k {
                info[a][b] += w * grad[a] * grad[b];
            }
        }
    }
    info
}

/// Inverts the leading `k×k` block of an information matrix.
pub fn covariance_from_information(info: &Matrix2, k: usize) -> Result<Matrix2> {
    match k {
        1 => {
            if info[0][0] <= 0.0 || !info[0][0].is_finite() {
                return Err(ReliabilityError::degenerate(
                    "Fisher information is not positive",
                ));
            }
            Ok([[1.0 / info[0][0], 0.0], [0.0, 0.0]])
        }
        2 => Ok(symmetrize(&invert(info)?)),
        _ => Err(ReliabilityError::invalid(format!(
            "covariance supports one or two parameters, got {k}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_3x3() {
        let m = [[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let inv = invert(&m).unwrap();
        let expected = [[0.75, 0.5, 0.25], [0.5, 1.0, 0.5], [0.25, 0.5, 0.75]];
        for i in 0..3 {
            for j in 0..3 {
                assert!((inv[i][j] - expected[i][j]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn invert_needs_pivoting() {
        let inv = invert(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
        assert_eq!(inv, [[0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn symmetry_helpers() {
        let m = [[1.0, 2.0], [2.000_000_1, 3.0]];
        assert!(!is_symmetric(&m, 1e-12));
        assert!(is_symmetric(&symmetrize(&m), 1e-12));
        assert!((quadratic_form(&[1.0, 1.0], &[[1.0, 2.0], [2.0, 3.0]]) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn information_of_exponential_sample() {
        // log f = ln λ − λx, score = 1/λ − x
        let xs = [1.0, 2.0, 3.0];
        let info = outer_product_information(&[0.5], xs.len(), |_| 1.0, |i, p| {
            p[0].ln() - p[0] * xs[i]
        });
        let expected: f64 = xs.iter().map(|x| (2.0 - x).powi(2)).sum();
        assert!((info[0][0] - expected).abs() < 1e-6);
        let cov = covariance_from_information(&info, 1).unwrap();
        assert!((cov[0][0] - 1.0 / expected).abs() < 1e-6);
    }
}

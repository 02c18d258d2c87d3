//! Singular value decomposition.

use crate::config::{NumericOptions, DEFAULT_MAX_SVD_SWEEPS};
use crate::error::MatrixResult;
use crate::matrix::Matrix;
use tracing::{debug, warn};

/// Machine epsilon, 2^-52.
const EPS: f64 = f64::EPSILON;

/// 2^-966, the absolute floor of the negligibility test.
const TINY: f64 = 1.6033346880071782e-291;

/// Singular value decomposition `A = U * S * V^T`.
///
/// With `k = min(m, n)`, `U` is m x k and `V` is n x k, both with
/// orthonormal columns, and `S` is a k x k diagonal matrix holding the
/// singular values `s[0] >= s[1] >= ... >= s[k-1] >= 0`.
///
/// The decomposition always exists. The QR iteration is capped per
/// singular value; if the cap is hit the factors are returned as they
/// stand and [`converged`](Self::converged) reports `false`. The singular
/// values give the 2-norm, the condition number and the effective
/// numerical rank of `A`.
#[derive(Debug, Clone)]
pub struct SingularValueDecomposition {
    u: Matrix,
    v: Matrix,
    s: Vec<f64>,
    rows: usize,
    cols: usize,
    converged: bool,
}

/// Output of [`factor_tall`].
struct TallFactors {
    u: Matrix,
    s: Vec<f64>,
    v: Matrix,
    sweeps: usize,
    converged: bool,
}

impl SingularValueDecomposition {
    /// Factor `a` with the default sweep limit.
    #[must_use]
    pub fn new(a: &Matrix) -> Self {
        Self::factor(a, DEFAULT_MAX_SVD_SWEEPS)
    }

    /// Factor `a`, limiting QR sweeps per singular value to
    /// `options.max_svd_sweeps`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidArgument`](crate::MatrixError::InvalidArgument)
    /// if `options` fails [`NumericOptions::validate`].
    pub fn with_options(a: &Matrix, options: &NumericOptions) -> MatrixResult<Self> {
        options.validate()?;
        Ok(Self::factor(a, options.max_svd_sweeps))
    }

    fn factor(a: &Matrix, max_sweeps: usize) -> Self {
        let (rows, cols) = a.shape();
        if rows == 0 || cols == 0 {
            return Self {
                u: Matrix::new(rows, 0),
                v: Matrix::new(cols, 0),
                s: Vec::new(),
                rows,
                cols,
                converged: true,
            };
        }

        // A^T = V * S * U^T, so a wide matrix is factored through its
        // transpose with the roles of U and V exchanged.
        let TallFactors {
            u,
            s,
            v,
            sweeps,
            converged,
        } = if rows >= cols {
            factor_tall(a, max_sweeps)
        } else {
            let t = factor_tall(&a.transpose(), max_sweeps);
            TallFactors {
                u: t.v,
                v: t.u,
                ..t
            }
        };

        let result = Self {
            u,
            v,
            s,
            rows,
            cols,
            converged,
        };
        debug!(
            rows,
            cols,
            rank = result.rank(),
            sweeps,
            converged,
            "SVD complete"
        );
        result
    }

    /// Whether every singular value converged within the sweep limit.
    ///
    /// When `false`, the singular values may be unordered or negative and
    /// `U * S * V^T` only approximates `A`.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Left singular vectors (m x min(m, n)).
    #[must_use]
    pub fn u(&self) -> Matrix {
        self.u.clone()
    }

    /// Right singular vectors (n x min(m, n)).
    #[must_use]
    pub fn v(&self) -> Matrix {
        self.v.clone()
    }

    /// Diagonal matrix of singular values.
    #[must_use]
    pub fn s(&self) -> Matrix {
        let k = self.s.len();
        let mut s = Matrix::new(k, k);
        for (i, &value) in self.s.iter().enumerate() {
            s[(i, i)] = value;
        }
        s
    }

    /// Singular values in descending order.
    #[must_use]
    pub fn singular_values(&self) -> &[f64] {
        &self.s
    }

    /// Two norm: the largest singular value, or 0 for an empty matrix.
    #[must_use]
    pub fn norm2(&self) -> f64 {
        self.s.first().copied().unwrap_or(0.0)
    }

    /// Two norm condition number `max(S) / min(S)`.
    ///
    /// Infinite for a singular matrix, NaN for an empty one.
    #[must_use]
    pub fn cond(&self) -> f64 {
        match (self.s.first(), self.s.last()) {
            (Some(&max), Some(&min)) => max / min,
            _ => f64::NAN,
        }
    }

    /// Effective numerical rank: the number of singular values above
    /// `max(m, n) * s[0] * eps`.
    #[must_use]
    pub fn rank(&self) -> usize {
        let tol = self.rows.max(self.cols) as f64 * self.norm2() * EPS;
        self.s.iter().filter(|&&value| value > tol).count()
    }
}

/// Golub-Kahan-Reinsch SVD of a matrix with `m >= n >= 1`.
///
/// `U` is m x n and `V` is n x n. `sweeps` counts the implicit QR steps
/// taken in total.
fn factor_tall(source: &Matrix, max_sweeps: usize) -> TallFactors {
    let (m, n) = source.shape();
    let mut a = source.clone();
    let mut s = vec![0.0_f64; n];
    let mut e = vec![0.0_f64; n];
    let mut work = vec![0.0_f64; m];
    let mut u = Matrix::new(m, n);
    let mut v = Matrix::new(n, n);

    // Reduce A to bidiagonal form, storing the diagonal elements in s and
    // the super-diagonal elements in e.
    let nct = (m - 1).min(n);
    let nrt = n.saturating_sub(2).min(m);
    for k in 0..nct.max(nrt) {
        if k < nct {
            // Transformation for the k-th column, placing the k-th diagonal
            // element in s[k].
            s[k] = 0.0;
            for i in k..m {
                s[k] = s[k].hypot(a[(i, k)]);
            }
            if s[k] != 0.0 {
                if a[(k, k)] < 0.0 {
                    s[k] = -s[k];
                }
                for i in k..m {
                    a[(i, k)] /= s[k];
                }
                a[(k, k)] += 1.0;
            }
            s[k] = -s[k];
        }
        for j in (k + 1)..n {
            if k < nct && s[k] != 0.0 {
                let mut t = 0.0;
                for i in k..m {
                    t += a[(i, k)] * a[(i, j)];
                }
                t = -t / a[(k, k)];
                for i in k..m {
                    a[(i, j)] += t * a[(i, k)];
                }
            }
            // Row k of A, for the row transformation below.
            e[j] = a[(k, j)];
        }
        if k < nct {
            for i in k..m {
                u[(i, k)] = a[(i, k)];
            }
        }
        if k < nrt {
            // Transformation for the k-th row, placing the k-th
            // super-diagonal element in e[k].
            e[k] = 0.0;
            for i in (k + 1)..n {
                e[k] = e[k].hypot(e[i]);
            }
            if e[k] != 0.0 {
                if e[k + 1] < 0.0 {
                    e[k] = -e[k];
                }
                for i in (k + 1)..n {
                    e[i] /= e[k];
                }
                e[k + 1] += 1.0;
            }
            e[k] = -e[k];
            if k + 1 < m && e[k] != 0.0 {
                for slot in &mut work[(k + 1)..m] {
                    *slot = 0.0;
                }
                for j in (k + 1)..n {
                    for i in (k + 1)..m {
                        work[i] += e[j] * a[(i, j)];
                    }
                }
                for j in (k + 1)..n {
                    let t = -e[j] / e[k + 1];
                    for i in (k + 1)..m {
                        a[(i, j)] += t * work[i];
                    }
                }
            }
            for i in (k + 1)..n {
                v[(i, k)] = e[i];
            }
        }
    }

    // Final bidiagonal matrix of order p = n.
    let p = n;
    if nct < n {
        s[nct] = a[(nct, nct)];
    }
    if nrt + 1 < p {
        e[nrt] = a[(nrt, p - 1)];
    }
    e[p - 1] = 0.0;

    // Accumulate U.
    for j in nct..n {
        for i in 0..m {
            u[(i, j)] = 0.0;
        }
        u[(j, j)] = 1.0;
    }
    for k in (0..nct).rev() {
        if s[k] != 0.0 {
            for j in (k + 1)..n {
                let mut t = 0.0;
                for i in k..m {
                    t += u[(i, k)] * u[(i, j)];
                }
                t = -t / u[(k, k)];
                for i in k..m {
                    u[(i, j)] += t * u[(i, k)];
                }
            }
            for i in k..m {
                u[(i, k)] = -u[(i, k)];
            }
            u[(k, k)] += 1.0;
            for i in 0..k.saturating_sub(1) {
                u[(i, k)] = 0.0;
            }
        } else {
            for i in 0..m {
                u[(i, k)] = 0.0;
            }
            u[(k, k)] = 1.0;
        }
    }

    // Accumulate V.
    for k in (0..n).rev() {
        if k < nrt && e[k] != 0.0 {
            for j in (k + 1)..n {
                let mut t = 0.0;
                for i in (k + 1)..n {
                    t += v[(i, k)] * v[(i, j)];
                }
                t = -t / v[(k + 1, k)];
                for i in (k + 1)..n {
                    v[(i, j)] += t * v[(i, k)];
                }
            }
        }
        for i in 0..n {
            v[(i, k)] = 0.0;
        }
        v[(k, k)] = 1.0;
    }

    // Implicit-shift QR on the bidiagonal form.
    let mut p = p;
    let pp = p - 1;
    let mut iter = 0;
    let mut sweeps = 0;
    let mut converged = true;
    while p > 0 {
        // Find the largest k < p - 1 with a negligible e[k], or -1.
        let mut k = p as isize - 2;
        while k >= 0 {
            let ku = k as usize;
            if e[ku].abs() <= TINY + EPS * (s[ku].abs() + s[ku + 1].abs()) {
                e[ku] = 0.0;
                break;
            }
            k -= 1;
        }

        let kase = if k == p as isize - 2 {
            // s[p-1] has converged.
            4
        } else {
            // Look for a negligible s[ks] between k and p - 1.
            let mut ks = p as isize - 1;
            while ks > k {
                let ksu = ks as usize;
                let t = e[ksu].abs() + if ks != k + 1 { e[ksu - 1].abs() } else { 0.0 };
                if s[ksu].abs() <= TINY + EPS * t {
                    s[ksu] = 0.0;
                    break;
                }
                ks -= 1;
            }
            if ks == k {
                // e[k] is negligible and k < p - 1: take a QR step.
                3
            } else if ks == p as isize - 1 {
                // s[p-1] is negligible.
                1
            } else {
                // s[ks] is negligible and ks < p - 1.
                k = ks;
                2
            }
        };
        let k = (k + 1) as usize;

        match kase {
            // Deflate negligible s[p-1].
            1 => {
                let mut f = e[p - 2];
                e[p - 2] = 0.0;
                for j in (k..=(p - 2)).rev() {
                    let t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    if j != k {
                        f = -sn * e[j - 1];
                        e[j - 1] *= cs;
                    }
                    rotate_columns(&mut v, j, p - 1, cs, sn);
                }
            }

            // Split at negligible s[k-1].
            2 => {
                let mut f = e[k - 1];
                e[k - 1] = 0.0;
                for j in k..p {
                    let t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    f = -sn * e[j];
                    e[j] *= cs;
                    rotate_columns(&mut u, j, k - 1, cs, sn);
                }
            }

            // One QR step.
            3 => {
                if iter >= max_sweeps {
                    warn!(
                        index = p - 1,
                        sweeps = iter,
                        "SVD did not converge, stopping QR iteration"
                    );
                    converged = false;
                    break;
                }

                // Shift from the trailing 2x2 block.
                let scale = s[p - 1]
                    .abs()
                    .max(s[p - 2].abs())
                    .max(e[p - 2].abs())
                    .max(s[k].abs())
                    .max(e[k].abs());
                let sp = s[p - 1] / scale;
                let spm1 = s[p - 2] / scale;
                let epm1 = e[p - 2] / scale;
                let sk = s[k] / scale;
                let ek = e[k] / scale;
                let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) / 2.0;
                let c = (sp * epm1) * (sp * epm1);
                let mut shift = 0.0;
                if b != 0.0 || c != 0.0 {
                    shift = (b * b + c).sqrt();
                    if b < 0.0 {
                        shift = -shift;
                    }
                    shift = c / (b + shift);
                }
                let mut f = (sk + sp) * (sk - sp) + shift;
                let mut g = sk * ek;

                // Chase zeros.
                for j in k..(p - 1) {
                    let mut t = f.hypot(g);
                    let mut cs = f / t;
                    let mut sn = g / t;
                    if j != k {
                        e[j - 1] = t;
                    }
                    f = cs * s[j] + sn * e[j];
                    e[j] = cs * e[j] - sn * s[j];
                    g = sn * s[j + 1];
                    s[j + 1] *= cs;
                    rotate_columns(&mut v, j, j + 1, cs, sn);

                    t = f.hypot(g);
                    cs = f / t;
                    sn = g / t;
                    s[j] = t;
                    f = cs * e[j] + sn * s[j + 1];
                    s[j + 1] = -sn * e[j] + cs * s[j + 1];
                    g = sn * e[j + 1];
                    e[j + 1] *= cs;
                    rotate_columns(&mut u, j, j + 1, cs, sn);
                }
                e[p - 2] = f;
                iter += 1;
                sweeps += 1;
            }

            // Convergence.
            _ => {
                let mut k = k;
                // Make the singular value non-negative.
                if s[k] <= 0.0 {
                    s[k] = if s[k] < 0.0 { -s[k] } else { 0.0 };
                    for i in 0..=pp {
                        v[(i, k)] = -v[(i, k)];
                    }
                }

                // Bubble it into place.
                while k < pp && s[k] < s[k + 1] {
                    s.swap(k, k + 1);
                    swap_columns(&mut v, k, k + 1);
                    swap_columns(&mut u, k, k + 1);
                    k += 1;
                }
                iter = 0;
                p -= 1;
            }
        }
    }

    TallFactors {
        u,
        s,
        v,
        sweeps,
        converged,
    }
}

/// Apply the plane rotation `(cs, sn)` to columns `j` and `l` of `m`.
fn rotate_columns(m: &mut Matrix, j: usize, l: usize, cs: f64, sn: f64) {
    for i in 0..m.rows() {
        let t = cs * m[(i, j)] + sn * m[(i, l)];
        m[(i, l)] = -sn * m[(i, j)] + cs * m[(i, l)];
        m[(i, j)] = t;
    }
}

fn swap_columns(m: &mut Matrix, j: usize, l: usize) {
    for i in 0..m.rows() {
        let t = m[(i, j)];
        m[(i, j)] = m[(i, l)];
        m[(i, l)] = t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix_math;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn assert_reconstructs(a: &Matrix, svd: &SingularValueDecomposition) {
        let us = matrix_math::multiply(&svd.u(), &svd.s()).unwrap();
        let usv = matrix_math::multiply(&us, &svd.v().transpose()).unwrap();
        assert_eq!(usv.shape(), a.shape());
        for i in 0..a.rows() {
            for j in 0..a.cols() {
                assert!(
                    approx_eq(usv[(i, j)], a[(i, j)], 1e-10),
                    "USV^T[{},{}] = {} != A[{},{}] = {}",
                    i,
                    j,
                    usv[(i, j)],
                    i,
                    j,
                    a[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_svd_basic() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        let svd = SingularValueDecomposition::new(&a);

        assert_eq!(svd.u().shape(), (3, 2));
        assert_eq!(svd.s().shape(), (2, 2));
        assert_eq!(svd.v().shape(), (2, 2));
        assert_reconstructs(&a, &svd);
    }

    #[test]
    fn test_svd_descending_non_negative() {
        let a = Matrix::from_rows(&[
            [2.0, -1.0, 0.0, 3.0],
            [-1.0, 2.0, -1.0, 1.0],
            [0.0, -1.0, 2.0, -2.0],
            [4.0, 0.0, 1.0, 1.0],
        ])
        .unwrap();
        let svd = SingularValueDecomposition::new(&a);
        let values = svd.singular_values();
        assert_eq!(values.len(), 4);
        for pair in values.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert!(values.iter().all(|&x| x >= 0.0));
        assert_reconstructs(&a, &svd);
    }

    #[test]
    fn test_svd_diagonal() {
        let a = Matrix::from_rows(&[[3.0, 0.0, 0.0], [0.0, -5.0, 0.0], [0.0, 0.0, 1.0]]).unwrap();
        let svd = SingularValueDecomposition::new(&a);
        let values = svd.singular_values();
        assert!(approx_eq(values[0], 5.0, 1e-12));
        assert!(approx_eq(values[1], 3.0, 1e-12));
        assert!(approx_eq(values[2], 1.0, 1e-12));
        assert_reconstructs(&a, &svd);
    }

    #[test]
    fn test_svd_wide() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let svd = SingularValueDecomposition::new(&a);
        assert_eq!(svd.u().shape(), (2, 2));
        assert_eq!(svd.s().shape(), (2, 2));
        assert_eq!(svd.v().shape(), (3, 2));
        assert_reconstructs(&a, &svd);
    }

    #[test]
    fn test_svd_rank_cond_norm() {
        let a = Matrix::from_rows(&[[2.0, 0.0], [0.0, 1.0]]).unwrap();
        let svd = SingularValueDecomposition::new(&a);
        assert_eq!(svd.rank(), 2);
        assert!(approx_eq(svd.cond(), 2.0, 1e-12));
        assert!(approx_eq(svd.norm2(), 2.0, 1e-12));
    }

    #[test]
    fn test_svd_rank_deficient() {
        let a = Matrix::from_rows(&[[3.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 0.0, 2.0]]).unwrap();
        let svd = SingularValueDecomposition::new(&a);
        assert_eq!(svd.rank(), 2);
        assert_eq!(svd.singular_values()[2], 0.0);
        assert!(svd.cond().is_infinite());
        assert_reconstructs(&a, &svd);
    }

    #[test]
    fn test_svd_single_element() {
        let a = Matrix::from_rows(&[[-4.0]]).unwrap();
        let svd = SingularValueDecomposition::new(&a);
        assert_eq!(svd.singular_values(), &[4.0]);
        assert_reconstructs(&a, &svd);
    }

    #[test]
    fn test_svd_empty() {
        let svd = SingularValueDecomposition::new(&Matrix::new(0, 3));
        assert!(svd.singular_values().is_empty());
        assert_eq!(svd.rank(), 0);
        assert_eq!(svd.norm2(), 0.0);
        assert!(svd.cond().is_nan());
        assert_eq!(svd.v().shape(), (3, 0));
    }

    #[test]
    fn test_svd_is_repeatable() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let first = SingularValueDecomposition::new(&a);
        let second = SingularValueDecomposition::new(&a);
        assert_eq!(first.singular_values(), second.singular_values());
        assert_eq!(first.u(), second.u());
    }

    #[test]
    fn test_svd_sweep_limit_reported() {
        let a = Matrix::from_rows(&[
            [0.0, 2.0, 1.0, -3.0],
            [1.0, -1.0, 4.0, 2.0],
            [5.0, 0.5, -2.0, 1.0],
            [-2.0, 3.0, 0.0, 7.0],
        ])
        .unwrap();

        let capped = NumericOptions::default().with_max_svd_sweeps(1);
        let svd = SingularValueDecomposition::with_options(&a, &capped).unwrap();
        assert!(!svd.converged());
        assert!(svd.singular_values().iter().all(|x| x.is_finite()));

        let full = SingularValueDecomposition::new(&a);
        assert!(full.converged());
        assert_reconstructs(&a, &full);
    }

    #[test]
    fn test_svd_rejects_zero_sweeps() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let options = NumericOptions::default().with_max_svd_sweeps(0);
        assert!(matches!(
            SingularValueDecomposition::with_options(&a, &options),
            Err(crate::MatrixError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_svd_diagonal_needs_no_sweeps() {
        let a = Matrix::from_rows(&[[3.0, 0.0], [0.0, 1.0]]).unwrap();
        let options = NumericOptions::default().with_max_svd_sweeps(1);
        let svd = SingularValueDecomposition::with_options(&a, &options).unwrap();
        assert!(svd.converged());
        assert_eq!(svd.singular_values(), &[3.0, 1.0]);
    }
}

//! Cholesky decomposition.

use crate::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use tracing::debug;

/// Cholesky factorization `A = L * L^T` of a symmetric positive definite
/// matrix.
///
/// The factorization always runs to completion. If the input turns out not
/// to be symmetric positive definite, [`CholeskyDecomposition::is_spd`]
/// reports it and `L` holds a partial factorization. Entries below a zero
/// pivot are left at zero.
#[derive(Debug, Clone)]
pub struct CholeskyDecomposition {
    l: Matrix,
    is_spd: bool,
}

impl CholeskyDecomposition {
    /// Factor `a`, checking symmetry and positive definiteness on the way.
    ///
    /// Only the leading `rows x rows` block of a non-square matrix is read;
    /// missing columns count as zero and the matrix is reported as not SPD.
    #[must_use]
    pub fn new(a: &Matrix) -> Self {
        let n = a.rows();
        let at = |i: usize, j: usize| if j < a.cols() { a[(i, j)] } else { 0.0 };
        let mut l = Matrix::new(n, n);
        let mut is_spd = a.cols() == n;

        for j in 0..n {
            let mut d = 0.0;
            for k in 0..j {
                let mut s = 0.0;
                for i in 0..k {
                    s += l[(k, i)] * l[(j, i)];
                }
                let pivot = l[(k, k)];
                s = if pivot == 0.0 { 0.0 } else { (at(j, k) - s) / pivot };
                l[(j, k)] = s;
                d += s * s;
                is_spd = is_spd && at(k, j) == at(j, k);
            }
            d = at(j, j) - d;
            is_spd = is_spd && d > 0.0;
            l[(j, j)] = d.max(0.0).sqrt();
        }

        debug!(size = n, spd = is_spd, "Cholesky decomposition complete");
        Self { l, is_spd }
    }

    /// True if the factored matrix is symmetric and positive definite.
    #[must_use]
    pub fn is_spd(&self) -> bool {
        self.is_spd
    }

    /// Lower triangular factor.
    #[must_use]
    pub fn l(&self) -> Matrix {
        self.l.clone()
    }

    /// Determinant of the factored matrix.
    ///
    /// det(A) = det(L)^2 = (prod L_ii)^2, meaningful only when
    /// [`is_spd`](Self::is_spd) holds.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let n = self.l.rows();
        let det_l: f64 = (0..n).map(|i| self.l[(i, i)]).product();
        det_l * det_l
    }

    /// Solve `A * X = B`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `b.rows() != n` and
    /// [`MatrixError::NotSpd`] if the matrix is not symmetric positive
    /// definite.
    pub fn solve(&self, b: &Matrix) -> MatrixResult<Matrix> {
        let n = self.l.rows();
        if b.rows() != n {
            return Err(MatrixError::DimensionMismatch(format!(
                "right-hand side has {} rows but the matrix has {}",
                b.rows(),
                n
            )));
        }
        if !self.is_spd {
            return Err(MatrixError::NotSpd);
        }

        let nx = b.cols();
        let mut x = b.clone();

        // Solve L*Y = B
        for k in 0..n {
            for j in 0..nx {
                for i in 0..k {
                    x[(k, j)] -= x[(i, j)] * self.l[(k, i)];
                }
                x[(k, j)] /= self.l[(k, k)];
            }
        }

        // Solve L'*X = Y
        for k in (0..n).rev() {
            for j in 0..nx {
                for i in (k + 1)..n {
                    x[(k, j)] -= x[(i, j)] * self.l[(i, k)];
                }
                x[(k, j)] /= self.l[(k, k)];
            }
        }

        Ok(x)
    }

    /// Solve `A * x = b` for a single right-hand side.
    ///
    /// # Errors
    ///
    /// Same as [`CholeskyDecomposition::solve`].
    pub fn solve_vector(&self, b: &[f64]) -> MatrixResult<Vec<f64>> {
        let rhs = Matrix::create_column_matrix(b)?;
        Ok(self.solve(&rhs)?.to_packed_array())
    }
}

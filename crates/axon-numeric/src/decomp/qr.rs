//! QR decomposition by Householder reflections.

use crate::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use tracing::debug;

/// QR factorization of an m x n matrix.
///
/// `A = Q * R` with `Q` m x n having orthonormal columns and `R` n x n upper
/// triangular. The Householder vectors are packed into the lower trapezoid
/// of one array, with the strict upper triangle of `R` above them; the
/// diagonal of `R` is kept apart in `rdiag`.
#[derive(Debug, Clone)]
pub struct QrDecomposition {
    qr: Matrix,
    rdiag: Vec<f64>,
}

impl QrDecomposition {
    /// Factor `a` column by column with Householder reflections.
    #[must_use]
    pub fn new(a: &Matrix) -> Self {
        let (m, n) = a.shape();
        let mut qr = a.clone();
        let mut rdiag = vec![0.0; n];

        for k in 0..n {
            // 2-norm of the k-th column below the diagonal, without
            // under/overflow.
            let mut nrm = 0.0_f64;
            for i in k..m {
                nrm = nrm.hypot(qr[(i, k)]);
            }

            if nrm != 0.0 {
                // Form k-th Householder vector, signed away from the pivot.
                if qr[(k, k)] < 0.0 {
                    nrm = -nrm;
                }
                for i in k..m {
                    qr[(i, k)] /= nrm;
                }
                qr[(k, k)] += 1.0;

                // Apply transformation to remaining columns.
                for j in (k + 1)..n {
                    let mut s = 0.0;
                    for i in k..m {
                        s += qr[(i, k)] * qr[(i, j)];
                    }
                    s = -s / qr[(k, k)];
                    for i in k..m {
                        qr[(i, j)] += s * qr[(i, k)];
                    }
                }
            }
            rdiag[k] = -nrm;
        }

        let result = Self { qr, rdiag };
        debug!(
            rows = m,
            cols = n,
            full_rank = result.is_full_rank(),
            "QR decomposition complete"
        );
        result
    }

    /// True if `R`, and hence `A`, has full column rank.
    #[must_use]
    pub fn is_full_rank(&self) -> bool {
        self.rdiag.iter().all(|&d| d != 0.0)
    }

    /// Householder vectors, one per column (m x n lower trapezoidal).
    #[must_use]
    pub fn h(&self) -> Matrix {
        let (m, n) = self.qr.shape();
        let mut h = Matrix::new(m, n);
        for i in 0..m {
            for j in 0..n.min(i + 1) {
                h[(i, j)] = self.qr[(i, j)];
            }
        }
        h
    }

    /// Upper triangular factor (n x n).
    #[must_use]
    pub fn r(&self) -> Matrix {
        let (m, n) = self.qr.shape();
        let mut r = Matrix::new(n, n);
        for i in 0..n {
            r[(i, i)] = self.rdiag[i];
            if i < m {
                for j in (i + 1)..n {
                    r[(i, j)] = self.qr[(i, j)];
                }
            }
        }
        r
    }

    /// Economy-size orthogonal factor (m x n).
    #[must_use]
    pub fn q(&self) -> Matrix {
        let (m, n) = self.qr.shape();
        let mut q = Matrix::new(m, n);
        for k in (0..n.min(m)).rev() {
            q[(k, k)] = 1.0;
            if self.qr[(k, k)] == 0.0 {
                continue;
            }
            for j in k..n {
                let mut s = 0.0;
                for i in k..m {
                    s += self.qr[(i, k)] * q[(i, j)];
                }
                s = -s / self.qr[(k, k)];
                for i in k..m {
                    q[(i, j)] += s * self.qr[(i, k)];
                }
            }
        }
        q
    }

    /// Least squares solution of `A * X = B`.
    ///
    /// Returns X with `n` rows and `b.cols()` columns minimizing
    /// `||A * X - B||`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `b.rows() != m` and
    /// [`MatrixError::RankDeficient`] if the matrix is rank deficient.
    pub fn solve(&self, b: &Matrix) -> MatrixResult<Matrix> {
        let (m, n) = self.qr.shape();
        if b.rows() != m {
            return Err(MatrixError::DimensionMismatch(format!(
                "right-hand side has {} rows but the matrix has {}",
                b.rows(),
                m
            )));
        }
        if !self.is_full_rank() {
            return Err(MatrixError::RankDeficient);
        }

        let nx = b.cols();
        let mut x = b.clone();

        // Compute Y = transpose(Q)*B
        for k in 0..n {
            for j in 0..nx {
                let mut s = 0.0;
                for i in k..m {
                    s += self.qr[(i, k)] * x[(i, j)];
                }
                s = -s / self.qr[(k, k)];
                for i in k..m {
                    x[(i, j)] += s * self.qr[(i, k)];
                }
            }
        }

        // Solve R*X = Y
        for k in (0..n).rev() {
            for j in 0..nx {
                x[(k, j)] /= self.rdiag[k];
            }
            for i in 0..k {
                let factor = self.qr[(i, k)];
                for j in 0..nx {
                    x[(i, j)] -= x[(k, j)] * factor;
                }
            }
        }

        if n == 0 || nx == 0 {
            return Ok(Matrix::new(n, nx));
        }
        x.get_matrix(0, n - 1, 0, nx - 1)
    }

    /// Least squares solution for a single right-hand side.
    ///
    /// # Errors
    ///
    /// Same as [`QrDecomposition::solve`].
    pub fn solve_vector(&self, b: &[f64]) -> MatrixResult<Vec<f64>> {
        let rhs = Matrix::create_column_matrix(b)?;
        Ok(self.solve(&rhs)?.to_packed_array())
    }
}

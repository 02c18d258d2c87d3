//! LU decomposition with partial pivoting.

use crate::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use tracing::debug;

/// LU factorization of an m x n matrix.
///
/// Produces a unit lower triangular `L`, an upper triangular `U` and a row
/// permutation `piv` such that `A(piv, :) = L * U`. For `m >= n`, `L` is
/// m x n and `U` is n x n.
///
/// Both factors share one array:
/// ```text
/// [U00 U01 U02]   L stored below diagonal
/// [L10 U11 U12]   U stored on and above diagonal
/// [L20 L21 U22]   L diagonal is implicitly 1
/// ```
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    lu: Matrix,
    piv: Vec<usize>,
    /// +1 or -1: parity of the row swaps.
    pivsign: f64,
}

impl LuDecomposition {
    /// Factor `a` using left-looking (Crout/Doolittle) elimination with
    /// partial pivoting.
    #[must_use]
    pub fn new(a: &Matrix) -> Self {
        let (m, n) = a.shape();
        let mut lu = a.clone();
        let mut piv: Vec<usize> = (0..m).collect();
        let mut pivsign = 1.0;
        let mut lu_colj = vec![0.0; m];

        for j in 0..n {
            // Make a copy of the j-th column to localize references.
            for (i, slot) in lu_colj.iter_mut().enumerate() {
                *slot = lu[(i, j)];
            }

            // Apply previous transformations.
            for i in 0..m {
                let kmax = i.min(j);
                let mut s = 0.0;
                for k in 0..kmax {
                    s += lu[(i, k)] * lu_colj[k];
                }
                lu_colj[i] -= s;
                lu[(i, j)] = lu_colj[i];
            }

            // Find pivot and exchange if necessary.
            let mut p = j;
            for i in (j + 1)..m {
                if lu_colj[i].abs() > lu_colj[p].abs() {
                    p = i;
                }
            }
            if p != j {
                for k in 0..n {
                    let t = lu[(p, k)];
                    lu[(p, k)] = lu[(j, k)];
                    lu[(j, k)] = t;
                }
                piv.swap(p, j);
                pivsign = -pivsign;
            }

            // Compute multipliers.
            if j < m && lu[(j, j)] != 0.0 {
                let pivot = lu[(j, j)];
                for i in (j + 1)..m {
                    lu[(i, j)] /= pivot;
                }
            }
        }

        let result = Self { lu, piv, pivsign };
        debug!(
            rows = m,
            cols = n,
            nonsingular = result.is_nonsingular(),
            "LU decomposition complete"
        );
        result
    }

    fn rows(&self) -> usize {
        self.lu.rows()
    }

    fn cols(&self) -> usize {
        self.lu.cols()
    }

    /// True if the upper triangular factor, and hence the matrix, is
    /// nonsingular.
    ///
    /// Matrices with fewer rows than columns are always reported singular.
    #[must_use]
    pub fn is_nonsingular(&self) -> bool {
        let (m, n) = (self.rows(), self.cols());
        m >= n && (0..n).all(|j| self.lu[(j, j)] != 0.0)
    }

    /// Unit lower triangular factor (m x min(m, n)).
    #[must_use]
    pub fn l(&self) -> Matrix {
        let m = self.rows();
        let k = m.min(self.cols());
        let mut l = Matrix::new(m, k);
        for i in 0..m {
            for j in 0..k {
                if i > j {
                    l[(i, j)] = self.lu[(i, j)];
                } else if i == j {
                    l[(i, j)] = 1.0;
                }
            }
        }
        l
    }

    /// Upper triangular factor (min(m, n) x n).
    #[must_use]
    pub fn u(&self) -> Matrix {
        let n = self.cols();
        let k = self.rows().min(n);
        let mut u = Matrix::new(k, n);
        for i in 0..k {
            for j in i..n {
                u[(i, j)] = self.lu[(i, j)];
            }
        }
        u
    }

    /// Row permutation: row `i` of `L * U` is row `pivot()[i]` of `A`.
    #[must_use]
    pub fn pivot(&self) -> &[usize] {
        &self.piv
    }

    /// Row permutation as floating point values.
    #[must_use]
    pub fn double_pivot(&self) -> Vec<f64> {
        self.piv.iter().map(|&p| p as f64).collect()
    }

    /// Determinant of the factored matrix.
    ///
    /// det(A) = pivsign * prod(U_ii)
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::NotSquare`] unless the matrix is square.
    pub fn det(&self) -> MatrixResult<f64> {
        let (m, n) = (self.rows(), self.cols());
        if m != n {
            return Err(MatrixError::NotSquare { rows: m, cols: n });
        }
        Ok((0..n).fold(self.pivsign, |d, j| d * self.lu[(j, j)]))
    }

    /// Solve `A * X = B`.
    ///
    /// Returns X with `n` rows and `b.cols()` columns.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `b.rows() != m` and
    /// [`MatrixError::Singular`] if the matrix is singular.
    pub fn solve(&self, b: &Matrix) -> MatrixResult<Matrix> {
        let (m, n) = (self.rows(), self.cols());
        if b.rows() != m {
            return Err(MatrixError::DimensionMismatch(format!(
                "right-hand side has {} rows but the matrix has {}",
                b.rows(),
                m
            )));
        }
        if !self.is_nonsingular() {
            return Err(MatrixError::Singular);
        }

        let nx = b.cols();
        if nx == 0 {
            return Ok(Matrix::new(n, 0));
        }
        // Copy right hand side with pivoting
        let mut x = b.get_matrix_rows(&self.piv[..n], 0, nx - 1)?;

        // Solve L*Y = B(piv,:)
        for k in 0..n {
            for i in (k + 1)..n {
                let factor = self.lu[(i, k)];
                for j in 0..nx {
                    x[(i, j)] -= x[(k, j)] * factor;
                }
            }
        }

        // Solve U*X = Y
        for k in (0..n).rev() {
            let diag = self.lu[(k, k)];
            for j in 0..nx {
                x[(k, j)] /= diag;
            }
            for i in 0..k {
                let factor = self.lu[(i, k)];
                for j in 0..nx {
                    x[(i, j)] -= x[(k, j)] * factor;
                }
            }
        }

        Ok(x)
    }

    /// Solve `A * x = b` for a single right-hand side.
    ///
    /// # Errors
    ///
    /// Same as [`LuDecomposition::solve`].
    pub fn solve_vector(&self, b: &[f64]) -> MatrixResult<Vec<f64>> {
        let rhs = Matrix::create_column_matrix(b)?;
        Ok(self.solve(&rhs)?.to_packed_array())
    }

    /// Inverse of the factored matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::NotSquare`] unless the matrix is square and
    /// [`MatrixError::Singular`] if it is singular.
    pub fn inverse(&self) -> MatrixResult<Matrix> {
        let (m, n) = (self.rows(), self.cols());
        if m != n {
            return Err(MatrixError::NotSquare { rows: m, cols: n });
        }
        if !self.is_nonsingular() {
            return Err(MatrixError::Singular);
        }
        if n == 0 {
            return Ok(Matrix::new(0, 0));
        }
        self.solve(&Matrix::identity(n)?)
    }
}

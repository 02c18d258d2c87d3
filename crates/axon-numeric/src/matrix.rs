//! 2-D matrices
//!
//! # Overview
//!
//! [`Matrix`] is a dense, row-major matrix of finite `f64` values. It offers
//! two access modes:
//!
//! - **Checked**: [`Matrix::get`], [`Matrix::set`] and [`Matrix::add`] return
//!   a [`MatrixResult`] and reject out-of-range indices and non-finite values.
//! - **Raw**: `matrix[(row, col)]`, [`Matrix::as_slice`] and
//!   [`Matrix::as_mut_slice`] give direct access to the backing store. They
//!   panic on out-of-range indices like a slice does and do not check
//!   finiteness. The decomposition kernels use this mode.
//!
//! Sub-matrix ranges (`i0..=i1`) are inclusive at both ends.

use crate::config::NumericOptions;
use crate::decomp::{LuDecomposition, QrDecomposition};
use crate::error::{MatrixError, MatrixResult};
use crate::matrix_math;
use std::fmt;
use std::ops::{Index, IndexMut};
use tracing::trace;

// ============================================================
// Core Matrix Type
// ============================================================

/// A 2-D row-major matrix of finite `f64` values.
#[derive(Clone)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

/// How [`Matrix::solve`] solves a system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStrategy {
    /// Square coefficient matrix: exact solve through LU.
    Square,
    /// Rectangular coefficient matrix: least squares through QR.
    Rectangular,
}

impl SolveStrategy {
    /// Pick the strategy for a coefficient matrix of the given shape.
    #[must_use]
    pub const fn for_shape(rows: usize, cols: usize) -> Self {
        if rows == cols {
            Self::Square
        } else {
            Self::Rectangular
        }
    }
}

fn check_finite(row: usize, col: usize, value: f64) -> MatrixResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MatrixError::InvalidValue { row, col, value })
    }
}

fn check_range(what: &'static str, first: usize, last: usize, bound: usize) -> MatrixResult<()> {
    if last >= bound {
        return Err(MatrixError::IndexOutOfRange {
            what,
            index: last,
            bound,
        });
    }
    if first > last {
        return Err(MatrixError::IndexOutOfRange {
            what,
            index: first,
            bound: last + 1,
        });
    }
    Ok(())
}

fn check_indices(what: &'static str, indices: &[usize], bound: usize) -> MatrixResult<()> {
    match indices.iter().find(|&&i| i >= bound) {
        Some(&index) => Err(MatrixError::IndexOutOfRange { what, index, bound }),
        None => Ok(()),
    }
}

impl Matrix {
    /// Create a zero-filled matrix.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build a matrix from parts the caller has already validated.
    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    /// Create a matrix from row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `data.len() != rows * cols`
    /// and [`MatrixError::InvalidValue`] if any value is not finite.
    pub fn from_data(rows: usize, cols: usize, data: Vec<f64>) -> MatrixResult<Self> {
        if data.len() != rows * cols {
            return Err(MatrixError::DimensionMismatch(format!(
                "{} values cannot fill a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        for (i, &value) in data.iter().enumerate() {
            check_finite(i / cols.max(1), i % cols.max(1), value)?;
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a matrix by deep-copying 2-D data.
    ///
    /// An empty slice produces a 0x0 matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] for jagged input and
    /// [`MatrixError::InvalidValue`] for non-finite values.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> MatrixResult<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MatrixError::DimensionMismatch(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                check_finite(i, j, value)?;
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Create a matrix from boolean data, mapping `true` to `1.0` and
    /// `false` to `-1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] for jagged input.
    pub fn from_bools<R: AsRef<[bool]>>(rows: &[R]) -> MatrixResult<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MatrixError::DimensionMismatch(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend(row.iter().map(|&b| if b { 1.0 } else { -1.0 }));
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Create a 1xN matrix holding `values`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidValue`] for non-finite values.
    pub fn create_row_matrix(values: &[f64]) -> MatrixResult<Self> {
        Self::from_data(1, values.len(), values.to_vec())
    }

    /// Create an Nx1 matrix holding `values`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidValue`] for non-finite values.
    pub fn create_column_matrix(values: &[f64]) -> MatrixResult<Self> {
        Self::from_data(values.len(), 1, values.to_vec())
    }

    /// Create an identity matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidArgument`] if `size < 1`.
    pub fn identity(size: usize) -> MatrixResult<Self> {
        matrix_math::identity(size)
    }

    // ------------------------------------------------------------
    // Shape
    // ------------------------------------------------------------

    /// Get the number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get the shape as (rows, cols)
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get the total number of cells
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// Check if the matrix has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Check if the matrix is square
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major view of the backing store.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major view of the backing store.
    ///
    /// Writes through this slice bypass the finiteness check.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn to_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn check_cell(&self, row: usize, col: usize) -> MatrixResult<usize> {
        if row >= self.rows {
            return Err(MatrixError::row(row, self.rows));
        }
        if col >= self.cols {
            return Err(MatrixError::col(col, self.cols));
        }
        Ok(self.to_index(row, col))
    }

    // ------------------------------------------------------------
    // Checked element access
    // ------------------------------------------------------------

    /// Get the value at (row, col).
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> MatrixResult<f64> {
        let idx = self.check_cell(row, col)?;
        Ok(self.data[idx])
    }

    /// Set the value at (row, col).
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] outside the matrix and
    /// [`MatrixError::InvalidValue`] for a non-finite value.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> MatrixResult<()> {
        let idx = self.check_cell(row, col)?;
        check_finite(row, col, value)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Add `value` to the cell at (row, col).
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::set`]; the accumulated result must be finite.
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> MatrixResult<()> {
        let idx = self.check_cell(row, col)?;
        let sum = self.data[idx] + value;
        check_finite(row, col, sum)?;
        self.data[idx] = sum;
        Ok(())
    }

    /// Set every cell to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Set every cell to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidValue`] for a non-finite value.
    pub fn fill(&mut self, value: f64) -> MatrixResult<()> {
        check_finite(0, 0, value)?;
        self.data.fill(value);
        Ok(())
    }

    /// Overwrite this matrix with the cells of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if the shapes differ.
    pub fn copy_from(&mut self, source: &Matrix) -> MatrixResult<()> {
        matrix_math::copy(source, self)
    }

    /// Get row `row` as a new 1xN matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] if `row >= rows`.
    pub fn get_row(&self, row: usize) -> MatrixResult<Matrix> {
        if row >= self.rows {
            return Err(MatrixError::row(row, self.rows));
        }
        let start = row * self.cols;
        Ok(Self::from_parts(
            1,
            self.cols,
            self.data[start..start + self.cols].to_vec(),
        ))
    }

    /// Get column `col` as a new Nx1 matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] if `col >= cols`.
    pub fn get_col(&self, col: usize) -> MatrixResult<Matrix> {
        if col >= self.cols {
            return Err(MatrixError::col(col, self.cols));
        }
        let data = (0..self.rows).map(|r| self.data[r * self.cols + col]).collect();
        Ok(Self::from_parts(self.rows, 1, data))
    }

    // ------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------

    /// True if the matrix has a single row or a single column.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    /// True if every cell is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&x| x == 0.0)
    }

    /// True if the matrix is square with ones on the diagonal and zeros
    /// elsewhere.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.is_square()
            && (0..self.rows).all(|r| {
                (0..self.cols).all(|c| {
                    let expected = if r == c { 1.0 } else { 0.0 };
                    self.data[self.to_index(r, c)] == expected
                })
            })
    }

    /// Sum of all cells
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Compare with `other` to `precision` decimal digits.
    ///
    /// Each cell is scaled by `10^precision` and truncated toward zero
    /// before the comparison. Cells whose scaled value overflows are
    /// compared exactly. Matrices of different shapes are unequal.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidArgument`] if `precision` is negative or
    /// `10^precision` does not fit in an `i64`.
    pub fn equals(&self, other: &Matrix, precision: i32) -> MatrixResult<bool> {
        if precision < 0 {
            return Err(MatrixError::InvalidArgument(format!(
                "precision must be non-negative, got {}",
                precision
            )));
        }
        let scale = 10f64.powi(precision);
        if !scale.is_finite() || scale > i64::MAX as f64 {
            return Err(MatrixError::InvalidArgument(format!(
                "precision {} is too large",
                precision
            )));
        }
        if self.shape() != other.shape() {
            return Ok(false);
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .all(|(&a, &b)| {
                let (x, y) = (a * scale, b * scale);
                if x.is_finite() && y.is_finite() {
                    x.trunc() == y.trunc()
                } else {
                    a == b
                }
            }))
    }

    /// Compare with `other` at the precision configured in `options`.
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::equals`].
    pub fn equals_with(&self, other: &Matrix, options: &NumericOptions) -> MatrixResult<bool> {
        self.equals(other, options.precision)
    }

    // ------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------

    /// Deep copy of the cells as nested rows.
    #[must_use]
    pub fn get_array_copy(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|r| self.data[r * self.cols..(r + 1) * self.cols].to_vec())
            .collect()
    }

    /// Cells in row-major order.
    #[must_use]
    pub fn to_packed_array(&self) -> Vec<f64> {
        self.data.clone()
    }

    /// Fill the matrix row-major from `array[index..]`.
    ///
    /// Returns the index just past the last value consumed.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] if fewer than `size()` values
    /// remain, and [`MatrixError::InvalidValue`] for a non-finite value. The
    /// matrix is left unchanged on error.
    pub fn from_packed_array(&mut self, array: &[f64], index: usize) -> MatrixResult<usize> {
        let end = match index.checked_add(self.size()) {
            Some(end) if end <= array.len() => end,
            _ => {
                return Err(MatrixError::IndexOutOfRange {
                    what: "packed array",
                    index,
                    bound: array.len(),
                })
            }
        };
        let source = &array[index..end];
        for (i, &value) in source.iter().enumerate() {
            check_finite(i / self.cols, i % self.cols, value)?;
        }
        self.data.copy_from_slice(source);
        Ok(end)
    }

    // ------------------------------------------------------------
    // Sub-matrices
    // ------------------------------------------------------------

    /// Extract rows `i0..=i1` and columns `j0..=j1`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] for an invalid or reversed range.
    pub fn get_matrix(&self, i0: usize, i1: usize, j0: usize, j1: usize) -> MatrixResult<Matrix> {
        check_range("row", i0, i1, self.rows)?;
        check_range("column", j0, j1, self.cols)?;
        let rows: Vec<usize> = (i0..=i1).collect();
        let cols: Vec<usize> = (j0..=j1).collect();
        Ok(self.gather(&rows, &cols))
    }

    /// Extract the cells at the given row and column indices.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] for any invalid index.
    pub fn get_matrix_indexed(&self, rows: &[usize], cols: &[usize]) -> MatrixResult<Matrix> {
        check_indices("row", rows, self.rows)?;
        check_indices("column", cols, self.cols)?;
        Ok(self.gather(rows, cols))
    }

    /// Extract the given rows, columns `j0..=j1`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] for any invalid index.
    pub fn get_matrix_rows(&self, rows: &[usize], j0: usize, j1: usize) -> MatrixResult<Matrix> {
        check_indices("row", rows, self.rows)?;
        check_range("column", j0, j1, self.cols)?;
        let cols: Vec<usize> = (j0..=j1).collect();
        Ok(self.gather(rows, &cols))
    }

    /// Extract rows `i0..=i1`, the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] for any invalid index.
    pub fn get_matrix_cols(&self, i0: usize, i1: usize, cols: &[usize]) -> MatrixResult<Matrix> {
        check_range("row", i0, i1, self.rows)?;
        check_indices("column", cols, self.cols)?;
        let rows: Vec<usize> = (i0..=i1).collect();
        Ok(self.gather(&rows, cols))
    }

    fn gather(&self, rows: &[usize], cols: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(rows.len() * cols.len());
        for &r in rows {
            data.extend(cols.iter().map(|&c| self.data[self.to_index(r, c)]));
        }
        Self::from_parts(rows.len(), cols.len(), data)
    }

    /// Overwrite rows `i0..=i1`, columns `j0..=j1` with `x`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] for an invalid range and
    /// [`MatrixError::DimensionMismatch`] if `x` has the wrong shape.
    pub fn set_matrix(
        &mut self,
        i0: usize,
        i1: usize,
        j0: usize,
        j1: usize,
        x: &Matrix,
    ) -> MatrixResult<()> {
        check_range("row", i0, i1, self.rows)?;
        check_range("column", j0, j1, self.cols)?;
        let rows: Vec<usize> = (i0..=i1).collect();
        let cols: Vec<usize> = (j0..=j1).collect();
        self.scatter(&rows, &cols, x)
    }

    /// Overwrite the cells at the given row and column indices with `x`.
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::set_matrix`].
    pub fn set_matrix_indexed(
        &mut self,
        rows: &[usize],
        cols: &[usize],
        x: &Matrix,
    ) -> MatrixResult<()> {
        check_indices("row", rows, self.rows)?;
        check_indices("column", cols, self.cols)?;
        self.scatter(rows, cols, x)
    }

    /// Overwrite the given rows, columns `j0..=j1` with `x`.
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::set_matrix`].
    pub fn set_matrix_rows(
        &mut self,
        rows: &[usize],
        j0: usize,
        j1: usize,
        x: &Matrix,
    ) -> MatrixResult<()> {
        check_indices("row", rows, self.rows)?;
        check_range("column", j0, j1, self.cols)?;
        let cols: Vec<usize> = (j0..=j1).collect();
        self.scatter(rows, &cols, x)
    }

    /// Overwrite rows `i0..=i1`, the given columns with `x`.
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::set_matrix`].
    pub fn set_matrix_cols(
        &mut self,
        i0: usize,
        i1: usize,
        cols: &[usize],
        x: &Matrix,
    ) -> MatrixResult<()> {
        check_range("row", i0, i1, self.rows)?;
        check_indices("column", cols, self.cols)?;
        let rows: Vec<usize> = (i0..=i1).collect();
        self.scatter(&rows, cols, x)
    }

    fn scatter(&mut self, rows: &[usize], cols: &[usize], x: &Matrix) -> MatrixResult<()> {
        if x.shape() != (rows.len(), cols.len()) {
            return Err(MatrixError::DimensionMismatch(format!(
                "source matrix is {}x{} but the target region is {}x{}",
                x.rows,
                x.cols,
                rows.len(),
                cols.len()
            )));
        }
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                let idx = self.to_index(r, c);
                self.data[idx] = x[(i, j)];
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Algebra
    // ------------------------------------------------------------

    /// The strategy [`Matrix::solve`] uses for this coefficient matrix.
    #[must_use]
    pub fn solve_strategy(&self) -> SolveStrategy {
        SolveStrategy::for_shape(self.rows, self.cols)
    }

    /// Solve `A * X = B`.
    ///
    /// Square matrices are solved exactly through LU; rectangular ones in
    /// the least squares sense through QR.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `b.rows() != rows`,
    /// [`MatrixError::Singular`] for a singular square matrix and
    /// [`MatrixError::RankDeficient`] for a rank-deficient rectangular one.
    pub fn solve(&self, b: &Matrix) -> MatrixResult<Matrix> {
        let strategy = self.solve_strategy();
        trace!(rows = self.rows, cols = self.cols, ?strategy, "solving linear system");
        match strategy {
            SolveStrategy::Square => LuDecomposition::new(self).solve(b),
            SolveStrategy::Rectangular => QrDecomposition::new(self).solve(b),
        }
    }

    /// Inverse for square matrices, pseudo-inverse otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::solve`]; additionally
    /// [`MatrixError::InvalidArgument`] for a matrix with no rows.
    pub fn inverse(&self) -> MatrixResult<Matrix> {
        self.solve(&matrix_math::identity(self.rows)?)
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Matrix {
        matrix_math::transpose(self)
    }

    /// Multiply by `vector`, writing the product into `result`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `vector.len() != cols`
    /// or `result.len() != rows`.
    pub fn multiply_vector(&self, vector: &[f64], result: &mut [f64]) -> MatrixResult<()> {
        if vector.len() != self.cols {
            return Err(MatrixError::DimensionMismatch(format!(
                "vector has {} elements but the matrix has {} columns",
                vector.len(),
                self.cols
            )));
        }
        if result.len() != self.rows {
            return Err(MatrixError::DimensionMismatch(format!(
                "result buffer has {} elements but the matrix has {} rows",
                result.len(),
                self.rows
            )));
        }
        for (r, out) in result.iter_mut().enumerate() {
            let row = &self.data[r * self.cols..(r + 1) * self.cols];
            *out = row.iter().zip(vector).map(|(a, b)| a * b).sum();
        }
        Ok(())
    }
}

// ============================================================
// Trait Implementations
// ============================================================

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}x{}, {:?})", self.rows, self.cols, self.data)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for r in 0..self.rows {
            write!(f, "  [")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.data[r * self.cols + c])?;
            }
            writeln!(f, "]")?;
        }
        write!(f, "]")
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap()
    }

    #[test]
    fn test_matrix_new_is_zero() {
        let m = Matrix::new(3, 4);
        assert_eq!(m.shape(), (3, 4));
        assert!(m.is_zero());
    }

    #[test]
    fn test_matrix_from_rows_copies() {
        let mut source = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let m = Matrix::from_rows(&source).unwrap();
        source[0][0] = 99.0;
        assert_eq!(m[(0, 0)], 1.0);
    }

    #[test]
    fn test_matrix_from_rows_jagged() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            Matrix::from_rows(&rows),
            Err(MatrixError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_matrix_from_rows_rejects_nan() {
        let result = Matrix::from_rows(&[[1.0, f64::NAN]]);
        assert!(matches!(
            result,
            Err(MatrixError::InvalidValue { row: 0, col: 1, .. })
        ));
    }

    #[test]
    fn test_matrix_from_bools() {
        let m = Matrix::from_bools(&[[true, false], [false, true]]).unwrap();
        assert_eq!(m.as_slice(), &[1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_matrix_from_data_wrong_len() {
        assert!(Matrix::from_data(2, 2, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_matrix_get_set() {
        let mut m = Matrix::new(2, 2);
        m.set(0, 1, 5.0).unwrap();
        assert_eq!(m.get(0, 1).unwrap(), 5.0);
        assert_eq!(m[(0, 1)], 5.0);
    }

    #[test]
    fn test_matrix_get_out_of_range() {
        let m = Matrix::new(2, 3);
        assert!(matches!(
            m.get(2, 0),
            Err(MatrixError::IndexOutOfRange { what: "row", index: 2, bound: 2 })
        ));
        assert!(matches!(
            m.get(0, 3),
            Err(MatrixError::IndexOutOfRange { what: "column", .. })
        ));
    }

    #[test]
    fn test_matrix_set_rejects_non_finite() {
        let mut m = Matrix::new(2, 2);
        assert!(matches!(
            m.set(0, 0, f64::INFINITY),
            Err(MatrixError::InvalidValue { .. })
        ));
        assert!(matches!(
            m.set(1, 1, f64::NAN),
            Err(MatrixError::InvalidValue { .. })
        ));
        assert!(m.is_zero());
    }

    #[test]
    fn test_matrix_add_accumulates() {
        let mut m = Matrix::new(1, 1);
        m.add(0, 0, 1.5).unwrap();
        m.add(0, 0, 2.0).unwrap();
        assert_eq!(m[(0, 0)], 3.5);
        assert!(m.add(0, 0, f64::MAX).is_ok());
        assert!(m.add(0, 0, f64::MAX).is_err());
    }

    #[test]
    fn test_matrix_row_col() {
        let m = sample();
        let row = m.get_row(1).unwrap();
        assert_eq!(row.shape(), (1, 3));
        assert_eq!(row.as_slice(), &[4.0, 5.0, 6.0]);
        let col = m.get_col(2).unwrap();
        assert_eq!(col.shape(), (3, 1));
        assert_eq!(col.as_slice(), &[3.0, 6.0, 9.0]);
    }

    #[test]
    fn test_matrix_row_col_at_bound() {
        let m = sample();
        assert!(m.get_row(3).is_err());
        assert!(m.get_col(3).is_err());
    }

    #[test]
    fn test_matrix_predicates() {
        assert!(Matrix::new(1, 5).is_vector());
        assert!(Matrix::new(5, 1).is_vector());
        assert!(!Matrix::new(2, 2).is_vector());
        assert!(Matrix::identity(3).unwrap().is_identity());
        assert!(!sample().is_identity());
        assert_eq!(sample().sum(), 45.0);
    }

    #[test]
    fn test_matrix_equals_precision() {
        let a = Matrix::from_rows(&[[1.123456, 2.0]]).unwrap();
        let b = Matrix::from_rows(&[[1.123499, 2.0]]).unwrap();
        assert!(a.equals(&b, 4).unwrap());
        assert!(!a.equals(&b, 5).unwrap());
        assert!(!a.equals(&Matrix::new(2, 1), 4).unwrap());
    }

    #[test]
    fn test_matrix_equals_invalid_precision() {
        let a = Matrix::new(1, 1);
        assert!(matches!(
            a.equals(&a, -1),
            Err(MatrixError::InvalidArgument(_))
        ));
        assert!(matches!(
            a.equals(&a, 19),
            Err(MatrixError::InvalidArgument(_))
        ));
        assert!(a.equals(&a, 18).unwrap());
    }

    #[test]
    fn test_matrix_equals_with_options() {
        let a = Matrix::from_rows(&[[0.5]]).unwrap();
        let b = Matrix::from_rows(&[[0.5 + 1e-12]]).unwrap();
        assert!(a.equals_with(&b, &NumericOptions::default()).unwrap());
        let strict = NumericOptions::default().with_precision(14);
        assert!(!a.equals_with(&b, &strict).unwrap());
    }

    #[test]
    fn test_matrix_equals_large_values() {
        let a = Matrix::from_rows(&[[1e9]]).unwrap();
        let b = Matrix::from_rows(&[[5e9]]).unwrap();
        assert!(!a.equals_with(&b, &NumericOptions::default()).unwrap());
        assert!(a.equals_with(&a, &NumericOptions::default()).unwrap());

        // 1e300 * 10^10 overflows; such cells are compared exactly.
        let c = Matrix::from_rows(&[[1e300]]).unwrap();
        let d = Matrix::from_rows(&[[2e300]]).unwrap();
        assert!(!c.equals(&d, 10).unwrap());
        assert!(c.equals(&c, 10).unwrap());
    }

    #[test]
    fn test_matrix_packed_array() {
        let m = sample();
        let packed = m.to_packed_array();
        let mut n = Matrix::new(3, 3);
        let mut buffer = vec![-1.0];
        buffer.extend_from_slice(&packed);
        assert_eq!(n.from_packed_array(&buffer, 1).unwrap(), 10);
        assert_eq!(n, m);
        assert!(n.from_packed_array(&packed, 1).is_err());
    }

    #[test]
    fn test_matrix_packed_array_huge_index() {
        let mut n = Matrix::new(2, 2);
        assert!(matches!(
            n.from_packed_array(&[1.0, 2.0, 3.0, 4.0], usize::MAX),
            Err(MatrixError::IndexOutOfRange { what: "packed array", index: usize::MAX, bound: 4 })
        ));
        assert!(n.is_zero());
    }

    #[test]
    fn test_matrix_array_copy() {
        let m = sample();
        let copy = m.get_array_copy();
        assert_eq!(copy.len(), 3);
        assert_eq!(copy[2], vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_matrix_get_submatrix() {
        let m = sample();
        let sub = m.get_matrix(1, 2, 0, 1).unwrap();
        assert_eq!(sub.as_slice(), &[4.0, 5.0, 7.0, 8.0]);
        let picked = m.get_matrix_indexed(&[2, 0], &[1]).unwrap();
        assert_eq!(picked.as_slice(), &[8.0, 2.0]);
        let rows = m.get_matrix_rows(&[0], 1, 2).unwrap();
        assert_eq!(rows.as_slice(), &[2.0, 3.0]);
        let cols = m.get_matrix_cols(0, 1, &[2, 2]).unwrap();
        assert_eq!(cols.as_slice(), &[3.0, 3.0, 6.0, 6.0]);
    }

    #[test]
    fn test_matrix_get_submatrix_errors() {
        let m = sample();
        assert!(matches!(
            m.get_matrix(0, 3, 0, 0),
            Err(MatrixError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            m.get_matrix(2, 1, 0, 0),
            Err(MatrixError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            m.get_matrix_indexed(&[0], &[5]),
            Err(MatrixError::IndexOutOfRange { what: "column", index: 5, .. })
        ));
    }

    #[test]
    fn test_matrix_set_submatrix() {
        let mut m = Matrix::new(3, 3);
        let block = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        m.set_matrix(1, 2, 1, 2, &block).unwrap();
        assert_eq!(m.get_matrix(1, 2, 1, 2).unwrap(), block);
        assert_eq!(m[(0, 0)], 0.0);

        m.set_matrix_indexed(&[0, 2], &[0, 2], &block).unwrap();
        assert_eq!(m[(2, 2)], 4.0);
        assert_eq!(m[(0, 2)], 2.0);

        let wrong = Matrix::new(3, 1);
        assert!(matches!(
            m.set_matrix_rows(&[0, 1], 0, 0, &wrong),
            Err(MatrixError::DimensionMismatch(_))
        ));
        m.set_matrix_cols(0, 2, &[1], &wrong).unwrap();
        assert_eq!(m.get_col(1).unwrap(), wrong);
    }

    #[test]
    fn test_matrix_multiply_vector() {
        let m = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        let mut out = vec![0.0; 3];
        m.multiply_vector(&[1.0, 1.0], &mut out).unwrap();
        assert_eq!(out, vec![3.0, 7.0, 11.0]);

        let mut short = vec![0.0; 2];
        assert!(m.multiply_vector(&[1.0, 1.0], &mut short).is_err());
        assert!(m.multiply_vector(&[1.0], &mut out).is_err());
    }

    #[test]
    fn test_matrix_solve_strategy() {
        assert_eq!(Matrix::new(3, 3).solve_strategy(), SolveStrategy::Square);
        assert_eq!(Matrix::new(4, 3).solve_strategy(), SolveStrategy::Rectangular);
    }

    #[test]
    fn test_matrix_solve_diagonal() {
        let a = Matrix::from_rows(&[[2.0, 0.0], [0.0, 3.0]]).unwrap();
        let b = Matrix::create_column_matrix(&[2.0, 3.0]).unwrap();
        let x = a.solve(&b).unwrap();
        assert!((x[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((x[(1, 0)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_inverse() {
        let a = Matrix::from_rows(&[[4.0, 7.0], [2.0, 6.0]]).unwrap();
        let inv = a.inverse().unwrap();
        let expected = [0.6, -0.7, -0.2, 0.4];
        for (got, want) in inv.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_matrix_clear_fill_copy() {
        let mut m = sample();
        m.clear();
        assert!(m.is_zero());
        m.fill(2.5).unwrap();
        assert_eq!(m.sum(), 22.5);
        assert!(m.fill(f64::NEG_INFINITY).is_err());
        m.copy_from(&sample()).unwrap();
        assert_eq!(m, sample());
        assert!(m.copy_from(&Matrix::new(2, 2)).is_err());
    }

    #[test]
    fn test_matrix_display() {
        let m = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let s = format!("{}", m);
        assert!(s.contains("[1"));
        assert!(s.contains("2]"));
    }

    #[test]
    #[should_panic]
    fn test_matrix_raw_index_panics() {
        let m = Matrix::new(2, 2);
        let _value = m[(2, 0)];
    }
}

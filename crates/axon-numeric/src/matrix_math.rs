//! Matrix algebra as free functions.
//!
//! Every function takes its operands by reference and returns a new
//! [`Matrix`], except [`copy`], which writes into an existing target.
//! Results that would hold a non-finite cell (overflow, division by zero)
//! are rejected with [`MatrixError::InvalidValue`].

use crate::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;

fn same_shape(op: &str, a: &Matrix, b: &Matrix) -> MatrixResult<()> {
    if a.rows() != b.rows() {
        return Err(MatrixError::DimensionMismatch(format!(
            "to {} the matrices they must have the same number of rows: \
             matrix a has {} rows and matrix b has {} rows",
            op,
            a.rows(),
            b.rows()
        )));
    }
    if a.cols() != b.cols() {
        return Err(MatrixError::DimensionMismatch(format!(
            "to {} the matrices they must have the same number of columns: \
             matrix a has {} columns and matrix b has {} columns",
            op,
            a.cols(),
            b.cols()
        )));
    }
    Ok(())
}

fn zip_with(a: &Matrix, b: &Matrix, f: impl Fn(f64, f64) -> f64) -> MatrixResult<Matrix> {
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Matrix::from_data(a.rows(), a.cols(), data)
}

fn map(a: &Matrix, f: impl Fn(f64) -> f64) -> MatrixResult<Matrix> {
    Matrix::from_data(a.rows(), a.cols(), a.as_slice().iter().map(|&x| f(x)).collect())
}

/// Element-wise sum `a + b`.
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if the shapes differ and
/// [`MatrixError::InvalidValue`] if a sum overflows.
pub fn add(a: &Matrix, b: &Matrix) -> MatrixResult<Matrix> {
    same_shape("add", a, b)?;
    zip_with(a, b, |x, y| x + y)
}

/// Element-wise difference `a - b`.
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if the shapes differ and
/// [`MatrixError::InvalidValue`] if a difference overflows.
pub fn subtract(a: &Matrix, b: &Matrix) -> MatrixResult<Matrix> {
    same_shape("subtract", a, b)?;
    zip_with(a, b, |x, y| x - y)
}

/// Copy every cell of `source` into `target`.
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if the shapes differ.
pub fn copy(source: &Matrix, target: &mut Matrix) -> MatrixResult<()> {
    same_shape("copy", source, target)?;
    target.as_mut_slice().copy_from_slice(source.as_slice());
    Ok(())
}

/// Matrix product `a * b` (naive O(n³)).
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if `a.cols() != b.rows()` and
/// [`MatrixError::InvalidValue`] if a cell of the product overflows.
pub fn multiply(a: &Matrix, b: &Matrix) -> MatrixResult<Matrix> {
    if a.cols() != b.rows() {
        return Err(MatrixError::DimensionMismatch(format!(
            "to multiply the matrices the columns of matrix a must match the rows \
             of matrix b: matrix a has {} columns and matrix b has {} rows",
            a.cols(),
            b.rows()
        )));
    }
    let (m, n, p) = (a.rows(), a.cols(), b.cols());
    let lhs = a.as_slice();
    let rhs = b.as_slice();
    let mut result = vec![0.0; m * p];
    for i in 0..m {
        for k in 0..n {
            let aik = lhs[i * n + k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..p {
                result[i * p + j] += aik * rhs[k * p + j];
            }
        }
    }
    Matrix::from_data(m, p, result)
}

/// Scalar product `a * b`.
///
/// # Errors
///
/// Returns [`MatrixError::InvalidValue`] if a cell overflows or `b` is not
/// finite.
pub fn multiply_scalar(a: &Matrix, b: f64) -> MatrixResult<Matrix> {
    map(a, |x| x * b)
}

/// Scalar quotient `a / b`.
///
/// # Errors
///
/// Returns [`MatrixError::InvalidValue`] if a cell overflows, including
/// division by zero.
pub fn divide_scalar(a: &Matrix, b: f64) -> MatrixResult<Matrix> {
    map(a, |x| x / b)
}

/// Matrix-vector product `a * d`.
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if `d.len() != a.cols()`.
pub fn multiply_vector(a: &Matrix, d: &[f64]) -> MatrixResult<Vec<f64>> {
    let mut result = vec![0.0; a.rows()];
    a.multiply_vector(d, &mut result)?;
    Ok(result)
}

/// Transposed copy of `input`.
#[must_use]
pub fn transpose(input: &Matrix) -> Matrix {
    let (rows, cols) = input.shape();
    let source = input.as_slice();
    let mut data = Vec::with_capacity(rows * cols);
    for c in 0..cols {
        for r in 0..rows {
            data.push(source[r * cols + c]);
        }
    }
    Matrix::from_parts(cols, rows, data)
}

/// Identity matrix of the given size.
///
/// # Errors
///
/// Returns [`MatrixError::InvalidArgument`] if `size < 1`.
pub fn identity(size: usize) -> MatrixResult<Matrix> {
    if size < 1 {
        return Err(MatrixError::InvalidArgument(
            "identity matrix must be at least of size 1".to_string(),
        ));
    }
    let mut result = Matrix::new(size, size);
    for i in 0..size {
        result[(i, i)] = 1.0;
    }
    Ok(result)
}

/// Dot product of two vectors (1xN or Nx1 matrices, in any combination).
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if either operand is not a
/// vector or their lengths differ.
pub fn dot_product(a: &Matrix, b: &Matrix) -> MatrixResult<f64> {
    if !a.is_vector() || !b.is_vector() {
        return Err(MatrixError::DimensionMismatch(
            "to take the dot product both matrices must be vectors".to_string(),
        ));
    }
    if a.size() != b.size() {
        return Err(MatrixError::DimensionMismatch(format!(
            "to take the dot product both vectors must be the same length: \
             vector a has {} elements and vector b has {} elements",
            a.size(),
            b.size()
        )));
    }
    Ok(a.as_slice().iter().zip(b.as_slice()).map(|(x, y)| x * y).sum())
}

/// Euclidean length of a vector.
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if `input` is not a vector.
pub fn vector_length(input: &Matrix) -> MatrixResult<f64> {
    if !input.is_vector() {
        return Err(MatrixError::DimensionMismatch(
            "can only take the vector length of a vector".to_string(),
        ));
    }
    Ok(input.as_slice().iter().map(|x| x * x).sum::<f64>().sqrt())
}

/// Copy of `matrix` without row `deleted`.
///
/// # Errors
///
/// Returns [`MatrixError::IndexOutOfRange`] if `deleted >= matrix.rows()`.
pub fn delete_row(matrix: &Matrix, deleted: usize) -> MatrixResult<Matrix> {
    if deleted >= matrix.rows() {
        return Err(MatrixError::row(deleted, matrix.rows()));
    }
    let cols = matrix.cols();
    let data = matrix
        .as_slice()
        .chunks(cols.max(1))
        .enumerate()
        .filter(|&(r, _)| r != deleted)
        .flat_map(|(_, row)| row.iter().copied())
        .collect();
    Ok(Matrix::from_parts(matrix.rows() - 1, cols, data))
}

/// Copy of `matrix` without column `deleted`.
///
/// # Errors
///
/// Returns [`MatrixError::IndexOutOfRange`] if `deleted >= matrix.cols()`.
pub fn delete_col(matrix: &Matrix, deleted: usize) -> MatrixResult<Matrix> {
    if deleted >= matrix.cols() {
        return Err(MatrixError::col(deleted, matrix.cols()));
    }
    let data = matrix
        .as_slice()
        .iter()
        .enumerate()
        .filter(|&(i, _)| i % matrix.cols() != deleted)
        .map(|(_, &x)| x)
        .collect();
    Ok(Matrix::from_parts(matrix.rows(), matrix.cols() - 1, data))
}

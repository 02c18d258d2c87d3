//! Error types for matrix operations and decompositions.

use thiserror::Error;

/// Errors produced by [`Matrix`](crate::matrix::Matrix), the
/// [`matrix_math`](crate::matrix_math) functions and the decompositions.
///
/// Every error is raised at the point of violation and returned to the
/// caller; nothing in this crate retries or substitutes a default result.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// A row, column or sub-matrix index lies outside the matrix.
    #[error("{what} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        /// Which index was checked ("row", "column", ...).
        what: &'static str,
        /// The offending index.
        index: usize,
        /// Exclusive upper bound the index was checked against.
        bound: usize,
    },

    /// A non-finite value was written into a matrix cell.
    #[error("cannot store {value} at ({row}, {col}): matrix cells must be finite")]
    InvalidValue {
        /// Target row.
        row: usize,
        /// Target column.
        col: usize,
        /// The rejected value.
        value: f64,
    },

    /// Operands have incompatible shapes.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A square matrix is required.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Rows of the offending matrix.
        rows: usize,
        /// Columns of the offending matrix.
        cols: usize,
    },

    /// LU factorization found the matrix singular.
    #[error("matrix is singular")]
    Singular,

    /// QR factorization found the matrix rank deficient.
    #[error("matrix is rank deficient")]
    RankDeficient,

    /// Cholesky factorization found the matrix not symmetric positive definite.
    #[error("matrix is not symmetric positive definite")]
    NotSpd,

    /// An argument is outside its documented domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Options could not be parsed from TOML.
    #[error("invalid numeric options: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for matrix operations.
pub type MatrixResult<T> = Result<T, MatrixError>;

impl MatrixError {
    pub(crate) fn row(index: usize, bound: usize) -> Self {
        Self::IndexOutOfRange {
            what: "row",
            index,
            bound,
        }
    }

    pub(crate) fn col(index: usize, bound: usize) -> Self {
        Self::IndexOutOfRange {
            what: "column",
            index,
            bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_index() {
        let err = MatrixError::row(4, 3);
        assert_eq!(err.to_string(), "row index 4 out of range (bound 3)");
    }

    #[test]
    fn test_display_not_square() {
        let err = MatrixError::NotSquare { rows: 2, cols: 3 };
        assert_eq!(err.to_string(), "matrix must be square, got 2x3");
    }

    #[test]
    fn test_toml_error_converts() {
        let parse: Result<toml::Value, _> = toml::from_str("precision = ");
        let err: MatrixError = parse.unwrap_err().into();
        assert!(matches!(err, MatrixError::Config(_)));
    }
}

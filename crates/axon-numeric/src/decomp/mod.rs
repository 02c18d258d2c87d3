//! Matrix decompositions
//!
//! This module provides numerical matrix decomposition algorithms:
//!
//! - **LU Decomposition**: `A(piv, :) = L * U` with partial (row) pivoting
//! - **QR Decomposition**: `A = Q * R` by Householder reflections
//! - **Cholesky Decomposition**: `A = L * L^T` for symmetric positive definite A
//! - **SVD (Singular Value Decomposition)**: `A = U * S * V^T` with the
//!   singular values in descending order
//!
//! # Ownership
//!
//! Each decomposition copies its input and factors the copy eagerly in the
//! constructor. The result is an immutable value: the source matrix may be
//! changed or dropped afterwards, and every accessor (`l()`, `q()`, ...)
//! builds a fresh matrix from the stored factorization.
//!
//! # Failure
//!
//! `new` never fails. `SingularValueDecomposition::with_options` only
//! rejects invalid [`NumericOptions`](crate::NumericOptions), and a cut-off
//! QR iteration shows up as `converged() == false`.
//! Conditions such as singularity are reported by
//! the predicate of each decomposition and turned into a
//! [`MatrixError`](crate::error::MatrixError) only when an operation needs
//! them (`solve`, `inverse`, `det`).
//!
//! # Example
//!
//! ```
//! use axon_numeric::decomp::{LuDecomposition, QrDecomposition};
//! use axon_numeric::Matrix;
//!
//! let a = Matrix::from_rows(&[
//!     [2.0, -1.0, 0.0],
//!     [-1.0, 2.0, -1.0],
//!     [0.0, -1.0, 2.0],
//! ]).unwrap();
//!
//! let lu = LuDecomposition::new(&a);
//! assert!(lu.is_nonsingular());
//! assert!((lu.det().unwrap() - 4.0).abs() < 1e-12);
//!
//! let qr = QrDecomposition::new(&a);
//! assert!(qr.is_full_rank());
//! ```

mod cholesky;
mod lu;
mod qr;
mod svd;

pub use cholesky::CholeskyDecomposition;
pub use lu::LuDecomposition;
pub use qr::QrDecomposition;
pub use svd::SingularValueDecomposition;

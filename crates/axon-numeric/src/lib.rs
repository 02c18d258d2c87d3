//! Axon Numeric Library
//!
//! Dense `f64` matrices and the classical direct decompositions.
//!
//! # Architecture
//!
//! - [`matrix`]: the [`Matrix`] type with checked element access,
//!   sub-matrix views, precision equality and linear solves.
//! - [`matrix_math`]: free functions for elementwise and product algebra.
//! - [`decomp`]: LU, QR, Cholesky and singular value decompositions. Each
//!   one factors a private copy of its input at construction.
//! - [`config`]: [`NumericOptions`], loadable from TOML.
//! - [`error`]: the crate-wide [`MatrixError`].
//!
//! # Example
//!
//! ```
//! use axon_numeric::{Matrix, SingularValueDecomposition};
//!
//! let a = Matrix::from_rows(&[[2.0, 0.0], [0.0, 3.0]]).unwrap();
//! let b = Matrix::create_column_matrix(&[2.0, 3.0]).unwrap();
//!
//! let x = a.solve(&b).unwrap();
//! assert!((x.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
//! assert!((x.get(1, 0).unwrap() - 1.0).abs() < 1e-12);
//!
//! let svd = SingularValueDecomposition::new(&a);
//! assert_eq!(svd.rank(), 2);
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber:
//! `debug` when a decomposition finishes, `trace` when [`Matrix::solve`]
//! picks a strategy and `warn` if SVD iteration is cut off.

#![warn(missing_docs)]

pub mod config;
pub mod decomp;
pub mod error;
pub mod matrix;
pub mod matrix_math;

pub use config::NumericOptions;
pub use decomp::{
    CholeskyDecomposition, LuDecomposition, QrDecomposition, SingularValueDecomposition,
};
pub use error::{MatrixError, MatrixResult};
pub use matrix::{Matrix, SolveStrategy};

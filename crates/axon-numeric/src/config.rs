//! Numeric options.
//!
//! Tolerances that would otherwise be process-wide constants are carried in
//! [`NumericOptions`] and passed explicitly to the routines that need them.
//!
//! ```toml
//! precision = 8
//! max_svd_sweeps = 100
//! ```

use crate::error::{MatrixError, MatrixResult};
use serde::{Deserialize, Serialize};

/// Default number of decimal digits compared by precision equality.
pub const DEFAULT_PRECISION: i32 = 10;

/// Default cap on QR sweeps spent on a single singular value.
pub const DEFAULT_MAX_SVD_SWEEPS: usize = 75;

/// Options for comparison and iterative routines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericOptions {
    /// Decimal digits compared by [`Matrix::equals_with`](crate::matrix::Matrix::equals_with).
    pub precision: i32,
    /// Maximum implicit-QR sweeps per singular value before the SVD stops.
    pub max_svd_sweeps: usize,
}

impl Default for NumericOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_svd_sweeps: DEFAULT_MAX_SVD_SWEEPS,
        }
    }
}

impl NumericOptions {
    /// Parse options from TOML. Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::Config`] if the text is not valid TOML, and
    /// [`MatrixError::InvalidArgument`] if a value fails [`Self::validate`].
    pub fn from_toml_str(content: &str) -> MatrixResult<Self> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every option is within its domain.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidArgument`] for a negative precision or a
    /// zero sweep limit.
    pub fn validate(&self) -> MatrixResult<()> {
        if self.precision < 0 {
            return Err(MatrixError::InvalidArgument(format!(
                "precision must be non-negative, got {}",
                self.precision
            )));
        }
        if self.max_svd_sweeps == 0 {
            return Err(MatrixError::InvalidArgument(
                "max_svd_sweeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the comparison precision.
    #[must_use]
    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    /// Set the SVD sweep limit.
    #[must_use]
    pub fn with_max_svd_sweeps(mut self, sweeps: usize) -> Self {
        self.max_svd_sweeps = sweeps;
        self
    }
}

//! Error types for the fracture-mechanics core.

use thiserror::Error;

/// Failures reported by the numerical core and its closed-form collaborators.
///
/// A stable R-curve (no instability inside the swept range) is a valid result and is
/// reported through [`crate::r_curve::Stability::Stable`], never through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FractureError {
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("quadrature did not converge after {intervals} subintervals (estimate {estimate}, error {error})")]
    NonConvergence {
        estimate: f64,
        error: f64,
        intervals: usize,
    },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("resistance expression: {0}")]
    Expression(String),
}

impl FractureError {
    pub(crate) fn domain(message: impl Into<String>) -> Self {
        FractureError::InvalidDomain(message.into())
    }
}

/// Result type for fracture-mechanics operations
pub type Result<T> = std::result::Result<T, FractureError>;

/// Rejects anything that is not a finite, strictly positive number.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FractureError::domain(format!(
            "{} must be greater than 0.0, got {}",
            name, value
        )));
    }
    Ok(())
}

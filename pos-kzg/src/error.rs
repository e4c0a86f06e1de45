//! Error types for the pos-kzg crate.

use thiserror::Error;

/// Result type alias using PosError
pub type Result<T> = std::result::Result<T, PosError>;

/// Errors that can occur in commitment and encoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PosError {
    /// Malformed byte layout (wrong length, out-of-range field value, off-curve point)
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Polynomial has more coefficients than the reference string has powers
    #[error("SRS too small: need {required} G1 powers, have {available}")]
    SrsTooSmall { required: usize, available: usize },

    /// Empty data
    #[error("Cannot process empty data")]
    EmptyData,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<ark_serialize::SerializationError> for PosError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        PosError::SerializationError(err.to_string())
    }
}

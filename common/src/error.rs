//! Error types for signature and encoding checks.

use thiserror::Error;

use crate::{Address, U256};

/// Result type alias using AuthError
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while building or checking authorizations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Credential signature recovers to someone other than the designated submitter
    #[error("Unauthorized credential: signed by {recovered}, expected {expected}")]
    UnauthorizedCredential { expected: Address, recovered: Address },

    /// Fewer than the required number of distinct authorized signers
    #[error("Insufficient authorization: {valid} valid distinct signatures, {required} required")]
    InsufficientAuthorization { valid: usize, required: usize },

    /// Authorization does not carry exactly the required number of signatures
    #[error("Wrong signature count: {count} given, {required} required")]
    SignatureCount { count: usize, required: usize },

    /// Authorization was built over a different setting-change hash
    #[error("Authorization hash mismatch: expected {expected}, signed {signed}")]
    HashMismatch { expected: String, signed: String },

    /// Signature bytes cannot be parsed or recovered
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// Authorization was signed against a nonce the chain has moved past
    #[error("Stale nonce: signed against {signed}, chain is at {current}")]
    StaleNonce { signed: U256, current: U256 },

    /// Malformed hex or fixed-width value
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

//! Error types for contract submission.

use common::{AuthError, TxHash};
use pos_kzg::PosError;
use thiserror::Error;

/// Result type alias using SubmitError
pub type Result<T> = std::result::Result<T, SubmitError>;

/// Errors returned by contract operations
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Transport or node failure while talking to the ledger
    #[error("{action}: ledger error: {message}")]
    Ledger { action: String, message: String },

    /// No receipt after every polling attempt
    #[error("{action}: no receipt for transaction {tx}, not packaged")]
    NotFound { action: String, tx: TxHash },

    /// Receipt shows the transaction used all of its gas
    #[error("{action}: transaction {tx} exceeded gas limit")]
    OutOfGas { action: String, tx: TxHash },

    /// Transaction was mined but execution failed
    #[error("{action}: transaction {tx} reverted: {reason}")]
    Reverted {
        action: String,
        tx: TxHash,
        reason: String,
    },

    /// Polling was cancelled before a receipt was seen
    #[error("{action}: transaction {tx} still pending")]
    Pending { action: String, tx: TxHash },

    /// Local credential or authorization check failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Commitment or encoding failure
    #[error(transparent)]
    Pos(#[from] PosError),
}

impl SubmitError {
    pub fn ledger(action: &str, err: impl std::fmt::Display) -> Self {
        SubmitError::Ledger {
            action: action.to_string(),
            message: err.to_string(),
        }
    }
}

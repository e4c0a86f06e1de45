//! Error types for challenge tracking.

use chain_submitter::SubmitError;
use pos_kzg::PosError;
use thiserror::Error;

/// Result type alias using TrackerError
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors returned while tracking or driving a challenge
#[derive(Error, Debug)]
pub enum TrackerError {
    /// On-chain state alone cannot tell which phase the challenge is in
    #[error("challenge state is ambiguous: status {status}, challenger {challenger}")]
    ProtocolStateAmbiguous { status: u8, challenger: String },

    /// A contract call or read failed
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Commitment or encoding failure
    #[error(transparent)]
    Pos(#[from] PosError),

    /// Disputed range read from the chain does not fit in file index space
    #[error("invalid disputed range: start {start}, length {len}")]
    InvalidRange { start: u64, len: u64 },

    /// The holder has no commitments for part of the disputed range
    #[error("missing commitments for file indices {start}..{end}")]
    MissingCommitments { start: u64, end: u64 },
}

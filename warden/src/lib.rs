//! Warden library - tracks and drives on-chain storage challenges.
//!
//! A challenge is an interactive bisection: the holder splits the disputed
//! file range into ten sub-ranges and commits to each, the challenger picks
//! one, and so on until the range is small enough for the holder to reveal
//! the individual file commitments.
//!
//! - `tracker`: phase classification, round deadlines and next-action
//!   decisions for either role
//! - `challenger`: sub-range splitting, seeded sub-range selection and proof
//!   cycle timing
//! - `scheduler`: the loop that reads chain state and acts through
//!   [`chain_submitter::ProofClient`]
//! - `config`: TOML + environment configuration

pub mod challenger;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod tracker;

pub use config::{WardenConfig, load_config};
pub use error::{Result, TrackerError};
pub use scheduler::{
    ChallengeLoop, CommitmentSource, load_commitments, run_challenge_loop, run_from_config,
};
pub use tracker::{
    Action, ChallengeTracker, Phase, ResolutionEvidence, Role, Winner, deadline,
    forfeiture_eligible, next_action,
};

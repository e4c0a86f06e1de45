//! Contract client for the file-proof protocol.
//!
//! This crate turns local commitments and signatures into contract calls and
//! reports what happened to them:
//! - **Ledger boundary**: the [`Ledger`] trait, the only way the client
//!   reaches the chain
//! - **Confirmation**: bounded receipt polling with out-of-gas and revert
//!   classification
//! - **Client**: holder, challenger and administrator operations plus typed
//!   reads of contract state
//!
//! # Architecture
//!
//! ```text
//! ProofClient ──► Ledger::submit ──► tx hash
//!      │                                │
//!      │            confirm(): sleep 6 s, then every 5 s, 10 lookups
//!      │                                │
//!      ▼                                ▼
//! Ok(tx) ◄── Confirmed        NotFound │ OutOfGas │ Reverted(reason)
//! ```

pub mod client;
pub mod config;
pub mod confirm;
pub mod error;
pub mod ledger;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod revert;

pub use client::ProofClient;
pub use config::{SubmitterConfig, load_config};
pub use confirm::{ConfirmConfig, TransactionOutcome, confirm};
pub use error::{Result, SubmitError};
pub use ledger::{
    CHALLENGE_FAN_OUT, ChainEvent, ContractAddresses, ContractCall, EventFilter, EventKind,
    InstanceKind, Ledger, Receipt,
};
pub use revert::decode_revert_reason;

//! Transaction confirmation by bounded receipt polling.
//!
//! Blocks are produced asynchronously and there is no push channel, so after
//! submitting a call the client waits for the transaction to be packaged:
//!
//! ```text
//! sleep(initial_settle) → receipt? ─yes─► classify
//!                            │ no
//!                  sleep(block_interval) → receipt? ... (max_attempts total)
//!                                                  │ still none
//!                                                  ▼
//!                                              NotFound
//! ```
//!
//! A failed receipt whose `gas_used` equals `cumulative_gas_used` is
//! classified as out of gas. Any other failure is replayed as a call to
//! recover the revert reason.

use std::time::Duration;

use common::TxHash;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SubmitError;
use crate::ledger::{Ledger, Receipt};
use crate::revert::decode_revert_reason;

/// Default wait before the first receipt lookup.
pub const DEFAULT_INITIAL_SETTLE: Duration = Duration::from_secs(6);

/// Default wait between later receipt lookups.
pub const DEFAULT_BLOCK_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of receipt lookups.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Polling schedule for [`confirm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmConfig {
    pub initial_settle: Duration,
    pub block_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            initial_settle: DEFAULT_INITIAL_SETTLE,
            block_interval: DEFAULT_BLOCK_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ConfirmConfig {
    /// Longest time [`confirm`] can spend sleeping.
    pub fn worst_case(&self) -> Duration {
        if self.max_attempts == 0 {
            return Duration::ZERO;
        }
        self.initial_settle + self.block_interval * (self.max_attempts - 1)
    }
}

/// Final classification of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Polling was cancelled before any receipt was seen
    Pending,
    Confirmed,
    RevertedWithReason(String),
    /// Failed, and replaying it produced no readable reason
    Reverted,
    OutOfGas,
    NotFound,
}

impl TransactionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransactionOutcome::Confirmed)
    }

    /// Turn every non-confirmed outcome into a typed error.
    pub fn into_result(self, action: &str, tx: &TxHash) -> Result<(), SubmitError> {
        let action = action.to_string();
        let tx = *tx;
        match self {
            TransactionOutcome::Confirmed => Ok(()),
            TransactionOutcome::Pending => Err(SubmitError::Pending { action, tx }),
            TransactionOutcome::NotFound => Err(SubmitError::NotFound { action, tx }),
            TransactionOutcome::OutOfGas => Err(SubmitError::OutOfGas { action, tx }),
            TransactionOutcome::RevertedWithReason(reason) => {
                Err(SubmitError::Reverted { action, tx, reason })
            }
            TransactionOutcome::Reverted => Err(SubmitError::Reverted {
                action,
                tx,
                reason: "mined but execution failed, no revert reason available".to_string(),
            }),
        }
    }
}

/// Poll for a receipt and classify the transaction.
///
/// # Arguments
/// * `ledger` - Chain access
/// * `tx` - Hash returned by the submission
/// * `action` - Action name for logs
/// * `config` - Polling schedule
/// * `cancel` - Stops polling early with [`TransactionOutcome::Pending`]
pub async fn confirm<L: Ledger + ?Sized>(
    ledger: &L,
    tx: &TxHash,
    action: &str,
    config: &ConfirmConfig,
    cancel: &CancellationToken,
) -> TransactionOutcome {
    let mut wait = config.initial_settle;
    let mut receipt = None;

    for attempt in 1..=config.max_attempts {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(action, tx = %tx, attempt, "Confirmation cancelled before receipt");
                return TransactionOutcome::Pending;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        match ledger.receipt(tx).await {
            Ok(Some(r)) => {
                receipt = Some(r);
                break;
            }
            Ok(None) => debug!(action, tx = %tx, attempt, "Receipt not yet available"),
            Err(e) => warn!(action, tx = %tx, attempt, error = %e, "Receipt lookup failed"),
        }
        wait = config.block_interval;
    }

    let Some(receipt) = receipt else {
        warn!(
            action,
            tx = %tx,
            attempts = config.max_attempts,
            "No receipt, transaction not packaged"
        );
        return TransactionOutcome::NotFound;
    };

    classify(ledger, tx, action, &receipt).await
}

async fn classify<L: Ledger + ?Sized>(
    ledger: &L,
    tx: &TxHash,
    action: &str,
    receipt: &Receipt,
) -> TransactionOutcome {
    if receipt.succeeded() {
        info!(action, tx = %tx, block = receipt.block_number, "Transaction confirmed");
        return TransactionOutcome::Confirmed;
    }

    if receipt.gas_used == receipt.cumulative_gas_used {
        warn!(action, tx = %tx, gas_used = receipt.gas_used, "Transaction exceeded gas limit");
        return TransactionOutcome::OutOfGas;
    }

    match ledger.simulate(tx).await {
        Ok(data) => match decode_revert_reason(&data) {
            Some(reason) => {
                warn!(action, tx = %tx, reason = %reason, "Transaction reverted");
                TransactionOutcome::RevertedWithReason(reason)
            }
            None => {
                warn!(action, tx = %tx, "Transaction reverted without a readable reason");
                TransactionOutcome::Reverted
            }
        },
        Err(e) => {
            warn!(action, tx = %tx, error = %e, "Failed to replay reverted transaction");
            TransactionOutcome::Reverted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLedger, ReceiptStep};
    use crate::revert::encode_revert_reason;
    use tokio::time::Instant;

    fn tx() -> TxHash {
        TxHash([0x77; 32])
    }

    fn failed(gas_used: u64, cumulative: u64) -> Receipt {
        Receipt {
            status: 0,
            gas_used,
            cumulative_gas_used: cumulative,
            block_number: 10,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_after_initial_settle() {
        let ledger = MockLedger::new();
        ledger.push_receipt(ReceiptStep::Ready(MockLedger::success_receipt()));

        let start = Instant::now();
        let outcome = confirm(
            &ledger,
            &tx(),
            "AddFile",
            &ConfirmConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, TransactionOutcome::Confirmed);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(ledger.receipt_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_after_retries() {
        let ledger = MockLedger::new();
        ledger.push_receipt(ReceiptStep::Missing);
        ledger.push_receipt(ReceiptStep::Error);
        ledger.push_receipt(ReceiptStep::Ready(MockLedger::success_receipt()));

        let start = Instant::now();
        let outcome = confirm(
            &ledger,
            &tx(),
            "GenerateRnd",
            &ConfirmConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, TransactionOutcome::Confirmed);
        // 6 s settle, then two 5 s block intervals
        assert_eq!(start.elapsed(), Duration::from_secs(16));
        assert_eq!(ledger.receipt_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_after_ten_attempts() {
        let ledger = MockLedger::new();
        for _ in 0..20 {
            ledger.push_receipt(ReceiptStep::Missing);
        }

        let start = Instant::now();
        let config = ConfirmConfig::default();
        let outcome = confirm(&ledger, &tx(), "EndChallenge", &config, &CancellationToken::new()).await;

        assert_eq!(outcome, TransactionOutcome::NotFound);
        assert_eq!(ledger.receipt_calls(), 10);
        assert_eq!(start.elapsed(), config.worst_case());
        assert_eq!(config.worst_case(), Duration::from_secs(51));
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_gas() {
        let ledger = MockLedger::new();
        ledger.push_receipt(ReceiptStep::Ready(failed(3_000_000, 3_000_000)));

        let outcome = confirm(
            &ledger,
            &tx(),
            "SubmitAggregationProof",
            &ConfirmConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, TransactionOutcome::OutOfGas);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_with_reason() {
        let ledger = MockLedger::new();
        ledger.push_receipt(ReceiptStep::Ready(failed(21_000, 90_000)));
        ledger.set_revert_data(Some(encode_revert_reason("X")));

        let outcome = confirm(
            &ledger,
            &tx(),
            "Challenge",
            &ConfirmConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, TransactionOutcome::RevertedWithReason("X".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_when_replay_fails() {
        let ledger = MockLedger::new();
        ledger.push_receipt(ReceiptStep::Ready(failed(21_000, 90_000)));
        ledger.set_revert_data(None);

        let outcome = confirm(
            &ledger,
            &tx(),
            "Challenge",
            &ConfirmConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, TransactionOutcome::Reverted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_returns_pending() {
        let ledger = MockLedger::new();
        for _ in 0..20 {
            ledger.push_receipt(ReceiptStep::Missing);
        }
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let outcome = confirm(&ledger, &tx(), "AddFile", &ConfirmConfig::default(), &cancel).await;

        assert_eq!(outcome, TransactionOutcome::Pending);
        assert_eq!(start.elapsed(), Duration::from_secs(12));
        assert_eq!(ledger.receipt_calls(), 2);
    }

    #[test]
    fn test_outcome_into_result() {
        assert!(TransactionOutcome::Confirmed.into_result("AddFile", &tx()).is_ok());

        let err = TransactionOutcome::RevertedWithReason("X".into())
            .into_result("AddFile", &tx())
            .unwrap_err();
        assert!(err.to_string().contains("AddFile"));
        assert!(err.to_string().contains("reverted: X"));

        assert!(matches!(
            TransactionOutcome::OutOfGas.into_result("AddFile", &tx()),
            Err(SubmitError::OutOfGas { .. })
        ));
        assert!(matches!(
            TransactionOutcome::Reverted.into_result("AddFile", &tx()),
            Err(SubmitError::Reverted { .. })
        ));
    }
}

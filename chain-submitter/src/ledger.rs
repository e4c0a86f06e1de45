//! Boundary between the client and the chain.
//!
//! The client never talks to a node directly. Everything it needs from the
//! chain goes through the [`Ledger`] trait: submitting a contract call,
//! fetching a receipt, re-simulating a failed transaction, typed reads of
//! contract state and historical events. Transport, ABI marshaling and key
//! custody live behind the implementation.

use async_trait::async_trait;
use common::{
    Address, AlterSettingInfo, ChallengeInfo, ProfitInfo, SettingsRecord, Signature, TxHash, U256,
    VerifyInfo,
};
use pos_kzg::ProofInfo;
use pos_kzg::codec::{G1Limbs, G2Limbs};
use serde::{Deserialize, Serialize};

/// Number of sub-ranges a disputed range is split into each round.
pub const CHALLENGE_FAN_OUT: usize = 10;

// ============================================================================
// Contract Registry
// ============================================================================

/// Contracts resolved through the on-chain instance registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceKind {
    /// Proof logic contract
    FileProof,
    /// Proxy that holders and challengers call
    FileProofProxy,
    /// Controller whose address is bound into setting-change hashes
    FileProofControl,
    /// Multi-signature authorization contract holding the nonce
    Auth,
    /// Token used for pledges and rewards
    Erc20,
}

impl InstanceKind {
    /// Registry key for this contract.
    pub fn registry_id(self) -> u8 {
        match self {
            InstanceKind::Erc20 => 1,
            InstanceKind::Auth => 2,
            InstanceKind::FileProof => 100,
            InstanceKind::FileProofControl => 101,
            InstanceKind::FileProofProxy => 102,
        }
    }
}

/// Addresses the client needs, resolved once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub proof: Address,
    pub controller: Address,
    pub token: Address,
    pub auth: Address,
}

// ============================================================================
// Calls and Receipts
// ============================================================================

/// Every mutating call the client makes, with arguments already encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    AddFile {
        commitment: G1Limbs,
        size: u64,
        start: U256,
        end: U256,
        credential: Signature,
    },
    GenerateRnd,
    SubmitProof {
        rnd: [u8; 32],
        commitment: G1Limbs,
        proof: ProofInfo,
    },
    DoChallenge {
        index: u8,
    },
    ResponseChallenge {
        commitments: [G1Limbs; CHALLENGE_FAN_OUT],
    },
    OneStepProve {
        commitments: Vec<G1Limbs>,
    },
    EndChallenge,
    WithdrawMissedProfit,
    AlterSetting {
        info: AlterSettingInfo,
        signatures: Vec<Signature>,
    },
}

impl ContractCall {
    /// Action name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ContractCall::AddFile { .. } => "AddFile",
            ContractCall::GenerateRnd => "GenerateRnd",
            ContractCall::SubmitProof { .. } => "SubmitAggregationProof",
            ContractCall::DoChallenge { .. } => "Challenge",
            ContractCall::ResponseChallenge { .. } => "ResponseChallenge",
            ContractCall::OneStepProve { .. } => "OneStepProve",
            ContractCall::EndChallenge => "EndChallenge",
            ContractCall::WithdrawMissedProfit => "WithdrawMissedProfit",
            ContractCall::AlterSetting { .. } => "AlterSetting",
        }
    }
}

/// Transaction receipt fields the confirmation protocol inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// 1 for success, 0 for failure
    pub status: u64,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub block_number: u64,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    AddFile,
    SubmitProof,
    ChallengeResult,
}

/// Historical event query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventFilter {
    pub address: Address,
    pub kinds: Vec<EventKind>,
    pub from_block: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    FileAdded {
        block_number: u64,
        owner: Address,
        size: u64,
    },
    ProofSubmitted {
        block_number: u64,
        rnd: U256,
    },
    /// Emitted when a challenge ends, naming the party that won it.
    ChallengeResult {
        block_number: u64,
        challenger: Address,
        winner: Address,
    },
}

impl ChainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChainEvent::FileAdded { .. } => EventKind::AddFile,
            ChainEvent::ProofSubmitted { .. } => EventKind::SubmitProof,
            ChainEvent::ChallengeResult { .. } => EventKind::ChallengeResult,
        }
    }

    pub fn block_number(&self) -> u64 {
        match self {
            ChainEvent::FileAdded { block_number, .. }
            | ChainEvent::ProofSubmitted { block_number, .. }
            | ChainEvent::ChallengeResult { block_number, .. } => *block_number,
        }
    }
}

// ============================================================================
// Ledger Trait
// ============================================================================

/// Chain access used by the client.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Account that signs submitted transactions.
    fn account(&self) -> Address;

    /// Sign and broadcast a call to `to`, returning its hash.
    async fn submit(&self, to: Address, call: ContractCall) -> anyhow::Result<TxHash>;

    /// Receipt for a transaction, `None` while it is not yet packaged.
    async fn receipt(&self, tx: &TxHash) -> anyhow::Result<Option<Receipt>>;

    /// Replay a mined transaction as a call and return the raw revert data.
    async fn simulate(&self, tx: &TxHash) -> anyhow::Result<Vec<u8>>;

    async fn instance_address(&self, kind: InstanceKind) -> anyhow::Result<Address>;

    async fn challenge_info(&self, proof: &Address) -> anyhow::Result<ChallengeInfo>;

    async fn setting_info(&self, proof: &Address) -> anyhow::Result<SettingsRecord>;

    async fn verify_info(&self, proof: &Address) -> anyhow::Result<VerifyInfo>;

    async fn profit_info(&self, proof: &Address) -> anyhow::Result<ProfitInfo>;

    /// Current counter of the authorization contract.
    async fn auth_nonce(&self, auth: &Address) -> anyhow::Result<U256>;

    async fn token_balance(&self, token: &Address, owner: &Address) -> anyhow::Result<U256>;

    /// Verification key currently stored by the proof contract.
    async fn vk(&self, proof: &Address) -> anyhow::Result<G2Limbs>;

    async fn events(&self, filter: &EventFilter) -> anyhow::Result<Vec<ChainEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ids_are_distinct() {
        let kinds = [
            InstanceKind::FileProof,
            InstanceKind::FileProofProxy,
            InstanceKind::FileProofControl,
            InstanceKind::Auth,
            InstanceKind::Erc20,
        ];
        let ids: std::collections::HashSet<u8> = kinds.iter().map(|k| k.registry_id()).collect();
        assert_eq!(ids.len(), kinds.len());
    }

    #[test]
    fn test_call_names() {
        assert_eq!(ContractCall::GenerateRnd.name(), "GenerateRnd");
        assert_eq!(ContractCall::DoChallenge { index: 3 }.name(), "Challenge");
        assert_eq!(
            ContractCall::OneStepProve {
                commitments: Vec::new()
            }
            .name(),
            "OneStepProve"
        );
    }

    #[test]
    fn test_event_accessors() {
        let event = ChainEvent::ChallengeResult {
            block_number: 42,
            challenger: Address([1; 20]),
            winner: Address([2; 20]),
        };
        assert_eq!(event.kind(), EventKind::ChallengeResult);
        assert_eq!(event.block_number(), 42);
    }
}

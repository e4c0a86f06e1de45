//! In-memory ledger for tests.
//!
//! Holds contract state behind a mutex, records every submitted call and
//! replays a scripted sequence of receipt lookups. Once the script is empty,
//! every lookup returns a successful receipt. Submissions can also advance
//! the challenge record, standing in for the contract's own transitions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use common::{
    Address, ChallengeInfo, ProfitInfo, SettingInfo, SettingsRecord, TxHash, U256, VerifyInfo,
};
use pos_kzg::codec::G2Limbs;

use crate::ledger::{ChainEvent, ContractCall, EventFilter, InstanceKind, Ledger, Receipt};

/// One scripted receipt lookup.
#[derive(Clone, Debug)]
pub enum ReceiptStep {
    Missing,
    Error,
    Ready(Receipt),
}

#[derive(Debug, Default)]
struct MockState {
    account: Address,
    instances: HashMap<InstanceKind, Address>,
    receipts: VecDeque<ReceiptStep>,
    receipt_calls: u32,
    revert_data: Option<Vec<u8>>,
    submitted: Vec<(Address, ContractCall)>,
    challenge: ChallengeInfo,
    settings: Option<SettingsRecord>,
    verify: VerifyInfo,
    profit: ProfitInfo,
    nonce: U256,
    balances: HashMap<(Address, Address), U256>,
    vk: G2Limbs,
    events: Vec<ChainEvent>,
    after_submit: VecDeque<(ChallengeInfo, Option<ChainEvent>)>,
    next_tx: u64,
}

#[derive(Debug, Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl MockLedger {
    /// Ledger with distinct registry addresses for every contract kind.
    pub fn new() -> Self {
        let ledger = Self::default();
        {
            let mut state = ledger.lock();
            state.account = Address([0xee; 20]);
            for kind in [
                InstanceKind::FileProof,
                InstanceKind::FileProofProxy,
                InstanceKind::FileProofControl,
                InstanceKind::Auth,
                InstanceKind::Erc20,
            ] {
                state
                    .instances
                    .insert(kind, Address([kind.registry_id(); 20]));
            }
        }
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn success_receipt() -> Receipt {
        Receipt {
            status: 1,
            gas_used: 50_000,
            cumulative_gas_used: 120_000,
            block_number: 1,
        }
    }

    pub fn set_account(&self, account: Address) {
        self.lock().account = account;
    }

    pub fn instance(&self, kind: InstanceKind) -> Address {
        self.lock().instances.get(&kind).copied().unwrap_or_default()
    }

    pub fn push_receipt(&self, step: ReceiptStep) {
        self.lock().receipts.push_back(step);
    }

    pub fn receipt_calls(&self) -> u32 {
        self.lock().receipt_calls
    }

    pub fn set_revert_data(&self, data: Option<Vec<u8>>) {
        self.lock().revert_data = data;
    }

    pub fn submitted(&self) -> Vec<(Address, ContractCall)> {
        self.lock().submitted.clone()
    }

    pub fn submitted_names(&self) -> Vec<&'static str> {
        self.lock().submitted.iter().map(|(_, c)| c.name()).collect()
    }

    pub fn set_challenge(&self, info: ChallengeInfo) {
        self.lock().challenge = info;
    }

    pub fn set_settings(&self, settings: SettingsRecord) {
        self.lock().settings = Some(settings);
    }

    pub fn set_verify(&self, info: VerifyInfo) {
        self.lock().verify = info;
    }

    pub fn set_profit(&self, info: ProfitInfo) {
        self.lock().profit = info;
    }

    pub fn set_nonce(&self, nonce: U256) {
        self.lock().nonce = nonce;
    }

    pub fn set_balance(&self, token: Address, owner: Address, balance: U256) {
        self.lock().balances.insert((token, owner), balance);
    }

    pub fn set_vk(&self, vk: G2Limbs) {
        self.lock().vk = vk;
    }

    pub fn push_event(&self, event: ChainEvent) {
        self.lock().events.push(event);
    }

    /// Queue the challenge record (and optional event) the next submission
    /// moves the contract to.
    pub fn push_after_submit(&self, challenge: ChallengeInfo, event: Option<ChainEvent>) {
        self.lock().after_submit.push_back((challenge, event));
    }
}

#[async_trait]
impl Ledger for MockLedger {
    fn account(&self) -> Address {
        self.lock().account
    }

    async fn submit(&self, to: Address, call: ContractCall) -> anyhow::Result<TxHash> {
        let mut state = self.lock();
        state.next_tx += 1;
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        state.submitted.push((to, call));
        if let Some((challenge, event)) = state.after_submit.pop_front() {
            state.challenge = challenge;
            state.events.extend(event);
        }
        Ok(TxHash(hash))
    }

    async fn receipt(&self, _tx: &TxHash) -> anyhow::Result<Option<Receipt>> {
        let mut state = self.lock();
        state.receipt_calls += 1;
        match state.receipts.pop_front() {
            Some(ReceiptStep::Missing) => Ok(None),
            Some(ReceiptStep::Error) => Err(anyhow::anyhow!("connection reset")),
            Some(ReceiptStep::Ready(receipt)) => Ok(Some(receipt)),
            None => Ok(Some(Self::success_receipt())),
        }
    }

    async fn simulate(&self, _tx: &TxHash) -> anyhow::Result<Vec<u8>> {
        self.lock()
            .revert_data
            .clone()
            .ok_or_else(|| anyhow::anyhow!("replay failed"))
    }

    async fn instance_address(&self, kind: InstanceKind) -> anyhow::Result<Address> {
        self.lock()
            .instances
            .get(&kind)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no instance registered for {:?}", kind))
    }

    async fn challenge_info(&self, _proof: &Address) -> anyhow::Result<ChallengeInfo> {
        Ok(self.lock().challenge.clone())
    }

    async fn setting_info(&self, _proof: &Address) -> anyhow::Result<SettingsRecord> {
        Ok(self
            .lock()
            .settings
            .clone()
            .unwrap_or_else(|| SettingsRecord::Current(SettingInfo::default())))
    }

    async fn verify_info(&self, _proof: &Address) -> anyhow::Result<VerifyInfo> {
        Ok(self.lock().verify.clone())
    }

    async fn profit_info(&self, _proof: &Address) -> anyhow::Result<ProfitInfo> {
        Ok(self.lock().profit.clone())
    }

    async fn auth_nonce(&self, _auth: &Address) -> anyhow::Result<U256> {
        Ok(self.lock().nonce)
    }

    async fn token_balance(&self, token: &Address, owner: &Address) -> anyhow::Result<U256> {
        Ok(self
            .lock()
            .balances
            .get(&(*token, *owner))
            .copied()
            .unwrap_or_default())
    }

    async fn vk(&self, _proof: &Address) -> anyhow::Result<G2Limbs> {
        Ok(self.lock().vk)
    }

    async fn events(&self, filter: &EventFilter) -> anyhow::Result<Vec<ChainEvent>> {
        let from = filter.from_block.unwrap_or(0);
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| filter.kinds.contains(&e.kind()) && e.block_number() >= from)
            .cloned()
            .collect())
    }
}

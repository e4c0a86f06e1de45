//! Contract client for holders, challengers and administrators.
//!
//! Every mutating operation follows the same path:
//!
//! ```text
//! local checks → encode arguments → Ledger::submit → confirm() → Ok(tx) | SubmitError
//! ```
//!
//! Reads go straight to the ledger and are never cached; on-chain state is
//! the only source of truth for challenge progress.

use std::sync::Arc;

use common::{
    Address, AlterSettingInfo, ChallengeInfo, Hash, ProfitInfo, SettingChangeAuthorization,
    SettingInfo, SettingsRecord, Signature, TxHash, U256, VerifyInfo, credential_hash,
    setting_change_hash, verify_authorization, verify_credential,
};
use pos_kzg::codec::{decode_g2, encode_g1, encode_g2, scalar_from_be_bytes_mod_order};
use pos_kzg::config::{Fr, G1Affine, G2Affine};
use pos_kzg::{OpeningProof, ProofInfo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SubmitterConfig;
use crate::confirm::{ConfirmConfig, confirm};
use crate::error::{Result, SubmitError};
use crate::ledger::{
    CHALLENGE_FAN_OUT, ChainEvent, ContractAddresses, ContractCall, EventFilter, EventKind,
    InstanceKind, Ledger,
};

/// Client bound to one deployment of the file-proof contracts.
pub struct ProofClient<L: Ledger + ?Sized> {
    ledger: Arc<L>,
    addresses: ContractAddresses,
    confirm: ConfirmConfig,
    cancel: CancellationToken,
    authorized_signers: Vec<Address>,
}

impl<L: Ledger + ?Sized> Clone for ProofClient<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            addresses: self.addresses,
            confirm: self.confirm,
            cancel: self.cancel.clone(),
            authorized_signers: self.authorized_signers.clone(),
        }
    }
}

impl<L: Ledger + ?Sized> ProofClient<L> {
    /// Connect with the confirmation schedule and signer set from `config`.
    pub async fn from_config(
        ledger: Arc<L>,
        config: &SubmitterConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let client = Self::connect(ledger, config.confirm_config(), cancel).await?;
        Ok(client.with_authorized_signers(config.authorized_signers.clone()))
    }

    /// Resolve contract addresses through the instance registry.
    pub async fn connect(
        ledger: Arc<L>,
        confirm: ConfirmConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let resolve = |kind: InstanceKind| {
            let ledger = Arc::clone(&ledger);
            async move {
                ledger
                    .instance_address(kind)
                    .await
                    .map_err(|e| SubmitError::ledger("ResolveInstance", e))
            }
        };

        let addresses = ContractAddresses {
            proof: resolve(InstanceKind::FileProofProxy).await?,
            controller: resolve(InstanceKind::FileProofControl).await?,
            token: resolve(InstanceKind::Erc20).await?,
            auth: resolve(InstanceKind::Auth).await?,
        };
        info!(
            proof = %addresses.proof,
            controller = %addresses.controller,
            token = %addresses.token,
            auth = %addresses.auth,
            "Resolved contract instances"
        );

        Ok(Self::with_addresses(ledger, addresses, confirm, cancel))
    }

    pub fn with_addresses(
        ledger: Arc<L>,
        addresses: ContractAddresses,
        confirm: ConfirmConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ledger,
            addresses,
            confirm,
            cancel,
            authorized_signers: Vec::new(),
        }
    }

    /// Keys whose signatures [`alter_setting`](Self::alter_setting) accepts.
    pub fn with_authorized_signers(mut self, signers: Vec<Address>) -> Self {
        self.authorized_signers = signers;
        self
    }

    pub fn authorized_signers(&self) -> &[Address] {
        &self.authorized_signers
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    /// Account signing this client's transactions.
    pub fn account(&self) -> Address {
        self.ledger.account()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Submit a call to the proof contract and wait for its outcome.
    async fn execute(&self, call: ContractCall) -> Result<TxHash> {
        let action = call.name();
        let tx = self
            .ledger
            .submit(self.addresses.proof, call)
            .await
            .map_err(|e| SubmitError::ledger(action, e))?;
        info!(action, tx = %tx, "Transaction submitted");

        confirm(&*self.ledger, &tx, action, &self.confirm, &self.cancel)
            .await
            .into_result(action, &tx)?;
        Ok(tx)
    }

    // ========================================================================
    // Holder Operations
    // ========================================================================

    /// Register a committed file.
    ///
    /// The credential is checked locally against the configured submitter
    /// before anything is sent.
    pub async fn add_file(
        &self,
        commitment: &G1Affine,
        size: u64,
        start: U256,
        end: U256,
        credential: &Signature,
    ) -> Result<TxHash> {
        let settings = self.settings().await?.into_current();
        let hash = credential_hash(
            &self.addresses.proof,
            &self.account(),
            commitment,
            size,
            &start,
            &end,
        );
        verify_credential(&hash, credential, &settings.submitter)?;

        self.execute(ContractCall::AddFile {
            commitment: encode_g1(commitment),
            size,
            start,
            end,
            credential: *credential,
        })
        .await
    }

    /// Ask the contract to draw a new challenge point.
    pub async fn generate_rnd(&self) -> Result<TxHash> {
        self.execute(ContractCall::GenerateRnd).await
    }

    /// Submit an aggregate opening at the current challenge point.
    pub async fn submit_proof(
        &self,
        rnd: &U256,
        commitment: &G1Affine,
        proof: &OpeningProof,
    ) -> Result<TxHash> {
        self.execute(ContractCall::SubmitProof {
            rnd: rnd.0,
            commitment: encode_g1(commitment),
            proof: ProofInfo::from_opening(proof),
        })
        .await
    }

    /// Answer a challenge round with one aggregate commitment per sub-range.
    pub async fn response_challenge(
        &self,
        commitments: &[G1Affine; CHALLENGE_FAN_OUT],
    ) -> Result<TxHash> {
        self.execute(ContractCall::ResponseChallenge {
            commitments: commitments.map(|c| encode_g1(&c)),
        })
        .await
    }

    /// Reveal the individual commitments of the final disputed range.
    pub async fn one_step_prove(&self, commitments: &[G1Affine]) -> Result<TxHash> {
        self.execute(ContractCall::OneStepProve {
            commitments: commitments.iter().map(encode_g1).collect(),
        })
        .await
    }

    pub async fn withdraw_missed_profit(&self) -> Result<TxHash> {
        self.execute(ContractCall::WithdrawMissedProfit).await
    }

    // ========================================================================
    // Challenger Operations
    // ========================================================================

    /// Open a challenge or pick the sub-range to dispute in the current round.
    pub async fn do_challenge(&self, index: u8) -> Result<TxHash> {
        self.execute(ContractCall::DoChallenge { index }).await
    }

    /// Claim victory after the counterparty missed its deadline.
    pub async fn end_challenge(&self) -> Result<TxHash> {
        self.execute(ContractCall::EndChallenge).await
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Build the hash the authorized keys must sign, at the current nonce.
    pub async fn setting_change_request(
        &self,
        setting: &SettingInfo,
        vk: &G2Affine,
    ) -> Result<(Hash, U256)> {
        let nonce = self.auth_nonce().await?;
        let hash = setting_change_hash(
            &self.addresses.controller,
            &self.addresses.auth,
            setting,
            vk,
            &nonce,
        );
        debug!(nonce = %nonce, "Built setting change hash");
        Ok((hash, nonce))
    }

    /// Submit a setting change signed by all five authorized keys.
    ///
    /// The nonce and the client's authorized signer set are checked locally
    /// first, so a stale or incomplete authorization never reaches the chain.
    pub async fn alter_setting(
        &self,
        setting: &SettingInfo,
        vk: &G2Affine,
        authorization: &SettingChangeAuthorization,
    ) -> Result<TxHash> {
        let (hash, nonce) = self.setting_change_request(setting, vk).await?;
        authorization.check_nonce(&nonce)?;
        verify_authorization(&hash, authorization, &self.authorized_signers)?;

        self.execute(ContractCall::AlterSetting {
            info: AlterSettingInfo {
                setting: setting.clone(),
                vk: encode_g2(vk),
            },
            signatures: authorization.signatures.clone(),
        })
        .await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn verify_info(&self) -> Result<VerifyInfo> {
        self.ledger
            .verify_info(&self.addresses.proof)
            .await
            .map_err(|e| SubmitError::ledger("GetVerifyInfo", e))
    }

    /// Current opening point, reduced modulo r like the contract does.
    pub async fn challenge_point(&self) -> Result<(Fr, VerifyInfo)> {
        let info = self.verify_info().await?;
        Ok((scalar_from_be_bytes_mod_order(&info.rnd.0), info))
    }

    pub async fn profit_info(&self) -> Result<ProfitInfo> {
        self.ledger
            .profit_info(&self.addresses.proof)
            .await
            .map_err(|e| SubmitError::ledger("GetProfitInfo", e))
    }

    pub async fn challenge_info(&self) -> Result<ChallengeInfo> {
        self.ledger
            .challenge_info(&self.addresses.proof)
            .await
            .map_err(|e| SubmitError::ledger("GetChallengeInfo", e))
    }

    pub async fn settings(&self) -> Result<SettingsRecord> {
        self.ledger
            .setting_info(&self.addresses.proof)
            .await
            .map_err(|e| SubmitError::ledger("GetSettingInfo", e))
    }

    pub async fn auth_nonce(&self) -> Result<U256> {
        self.ledger
            .auth_nonce(&self.addresses.auth)
            .await
            .map_err(|e| SubmitError::ledger("GetNonce", e))
    }

    /// Pledge-token balance of `owner`.
    pub async fn token_balance(&self, owner: &Address) -> Result<U256> {
        self.ledger
            .token_balance(&self.addresses.token, owner)
            .await
            .map_err(|e| SubmitError::ledger("BalanceOf", e))
    }

    /// Verification key stored by the proof contract.
    pub async fn verifying_key(&self) -> Result<G2Affine> {
        let limbs = self
            .ledger
            .vk(&self.addresses.proof)
            .await
            .map_err(|e| SubmitError::ledger("GetVk", e))?;
        Ok(decode_g2(&limbs)?)
    }

    /// Block and winner of the most recent challenge-result event at or
    /// after `from_block`.
    pub async fn challenge_result(
        &self,
        from_block: Option<u64>,
    ) -> Result<Option<(u64, Address)>> {
        let filter = EventFilter {
            address: self.addresses.proof,
            kinds: vec![EventKind::ChallengeResult],
            from_block,
        };
        let events = self
            .ledger
            .events(&filter)
            .await
            .map_err(|e| SubmitError::ledger("FilterChallengeResult", e))?;

        Ok(events
            .iter()
            .filter_map(|event| match event {
                ChainEvent::ChallengeResult {
                    block_number,
                    winner,
                    ..
                } => Some((*block_number, *winner)),
                _ => None,
            })
            .max_by_key(|(block, _)| *block))
    }
}

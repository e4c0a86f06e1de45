//! Multi-signature authorization of protocol setting changes.
//!
//! Changing the proof settings requires signatures from all five members of
//! the authorization contract over a two-stage hash:
//!
//! ```text
//! inner = keccak(controller ‖ "alterFileProofSetting" ‖ interval(4) ‖ period(4)
//!                ‖ chal_sum(4) ‖ respond_time(4) ‖ price(8) ‖ submitter ‖ receiver
//!                ‖ foundation ‖ chal_reward_ratio(1) ‖ chal_pledge(32) ‖ vk(256))
//! outer = keccak(auth ‖ nonce(32) ‖ "perm" ‖ inner)
//! ```
//!
//! The nonce is the authorization contract's counter, which advances after
//! every accepted change, so a signature set is only valid once.

use k256::ecdsa::SigningKey;
use pos_kzg::codec::encode_appended_g2;
use pos_kzg::config::G2Affine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credential::{recover_signer, sign_hash};
use crate::keccak::keccak256_concat;
use crate::settings::SettingInfo;
use crate::{Address, AuthError, Hash, Result, Signature, U256};

/// Number of distinct signers needed to change settings.
pub const REQUIRED_SIGNATURES: usize = 5;

const SETTING_DOMAIN: &[u8] = b"alterFileProofSetting";
const PERMISSION_DOMAIN: &[u8] = b"perm";

/// Build the hash the five authorized keys must sign.
pub fn setting_change_hash(
    controller: &Address,
    auth: &Address,
    setting: &SettingInfo,
    vk: &G2Affine,
    nonce: &U256,
) -> Hash {
    let vk_bytes = encode_appended_g2(vk);
    let inner = keccak256_concat(&[
        controller.as_bytes(),
        SETTING_DOMAIN,
        &setting.interval.to_be_bytes(),
        &setting.period.to_be_bytes(),
        &setting.chal_sum.to_be_bytes(),
        &setting.respond_time.to_be_bytes(),
        &setting.price.to_be_bytes(),
        setting.submitter.as_bytes(),
        setting.receiver.as_bytes(),
        setting.foundation.as_bytes(),
        &[setting.chal_reward_ratio],
        setting.chal_pledge.as_bytes(),
        &vk_bytes,
    ]);

    keccak256_concat(&[auth.as_bytes(), nonce.as_bytes(), PERMISSION_DOMAIN, &inner])
}

/// Signatures over a setting-change hash, bound to the nonce they used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingChangeAuthorization {
    #[serde(with = "hex::serde")]
    pub hash: Hash,
    pub nonce: U256,
    pub signatures: Vec<Signature>,
}

impl SettingChangeAuthorization {
    /// Sign `hash` with all five keys, in order.
    pub fn sign(
        hash: Hash,
        nonce: U256,
        keys: [&SigningKey; REQUIRED_SIGNATURES],
    ) -> Result<Self> {
        let signatures = keys
            .iter()
            .map(|key| sign_hash(key, &hash))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            hash,
            nonce,
            signatures,
        })
    }

    /// Fail if the chain's authorization counter has moved since signing.
    pub fn check_nonce(&self, current: &U256) -> Result<()> {
        if self.nonce != *current {
            warn!(signed = %self.nonce, current = %current, "Authorization nonce is stale");
            return Err(AuthError::StaleNonce {
                signed: self.nonce,
                current: *current,
            });
        }
        Ok(())
    }
}

/// Check that exactly five signatures recover to five distinct members of
/// `authorized`.
///
/// `hash` is the freshly recomputed setting-change hash; the authorization
/// must have been built over the same value. Returns the recovered signers in
/// signature order.
pub fn verify_authorization(
    hash: &Hash,
    auth: &SettingChangeAuthorization,
    authorized: &[Address],
) -> Result<[Address; REQUIRED_SIGNATURES]> {
    if auth.hash != *hash {
        return Err(AuthError::HashMismatch {
            expected: hex::encode(hash),
            signed: hex::encode(auth.hash),
        });
    }
    if auth.signatures.len() != REQUIRED_SIGNATURES {
        return Err(AuthError::SignatureCount {
            count: auth.signatures.len(),
            required: REQUIRED_SIGNATURES,
        });
    }

    let mut signers: Vec<Address> = Vec::with_capacity(REQUIRED_SIGNATURES);

    for (index, signature) in auth.signatures.iter().enumerate() {
        match recover_signer(hash, signature.as_bytes()) {
            Ok(signer) if !authorized.contains(&signer) => {
                debug!(index, %signer, "Signer is not in the authorized set");
            }
            Ok(signer) if signers.contains(&signer) => {
                debug!(index, %signer, "Repeated signer");
            }
            Ok(signer) => signers.push(signer),
            Err(e) => {
                debug!(index, error = %e, "Skipping unrecoverable signature");
            }
        }
    }

    let valid = signers.len();
    signers
        .try_into()
        .map_err(|_| AuthError::InsufficientAuthorization {
            valid,
            required: REQUIRED_SIGNATURES,
        })
}

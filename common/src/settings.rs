//! Views of the file-proof contract state.
//!
//! The settings record has changed shape over the life of the contract, so it
//! is modelled as a versioned enum. Older deployments return the legacy shape,
//! which upgrades into the current one with the newer fields unset.

use pos_kzg::codec::G2Limbs;
use serde::{Deserialize, Serialize};

use crate::{Address, U256};

/// Current protocol settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingInfo {
    /// Seconds between proof windows
    pub interval: u32,
    /// Length of the proof window in seconds
    pub period: u32,
    /// Number of challenges allowed per cycle
    pub chal_sum: u32,
    /// Seconds each party has to act in a challenge round
    pub respond_time: u32,
    /// Storage price per byte
    pub price: u64,
    /// Address allowed to submit proofs
    pub submitter: Address,
    /// Address receiving storage rewards
    pub receiver: Address,
    /// Foundation address receiving forfeited pledges
    pub foundation: Address,
    /// Percentage of a forfeited pledge paid to a winning challenger
    pub chal_reward_ratio: u8,
    /// Token amount a challenger must lock to open a challenge
    pub chal_pledge: U256,
}

/// Settings as returned by deployments that predate pledged challenges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySettingInfo {
    pub interval: u32,
    pub period: u32,
    pub chal_sum: u32,
    pub respond_time: u32,
    pub price: u64,
    pub submitter: Address,
    pub receiver: Address,
}

impl From<LegacySettingInfo> for SettingInfo {
    fn from(legacy: LegacySettingInfo) -> Self {
        Self {
            interval: legacy.interval,
            period: legacy.period,
            chal_sum: legacy.chal_sum,
            respond_time: legacy.respond_time,
            price: legacy.price,
            submitter: legacy.submitter,
            receiver: legacy.receiver,
            foundation: Address::ZERO,
            chal_reward_ratio: 0,
            chal_pledge: U256::ZERO,
        }
    }
}

/// Settings record tagged with the schema version it was read as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "snake_case")]
pub enum SettingsRecord {
    Legacy(LegacySettingInfo),
    Current(SettingInfo),
}

impl SettingsRecord {
    /// Normalize to the current schema.
    pub fn into_current(self) -> SettingInfo {
        match self {
            SettingsRecord::Legacy(legacy) => legacy.into(),
            SettingsRecord::Current(info) => info,
        }
    }

    pub fn respond_time(&self) -> u32 {
        match self {
            SettingsRecord::Legacy(legacy) => legacy.respond_time,
            SettingsRecord::Current(info) => info.respond_time,
        }
    }

    /// `(interval, period)` for proof window timing.
    pub fn window(&self) -> (u32, u32) {
        match self {
            SettingsRecord::Legacy(legacy) => (legacy.interval, legacy.period),
            SettingsRecord::Current(info) => (info.interval, info.period),
        }
    }
}

/// Settings change request as submitted to the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterSettingInfo {
    #[serde(flatten)]
    pub setting: SettingInfo,
    /// New verification key `[τ]H` in limb layout
    pub vk: G2Limbs,
}

/// Raw challenge record.
///
/// `status` encodes the round: odd values wait on the holder, even non-zero
/// values wait on the challenger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeInfo {
    pub status: u8,
    pub challenger: Address,
    /// Sub-range picked by the challenger in the last commitment round
    pub chal_index: u8,
    /// First file index of the disputed range
    pub start_index: u64,
    /// Number of files in the disputed range
    pub chal_length: u64,
}

/// Current proof challenge point and cycle anchor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyInfo {
    /// 32-byte random value, reduced modulo r to get the opening point
    pub rnd: U256,
    /// Unix time the current cycle or challenge round started
    pub last: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitInfo {
    pub pending_profit: U256,
    pub missed_profit: U256,
    pub final_expire: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> LegacySettingInfo {
        LegacySettingInfo {
            interval: 3600,
            period: 600,
            chal_sum: 3,
            respond_time: 30,
            price: 10,
            submitter: Address([1; 20]),
            receiver: Address([2; 20]),
        }
    }

    #[test]
    fn test_legacy_upgrade() {
        let current = SettingsRecord::Legacy(legacy()).into_current();
        assert_eq!(current.respond_time, 30);
        assert_eq!(current.submitter, Address([1; 20]));
        assert!(current.foundation.is_zero());
        assert!(current.chal_pledge.is_zero());
    }

    #[test]
    fn test_record_accessors() {
        let record = SettingsRecord::Legacy(legacy());
        assert_eq!(record.respond_time(), 30);
        assert_eq!(record.window(), (3600, 600));
    }

    #[test]
    fn test_record_tagged_json() {
        let record = SettingsRecord::Current(SettingInfo {
            respond_time: 45,
            ..Default::default()
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["version"], "current");
        assert_eq!(json["respond_time"], 45);

        let back: SettingsRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}

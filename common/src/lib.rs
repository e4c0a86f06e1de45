//! Common types and authorization primitives for the file-proof client.
//!
//! This crate provides functionality shared by the submitter, the warden and
//! the operator tools:
//! - **Fixed-width types**: `Address`, `U256`, `TxHash`, recoverable
//!   `Signature`, all hex-encoded in text and JSON
//! - **Keccak hashing**: EVM-compatible `keccak256`
//! - **Credentials**: the single-signer storage credential binding a file
//!   commitment to a verifier and a validity window
//! - **Setting-change authorization**: the nonce-bound 5-of-5 multi-signature
//!   over a full settings record
//! - **Contract state views**: settings, challenge, verify and profit records
//!
//! # Hash Preimages
//!
//! Every preimage is a plain concatenation of fixed-width big-endian fields,
//! with no delimiters and no length prefixes:
//!
//! ```text
//! credential:  verifier(20) ‖ signer(20) ‖ G1(128) ‖ size(8) ‖ start(32) ‖ end(32)
//! setting:     keccak(auth(20) ‖ nonce(32) ‖ "perm" ‖ keccak(controller ‖ "alterFileProofSetting" ‖ fields ‖ G2(256)))
//! ```

pub mod authorization;
pub mod credential;
pub mod error;
pub mod keccak;
pub mod settings;

pub use authorization::{
    REQUIRED_SIGNATURES, SettingChangeAuthorization, setting_change_hash, verify_authorization,
};
pub use credential::{address_of, credential_hash, recover_signer, sign_hash, verify_credential};
pub use error::{AuthError, Result};
pub use keccak::{keccak256, keccak256_concat};
pub use settings::{
    AlterSettingInfo, ChallengeInfo, LegacySettingInfo, ProfitInfo, SettingInfo, SettingsRecord,
    VerifyInfo,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 32-byte Keccak digest.
pub type Hash = [u8; 32];

// ============================================================================
// Fixed-width Types
// ============================================================================

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;
            pub const ZERO: Self = Self([0u8; $len]);

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Copy from a slice of exactly the right width.
            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| {
                    AuthError::InvalidEncoding(format!(
                        "{} must be {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(arr))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = AuthError;

            fn from_str(s: &str) -> Result<Self> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(digits)
                    .map_err(|e| AuthError::InvalidEncoding(format!("{}: {}", stringify!($name), e)))?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// 20-byte account or contract address.
    Address,
    20
);

fixed_bytes!(
    /// 256-bit unsigned integer stored big-endian, as the contract sees it.
    U256,
    32
);

fixed_bytes!(
    /// Recoverable secp256k1 signature laid out as `r ‖ s ‖ v`.
    Signature,
    65
);

fixed_bytes!(
    /// Hash identifying a submitted transaction.
    TxHash,
    32
);

impl U256 {
    pub fn from_u64(value: u64) -> Self {
        let mut out = [0u8; 32];
        out[24..].copy_from_slice(&value.to_be_bytes());
        Self(out)
    }

    /// Narrow to u64 if the value fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(low))
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

/// Get current Unix timestamp in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

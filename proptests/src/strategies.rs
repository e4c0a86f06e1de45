//! Shared proptest strategies for property-based testing.
//!
//! This module provides reusable strategies for generating:
//! - Curve points from random scalars
//! - Blobs and packer windows
//! - secp256k1 signing keys
//! - Challenge records

use ark_ec::{CurveGroup, PrimeGroup};
use common::{Address, ChallengeInfo};
use k256::ecdsa::SigningKey;
use pos_kzg::Srs;
use pos_kzg::config::{Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use proptest::prelude::*;
use std::sync::OnceLock;

/// Largest blob the commitment properties use.
pub const MAX_BLOB: usize = 2_000;

/// Shared development SRS, large enough for [`MAX_BLOB`].
pub fn test_srs() -> &'static Srs {
    static SRS: OnceLock<Srs> = OnceLock::new();
    SRS.get_or_init(|| {
        Srs::insecure(pos_kzg::element_count(MAX_BLOB) + 1, 985).expect("SRS generation")
    })
}

/// Generate a scalar from 32 random bytes.
pub fn scalar_strategy() -> impl Strategy<Value = Fr> {
    prop::array::uniform32(any::<u8>())
        .prop_map(|bytes| pos_kzg::codec::scalar_from_be_bytes_mod_order(&bytes))
}

/// Generate a G1 point, including the identity.
pub fn g1_strategy() -> impl Strategy<Value = G1Affine> {
    prop_oneof![
        1 => Just(G1Affine::identity()),
        15 => scalar_strategy().prop_map(|s| (G1Projective::generator() * s).into_affine()),
    ]
}

/// Generate a G2 point, including the identity.
pub fn g2_strategy() -> impl Strategy<Value = G2Affine> {
    prop_oneof![
        1 => Just(G2Affine::identity()),
        15 => scalar_strategy().prop_map(|s| (G2Projective::generator() * s).into_affine()),
    ]
}

/// Generate random blob data within a size range.
pub fn blob_strategy(min_size: usize, max_size: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), min_size..=max_size)
}

/// Generate one full 127-byte packer window.
pub fn window_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), pos_kzg::SHARD_LEN)
}

/// Generate a valid secp256k1 signing key.
pub fn signing_key_strategy() -> impl Strategy<Value = SigningKey> {
    prop::array::uniform32(any::<u8>())
        .prop_filter_map("not a valid secp256k1 scalar", |bytes| {
            SigningKey::from_slice(&bytes).ok()
        })
}

/// Generate `count` signing keys with distinct addresses.
pub fn distinct_keys_strategy(count: usize) -> impl Strategy<Value = Vec<SigningKey>> {
    prop::collection::vec(signing_key_strategy(), count).prop_filter(
        "signing keys must be distinct",
        |keys| {
            let addrs: std::collections::HashSet<Address> = keys
                .iter()
                .map(|k| common::address_of(k.verifying_key()))
                .collect();
            addrs.len() == keys.len()
        },
    )
}

pub fn address_strategy() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address)
}

/// Generate an in-progress challenge record (status 1..=254).
pub fn active_challenge_strategy() -> impl Strategy<Value = ChallengeInfo> {
    (
        1u8..=254,
        address_strategy(),
        0u8..10,
        0u64..1_000_000,
        1u64..100_000,
    )
        .prop_map(
            |(status, challenger, chal_index, start_index, chal_length)| ChallengeInfo {
                status,
                challenger,
                chal_index,
                start_index,
                chal_length,
            },
        )
}

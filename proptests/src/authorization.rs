//! Property-based tests for credentials and setting-change authorization.
//!
//! Tests the following invariants:
//! - A signature recovers to the signing key's address
//! - Credentials verify only against their signer
//! - Five distinct authorized signers are accepted
//! - An outsider or a repeated signer is rejected

use crate::strategies::*;
use common::{
    AuthError, SettingChangeAuthorization, SettingInfo, U256, address_of, credential_hash,
    recover_signer, setting_change_hash, sign_hash, verify_authorization, verify_credential,
};
use k256::ecdsa::SigningKey;
use proptest::prelude::*;

fn five(keys: &[SigningKey]) -> [&SigningKey; 5] {
    [&keys[0], &keys[1], &keys[2], &keys[3], &keys[4]]
}

fn hash_for(nonce: u64, interval: u32) -> common::Hash {
    let setting = SettingInfo {
        interval,
        period: 120,
        respond_time: 120,
        ..SettingInfo::default()
    };
    setting_change_hash(
        &common::Address([0x11; 20]),
        &common::Address([0x22; 20]),
        &setting,
        &test_srs().verifying_key(),
        &U256::from(nonce),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// recover(sign(k, h)) == address(k)
    #[test]
    fn prop_sign_recover(key in signing_key_strategy(), hash in prop::array::uniform32(any::<u8>())) {
        let signature = sign_hash(&key, &hash).expect("sign");
        let signer = recover_signer(&hash, signature.as_bytes()).expect("recover");
        prop_assert_eq!(signer, address_of(key.verifying_key()));
    }

    /// A credential verifies for its signer and fails for anyone else.
    #[test]
    fn prop_credential_bound_to_signer(
        key in signing_key_strategy(),
        other in address_strategy(),
        commitment in g1_strategy(),
        size in 1u64..1 << 40,
    ) {
        let signer = address_of(key.verifying_key());
        prop_assume!(other != signer);

        let hash = credential_hash(
            &common::Address([0x33; 20]),
            &signer,
            &commitment,
            size,
            &U256::from(0u64),
            &U256::from(1_000u64),
        );
        let signature = sign_hash(&key, &hash).expect("sign");
        prop_assert!(verify_credential(&hash, &signature, &signer).is_ok());
        prop_assert!(verify_credential(&hash, &signature, &other).is_err());
    }

    /// Five distinct authorized signers produce a valid authorization.
    #[test]
    fn prop_five_distinct_signers_accepted(
        keys in distinct_keys_strategy(5),
        nonce in any::<u64>(),
        interval in 1u32..10_000,
    ) {
        let authorized: Vec<_> = keys.iter().map(|k| address_of(k.verifying_key())).collect();
        let hash = hash_for(nonce, interval);
        let auth = SettingChangeAuthorization::sign(hash, U256::from(nonce), five(&keys))
            .expect("sign");

        let signers = verify_authorization(&hash, &auth, &authorized).expect("verify");
        prop_assert_eq!(signers.to_vec(), authorized);
        prop_assert!(auth.check_nonce(&U256::from(nonce)).is_ok());
        prop_assert!(auth.check_nonce(&U256::from(nonce.wrapping_add(1))).is_err());
    }

    /// One signer outside the authorized set fails the whole authorization.
    #[test]
    fn prop_outsider_rejected(keys in distinct_keys_strategy(6), nonce in any::<u64>()) {
        let authorized: Vec<_> = keys[..5].iter().map(|k| address_of(k.verifying_key())).collect();
        let hash = hash_for(nonce, 480);
        let signing = [&keys[0], &keys[1], &keys[2], &keys[3], &keys[5]];
        let auth = SettingChangeAuthorization::sign(hash, U256::from(nonce), signing)
            .expect("sign");

        let result = verify_authorization(&hash, &auth, &authorized);
        prop_assert!(
            matches!(result, Err(AuthError::InsufficientAuthorization { valid: 4, .. })),
            "expected rejection, got {:?}",
            result
        );
    }

    /// The same key signing twice counts once.
    #[test]
    fn prop_repeated_signer_rejected(keys in distinct_keys_strategy(5), nonce in any::<u64>()) {
        let authorized: Vec<_> = keys.iter().map(|k| address_of(k.verifying_key())).collect();
        let hash = hash_for(nonce, 480);
        let signing = [&keys[0], &keys[1], &keys[2], &keys[3], &keys[0]];
        let auth = SettingChangeAuthorization::sign(hash, U256::from(nonce), signing)
            .expect("sign");

        prop_assert!(verify_authorization(&hash, &auth, &authorized).is_err());
    }

    /// Signatures over one nonce do not authorize another.
    #[test]
    fn prop_signatures_bound_to_nonce(keys in distinct_keys_strategy(5), nonce in any::<u64>()) {
        let authorized: Vec<_> = keys.iter().map(|k| address_of(k.verifying_key())).collect();
        let hash = hash_for(nonce, 480);
        let auth = SettingChangeAuthorization::sign(hash, U256::from(nonce), five(&keys))
            .expect("sign");

        let moved = hash_for(nonce.wrapping_add(1), 480);
        prop_assert!(verify_authorization(&moved, &auth, &authorized).is_err());
    }
}

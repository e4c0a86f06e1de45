//! Property-based tests for the curve point codec.
//!
//! Tests the following invariants:
//! - G1 and G2 limb encodings round-trip for every point
//! - The high 16 bytes of every hi limb are zero
//! - The appended layout is the limb layout with each coordinate left-padded
//! - Decoding arbitrary bytes never panics

use crate::strategies::*;
use pos_kzg::codec::{
    decode_g1, decode_g1_bytes, decode_g2, decode_g2_bytes, encode_appended_g1, encode_g1,
    encode_g2,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// decode_g1(encode_g1(p)) == p
    #[test]
    fn prop_g1_round_trip(point in g1_strategy()) {
        let limbs = encode_g1(&point);
        prop_assert_eq!(decode_g1(&limbs).expect("decode"), point);
        prop_assert_eq!(decode_g1_bytes(&limbs.concat()).expect("decode bytes"), point);
    }

    /// decode_g2(encode_g2(p)) == p
    #[test]
    fn prop_g2_round_trip(point in g2_strategy()) {
        let limbs = encode_g2(&point);
        prop_assert_eq!(decode_g2(&limbs).expect("decode"), point);
        prop_assert_eq!(decode_g2_bytes(&limbs.concat()).expect("decode bytes"), point);
    }

    /// Every hi limb carries only 16 significant bytes.
    #[test]
    fn prop_hi_limbs_have_zero_prefix(g1 in g1_strategy(), g2 in g2_strategy()) {
        for limb in encode_g1(&g1).iter().step_by(2) {
            prop_assert!(limb[..16].iter().all(|b| *b == 0));
        }
        for limb in encode_g2(&g2).iter().step_by(2) {
            prop_assert!(limb[..16].iter().all(|b| *b == 0));
        }
    }

    /// Appended layout: each 64-byte coordinate is 16 zero bytes then hi[16..] ‖ lo.
    #[test]
    fn prop_appended_matches_limbs(point in g1_strategy()) {
        let limbs = encode_g1(&point);
        let appended = encode_appended_g1(&point);
        for coord in 0..2 {
            let chunk = &appended[coord * 64..(coord + 1) * 64];
            prop_assert!(chunk[..16].iter().all(|b| *b == 0));
            prop_assert_eq!(&chunk[16..32], &limbs[2 * coord][16..]);
            prop_assert_eq!(&chunk[32..], &limbs[2 * coord + 1][..]);
        }
    }

    /// Untrusted input is rejected with an error, never a panic.
    #[test]
    fn prop_decode_arbitrary_bytes_does_not_panic(
        bytes in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let _ = decode_g1_bytes(&bytes);
        let _ = decode_g2_bytes(&bytes);
    }
}

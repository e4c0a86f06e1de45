//! Property-based tests for the field-element packer.
//!
//! Tests the following invariants:
//! - len(pack(data)) == 4 * ceil(len(data) / 127)
//! - unpack_window inverts pack_window for every window
//! - Every packed word is below 2^254
//! - unpack(pack(data)) == data whenever every word is below r

use crate::strategies::*;
use pos_kzg::packer::{pack_window, unpack_window};
use pos_kzg::{ELEMENTS_PER_SHARD, SHARD_LEN, element_count, pack, unpack};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Packed length depends only on input length.
    #[test]
    fn prop_pack_length(data in blob_strategy(0, 4_000)) {
        let expected = ELEMENTS_PER_SHARD * data.len().div_ceil(SHARD_LEN);
        prop_assert_eq!(pack(&data).len(), expected);
        prop_assert_eq!(element_count(data.len()), expected);
    }

    /// The window packing is a bijection on 127-byte inputs.
    #[test]
    fn prop_window_round_trip(window in window_strategy()) {
        let words = pack_window(&window);
        prop_assert_eq!(&unpack_window(&words)[..], &window[..]);
    }

    /// The top two bits of every word are clear.
    #[test]
    fn prop_words_fit_254_bits(window in window_strategy()) {
        for word in pack_window(&window) {
            prop_assert_eq!(word[0] & 0xc0, 0);
        }
    }

    /// Field-level round trip for data whose words stay below r.
    ///
    /// Clearing the first byte of each word keeps it under the modulus.
    #[test]
    fn prop_field_round_trip(mut data in blob_strategy(1, 2_000)) {
        for (i, byte) in data.iter_mut().enumerate() {
            if (i % SHARD_LEN) % 32 == 0 && i % SHARD_LEN < 97 {
                *byte = 0;
            }
        }
        let elements = pack(&data);
        prop_assert_eq!(unpack(&elements, data.len()).expect("unpack"), data);
    }
}

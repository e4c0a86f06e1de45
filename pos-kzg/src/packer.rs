//! Packing raw bytes into BLS12-381 scalar field elements.
//!
//! The scalar modulus is just below 2^255, so a raw 32-byte word cannot be
//! used as a field element without losing information. Data is therefore cut
//! into 127-byte windows, and every window is spread over four 32-byte words
//! holding 254 payload bits each (127 * 8 = 4 * 254).
//!
//! Word layout inside a window:
//!
//! ```text
//! word 0: bytes  0..31 verbatim, byte 31 keeps its low 6 bits
//! word 1: bytes 32..64 shifted left by 2, carrying the top bits of the previous byte
//! word 2: bytes 64..96 shifted left by 4
//! word 3: bytes 96..127 shifted left by 6, final carry in the last byte
//! ```
//!
//! The last byte of every word is masked with `0x3f`. Each word is then read
//! as a big-endian integer reduced modulo r, which is what the verifier
//! contract does with the same bytes.

use ark_ff::PrimeField;

use crate::codec::{Limb, encode_scalar};
use crate::config::Fr;
use crate::{ELEMENTS_PER_SHARD, LIMB_LEN, PosError, Result, SHARD_LEN};

/// Mask applied to the boundary byte of every word.
const BOUNDARY_MASK: u8 = 0x3f;

/// Number of scalar field elements produced for `len` input bytes.
pub fn element_count(len: usize) -> usize {
    ELEMENTS_PER_SHARD * len.div_ceil(SHARD_LEN)
}

/// Pack one window into four 32-byte words.
///
/// Input shorter than 127 bytes is zero-padded, longer input is truncated.
pub fn pack_window(input: &[u8]) -> [Limb; ELEMENTS_PER_SHARD] {
    let mut window = [0u8; SHARD_LEN];
    let take = input.len().min(SHARD_LEN);
    window[..take].copy_from_slice(&input[..take]);

    let mut words = [[0u8; LIMB_LEN]; ELEMENTS_PER_SHARD];

    words[0][..31].copy_from_slice(&window[..31]);
    words[0][31] = window[31] & BOUNDARY_MASK;
    let mut carry = window[31] >> 6;

    let mut v = 0u8;
    for i in 0..32 {
        v = window[32 + i];
        words[1][i] = (v << 2) | carry;
        carry = v >> 6;
    }
    words[1][31] &= BOUNDARY_MASK;
    carry = v >> 4;

    for i in 0..32 {
        v = window[64 + i];
        words[2][i] = (v << 4) | carry;
        carry = v >> 4;
    }
    words[2][31] &= BOUNDARY_MASK;
    carry = v >> 2;

    for i in 0..31 {
        v = window[96 + i];
        words[3][i] = (v << 6) | carry;
        carry = v >> 2;
    }
    words[3][31] = carry & BOUNDARY_MASK;

    words
}

/// Inverse of [`pack_window`].
pub fn unpack_window(words: &[Limb; ELEMENTS_PER_SHARD]) -> [u8; SHARD_LEN] {
    let mut out = [0u8; SHARD_LEN];

    out[..31].copy_from_slice(&words[0][..31]);
    out[31] = (words[0][31] & BOUNDARY_MASK) | ((words[1][0] & 0x03) << 6);

    for i in 0..31 {
        out[32 + i] = (words[1][i] >> 2) | ((words[1][i + 1] & 0x03) << 6);
    }
    out[63] = ((words[1][31] >> 2) & 0x0f) | ((words[2][0] & 0x0f) << 4);

    for i in 0..31 {
        out[64 + i] = (words[2][i] >> 4) | ((words[2][i + 1] & 0x0f) << 4);
    }
    out[95] = ((words[2][31] >> 4) & 0x03) | ((words[3][0] & BOUNDARY_MASK) << 2);

    for i in 0..31 {
        out[96 + i] = (words[3][i] >> 6) | ((words[3][i + 1] & BOUNDARY_MASK) << 2);
    }

    out
}

/// Pack arbitrary bytes into scalar field elements.
///
/// The buffer is zero-padded to a multiple of 127 bytes and every window
/// contributes exactly four elements. Empty input packs to no elements.
pub fn pack(data: &[u8]) -> Vec<Fr> {
    let mut elements = Vec::with_capacity(element_count(data.len()));
    for window in data.chunks(SHARD_LEN) {
        for word in pack_window(window) {
            elements.push(Fr::from_be_bytes_mod_order(&word));
        }
    }
    elements
}

/// Recover the first `len` bytes from packed field elements.
///
/// Exact whenever every packed word was below the scalar modulus, which holds
/// whenever the top byte of each word is below `0x73`. Elements whose
/// boundary byte has its top two bits set were not produced by [`pack`] and
/// are rejected.
pub fn unpack(elements: &[Fr], len: usize) -> Result<Vec<u8>> {
    if elements.len() % ELEMENTS_PER_SHARD != 0 {
        return Err(PosError::InvalidEncoding(format!(
            "element count {} is not a multiple of {}",
            elements.len(),
            ELEMENTS_PER_SHARD
        )));
    }
    let capacity = elements.len() / ELEMENTS_PER_SHARD * SHARD_LEN;
    if len > capacity {
        return Err(PosError::InvalidEncoding(format!(
            "requested {} bytes but elements hold at most {}",
            len, capacity
        )));
    }

    let mut out = Vec::with_capacity(capacity);
    for group in elements.chunks_exact(ELEMENTS_PER_SHARD) {
        let mut words = [[0u8; LIMB_LEN]; ELEMENTS_PER_SHARD];
        for (word, element) in words.iter_mut().zip(group) {
            *word = encode_scalar(element);
            if word[31] & !BOUNDARY_MASK != 0 {
                return Err(PosError::InvalidEncoding(
                    "element boundary byte has reserved bits set".to_string(),
                ));
            }
        }
        out.extend_from_slice(&unpack_window(&words));
    }
    out.truncate(len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(37).wrapping_add(11)).collect()
    }

    /// Clear the bytes that become the top byte of a word so every word stays below r.
    fn field_safe(mut data: Vec<u8>) -> Vec<u8> {
        for (i, b) in data.iter_mut().enumerate() {
            if matches!(i % SHARD_LEN, 0 | 32 | 64 | 96) {
                *b = 0;
            }
        }
        data
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(0), 0);
        assert_eq!(element_count(1), 4);
        assert_eq!(element_count(127), 4);
        assert_eq!(element_count(128), 8);
        assert_eq!(element_count(300), 12);
    }

    #[test]
    fn test_pack_length() {
        for len in [0, 1, 126, 127, 128, 254, 300, 1024] {
            assert_eq!(pack(&sample_bytes(len)).len(), element_count(len));
        }
    }

    #[test]
    fn test_window_round_trip() {
        let data = sample_bytes(127);
        let words = pack_window(&data);
        assert_eq!(unpack_window(&words).to_vec(), data);

        let ones = vec![0xffu8; 127];
        assert_eq!(unpack_window(&pack_window(&ones)).to_vec(), ones);
    }

    #[test]
    fn test_boundary_bytes_masked() {
        let words = pack_window(&[0xffu8; 127]);
        for word in &words {
            assert_eq!(word[31] & 0xc0, 0);
        }
        // First word holds the first 31 bytes verbatim.
        assert_eq!(words[0][..31], [0xffu8; 31]);
        assert_eq!(words[0][31], 0x3f);
    }

    #[test]
    fn test_short_window_is_zero_padded() {
        let short = pack_window(&[0xaa; 10]);
        let mut padded = [0u8; 127];
        padded[..10].fill(0xaa);
        assert_eq!(short, pack_window(&padded));
    }

    #[test]
    fn test_field_round_trip() {
        let data = field_safe(sample_bytes(300));
        let elements = pack(&data);
        assert_eq!(unpack(&elements, data.len()).unwrap(), data);
    }

    #[test]
    fn test_padding_is_zero() {
        let data = field_safe(sample_bytes(130));
        let elements = pack(&data);
        let full = unpack(&elements, 254).unwrap();
        assert_eq!(&full[..130], &data[..]);
        assert!(full[130..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_unpack_rejects_bad_shapes() {
        let elements = pack(&sample_bytes(10));
        assert!(unpack(&elements[..3], 10).is_err());
        assert!(unpack(&elements, 128).is_err());
    }
}

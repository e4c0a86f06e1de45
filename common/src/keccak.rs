//! Keccak-256 helpers matching the EVM `keccak256` builtin.

use tiny_keccak::{Hasher as KeccakHasher, Keccak};

use crate::Hash;

pub fn keccak256(data: &[u8]) -> Hash {
    keccak256_concat(&[data])
}

/// Hash the concatenation of `parts` without copying them into one buffer.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut keccak = Keccak::v256();
    for part in parts {
        keccak.update(part);
    }
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_error_selector() {
        assert_eq!(keccak256(b"Error(string)")[..4], [0x08, 0xc3, 0x79, 0xa0]);
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        let joined = keccak256(b"alterFileProofSettingperm");
        let parts = keccak256_concat(&[b"alterFileProofSetting".as_slice(), b"perm".as_slice()]);
        assert_eq!(joined, parts);
    }
}

//! Decoding `Error(string)` revert data.
//!
//! Solidity `require`/`revert` with a message returns
//! `selector ‖ offset(32) ‖ length(32) ‖ utf8 bytes (padded to 32)`.

use tracing::debug;

/// `keccak256("Error(string)")[..4]`
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

const WORD: usize = 32;

/// Read a 32-byte word as a usize offset or length.
fn read_word(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at.checked_add(WORD)?)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low)).ok()
}

/// Extract the message from `Error(string)` revert data.
///
/// Returns `None` for empty data, custom errors, panics and malformed
/// encodings.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != ERROR_SELECTOR {
        debug!(len = data.len(), "Revert data is not Error(string)");
        return None;
    }
    let body = &data[4..];

    let offset = read_word(body, 0)?;
    let len = read_word(body, offset)?;
    let start = offset.checked_add(WORD)?;
    let bytes = body.get(start..start.checked_add(len)?)?;

    String::from_utf8(bytes.to_vec()).ok()
}

/// ABI-encode `Error(string)`.
pub fn encode_revert_reason(reason: &str) -> Vec<u8> {
    let bytes = reason.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;

    let mut out = Vec::with_capacity(4 + 2 * WORD + padded);
    out.extend_from_slice(&ERROR_SELECTOR);

    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(WORD as u64).to_be_bytes());
    out.extend_from_slice(&word);
    word[WORD - 8..].copy_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(&word);

    out.extend_from_slice(bytes);
    out.resize(4 + 2 * WORD + padded, 0);
    out
}

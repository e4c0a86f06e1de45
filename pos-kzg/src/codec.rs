//! Fixed-width big-endian encodings of BLS12-381 points and scalars.
//!
//! Two layouts are produced:
//!
//! - **Limb layout** (contract arguments): every 48-byte base-field coordinate
//!   is split into two 32-byte words. The first word carries the top 16 bytes
//!   of the coordinate right-aligned, so its high 16 bytes are always zero.
//!   G1 uses 4 limbs `(x_hi, x_lo, y_hi, y_lo)`, G2 uses 8 limbs in the order
//!   `x.c0, x.c1, y.c0, y.c1`.
//! - **Appended layout** (hash preimages): each coordinate left-padded to 64
//!   bytes and concatenated, 128 bytes for G1 and 256 bytes for G2.
//!
//! The point at infinity is represented by all-zero coordinates in both
//! layouts. `(0, 0)` is not on either curve, so the mapping is unambiguous.

use ark_ff::{BigInteger, PrimeField, Zero};

use crate::config::{FQ_BYTES, FR_BYTES, Fq, Fq2, Fr, G1Affine, G2Affine};
use crate::{LIMB_LEN, PosError, Result};

/// A 32-byte big-endian word.
pub type Limb = [u8; LIMB_LEN];

/// Contract layout of a G1 point.
pub type G1Limbs = [Limb; 4];

/// Contract layout of a G2 point.
pub type G2Limbs = [Limb; 8];

/// Width of one coordinate in the appended layout.
const APPENDED_COORD_LEN: usize = 64;

/// Serialize a base-field element as 48 big-endian bytes.
fn fq_to_bytes(value: &Fq) -> [u8; FQ_BYTES] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; FQ_BYTES];
    out[FQ_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Parse 48 big-endian bytes, rejecting values outside the field.
fn fq_from_bytes(bytes: &[u8; FQ_BYTES]) -> Result<Fq> {
    let value = Fq::from_be_bytes_mod_order(bytes);
    if fq_to_bytes(&value) != *bytes {
        return Err(PosError::InvalidEncoding(
            "base field element exceeds modulus".to_string(),
        ));
    }
    Ok(value)
}

fn fq_to_limbs(value: &Fq) -> (Limb, Limb) {
    let bytes = fq_to_bytes(value);
    let mut hi = [0u8; LIMB_LEN];
    let mut lo = [0u8; LIMB_LEN];
    hi[16..].copy_from_slice(&bytes[..16]);
    lo.copy_from_slice(&bytes[16..]);
    (hi, lo)
}

fn fq_from_limbs(hi: &Limb, lo: &Limb) -> Result<Fq> {
    if hi[..16].iter().any(|b| *b != 0) {
        return Err(PosError::InvalidEncoding(
            "high 16 bytes of coordinate limb must be zero".to_string(),
        ));
    }
    let mut bytes = [0u8; FQ_BYTES];
    bytes[..16].copy_from_slice(&hi[16..]);
    bytes[16..].copy_from_slice(lo);
    fq_from_bytes(&bytes)
}

fn write_appended(out: &mut [u8], index: usize, value: &Fq) {
    let start = index * APPENDED_COORD_LEN + (APPENDED_COORD_LEN - FQ_BYTES);
    out[start..start + FQ_BYTES].copy_from_slice(&fq_to_bytes(value));
}

/// Coordinates of an affine G1 point, zero for the point at infinity.
fn g1_coords(point: &G1Affine) -> [Fq; 2] {
    if point.infinity {
        [Fq::zero(), Fq::zero()]
    } else {
        [point.x, point.y]
    }
}

/// Coordinates of an affine G2 point flattened to `x.c0, x.c1, y.c0, y.c1`.
fn g2_coords(point: &G2Affine) -> [Fq; 4] {
    if point.infinity {
        [Fq::zero(); 4]
    } else {
        [point.x.c0, point.x.c1, point.y.c0, point.y.c1]
    }
}

/// Encode a G1 point into 4 contract limbs.
pub fn encode_g1(point: &G1Affine) -> G1Limbs {
    let mut limbs = [[0u8; LIMB_LEN]; 4];
    for (i, coord) in g1_coords(point).iter().enumerate() {
        let (hi, lo) = fq_to_limbs(coord);
        limbs[2 * i] = hi;
        limbs[2 * i + 1] = lo;
    }
    limbs
}

/// Decode 4 contract limbs into a G1 point.
///
/// Rejects non-canonical coordinates, points off the curve and points outside
/// the prime-order subgroup.
pub fn decode_g1(limbs: &G1Limbs) -> Result<G1Affine> {
    let x = fq_from_limbs(&limbs[0], &limbs[1])?;
    let y = fq_from_limbs(&limbs[2], &limbs[3])?;

    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }

    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(PosError::InvalidEncoding("G1 point not on curve".to_string()));
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PosError::InvalidEncoding(
            "G1 point not in prime-order subgroup".to_string(),
        ));
    }
    Ok(point)
}

/// Decode a flattened 128-byte limb buffer into a G1 point.
pub fn decode_g1_bytes(bytes: &[u8]) -> Result<G1Affine> {
    if bytes.len() != 4 * LIMB_LEN {
        return Err(PosError::InvalidEncoding(format!(
            "G1 limbs must be {} bytes, got {}",
            4 * LIMB_LEN,
            bytes.len()
        )));
    }
    let mut limbs = [[0u8; LIMB_LEN]; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(LIMB_LEN)) {
        limb.copy_from_slice(chunk);
    }
    decode_g1(&limbs)
}

/// Encode a G2 point into 8 contract limbs.
pub fn encode_g2(point: &G2Affine) -> G2Limbs {
    let mut limbs = [[0u8; LIMB_LEN]; 8];
    for (i, coord) in g2_coords(point).iter().enumerate() {
        let (hi, lo) = fq_to_limbs(coord);
        limbs[2 * i] = hi;
        limbs[2 * i + 1] = lo;
    }
    limbs
}

/// Decode 8 contract limbs into a G2 point.
pub fn decode_g2(limbs: &G2Limbs) -> Result<G2Affine> {
    let mut coords = [Fq::zero(); 4];
    for (i, coord) in coords.iter_mut().enumerate() {
        *coord = fq_from_limbs(&limbs[2 * i], &limbs[2 * i + 1])?;
    }
    let x = Fq2::new(coords[0], coords[1]);
    let y = Fq2::new(coords[2], coords[3]);

    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }

    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(PosError::InvalidEncoding("G2 point not on curve".to_string()));
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PosError::InvalidEncoding(
            "G2 point not in prime-order subgroup".to_string(),
        ));
    }
    Ok(point)
}

/// Decode a flattened 256-byte limb buffer into a G2 point.
pub fn decode_g2_bytes(bytes: &[u8]) -> Result<G2Affine> {
    if bytes.len() != 8 * LIMB_LEN {
        return Err(PosError::InvalidEncoding(format!(
            "G2 limbs must be {} bytes, got {}",
            8 * LIMB_LEN,
            bytes.len()
        )));
    }
    let mut limbs = [[0u8; LIMB_LEN]; 8];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(LIMB_LEN)) {
        limb.copy_from_slice(chunk);
    }
    decode_g2(&limbs)
}

/// Encode a G1 point as 128 contiguous bytes for hash preimages.
pub fn encode_appended_g1(point: &G1Affine) -> [u8; 128] {
    let mut out = [0u8; 128];
    for (i, coord) in g1_coords(point).iter().enumerate() {
        write_appended(&mut out, i, coord);
    }
    out
}

/// Encode a G2 point as 256 contiguous bytes for hash preimages.
pub fn encode_appended_g2(point: &G2Affine) -> [u8; 256] {
    let mut out = [0u8; 256];
    for (i, coord) in g2_coords(point).iter().enumerate() {
        write_appended(&mut out, i, coord);
    }
    out
}

/// Encode a scalar as 32 big-endian bytes.
pub fn encode_scalar(value: &Fr) -> [u8; FR_BYTES] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; FR_BYTES];
    out[FR_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Interpret big-endian bytes as an integer reduced modulo r.
///
/// This is how random challenge points read from chain state become scalars.
pub fn scalar_from_be_bytes_mod_order(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Decode 32 big-endian bytes, rejecting values not below r.
pub fn decode_scalar(bytes: &[u8; FR_BYTES]) -> Result<Fr> {
    let value = Fr::from_be_bytes_mod_order(bytes);
    if encode_scalar(&value) != *bytes {
        return Err(PosError::InvalidEncoding(
            "scalar field element exceeds modulus".to_string(),
        ));
    }
    Ok(value)
}

//! KZG proof-of-storage primitives over BLS12-381.
//!
//! This crate provides everything a data holder needs to commit to stored
//! files and answer random-point challenges in a form the on-chain verifier
//! accepts byte-for-byte.
//!
//! # Architecture
//!
//! ```text
//! STORE PHASE:
//!   File Bytes → Pack (127-byte windows → 4 scalars) → KZG Commit → G1 limbs → chain
//!
//! PROVE PHASE:
//!   Random point r (from chain) → KZG Open(r) → (witness G1, claimed value) → chain
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pos_kzg::{Srs, commit, open, pack, verify, codec::encode_g1};
//!
//! let srs = Srs::insecure(1024, 985)?;
//! let coeffs = pack(&file_bytes);
//! let commitment = commit(&srs, &coeffs)?;
//! let proof = open(&srs, &coeffs, point)?;
//! assert!(verify(&srs, &commitment, point, &proof));
//! let limbs = encode_g1(&commitment);
//! ```

pub mod codec;
pub mod commitment;
pub mod error;
pub mod packer;
pub mod srs;

// Re-export main types and functions
pub use commitment::{
    FileCommitment, OpeningProof, ProofInfo, aggregate_commitments, aggregate_polynomials,
    commit, evaluate, open, verify,
};
pub use error::{PosError, Result};
pub use packer::{element_count, pack, unpack};
pub use srs::Srs;

/// Number of raw bytes consumed by one packed window.
pub const SHARD_LEN: usize = 127;

/// Number of scalar field elements produced per window.
pub const ELEMENTS_PER_SHARD: usize = 4;

/// Width of every encoded limb.
pub const LIMB_LEN: usize = 32;

/// Curve type aliases.
pub mod config {
    pub use ark_bls12_381::{Bls12_381, Fq, Fq2, Fr, G1Affine, G1Projective, G2Affine, G2Projective};

    /// Bytes in a canonical base-field element.
    pub const FQ_BYTES: usize = 48;

    /// Bytes in a canonical scalar-field element.
    pub const FR_BYTES: usize = 32;
}

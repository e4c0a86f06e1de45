//! KZG commitments to packed file data.
//!
//! A file's packed field elements are the coefficients of a polynomial
//! `p(x)`. The holder publishes `C = [p(τ)]G1` once, and later proves it
//! still has the data by opening `p` at a point chosen by the chain:
//!
//! ```text
//! y = p(z)
//! q(x) = (p(x) - y) / (x - z)
//! W = [q(τ)]G1
//! check: e(C - [y]G1, H) == e(W, [τ]H - [z]H)
//! ```
//!
//! Commitments are additively homomorphic, so many files can be proven with a
//! single opening of the summed polynomial against the summed commitments.

use ark_ec::pairing::Pairing;
use ark_ec::{CurveGroup, VariableBaseMSM};
use ark_ff::Zero;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{G1Limbs, encode_g1, encode_scalar};
use crate::config::{Bls12_381, Fr, G1Affine, G1Projective, G2Projective};
use crate::packer::pack;
use crate::srs::Srs;
use crate::{PosError, Result};

/// Witness and claimed value for one polynomial opening.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpeningProof {
    /// `[q(τ)]G1` for the quotient polynomial
    pub witness: G1Affine,

    /// `p(z)` at the challenged point
    pub claimed_value: Fr,
}

/// Opening in the layout the verifier contract accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInfo {
    /// Witness point as four 32-byte limbs
    pub npsi: G1Limbs,

    /// Claimed value as a 32-byte big-endian integer
    pub y: [u8; 32],
}

impl ProofInfo {
    pub fn from_opening(proof: &OpeningProof) -> Self {
        Self {
            npsi: encode_g1(&proof.witness),
            y: encode_scalar(&proof.claimed_value),
        }
    }
}

fn check_capacity(srs: &Srs, required: usize) -> Result<()> {
    if required > srs.len() {
        return Err(PosError::SrsTooSmall {
            required,
            available: srs.len(),
        });
    }
    Ok(())
}

/// Commit to a polynomial given by its coefficients, lowest degree first.
///
/// An empty coefficient list commits to the identity.
pub fn commit(srs: &Srs, coeffs: &[Fr]) -> Result<G1Affine> {
    check_capacity(srs, coeffs.len())?;
    if coeffs.is_empty() {
        return Ok(G1Affine::identity());
    }

    let bases = &srs.g1_powers()[..coeffs.len()];
    let point = G1Projective::msm(bases, coeffs).map_err(|available| PosError::SrsTooSmall {
        required: coeffs.len(),
        available,
    })?;
    Ok(point.into_affine())
}

/// Evaluate a polynomial at `point` with Horner's rule.
pub fn evaluate(coeffs: &[Fr], point: Fr) -> Fr {
    coeffs
        .iter()
        .rev()
        .fold(Fr::zero(), |acc, coeff| acc * point + coeff)
}

/// Divide `p(x) - p(z)` by `x - z`.
fn quotient(coeffs: &[Fr], point: Fr) -> Vec<Fr> {
    if coeffs.len() < 2 {
        return Vec::new();
    }
    let mut out = vec![Fr::zero(); coeffs.len() - 1];
    let mut acc = Fr::zero();
    for i in (1..coeffs.len()).rev() {
        acc = coeffs[i] + acc * point;
        out[i - 1] = acc;
    }
    out
}

/// Open a committed polynomial at `point`.
///
/// # Arguments
/// * `srs` - Reference string with at least `coeffs.len()` powers
/// * `coeffs` - The committed polynomial
/// * `point` - The challenge point, usually derived from on-chain randomness
pub fn open(srs: &Srs, coeffs: &[Fr], point: Fr) -> Result<OpeningProof> {
    check_capacity(srs, coeffs.len())?;

    let claimed_value = evaluate(coeffs, point);
    let witness = commit(srs, &quotient(coeffs, point))?;

    debug!(degree = coeffs.len(), "Opened polynomial");
    Ok(OpeningProof {
        witness,
        claimed_value,
    })
}

/// Check an opening against a commitment with the pairing equation.
pub fn verify(srs: &Srs, commitment: &G1Affine, point: Fr, proof: &OpeningProof) -> bool {
    let g = G1Projective::from(srs.g1_generator());
    let h = G2Projective::from(srs.g2_generator());

    let lhs_g1 = G1Projective::from(*commitment) - g * proof.claimed_value;
    let rhs_g2 = G2Projective::from(srs.verifying_key()) - h * point;

    let lhs = Bls12_381::pairing(lhs_g1, h);
    let rhs = Bls12_381::pairing(proof.witness, rhs_g2);
    lhs == rhs
}

/// Sum commitments to several polynomials.
pub fn aggregate_commitments(commitments: &[G1Affine]) -> G1Affine {
    commitments
        .iter()
        .fold(G1Projective::zero(), |acc, c| acc + c)
        .into_affine()
}

/// Sum several polynomials coefficient-wise.
///
/// The result commits to [`aggregate_commitments`] of the individual
/// commitments, so one opening covers every file.
pub fn aggregate_polynomials<P: AsRef<[Fr]>>(polys: &[P]) -> Vec<Fr> {
    let len = polys.iter().map(|p| p.as_ref().len()).max().unwrap_or(0);
    let mut out = vec![Fr::zero(); len];
    for poly in polys {
        for (acc, coeff) in out.iter_mut().zip(poly.as_ref()) {
            *acc += coeff;
        }
    }
    out
}

/// A committed file together with the data needed to open it later.
///
/// The commitment and size are published; the coefficients stay with the
/// holder.
#[derive(Clone, Debug)]
pub struct FileCommitment {
    /// `[p(τ)]G1` for the packed file
    pub commitment: G1Affine,

    /// Original file size in bytes
    pub size: u64,

    /// Packed coefficients
    pub coefficients: Vec<Fr>,
}

impl FileCommitment {
    /// Pack and commit to file bytes.
    pub fn generate(srs: &Srs, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(PosError::EmptyData);
        }
        let coefficients = pack(data);
        let commitment = commit(srs, &coefficients)?;

        debug!(size = data.len(), elements = coefficients.len(), "Committed file");
        Ok(Self {
            commitment,
            size: data.len() as u64,
            coefficients,
        })
    }

    pub fn element_count(&self) -> usize {
        self.coefficients.len()
    }

    /// Commitment in contract limb layout.
    pub fn limbs(&self) -> G1Limbs {
        encode_g1(&self.commitment)
    }

    pub fn open(&self, srs: &Srs, point: Fr) -> Result<OpeningProof> {
        open(srs, &self.coefficients, point)
    }
}

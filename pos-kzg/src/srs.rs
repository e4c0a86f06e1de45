//! Structured reference string for KZG commitments.
//!
//! The reference string holds the powers `[τ^i]G1` used to commit to
//! polynomials and the pair `(H, [τ]H)` in G2 used by the verifier. The
//! verifier contract stores `[τ]H` as its verifying key.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::One;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use tracing::debug;

use crate::config::{Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use crate::{PosError, Result};

/// Powers of a secret in G1 together with the G2 verification pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Srs {
    g1_powers: Vec<G1Affine>,
    g2: [G2Affine; 2],
}

impl Srs {
    /// Deterministic setup from a known secret.
    ///
    /// Anyone who knows `secret` can forge openings, so this is only suitable
    /// for development networks and tests.
    ///
    /// # Arguments
    /// * `size` - Number of G1 powers, i.e. the maximum number of coefficients
    /// * `secret` - The trapdoor τ
    pub fn insecure(size: usize, secret: u64) -> Result<Self> {
        if size == 0 {
            return Err(PosError::EmptyData);
        }

        let tau = Fr::from(secret);
        let g1 = G1Projective::from(G1Affine::generator());
        let mut powers = Vec::with_capacity(size);
        let mut acc = Fr::one();
        for _ in 0..size {
            powers.push(g1 * acc);
            acc *= tau;
        }
        let g1_powers = G1Projective::normalize_batch(&powers);

        let h = G2Affine::generator();
        let tau_h = (G2Projective::from(h) * tau).into_affine();

        debug!(size, "Generated insecure reference string");
        Ok(Self {
            g1_powers,
            g2: [h, tau_h],
        })
    }

    /// Assemble a reference string from externally generated parts.
    pub fn from_parts(g1_powers: Vec<G1Affine>, g2: [G2Affine; 2]) -> Result<Self> {
        if g1_powers.is_empty() {
            return Err(PosError::EmptyData);
        }
        Ok(Self { g1_powers, g2 })
    }

    /// Number of G1 powers.
    pub fn len(&self) -> usize {
        self.g1_powers.len()
    }

    /// Always false for a constructed reference string.
    pub fn is_empty(&self) -> bool {
        self.g1_powers.is_empty()
    }

    pub fn g1_powers(&self) -> &[G1Affine] {
        &self.g1_powers
    }

    /// The G1 generator, i.e. `[τ^0]G1`.
    pub fn g1_generator(&self) -> G1Affine {
        self.g1_powers[0]
    }

    /// The G2 generator `H`.
    pub fn g2_generator(&self) -> G2Affine {
        self.g2[0]
    }

    /// `[τ]H`, as stored by the verifier contract.
    pub fn verifying_key(&self) -> G2Affine {
        self.g2[1]
    }

    /// Serialize in arkworks compressed form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.g1_powers.serialize_compressed(&mut buf)?;
        self.g2[0].serialize_compressed(&mut buf)?;
        self.g2[1].serialize_compressed(&mut buf)?;
        Ok(buf)
    }

    /// Deserialize and validate every point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let g1_powers = Vec::<G1Affine>::deserialize_compressed(&mut reader)?;
        let h = G2Affine::deserialize_compressed(&mut reader)?;
        let tau_h = G2Affine::deserialize_compressed(&mut reader)?;
        if !reader.is_empty() {
            return Err(PosError::SerializationError(format!(
                "{} trailing bytes after reference string",
                reader.len()
            )));
        }
        Self::from_parts(g1_powers, [h, tau_h])
    }

    /// Write the serialized form to any writer.
    pub fn write_to<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer
            .write_all(&bytes)
            .map_err(|e| PosError::SerializationError(e.to_string()))
    }

    /// Read a reference string previously written with [`Srs::write_to`].
    pub fn read_from<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| PosError::SerializationError(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

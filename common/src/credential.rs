//! Storage credentials and secp256k1 signature recovery.
//!
//! A credential is a signature by the designated submitter over a hash that
//! binds a file commitment to a verifier contract, the file owner and a
//! validity window. The contract recovers the signer with `ecrecover` and
//! compares it to the configured submitter, so signing here is over the raw
//! 32-byte hash with no message prefix.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use pos_kzg::codec::encode_appended_g1;
use pos_kzg::config::G1Affine;
use tracing::debug;

use crate::keccak::{keccak256, keccak256_concat};
use crate::{Address, AuthError, Hash, Result, Signature, U256};

/// Offset added to the recovery id in the last signature byte.
const RECOVERY_OFFSET: u8 = 27;

/// Build the credential hash for adding a file.
///
/// # Arguments
/// * `verifier` - Proof contract that will check the credential
/// * `signer` - Account adding the file
/// * `commitment` - KZG commitment to the file
/// * `size` - File size in bytes
/// * `start` - Start of the storage period
/// * `end` - End of the storage period
pub fn credential_hash(
    verifier: &Address,
    signer: &Address,
    commitment: &G1Affine,
    size: u64,
    start: &U256,
    end: &U256,
) -> Hash {
    let appended = encode_appended_g1(commitment);
    keccak256_concat(&[
        verifier.as_bytes(),
        signer.as_bytes(),
        &appended,
        &size.to_be_bytes(),
        start.as_bytes(),
        end.as_bytes(),
    ])
}

/// Ethereum address of a public key: last 20 bytes of the Keccak hash of the
/// uncompressed point without its tag byte.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}

/// Sign a raw 32-byte hash, returning `r ‖ s ‖ v` with `v` in `{27, 28}`.
pub fn sign_hash(key: &SigningKey, hash: &Hash) -> Result<Signature> {
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(hash)
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recovery_id.to_byte() + RECOVERY_OFFSET;
    Ok(Signature(out))
}

/// Recover the signer address from a 65-byte signature.
///
/// The recovery byte may be given either as `0/1` or `27/28`.
pub fn recover_signer(hash: &Hash, signature: &[u8]) -> Result<Address> {
    if signature.len() != Signature::LEN {
        return Err(AuthError::MalformedSignature(format!(
            "expected {} bytes, got {}",
            Signature::LEN,
            signature.len()
        )));
    }

    let v = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - RECOVERY_OFFSET,
        other => {
            return Err(AuthError::MalformedSignature(format!(
                "invalid recovery byte {other}"
            )));
        }
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| AuthError::MalformedSignature(format!("invalid recovery id {v}")))?;
    let sig = EcdsaSignature::from_slice(&signature[..64])
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;
    Ok(address_of(&key))
}

/// Check that `signature` over `hash` was produced by `expected`.
pub fn verify_credential(hash: &Hash, signature: &Signature, expected: &Address) -> Result<()> {
    let recovered = recover_signer(hash, signature.as_bytes())?;
    if recovered != *expected {
        debug!(%recovered, %expected, "Credential signer mismatch");
        return Err(AuthError::UnauthorizedCredential {
            expected: *expected,
            recovered,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_std::{UniformRand, test_rng};
    use pos_kzg::config::G1Projective;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    fn sample_hash() -> Hash {
        let mut rng = test_rng();
        let commitment = G1Projective::rand(&mut rng).into_affine();
        credential_hash(
            &Address([0x11; 20]),
            &Address([0x22; 20]),
            &commitment,
            300,
            &U256::from(1_700_000_000u64),
            &U256::from(1_800_000_000u64),
        )
    }

    #[test]
    fn test_credential_preimage_layout() {
        let commitment = G1Affine::generator();
        let verifier = Address([0x11; 20]);
        let signer = Address([0x22; 20]);
        let start = U256::from(5u64);
        let end = U256::from(9u64);

        let mut preimage = Vec::new();
        preimage.extend_from_slice(&verifier.0);
        preimage.extend_from_slice(&signer.0);
        preimage.extend_from_slice(&encode_appended_g1(&commitment));
        preimage.extend_from_slice(&300u64.to_be_bytes());
        preimage.extend_from_slice(&start.0);
        preimage.extend_from_slice(&end.0);
        assert_eq!(preimage.len(), 20 + 20 + 128 + 8 + 32 + 32);

        assert_eq!(
            credential_hash(&verifier, &signer, &commitment, 300, &start, &end),
            keccak256(&preimage)
        );
    }

    #[test]
    fn test_known_address() {
        // Private key 1 maps to a well-known address.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let sk = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            address_of(sk.verifying_key()).to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_sign_and_verify() {
        let hash = sample_hash();
        let sk = key(3);
        let sig = sign_hash(&sk, &hash).unwrap();
        assert!(matches!(sig.0[64], 27 | 28));

        let expected = address_of(sk.verifying_key());
        assert!(verify_credential(&hash, &sig, &expected).is_ok());
        assert_eq!(recover_signer(&hash, &sig.0).unwrap(), expected);
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let hash = sample_hash();
        let sig = sign_hash(&key(3), &hash).unwrap();
        let other = address_of(key(4).verifying_key());

        match verify_credential(&hash, &sig, &other) {
            Err(AuthError::UnauthorizedCredential { expected, .. }) => assert_eq!(expected, other),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_raw_recovery_byte_accepted() {
        let hash = sample_hash();
        let sk = key(5);
        let mut sig = sign_hash(&sk, &hash).unwrap();
        sig.0[64] -= 27;
        assert_eq!(
            recover_signer(&hash, &sig.0).unwrap(),
            address_of(sk.verifying_key())
        );
    }

    #[test]
    fn test_malformed_signatures() {
        let hash = sample_hash();
        assert!(matches!(
            recover_signer(&hash, &[0u8; 64]),
            Err(AuthError::MalformedSignature(_))
        ));

        let mut sig = sign_hash(&key(3), &hash).unwrap();
        sig.0[64] = 35;
        assert!(matches!(
            recover_signer(&hash, &sig.0),
            Err(AuthError::MalformedSignature(_))
        ));

        // Zero r and s never parse
        let mut zero = [0u8; 65];
        zero[64] = 27;
        assert!(matches!(
            recover_signer(&hash, &zero),
            Err(AuthError::MalformedSignature(_))
        ));
    }
}

//! Property-based tests for the KZG commitment engine.
//!
//! Tests the following invariants:
//! - Honest openings verify at every point
//! - Openings do not verify against a different point or value
//! - Commitment aggregation is linear in the packed polynomials
//! - Commitment generation is deterministic

use crate::strategies::*;
use pos_kzg::commitment::aggregate_polynomials;
use pos_kzg::{FileCommitment, OpeningProof, aggregate_commitments, commit, verify};
use pos_kzg::config::Fr;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// verify(C, z, open(p, z)) holds for honest data.
    #[test]
    fn prop_opening_verifies(
        data in blob_strategy(1, MAX_BLOB),
        point in scalar_strategy(),
    ) {
        let srs = test_srs();
        let file = FileCommitment::generate(srs, &data).expect("commit");
        let proof = file.open(srs, point).expect("open");
        prop_assert!(verify(srs, &file.commitment, point, &proof));
    }

    /// A proof for one point is rejected at any other point.
    #[test]
    fn prop_opening_bound_to_point(
        data in blob_strategy(1, 500),
        point in scalar_strategy(),
        other in scalar_strategy(),
    ) {
        prop_assume!(point != other);
        let srs = test_srs();
        let file = FileCommitment::generate(srs, &data).expect("commit");
        let proof = file.open(srs, point).expect("open");
        prop_assert!(!verify(srs, &file.commitment, other, &proof));
    }

    /// Tampering with the claimed value breaks verification.
    #[test]
    fn prop_wrong_value_rejected(
        data in blob_strategy(1, 500),
        point in scalar_strategy(),
    ) {
        let srs = test_srs();
        let file = FileCommitment::generate(srs, &data).expect("commit");
        let proof = file.open(srs, point).expect("open");
        let forged = OpeningProof {
            claimed_value: proof.claimed_value + Fr::from(1u64),
            ..proof
        };
        prop_assert!(!verify(srs, &file.commitment, point, &forged));
    }

    /// Sum of commitments equals the commitment of the summed polynomials.
    #[test]
    fn prop_aggregation_is_linear(
        blobs in prop::collection::vec(blob_strategy(1, 600), 1..5),
        point in scalar_strategy(),
    ) {
        let srs = test_srs();
        let files: Vec<FileCommitment> = blobs
            .iter()
            .map(|b| FileCommitment::generate(srs, b).expect("commit"))
            .collect();

        let commitments: Vec<_> = files.iter().map(|f| f.commitment).collect();
        let aggregate = aggregate_commitments(&commitments);

        let polys: Vec<&[Fr]> = files.iter().map(|f| f.coefficients.as_slice()).collect();
        let summed = aggregate_polynomials(&polys);
        prop_assert_eq!(commit(srs, &summed).expect("commit"), aggregate);

        let proof = pos_kzg::open(srs, &summed, point).expect("open");
        prop_assert!(verify(srs, &aggregate, point, &proof));
    }

    /// Same bytes, same commitment.
    #[test]
    fn prop_commitment_deterministic(data in blob_strategy(0, 500)) {
        let srs = test_srs();
        let a = FileCommitment::generate(srs, &data).expect("commit");
        let b = FileCommitment::generate(srs, &data).expect("commit");
        prop_assert_eq!(a.commitment, b.commitment);
        prop_assert_eq!(a.element_count(), pos_kzg::element_count(data.len()));
    }
}

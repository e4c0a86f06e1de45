//! Property-based tests for the challenge tracker.
//!
//! Tests the following invariants:
//! - Deadlines grow with the round and forfeiture starts strictly after them
//! - Odd statuses are the holder's turn, even ones the challenger's
//! - Exactly one side may act in an active round, before or after the deadline

use crate::strategies::*;
use common::ChallengeInfo;
use proptest::prelude::*;
use warden::tracker::ONE_STEP_THRESHOLD;
use warden::{
    Action, ChallengeTracker, Phase, Role, deadline, forfeiture_eligible, next_action,
};

fn acts(action: Action) -> bool {
    !matches!(action, Action::Wait)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A later round never has an earlier deadline.
    #[test]
    fn prop_deadline_monotonic(
        start in 0u64..1 << 40,
        respond in 1u32..10_000,
        status in 0u8..254,
    ) {
        prop_assert!(deadline(start, respond, status) < deadline(start, respond, status + 1));
    }

    /// Forfeiture is possible only strictly after the deadline.
    #[test]
    fn prop_forfeiture_strict(d in 0u64..u64::MAX - 1) {
        prop_assert!(!forfeiture_eligible(d, d));
        prop_assert!(forfeiture_eligible(d + 1, d));
    }

    /// Status parity decides whose turn it is.
    #[test]
    fn prop_phase_parity(info in active_challenge_strategy(), role in prop_oneof![
        Just(Role::Holder),
        Just(Role::Challenger),
    ]) {
        let mut tracker = ChallengeTracker::new(role);
        let phase = tracker.observe(&info, None).expect("active round needs no evidence");

        let expected_turn = if info.status % 2 == 1 { Role::Holder } else { Role::Challenger };
        prop_assert_eq!(phase.turn(), Some(expected_turn));
        prop_assert!(tracker.has_session());

        if info.status % 2 == 1 {
            let one_step = matches!(phase, Phase::OneStep { .. });
            prop_assert_eq!(one_step, info.chal_length <= ONE_STEP_THRESHOLD);
        }
    }

    /// Before the deadline only the party on turn acts; after it only the
    /// other party does, by ending the challenge.
    #[test]
    fn prop_one_actor_per_round(
        info in active_challenge_strategy(),
        start in 0u64..1 << 32,
        respond in 1u32..1_000,
        offset in 0u64..200_000,
    ) {
        let phase = ChallengeTracker::new(Role::Holder)
            .observe(&info, None)
            .expect("active round");
        let d = deadline(start, respond, info.status);
        let now = start + offset;

        let holder = next_action(phase, Role::Holder, now, d);
        let challenger = next_action(phase, Role::Challenger, now, d);
        prop_assert!(acts(holder) != acts(challenger));

        if forfeiture_eligible(now, d) {
            let waiting = if phase.turn() == Some(Role::Holder) { challenger } else { holder };
            prop_assert_eq!(waiting, Action::EndChallenge);
        }
    }

    /// A record with no challenger and status zero is idle for a fresh tracker.
    #[test]
    fn prop_fresh_idle(role in prop_oneof![Just(Role::Holder), Just(Role::Challenger)]) {
        let mut tracker = ChallengeTracker::new(role);
        let info = ChallengeInfo::default();
        prop_assert!(!tracker.needs_evidence(&info));
        prop_assert_eq!(tracker.observe(&info, None).expect("idle"), Phase::Idle);
    }
}

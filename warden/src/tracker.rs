//! Client-side view of the on-chain challenge rounds.
//!
//! The contract encodes the whole dispute in one status byte:
//!
//! ```text
//! status 0        idle, or just resolved (see below)
//! status odd      holder's turn: aggregate commitments for the disputed range,
//!                 or the individual commitments once the range fits the fan-out
//! status even > 0 challenger's turn: pick one of the holder's sub-ranges
//! status 0xff     resolved, winner not recorded in the status
//! ```
//!
//! Each round must be answered before `round_start + respond_time * (status + 1)`.
//! Once that passes, the party waiting on its counterparty may end the
//! challenge and win by default.
//!
//! The contract clears the status as soon as a challenge is resolved, so a
//! zero status alone does not say whether nobody challenged or a challenge
//! just ended. The tracker keeps a session for the challenge it has seen in
//! progress and requires resolution evidence (a result event or a balance
//! change) before reporting a winner. A zero status with a zero challenger
//! and no open session is idle.

use chain_submitter::CHALLENGE_FAN_OUT;
use common::{Address, ChallengeInfo, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};

/// Status the contract uses for a resolved challenge.
pub const RESOLVED_STATUS: u8 = 0xff;

/// Largest disputed range answered with individual commitments.
pub const ONE_STEP_THRESHOLD: u64 = CHALLENGE_FAN_OUT as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Holder,
    Challenger,
}

impl Role {
    pub fn counterparty(self) -> Role {
        match self {
            Role::Holder => Role::Challenger,
            Role::Challenger => Role::Holder,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Holder => write!(f, "holder"),
            Role::Challenger => write!(f, "challenger"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "holder" => Ok(Role::Holder),
            "challenger" => Ok(Role::Challenger),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Party that won a resolved challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Holder,
    Challenger,
}

impl From<Role> for Winner {
    fn from(role: Role) -> Self {
        match role {
            Role::Holder => Winner::Holder,
            Role::Challenger => Winner::Challenger,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    /// Challenger selects which sub-range to dispute
    Commitment { round: u8 },
    /// Holder submits aggregate commitments for the disputed range
    Response { round: u8 },
    /// Holder submits the individual commitments of the final range
    OneStep { round: u8 },
    Resolved(Winner),
}

impl Phase {
    /// Party whose submission the contract is waiting for.
    pub fn turn(&self) -> Option<Role> {
        match self {
            Phase::Commitment { .. } => Some(Role::Challenger),
            Phase::Response { .. } | Phase::OneStep { .. } => Some(Role::Holder),
            Phase::Idle | Phase::Resolved(_) => None,
        }
    }
}

/// Proof that a challenge has been resolved, and by whom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionEvidence {
    /// Winner named by the contract's challenge-result event
    ResultEvent { winner: Address },
    /// Token balance of `observer` before the challenge and after it ended
    BalanceDelta {
        observer: Role,
        before: U256,
        after: U256,
    },
}

/// Deadline of the current round.
///
/// # Arguments
/// * `round_start` - Unix time the challenge started
/// * `respond_time` - Seconds allowed per round
/// * `status` - Current challenge status
pub fn deadline(round_start: u64, respond_time: u32, status: u8) -> u64 {
    round_start.saturating_add(u64::from(respond_time) * (u64::from(status) + 1))
}

/// Whether the round has expired and the waiting party may end the challenge.
pub fn forfeiture_eligible(now: u64, deadline: u64) -> bool {
    now > deadline
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Wait,
    OpenChallenge,
    SelectSubRange,
    RespondChallenge,
    OneStepProve,
    EndChallenge,
    Done(Winner),
}

/// Decide what `role` should do in `phase` at time `now`.
///
/// The party whose turn it is acts until the deadline; the other party ends
/// the challenge once the deadline has passed.
pub fn next_action(phase: Phase, role: Role, now: u64, deadline: u64) -> Action {
    let expired = forfeiture_eligible(now, deadline);
    match (phase, role) {
        (Phase::Resolved(winner), _) => Action::Done(winner),
        (Phase::Idle, Role::Challenger) => Action::OpenChallenge,
        (Phase::Idle, Role::Holder) => Action::Wait,
        (phase, role) if phase.turn() == Some(role) => {
            if expired {
                Action::Wait
            } else {
                match phase {
                    Phase::Commitment { .. } => Action::SelectSubRange,
                    Phase::Response { .. } => Action::RespondChallenge,
                    _ => Action::OneStepProve,
                }
            }
        }
        _ if expired => Action::EndChallenge,
        _ => Action::Wait,
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Challenge this tracker has seen in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Session {
    challenger: Address,
    last_status: u8,
    /// Unix time the challenge's rounds are counted from, once anchored
    round_start: Option<u64>,
}

/// Classifies freshly read challenge records.
///
/// Holds only what the chain cannot tell it: whether a challenge was in
/// progress at the previous observation.
#[derive(Debug)]
pub struct ChallengeTracker {
    role: Role,
    session: Option<Session>,
    resolved_challenger: Option<Address>,
}

impl ChallengeTracker {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            session: None,
            resolved_challenger: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Start time of the challenge in progress, or `None` when idle.
    ///
    /// The first call for a session records `anchor()`; later calls return
    /// the recorded value until the challenge resolves.
    pub fn round_start(&mut self, anchor: impl FnOnce() -> u64) -> Option<u64> {
        let session = self.session.as_mut()?;
        Some(*session.round_start.get_or_insert_with(anchor))
    }

    /// Whether classifying `info` requires resolution evidence.
    pub fn needs_evidence(&self, info: &ChallengeInfo) -> bool {
        match info.status {
            RESOLVED_STATUS => true,
            0 => !self.is_idle(info),
            _ => false,
        }
    }

    fn is_idle(&self, info: &ChallengeInfo) -> bool {
        self.session.is_none()
            && (info.challenger.is_zero() || self.resolved_challenger == Some(info.challenger))
    }

    /// Classify a challenge record read from the chain.
    ///
    /// # Arguments
    /// * `info` - Challenge record, read just before this call
    /// * `evidence` - Resolution evidence, needed when the status is zero
    ///   after a challenge or the resolved sentinel
    pub fn observe(
        &mut self,
        info: &ChallengeInfo,
        evidence: Option<ResolutionEvidence>,
    ) -> Result<Phase> {
        let phase = match info.status {
            0 if self.is_idle(info) => Phase::Idle,
            0 | RESOLVED_STATUS => {
                let winner = self.resolve(info, evidence)?;
                info!(
                    status = info.status,
                    challenger = %info.challenger,
                    winner = ?winner,
                    "Challenge resolved"
                );
                self.resolved_challenger = Some(self.challenger_of(info));
                self.session = None;
                return Ok(Phase::Resolved(winner));
            }
            status if status % 2 == 1 => {
                if info.chal_length <= ONE_STEP_THRESHOLD {
                    Phase::OneStep { round: status }
                } else {
                    Phase::Response { round: status }
                }
            }
            status => Phase::Commitment { round: status },
        };

        if info.status != 0 {
            if let Some(session) = self.session {
                if info.status < session.last_status {
                    warn!(
                        previous = session.last_status,
                        status = info.status,
                        "Challenge status moved backwards"
                    );
                }
            } else {
                debug!(
                    status = info.status,
                    challenger = %info.challenger,
                    "Challenge session opened"
                );
            }
            let round_start = self
                .session
                .filter(|session| session.challenger == info.challenger)
                .and_then(|session| session.round_start);
            self.session = Some(Session {
                challenger: info.challenger,
                last_status: info.status,
                round_start,
            });
        }

        Ok(phase)
    }

    fn challenger_of(&self, info: &ChallengeInfo) -> Address {
        match self.session {
            Some(session) if info.challenger.is_zero() => session.challenger,
            _ => info.challenger,
        }
    }

    fn resolve(
        &self,
        info: &ChallengeInfo,
        evidence: Option<ResolutionEvidence>,
    ) -> Result<Winner> {
        let ambiguous = || TrackerError::ProtocolStateAmbiguous {
            status: info.status,
            challenger: info.challenger.to_string(),
        };

        match evidence.ok_or_else(ambiguous)? {
            ResolutionEvidence::ResultEvent { winner } => {
                let challenger = self.challenger_of(info);
                if challenger.is_zero() {
                    return Err(ambiguous());
                }
                Ok(if winner == challenger {
                    Winner::Challenger
                } else {
                    Winner::Holder
                })
            }
            ResolutionEvidence::BalanceDelta {
                observer,
                before,
                after,
            } => Ok(if after > before {
                observer.into()
            } else {
                observer.counterparty().into()
            }),
        }
    }
}

//! Challenge loop - drives one side of a challenge through to resolution.
//!
//! ```text
//! read ChallengeInfo ─► (evidence if status is 0/0xff) ─► tracker.observe
//!        ▲                                                      │
//!        │                                   next_action(phase, role, now, deadline)
//!        │                                                      │
//!        └──── poll interval ◄── Wait          submit + confirm ◄┘ act
//! ```
//!
//! On-chain state is re-read before every decision; a concurrent party may
//! have advanced the round since the last read.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chain_submitter::{CHALLENGE_FAN_OUT, Ledger, ProofClient};
use common::{Address, ChallengeInfo, U256, now_secs};
use pos_kzg::aggregate_commitments;
use pos_kzg::codec::decode_g1_bytes;
use pos_kzg::config::G1Affine;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::challenger::{
    challenge_round_start, challenge_seed, challenge_window_wait, select_sub_range, split_range,
};
use crate::config::WardenConfig;
use crate::error::{Result, TrackerError};
use crate::tracker::{
    Action, ChallengeTracker, Phase, ResolutionEvidence, Role, Winner, deadline, next_action,
};

// ============================================================================
// Commitment Source
// ============================================================================

/// Per-file commitments the holder answers challenges with.
pub trait CommitmentSource: Send + Sync {
    /// Commitments of the files in `range`, in index order, or `None` if any
    /// are unknown.
    fn commitments(&self, range: Range<u64>) -> Option<Vec<G1Affine>>;
}

impl CommitmentSource for [G1Affine] {
    fn commitments(&self, range: Range<u64>) -> Option<Vec<G1Affine>> {
        let start = usize::try_from(range.start).ok()?;
        let end = usize::try_from(range.end).ok()?;
        self.get(start..end).map(<[G1Affine]>::to_vec)
    }
}

impl CommitmentSource for Vec<G1Affine> {
    fn commitments(&self, range: Range<u64>) -> Option<Vec<G1Affine>> {
        self.as_slice().commitments(range)
    }
}

/// Read commitments from a file with one hex-encoded 128-byte limb buffer
/// per line. Blank lines and `#` comments are skipped.
pub fn load_commitments(path: &Path) -> anyhow::Result<Vec<G1Affine>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read commitments from {}", path.display()))?;

    contents
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            let bytes = hex::decode(line.strip_prefix("0x").unwrap_or(line))
                .with_context(|| format!("line {}: invalid hex", n + 1))?;
            decode_g1_bytes(&bytes).with_context(|| format!("line {}: invalid G1 point", n + 1))
        })
        .collect()
}

// ============================================================================
// Challenge Loop
// ============================================================================

/// One side of a challenge, driven through [`ProofClient`].
pub struct ChallengeLoop<'a, L: Ledger + ?Sized, S: CommitmentSource + ?Sized> {
    client: &'a ProofClient<L>,
    source: &'a S,
    role: Role,
    poll_interval: Duration,
    clock: fn() -> u64,
}

impl<'a, L: Ledger + ?Sized, S: CommitmentSource + ?Sized> ChallengeLoop<'a, L, S> {
    pub fn new(client: &'a ProofClient<L>, source: &'a S, config: &WardenConfig) -> Self {
        Self {
            client,
            source,
            role: config.role,
            poll_interval: config.poll_interval(),
            clock: now_secs,
        }
    }

    /// Replace the wall clock used for deadline checks.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Run until a challenge this loop followed is resolved.
    ///
    /// Returns `None` when cancelled through the client's token.
    pub async fn run(&self) -> Result<Option<Winner>> {
        let cancel = self.client.cancellation().clone();
        let account = self.client.account();
        let mut tracker = ChallengeTracker::new(self.role);

        let balance_before = self.client.token_balance(&account).await?;
        let baseline_block = self
            .client
            .challenge_result(None)
            .await?
            .map(|(block, _)| block);

        info!(
            role = %self.role,
            account = %account,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Challenge loop started"
        );

        loop {
            if cancel.is_cancelled() {
                info!(role = %self.role, "Challenge loop cancelled");
                return Ok(None);
            }

            let info = self.client.challenge_info().await?;
            let had_session = tracker.has_session();
            let evidence = if tracker.needs_evidence(&info) {
                self.evidence(had_session, baseline_block, &account, balance_before)
                    .await?
            } else {
                None
            };
            let phase = tracker.observe(&info, evidence)?;

            if let Phase::Resolved(winner) = phase {
                if had_session {
                    return Ok(Some(winner));
                }
                info!(
                    challenger = %info.challenger,
                    winner = ?winner,
                    "Earlier challenge already resolved"
                );
                if !pause(self.poll_interval, &cancel).await {
                    return Ok(None);
                }
                continue;
            }

            let settings = self.client.settings().await?;
            let verify = self.client.verify_info().await?;
            let (interval, period) = settings.window();
            let now = (self.clock)();
            let round_start = tracker
                .round_start(|| challenge_round_start(now, verify.last, interval, period))
                .unwrap_or(verify.last);
            let round_deadline = deadline(round_start, settings.respond_time(), info.status);
            let action = next_action(phase, self.role, now, round_deadline);

            debug!(
                status = info.status,
                phase = ?phase,
                action = ?action,
                now,
                round_start,
                deadline = round_deadline,
                "Challenge state"
            );

            match action {
                Action::Done(winner) => return Ok(Some(winner)),
                Action::Wait => {
                    if !pause(self.poll_interval, &cancel).await {
                        return Ok(None);
                    }
                }
                Action::OpenChallenge => {
                    let wait = challenge_window_wait(now, verify.last, interval, period);
                    info!(wait_secs = wait.as_secs(), "Waiting for challenge window");
                    if !pause(wait, &cancel).await {
                        return Ok(None);
                    }

                    // Someone may have opened a challenge meanwhile
                    let info = self.client.challenge_info().await?;
                    if tracker.needs_evidence(&info)
                        || tracker.observe(&info, None)? != Phase::Idle
                    {
                        continue;
                    }
                    self.client.do_challenge(0).await?;
                    info!(round = 0, "Challenge opened");
                }
                Action::SelectSubRange => {
                    let seed = challenge_seed(&verify.rnd, info.status, &account);
                    let index = select_sub_range(&seed, CHALLENGE_FAN_OUT);
                    self.client.do_challenge(index).await?;
                    info!(round = info.status, index, "Sub-range selected");
                }
                Action::RespondChallenge => {
                    let commitments = self.aggregate_response(&info)?;
                    self.client.response_challenge(&commitments).await?;
                    info!(
                        round = info.status,
                        start = info.start_index,
                        len = info.chal_length,
                        "Challenge answered"
                    );
                }
                Action::OneStepProve => {
                    let commitments = self.lookup(disputed_range(&info)?)?;
                    self.client.one_step_prove(&commitments).await?;
                    info!(
                        round = info.status,
                        files = commitments.len(),
                        "One-step proof submitted"
                    );
                }
                Action::EndChallenge => {
                    warn!(
                        round = info.status,
                        deadline = round_deadline,
                        now,
                        "Counterparty missed its deadline, ending challenge"
                    );
                    self.client.end_challenge().await?;
                }
            }
        }
    }

    /// Resolution evidence, preferring a result event newer than the loop's
    /// start over the observer's balance change.
    async fn evidence(
        &self,
        had_session: bool,
        baseline_block: Option<u64>,
        account: &Address,
        balance_before: U256,
    ) -> Result<Option<ResolutionEvidence>> {
        let from_block = if had_session {
            baseline_block.map(|block| block + 1)
        } else {
            None
        };
        if let Some((_, winner)) = self.client.challenge_result(from_block).await? {
            return Ok(Some(ResolutionEvidence::ResultEvent { winner }));
        }

        if had_session {
            let after = self.client.token_balance(account).await?;
            return Ok(Some(ResolutionEvidence::BalanceDelta {
                observer: self.role,
                before: balance_before,
                after,
            }));
        }
        Ok(None)
    }

    fn lookup(&self, range: Range<u64>) -> Result<Vec<G1Affine>> {
        self.source
            .commitments(range.clone())
            .ok_or(TrackerError::MissingCommitments {
                start: range.start,
                end: range.end,
            })
    }

    /// One aggregate commitment per sub-range of the disputed range.
    fn aggregate_response(&self, info: &ChallengeInfo) -> Result<[G1Affine; CHALLENGE_FAN_OUT]> {
        disputed_range(info)?;
        let aggregates = split_range(info.start_index, info.chal_length, CHALLENGE_FAN_OUT)
            .into_iter()
            .map(|range| self.lookup(range).map(|c| aggregate_commitments(&c)))
            .collect::<Result<Vec<_>>>()?;
        Ok(std::array::from_fn(|i| aggregates[i]))
    }
}

/// File indices under dispute, rejecting ranges that overflow.
fn disputed_range(info: &ChallengeInfo) -> Result<Range<u64>> {
    let end = info
        .start_index
        .checked_add(info.chal_length)
        .ok_or(TrackerError::InvalidRange {
            start: info.start_index,
            len: info.chal_length,
        })?;
    Ok(info.start_index..end)
}

/// Drive `config.role` through one challenge.
pub async fn run_challenge_loop<L, S>(
    client: &ProofClient<L>,
    source: &S,
    config: &WardenConfig,
) -> Result<Option<Winner>>
where
    L: Ledger + ?Sized,
    S: CommitmentSource + ?Sized,
{
    ChallengeLoop::new(client, source, config).run().await
}

/// Connect to `ledger` and drive `config.role` through one challenge.
///
/// The holder reads its commitments from `config.commitments_path`; the
/// challenger needs none.
pub async fn run_from_config<L>(
    ledger: Arc<L>,
    config: &WardenConfig,
    cancel: CancellationToken,
) -> anyhow::Result<Option<Winner>>
where
    L: Ledger + ?Sized,
{
    let client = ProofClient::from_config(ledger, &config.submitter, cancel)
        .await
        .context("Failed to connect to the file-proof contracts")?;

    let commitments = match config.role {
        Role::Holder => load_commitments(&config.commitments_path)?,
        Role::Challenger => Vec::new(),
    };
    info!(
        role = %config.role,
        files = commitments.len(),
        commitments_path = %config.commitments_path.display(),
        "Starting challenge loop from config"
    );

    Ok(run_challenge_loop(&client, &commitments, config).await?)
}

/// Sleep unless cancelled first; returns false on cancellation.
async fn pause(wait: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}

//! Sub-range selection and cycle timing.
//!
//! A proof cycle is `interval + period` seconds long, anchored at the
//! contract's `last` timestamp:
//!
//! ```text
//! last           last+interval        last+interval+period
//!  │   interval        │      period         │
//!  ├───────────────────┼─────────────────────┤ next cycle...
//!                      └ proofs accepted ────┘
//! ```
//!
//! Challenges open at a cycle boundary. Sub-range choices are drawn from a
//! deterministic PRNG seeded with the round's randomness, so a challenger can
//! replay its own decisions.

use std::ops::Range;
use std::time::Duration;

use common::{Address, U256, keccak256_concat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Split `start..start + len` into `parts` contiguous ranges.
///
/// The first `len % parts` ranges are one index longer than the rest; when
/// `len < parts` the trailing ranges are empty.
pub fn split_range(start: u64, len: u64, parts: usize) -> Vec<Range<u64>> {
    if parts == 0 {
        return Vec::new();
    }
    let parts_u64 = parts as u64;
    let base = len / parts_u64;
    let extra = len % parts_u64;

    let mut ranges = Vec::with_capacity(parts);
    let mut cursor = start;
    for i in 0..parts_u64 {
        let size = base + u64::from(i < extra);
        ranges.push(cursor..cursor + size);
        cursor += size;
    }
    ranges
}

/// Seed for one round's sub-range choice.
pub fn challenge_seed(rnd: &U256, status: u8, challenger: &Address) -> [u8; 32] {
    keccak256_concat(&[rnd.as_bytes(), &[status], challenger.as_bytes(), b"challenge"])
}

/// Pick which of `parts` sub-ranges to dispute.
///
/// Uses deterministic PRNG seeded from `seed` to ensure reproducibility.
pub fn select_sub_range(seed: &[u8; 32], parts: usize) -> u8 {
    if parts == 0 {
        return 0;
    }
    let mut rng = StdRng::from_seed(*seed);
    let upper = parts.min(usize::from(u8::MAX) + 1);
    rng.random_range(0..upper) as u8
}

/// Time until the proof window of the current cycle opens.
///
/// Zero while the window is open.
pub fn proof_window_wait(now: u64, last: u64, interval: u32, period: u32) -> Duration {
    let cycle = u64::from(interval) + u64::from(period);
    if cycle == 0 {
        return Duration::ZERO;
    }
    if now < last {
        return Duration::from_secs(last - now + u64::from(interval));
    }
    let over = (now - last) % cycle;
    if over < u64::from(interval) {
        Duration::from_secs(u64::from(interval) - over)
    } else {
        Duration::ZERO
    }
}

/// Time until one second past the next cycle boundary, when a new challenge
/// can be opened.
pub fn challenge_window_wait(now: u64, last: u64, interval: u32, period: u32) -> Duration {
    if now <= last {
        return Duration::from_secs(last - now + 1);
    }
    let cycle = u64::from(interval) + u64::from(period);
    if cycle == 0 {
        return Duration::from_secs(1);
    }
    let over = (now - last) % cycle;
    Duration::from_secs(cycle - over + 1)
}

/// Cycle boundary at or before `now`, from which a challenge opened during
/// the current cycle counts its rounds.
///
/// Before the first boundary the anchor is `last` itself.
pub fn challenge_round_start(now: u64, last: u64, interval: u32, period: u32) -> u64 {
    let cycle = u64::from(interval) + u64::from(period);
    if now <= last {
        return last;
    }
    if cycle == 0 {
        return now;
    }
    now - (now - last) % cycle
}

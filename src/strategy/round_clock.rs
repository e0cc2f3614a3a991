//! Round-time validity gate.
//!
//! The feed stamps each round with a bare time of day. A bet is only worth
//! sending while that stamp is close to the local UTC clock; a stale state
//! replayed after a reconnect or a long pause would otherwise trigger a bet
//! on a round that has already closed.

use chrono::{DateTime, NaiveTime, Utc};
use std::time::Duration;

use crate::types::RoundTimeError;

/// Default tolerance between the round stamp and now.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(8);

/// Source of "now". Injected so the gate can be driven from tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse an `HH:MM:SS` (24h) round stamp.
pub fn parse_round_time(round_time: &str) -> Result<NaiveTime, RoundTimeError> {
    NaiveTime::parse_from_str(round_time, "%H:%M:%S").map_err(|_| RoundTimeError {
        value: round_time.to_string(),
    })
}

/// Whether `round_time`, placed on today's UTC date, is within `tolerance`
/// of `now` (inclusive).
pub fn is_round_time_valid(
    round_time: &str,
    now: DateTime<Utc>,
    tolerance: Duration,
) -> Result<bool, RoundTimeError> {
    let time = parse_round_time(round_time)?;
    let stamped = now.date_naive().and_time(time).and_utc();
    let gap = if now >= stamped { now - stamped } else { stamped - now };
    // Compared at full precision: 8.0005s is outside an 8s tolerance.
    Ok(gap.to_std().map_or(false, |gap| gap <= tolerance))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

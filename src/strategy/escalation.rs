//! Bet escalation.
//!
//! Tracks the face currently being bet on and how many bets it has already
//! absorbed. Stakes grow linearly (`base`, `2·base`, `3·base`, ...) while the
//! same face stays the target without showing; once `max_retries` bets have
//! been placed the target is suppressed until it changes or hits.

use std::fmt;

use tracing::{debug, info};

use crate::types::{Face, Round};

/// Escalation state for the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscalationState {
    /// No target seen yet.
    #[default]
    Idle,
    /// Betting on `target`; `retries` bets already placed on it.
    Armed { target: Face, retries: u32 },
    /// Retries used up for `target`; no more bets until it changes or hits.
    Suppressed { target: Face },
}

impl EscalationState {
    pub fn target(&self) -> Option<Face> {
        match self {
            EscalationState::Idle => None,
            EscalationState::Armed { target, .. } | EscalationState::Suppressed { target } => {
                Some(*target)
            }
        }
    }
}

impl fmt::Display for EscalationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationState::Idle => write!(f, "idle"),
            EscalationState::Armed { target, retries } => {
                write!(f, "armed on {target} ({retries} placed)")
            }
            EscalationState::Suppressed { target } => write!(f, "suppressed on {target}"),
        }
    }
}

/// What to do this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetAction {
    /// Send a bet of `stake` on `target`.
    Place { target: Face, stake: u64 },
    /// Nothing to do this round.
    Wait,
    /// The target still stands but its retries are used up.
    Exhausted { target: Face },
}

pub struct BetEscalationController {
    state: EscalationState,
    base_stake: u64,
    max_retries: u32,
}

impl BetEscalationController {
    pub fn new(base_stake: u64, max_retries: u32) -> Self {
        Self {
            state: EscalationState::Idle,
            base_stake,
            max_retries,
        }
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    pub fn base_stake(&self) -> u64 {
        self.base_stake
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Bets already placed on the current target.
    pub fn retry_count(&self) -> u32 {
        match self.state {
            EscalationState::Idle => 0,
            EscalationState::Armed { retries, .. } => retries,
            EscalationState::Suppressed { .. } => self.max_retries,
        }
    }

    /// Stake the next bet on the current target would carry.
    pub fn next_stake(&self) -> u64 {
        self.stake_for(self.retry_count())
    }

    fn stake_for(&self, retries: u32) -> u64 {
        self.base_stake * (u64::from(retries) + 1)
    }

    /// Feed a fresh decision. `latest` is the most recent round.
    ///
    /// Resets to `Armed(target, 0)` when the target changed or the armed
    /// face showed in `latest`; keeps the count otherwise. `None` leaves the
    /// state untouched.
    pub fn observe(&mut self, target: Option<Face>, latest: Option<&Round>) {
        let Some(target) = target else {
            return;
        };

        let armed = self.state.target();
        let hit = matches!((armed, latest), (Some(face), Some(round)) if round.contains(face));

        if hit || armed != Some(target) {
            if hit {
                info!(
                    face = armed.map(Face::value),
                    "Armed face hit, retries reset"
                );
            }
            debug!(target = target.value(), "Target armed");
            self.state = EscalationState::Armed { target, retries: 0 };
        }
    }

    /// Decide whether to bet this round.
    ///
    /// Never bets unless `is_new_round`. A placed bet consumes one retry.
    pub fn should_bet(&mut self, is_new_round: bool) -> BetAction {
        if !is_new_round {
            return BetAction::Wait;
        }

        match self.state {
            EscalationState::Idle => BetAction::Wait,
            EscalationState::Suppressed { target } => BetAction::Exhausted { target },
            EscalationState::Armed { target, retries } if retries >= self.max_retries => {
                self.state = EscalationState::Suppressed { target };
                BetAction::Exhausted { target }
            }
            EscalationState::Armed { target, retries } => {
                let stake = self.stake_for(retries);
                self.state = EscalationState::Armed {
                    target,
                    retries: retries + 1,
                };
                BetAction::Place { target, stake }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

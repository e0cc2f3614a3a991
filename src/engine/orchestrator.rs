//! Session orchestrator.
//!
//! Owns all mutable session state (game state, balance, history, escalation)
//! and reacts to one inbound frame at a time: decode, update, pick a target,
//! gate on round time, escalate, and send the bet pair. Observers get a
//! [`SessionSnapshot`] after every change and never write back.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::shutdown::Shutdown;
use crate::engine::transport::FrameSink;
use crate::history::OutcomeHistory;
use crate::protocol::outbound::{encode_bet, CURRENCY};
use crate::protocol::{self, InboundEvent};
use crate::strategy::escalation::{BetAction, BetEscalationController};
use crate::strategy::round_clock::{is_round_time_valid, Clock, DEFAULT_TOLERANCE};
use crate::strategy::{self, target_value};
use crate::types::{
    BalanceSnapshot, Face, GameState, LinkState, SessionError, SessionSnapshot,
};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Validated knobs the orchestrator runs with.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_stake: u64,
    pub rounds_to_consider: usize,
    pub max_retries: u32,
    pub round_time_tolerance: Duration,
    /// Pause after a bet pair is sent.
    pub settle_delay: Duration,
    /// Pause after a round where the target had no retries left.
    pub exhausted_pause: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            base_stake: 200,
            rounds_to_consider: 5,
            max_retries: 2,
            round_time_tolerance: DEFAULT_TOLERANCE,
            settle_delay: Duration::from_secs(9),
            exhausted_pause: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// A bet pair that went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetTicket {
    pub target: Face,
    pub stake: u64,
    pub round_time: String,
    pub game_id: String,
    /// 1 for the first bet on this target, 2 for the second, ...
    pub attempt: u32,
}

/// What the orchestrator did with a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    Ignored,
    Balance { balance: Decimal, delta: Decimal },
    /// State update without any decodable round.
    NoHistory,
    /// Every face showed in the window.
    NoTarget,
    /// Round stamp too far from now; try again on a later frame.
    Deferred { target: Face },
    /// Round already handled.
    Waiting { target: Face },
    Exhausted { target: Face },
    BetPlaced(BetTicket),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct SessionOrchestrator {
    settings: SessionSettings,
    history: OutcomeHistory,
    game: GameState,
    balance: BalanceSnapshot,
    escalation: BetEscalationController,
    clock: Arc<dyn Clock>,
    shutdown: Shutdown,
    status: watch::Sender<SessionSnapshot>,
    link: LinkState,
    bets_placed: u64,
    reconnects: u64,
}

impl SessionOrchestrator {
    pub fn new(settings: SessionSettings, clock: Arc<dyn Clock>, shutdown: Shutdown) -> Self {
        let escalation = BetEscalationController::new(settings.base_stake, settings.max_retries);
        let (status, _) = watch::channel(SessionSnapshot::default());
        let orchestrator = Self {
            settings,
            history: OutcomeHistory::new(),
            game: GameState::default(),
            balance: BalanceSnapshot::default(),
            escalation,
            clock,
            shutdown,
            status,
            link: LinkState::Disconnected,
            bets_placed: 0,
            reconnects: 0,
        };
        orchestrator.publish();
        orchestrator
    }

    /// Subscribe to snapshots. Receivers only read.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.subscribe()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn history(&self) -> &OutcomeHistory {
        &self.history
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn balance(&self) -> &BalanceSnapshot {
        &self.balance
    }

    pub fn escalation(&self) -> &BetEscalationController {
        &self.escalation
    }

    pub fn bets_placed(&self) -> u64 {
        self.bets_placed
    }

    pub fn set_link_state(&mut self, link: LinkState) {
        if self.link != link {
            debug!(from = %self.link, to = %link, "Link state");
            self.link = link;
            self.publish();
        }
    }

    pub fn record_reconnect(&mut self) {
        self.reconnects += 1;
        self.publish();
    }

    /// Current view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            link: self.link,
            round_time: self.game.round_time.clone(),
            game_id: self.game.game_id.clone(),
            last_round: self.history.latest().map(ToString::to_string),
            target: self.escalation.state().target().map(Face::value),
            escalation: self.escalation.state().to_string(),
            retry_count: self.escalation.retry_count(),
            max_retries: self.escalation.max_retries(),
            base_stake: self.escalation.base_stake(),
            next_stake: self.escalation.next_stake(),
            balance: self.balance.current,
            initial_balance: self.balance.initial,
            balance_delta: self.balance.delta(),
            bets_placed: self.bets_placed,
            reconnects: self.reconnects,
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot());
    }

    /// Decode and react to one text frame.
    pub async fn handle_text<S: FrameSink + ?Sized>(
        &mut self,
        raw: &str,
        sink: &mut S,
    ) -> Result<Reaction, SessionError> {
        let event = protocol::decode(raw)?;
        self.handle_event(event, sink).await
    }

    pub async fn handle_event<S: FrameSink + ?Sized>(
        &mut self,
        event: InboundEvent,
        sink: &mut S,
    ) -> Result<Reaction, SessionError> {
        match event {
            InboundEvent::Ignored => Ok(Reaction::Ignored),
            InboundEvent::BalanceUpdated { balance } => Ok(self.on_balance(balance)),
            InboundEvent::RoundState {
                round_time,
                game_id,
                recent_rounds,
            } => {
                let reaction = self
                    .on_round_state(round_time, game_id, recent_rounds, sink)
                    .await;
                self.publish();
                reaction
            }
        }
    }

    fn on_balance(&mut self, balance: Decimal) -> Reaction {
        let delta = self.balance.record(balance);
        info!(balance = %balance, win_or_lose = %delta, "Balance updated");
        self.publish();
        Reaction::Balance { balance, delta }
    }

    async fn on_round_state<S: FrameSink + ?Sized>(
        &mut self,
        round_time: String,
        game_id: String,
        recent_rounds: Vec<String>,
        sink: &mut S,
    ) -> Result<Reaction, SessionError> {
        let is_new_round = self.game.advance(round_time, game_id);
        self.history.replace(protocol::decode_rounds(&recent_rounds));

        let Some(latest) = self.history.latest().copied() else {
            debug!(round_time = %self.game.round_time, "State update without decodable rounds");
            return Ok(Reaction::NoHistory);
        };

        let n = self.settings.rounds_to_consider;
        let target = strategy::best_target(self.history.window(n), n);

        if is_new_round {
            info!(
                last_round = %latest,
                round_time = %self.game.round_time,
                target = target_value(target),
                "New round"
            );
        }

        let Some(face) = target else {
            if is_new_round {
                info!("No number to bet");
            }
            return Ok(Reaction::NoTarget);
        };

        self.escalation.observe(target, Some(&latest));

        let now = self.clock.now();
        if !is_round_time_valid(&self.game.round_time, now, self.settings.round_time_tolerance)? {
            debug!(
                round_time = %self.game.round_time,
                now = %now.format("%H:%M:%S"),
                "Round time out of tolerance, waiting for the next round"
            );
            return Ok(Reaction::Deferred { target: face });
        }

        match self.escalation.should_bet(is_new_round) {
            BetAction::Wait => Ok(Reaction::Waiting { target: face }),
            BetAction::Exhausted { target } => {
                info!(target = target.value(), "No bet attempts left for this target");
                self.publish();
                self.shutdown.sleep(self.settings.exhausted_pause).await;
                Ok(Reaction::Exhausted { target })
            }
            BetAction::Place { target, stake } => self.place_bet(target, stake, sink).await,
        }
    }

    /// Send the chip log then the bet action. Not atomic: if the second send
    /// fails the first has already gone out.
    async fn place_bet<S: FrameSink + ?Sized>(
        &mut self,
        target: Face,
        stake: u64,
        sink: &mut S,
    ) -> Result<Reaction, SessionError> {
        let envelopes = encode_bet(target, stake, &self.game.round_time, &self.game.game_id)?;
        let [chip_log, bet_action] = envelopes.into_frames();

        if let Err(e) = sink.send_text(chip_log).await {
            warn!(error = %e, "Chip log not sent");
            return Err(e.into());
        }
        if let Err(e) = sink.send_text(bet_action).await {
            warn!(error = %e, "Bet action not sent after chip log");
            return Err(e.into());
        }

        self.bets_placed += 1;
        let ticket = BetTicket {
            target,
            stake,
            round_time: self.game.round_time.clone(),
            game_id: self.game.game_id.clone(),
            attempt: self.escalation.retry_count(),
        };

        info!(
            target = target.value(),
            stake,
            currency = CURRENCY,
            attempt = ticket.attempt,
            game_id = %ticket.game_id,
            "Bet sent"
        );
        self.publish();

        if !self.shutdown.sleep(self.settings.settle_delay).await {
            debug!("Settle delay cut short by shutdown");
        }

        Ok(Reaction::BetPlaced(ticket))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

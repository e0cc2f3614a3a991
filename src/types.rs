//! Shared types for the Sic Bo client.
//!
//! These types form the data model used across all modules: die faces and
//! rounds decoded from the feed, the per-session game and balance state,
//! the snapshot published to observers, and the domain error enums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Faces & rounds
// ---------------------------------------------------------------------------

/// Die-face symbols used by the feed, indexed by `value - 1`.
const FACE_SYMBOLS: [char; 6] = ['\u{2680}', '\u{2681}', '\u{2682}', '\u{2683}', '\u{2684}', '\u{2685}'];

/// One face of a die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Face {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
}

impl Face {
    /// All faces in ascending order.
    pub const ALL: [Face; 6] = [
        Face::One,
        Face::Two,
        Face::Three,
        Face::Four,
        Face::Five,
        Face::Six,
    ];

    /// Numeric value in `1..=6`.
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1..=6 => Some(Self::ALL[usize::from(value) - 1]),
            _ => None,
        }
    }

    /// The Unicode die-face symbol the feed uses for this face.
    pub fn symbol(self) -> char {
        FACE_SYMBOLS[usize::from(self.value()) - 1]
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        FACE_SYMBOLS
            .iter()
            .position(|&s| s == symbol)
            .map(|idx| Self::ALL[idx])
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One resolved round: three dice, in the order the feed reported them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    faces: [Face; 3],
}

impl Round {
    pub fn new(faces: [Face; 3]) -> Self {
        Self { faces }
    }

    pub fn faces(&self) -> [Face; 3] {
        self.faces
    }

    /// Whether `face` shows on any of the three dice (a "hit").
    pub fn contains(&self, face: Face) -> bool {
        self.faces.contains(&face)
    }

    /// Build a round from plain values; `None` if any value is outside `1..=6`.
    pub fn from_values(values: [u8; 3]) -> Option<Self> {
        Some(Self::new([
            Face::from_value(values[0])?,
            Face::from_value(values[1])?,
            Face::from_value(values[2])?,
        ]))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.faces;
        write!(f, "{a}/{b}/{c}")
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The round the server is currently running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Wall-clock time of day of the round (`HH:MM:SS`).
    pub round_time: String,
    /// Opaque game identifier echoed back in bets.
    pub game_id: String,
}

impl GameState {
    /// Overwrite with the latest server state. Returns `true` when the round
    /// timestamp changed, i.e. a new round has started.
    pub fn advance(&mut self, round_time: String, game_id: String) -> bool {
        let is_new_round = self.round_time != round_time;
        self.round_time = round_time;
        self.game_id = game_id;
        is_new_round
    }
}

/// Account balance as reported by the server. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// First balance seen this process; never overwritten.
    pub initial: Option<Decimal>,
    pub current: Option<Decimal>,
}

impl BalanceSnapshot {
    /// Record a new balance and return the win/lose delta since the first one.
    pub fn record(&mut self, balance: Decimal) -> Decimal {
        let initial = *self.initial.get_or_insert(balance);
        self.current = Some(balance);
        balance - initial
    }

    pub fn delta(&self) -> Decimal {
        match (self.initial, self.current) {
            (Some(initial), Some(current)) => current - initial,
            _ => Decimal::ZERO,
        }
    }
}

/// Lifecycle of the feed connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closed,
    Errored,
    Reconnecting,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Connecting => write!(f, "connecting"),
            LinkState::Connected => write!(f, "connected"),
            LinkState::Closed => write!(f, "closed"),
            LinkState::Errored => write!(f, "errored"),
            LinkState::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// Read-only view of the session published to observers after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub link: LinkState,
    pub round_time: String,
    pub game_id: String,
    /// Most recent round, formatted `a/b/c`.
    pub last_round: Option<String>,
    /// Face currently armed for betting.
    pub target: Option<u8>,
    /// Human-readable escalation state.
    pub escalation: String,
    pub retry_count: u32,
    pub max_retries: u32,
    pub base_stake: u64,
    pub next_stake: u64,
    pub balance: Option<Decimal>,
    pub initial_balance: Option<Decimal>,
    pub balance_delta: Decimal,
    pub bets_placed: u64,
    pub reconnects: u64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// An inbound frame that could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("Field `{0}` has the wrong type")]
    WrongType(&'static str),

    #[error("Malformed `{event}` payload: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A round time that is not a valid `HH:MM:SS` time of day.
#[derive(Debug, thiserror::Error)]
#[error("Invalid round time `{value}`, expected HH:MM:SS")]
pub struct RoundTimeError {
    pub value: String,
}

/// Failure on the outbound side of the connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to serialise outbound frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Connection is closed")]
    Closed,
}

/// Why the session handler could not finish processing a frame.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    RoundTime(#[from] RoundTimeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

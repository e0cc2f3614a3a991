//! Feed protocol codec.
//!
//! Inbound frames are JSON envelopes `{"type": ..., "args": {...}}`. Only two
//! discriminants carry anything the session reacts to; every other
//! discriminant decodes to [`InboundEvent::Ignored`]. Outbound bet envelopes
//! live in [`outbound`].

pub mod outbound;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{DecodeError, Face, Round};

/// Discriminant of the balance notification.
pub const BALANCE_UPDATED: &str = "balanceUpdated";
/// Discriminant of the round-state notification.
pub const DICE_STATE: &str = "dice.state";

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    BalanceUpdated {
        balance: Decimal,
    },
    RoundState {
        /// Round time of day, `HH:MM:SS`.
        round_time: String,
        game_id: String,
        /// Raw symbol triplets, most recent first.
        recent_rounds: Vec<String>,
    },
    /// Any discriminant the session does not handle.
    Ignored,
}

#[derive(Debug, Deserialize)]
struct BalanceArgs {
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiceStateArgs {
    number: String,
    game_id: String,
    #[serde(default)]
    recent_results: Vec<String>,
}

/// Decode one text frame.
pub fn decode(raw: &str) -> Result<InboundEvent, DecodeError> {
    let Value::Object(mut root) = serde_json::from_str::<Value>(raw)? else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = match root.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) => return Err(DecodeError::WrongType("type")),
        // Acks and heartbeats carry no discriminant.
        None => return Ok(InboundEvent::Ignored),
    };

    match kind.as_str() {
        BALANCE_UPDATED => {
            let args: BalanceArgs = take_args(&mut root, BALANCE_UPDATED)?;
            Ok(InboundEvent::BalanceUpdated {
                balance: args.balance,
            })
        }
        DICE_STATE => {
            let args: DiceStateArgs = take_args(&mut root, DICE_STATE)?;
            Ok(InboundEvent::RoundState {
                round_time: args.number,
                game_id: args.game_id,
                recent_rounds: args.recent_results,
            })
        }
        _ => Ok(InboundEvent::Ignored),
    }
}

fn take_args<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    event: &'static str,
) -> Result<T, DecodeError> {
    let args = root.remove("args").unwrap_or(Value::Null);
    serde_json::from_value(args).map_err(|source| DecodeError::Payload { event, source })
}

/// Decode a symbol triplet such as `"⚀⚃⚅"` into a [`Round`].
///
/// Only the first three characters are read. Returns `None` if there are
/// fewer than three or any of them is not a die-face symbol.
pub fn decode_round(symbols: &str) -> Option<Round> {
    let mut chars = symbols.chars();
    let mut next_face = || chars.next().and_then(Face::from_symbol);
    Some(Round::new([next_face()?, next_face()?, next_face()?]))
}

/// Decode every well-formed triplet, dropping the rest, preserving order.
pub fn decode_rounds<S: AsRef<str>>(triplets: &[S]) -> Vec<Round> {
    triplets
        .iter()
        .filter_map(|t| decode_round(t.as_ref()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Outbound bet envelopes.
//!
//! A bet is two frames sent in order: a client-side chip-placement log,
//! then the bet action the server acts on. Field order and literal values
//! are what the table client sends and must not drift.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Face, TransportError};

/// Id carried by every bet-action envelope.
pub const BET_ACTION_ID: &str = "alevmddm5e";
pub const CURRENCY: &str = "IQD";
pub const CHIP_STACK: [u64; 6] = [200, 500, 1000, 2000, 5000, 25000];
pub const TABLE_MIN_LIMIT: u64 = 200;
pub const TABLE_MAX_LIMIT: u64 = 2_500_000;

// ---------------------------------------------------------------------------
// Chip log envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChipLogEnvelope<'a> {
    log: ChipLog<'a>,
}

#[derive(Debug, Serialize)]
struct ChipLog<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: ChipValue<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChipValue<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    codes: BTreeMap<String, u64>,
    amount: u64,
    currency: &'static str,
    chip_stack: [u64; 6],
    game_type: &'static str,
    table_min_limit: u64,
    table_max_limit: u64,
    bets: BTreeMap<String, u64>,
    game_time: &'a str,
    channel: &'static str,
    orientation: &'static str,
    game_dimensions: GameDimensions,
    game_id: &'a str,
}

#[derive(Debug, Serialize)]
struct GameDimensions {
    width: u32,
    height: f64,
}

// ---------------------------------------------------------------------------
// Bet action envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct BetActionEnvelope<'a> {
    id: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    args: BetActionArgs<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BetActionArgs<'a> {
    game_id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    chips: BTreeMap<String, u64>,
    bet_tags: BetTags,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BetTags {
    mw_layout: u32,
    open_mw_tables: u32,
    bt_video_quality: &'static str,
    bt_table_view: &'static str,
    orientation: &'static str,
    video_protocol: &'static str,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// The two serialised frames of one bet, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetEnvelopes {
    pub chip_log: String,
    pub bet_action: String,
}

impl BetEnvelopes {
    /// Frames in the order they must be sent.
    pub fn into_frames(self) -> [String; 2] {
        [self.chip_log, self.bet_action]
    }
}

/// Encode a bet of `stake` on `target` for the given round.
pub fn encode_bet(
    target: Face,
    stake: u64,
    round_time: &str,
    game_id: &str,
) -> Result<BetEnvelopes, TransportError> {
    let code = format!("SicBo_{}", target.value());

    let chip_log = ChipLogEnvelope {
        log: ChipLog {
            kind: "CLIENT_BET_CHIP",
            value: ChipValue {
                kind: "Chip",
                codes: BTreeMap::from([(code.clone(), stake)]),
                amount: stake,
                currency: CURRENCY,
                chip_stack: CHIP_STACK,
                game_type: "sicbo",
                table_min_limit: TABLE_MIN_LIMIT,
                table_max_limit: TABLE_MAX_LIMIT,
                bets: BTreeMap::from([(code, stake)]),
                game_time: round_time,
                channel: "PCMac",
                orientation: "landscape",
                game_dimensions: GameDimensions {
                    width: 1122,
                    height: 631.125,
                },
                game_id,
            },
        },
    };

    let bet_action = BetActionEnvelope {
        id: BET_ACTION_ID,
        kind: "dice.betAction",
        args: BetActionArgs {
            game_id,
            kind: "SET_CHIPS",
            chips: BTreeMap::from([(target.symbol().to_string(), stake)]),
            bet_tags: BetTags {
                mw_layout: 8,
                open_mw_tables: 1,
                bt_video_quality: "_hd",
                bt_table_view: "1",
                orientation: "landscape",
                video_protocol: "fmp4",
            },
        },
    };

    Ok(BetEnvelopes {
        chip_log: serde_json::to_string(&chip_log)?,
        bet_action: serde_json::to_string(&bet_action)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! End-to-end betting scenarios driven through the orchestrator.

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use sicbo_bot::engine::orchestrator::{Reaction, SessionOrchestrator, SessionSettings};
use sicbo_bot::engine::shutdown::Shutdown;
use sicbo_bot::strategy::round_clock::FixedClock;
use sicbo_bot::types::{Face, SessionError, TransportError};

use crate::recording_sink::RecordingSink;

pub fn symbols(values: [u8; 3]) -> String {
    values
        .iter()
        .map(|v| Face::from_value(*v).unwrap().symbol())
        .collect()
}

pub fn state_frame(round_time: &str, game_id: &str, rounds: &[[u8; 3]]) -> String {
    let results: Vec<String> = rounds.iter().map(|r| symbols(*r)).collect();
    json!({
        "type": "dice.state",
        "args": {"number": round_time, "gameId": game_id, "recentResults": results}
    })
    .to_string()
}

fn orchestrator(
    base_stake: u64,
    rounds_to_consider: usize,
) -> (SessionOrchestrator, tokio::sync::watch::Sender<bool>) {
    let (tx, shutdown) = Shutdown::channel();
    let settings = SessionSettings {
        base_stake,
        rounds_to_consider,
        settle_delay: Duration::ZERO,
        exhausted_pause: Duration::ZERO,
        ..SessionSettings::default()
    };
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 10).unwrap());
    (SessionOrchestrator::new(settings, Arc::new(clock), shutdown), tx)
}

fn placed_stake(reaction: &Reaction) -> Option<(Face, u64)> {
    match reaction {
        Reaction::BetPlaced(ticket) => Some((ticket.target, ticket.stake)),
        _ => None,
    }
}

#[tokio::test]
async fn test_escalation_then_reset_after_hit() {
    let (mut orc, _tx) = orchestrator(200, 5);
    let mut sink = RecordingSink::new();

    // Faces 1..5 across the window, 6 missing.
    let first = state_frame("18:00:05", "g-1", &[[1, 2, 3], [4, 5, 5], [1, 1, 2]]);
    let reaction = orc.handle_text(&first, &mut sink).await.unwrap();
    assert_eq!(placed_stake(&reaction), Some((Face::Six, 200)));

    // New round, 6 still missing.
    let second = state_frame("18:00:07", "g-2", &[[2, 2, 4], [1, 2, 3], [4, 5, 5]]);
    let reaction = orc.handle_text(&second, &mut sink).await.unwrap();
    assert_eq!(placed_stake(&reaction), Some((Face::Six, 400)));
    assert_eq!(orc.escalation().retry_count(), 2);

    // 6 shows; 4 and 5 are now missing, so the target moves to 4 at base stake.
    let third = state_frame("18:00:09", "g-3", &[[6, 6, 6], [1, 2, 3], [1, 1, 1]]);
    let reaction = orc.handle_text(&third, &mut sink).await.unwrap();
    assert_eq!(placed_stake(&reaction), Some((Face::Four, 200)));
    assert_eq!(orc.escalation().retry_count(), 1);

    let frames = sink.json_frames();
    assert_eq!(frames.len(), 6);
    assert_eq!(frames[0]["log"]["value"]["codes"]["SicBo_6"], 200);
    assert_eq!(frames[1]["args"]["chips"]["⚅"], 200);
    assert_eq!(frames[2]["log"]["value"]["amount"], 400);
    assert_eq!(frames[3]["args"]["gameId"], "g-2");
    assert_eq!(frames[4]["log"]["value"]["bets"]["SicBo_4"], 200);
    assert_eq!(frames[5]["args"]["chips"]["⚃"], 200);
    assert_eq!(frames[5]["type"], "dice.betAction");
    assert_eq!(orc.bets_placed(), 3);
}

#[tokio::test]
async fn test_target_suppressed_after_max_retries() {
    let (mut orc, _tx) = orchestrator(500, 5);
    let mut sink = RecordingSink::new();
    let rounds = [[1, 2, 3], [4, 5, 5]];

    let mut stakes = Vec::new();
    for time in ["18:00:03", "18:00:05", "18:00:07", "18:00:09"] {
        let reaction = orc
            .handle_text(&state_frame(time, "g", &rounds), &mut sink)
            .await
            .unwrap();
        stakes.push(placed_stake(&reaction).map(|(_, stake)| stake));
    }

    assert_eq!(stakes, vec![Some(500), Some(1000), None, None]);
    assert_eq!(sink.frames().len(), 4);
}

#[tokio::test]
async fn test_duplicate_round_sends_nothing() {
    let (mut orc, _tx) = orchestrator(200, 5);
    let mut sink = RecordingSink::new();
    let frame = state_frame("18:00:05", "g", &[[1, 2, 3]]);

    orc.handle_text(&frame, &mut sink).await.unwrap();
    orc.handle_text(&frame, &mut sink).await.unwrap();
    orc.handle_text(&frame, &mut sink).await.unwrap();

    assert_eq!(sink.frames().len(), 2);
}

#[tokio::test]
async fn test_malformed_frames_do_not_stop_processing() {
    let (mut orc, _tx) = orchestrator(200, 5);
    let mut sink = RecordingSink::new();

    assert!(matches!(
        orc.handle_text("not json", &mut sink).await,
        Err(SessionError::Decode(_))
    ));
    assert!(matches!(
        orc.handle_text(r#"{"type":"balanceUpdated","args":{}}"#, &mut sink).await,
        Err(SessionError::Decode(_))
    ));
    assert_eq!(
        orc.handle_text(r#"{"type":"chat.message"}"#, &mut sink).await.unwrap(),
        Reaction::Ignored
    );

    let balance = orc
        .handle_text(r#"{"type":"balanceUpdated","args":{"balance":1250.5}}"#, &mut sink)
        .await
        .unwrap();
    assert_eq!(balance, Reaction::Balance { balance: dec!(1250.5), delta: dec!(0) });

    let frame = state_frame("18:00:05", "g", &[[1, 2, 3]]);
    let reaction = orc.handle_text(&frame, &mut sink).await.unwrap();
    assert_eq!(placed_stake(&reaction), Some((Face::Four, 200)));
}

#[tokio::test]
async fn test_partial_send_is_not_rolled_back() {
    let (mut orc, _tx) = orchestrator(200, 5);
    let mut sink = RecordingSink::new();
    sink.fail_after(1);

    let frame = state_frame("18:00:05", "g", &[[1, 2, 3]]);
    let err = orc.handle_text(&frame, &mut sink).await.unwrap_err();

    assert!(matches!(err, SessionError::Transport(TransportError::Closed)));
    let frames = sink.json_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["log"]["type"], "CLIENT_BET_CHIP");
    assert_eq!(orc.bets_placed(), 0);
}

#[tokio::test]
async fn test_out_of_tolerance_round_defers_until_fresh_frame() {
    let (mut orc, _tx) = orchestrator(200, 5);
    let mut sink = RecordingSink::new();

    let stale = state_frame("17:50:00", "g", &[[1, 2, 3]]);
    assert_eq!(
        orc.handle_text(&stale, &mut sink).await.unwrap(),
        Reaction::Deferred { target: Face::Four }
    );
    assert!(sink.frames().is_empty());

    let fresh = state_frame("18:00:02", "g", &[[1, 2, 3]]);
    let reaction = orc.handle_text(&fresh, &mut sink).await.unwrap();
    assert_eq!(placed_stake(&reaction), Some((Face::Four, 200)));
}

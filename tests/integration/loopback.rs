//! Transport tests against a real WebSocket server on localhost.

use chrono::{TimeZone, Utc};
use futures::{SinkExt, StreamExt};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

use sicbo_bot::engine::orchestrator::{SessionOrchestrator, SessionSettings};
use sicbo_bot::engine::shutdown::Shutdown;
use sicbo_bot::engine::transport::TransportSession;
use sicbo_bot::strategy::round_clock::FixedClock;
use sicbo_bot::types::LinkState;

use crate::scenario::state_frame;

fn settings() -> SessionSettings {
    SessionSettings {
        settle_delay: Duration::ZERO,
        exhausted_pause: Duration::ZERO,
        ..SessionSettings::default()
    }
}

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 10).unwrap()))
}

#[tokio::test]
async fn test_bet_close_reconnect_then_cancel() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();
    let (second_tx, second_rx) = oneshot::channel::<()>();

    // First connection: push a round, collect the bet pair, then close.
    // Second connection: just stay open.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::Ping(b"hb".to_vec())).await.unwrap();
        ws.send(Message::Text(r#"{"type":"balanceUpdated","args":{"balance":5000}}"#.into()))
            .await
            .unwrap();
        ws.send(Message::Text("garbage".into())).await.unwrap();
        // Unreadable round time: skipped, the connection stays up.
        ws.send(Message::Text(state_frame("noon", "g-0", &[[1, 2, 3], [4, 5, 5]])))
            .await
            .unwrap();
        ws.send(Message::Text(state_frame("18:00:05", "g-1", &[[1, 2, 3], [4, 5, 5]])))
            .await
            .unwrap();

        let mut texts = 0;
        let mut pongs = 0;
        while texts < 2 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    frames_tx.send(text).unwrap();
                    texts += 1;
                }
                Some(Ok(Message::Pong(_))) => pongs += 1,
                Some(Ok(_)) => {}
                other => panic!("unexpected client frame: {other:?}"),
            }
        }
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        second_tx.send(()).unwrap();
        while let Some(Ok(_)) = ws.next().await {}
        pongs
    });

    let (stop_tx, shutdown) = Shutdown::channel();
    let mut orchestrator = SessionOrchestrator::new(settings(), fixed_clock(), shutdown.clone());
    let status = orchestrator.subscribe();
    let url = SecretString::new(format!("ws://{addr}"));

    let client = tokio::spawn(async move {
        let mut session = TransportSession::new(url, Duration::from_millis(50), shutdown);
        session.run(&mut orchestrator).await;
        orchestrator
    });

    tokio::time::timeout(Duration::from_secs(10), second_rx)
        .await
        .expect("client never reconnected")
        .unwrap();
    stop_tx.send(true).unwrap();

    let orchestrator = tokio::time::timeout(Duration::from_secs(10), client)
        .await
        .expect("session did not stop after cancel")
        .unwrap();

    let chip_log: serde_json::Value = serde_json::from_str(&frames_rx.recv().await.unwrap()).unwrap();
    let bet_action: serde_json::Value = serde_json::from_str(&frames_rx.recv().await.unwrap()).unwrap();
    assert_eq!(chip_log["log"]["value"]["codes"]["SicBo_6"], 200);
    assert_eq!(bet_action["args"]["chips"]["⚅"], 200);
    assert_eq!(bet_action["args"]["gameId"], "g-1");

    assert_eq!(orchestrator.bets_placed(), 1);
    assert_eq!(orchestrator.balance().current, Some(rust_decimal_macros::dec!(5000)));

    let snapshot = status.borrow().clone();
    assert_eq!(snapshot.link, LinkState::Disconnected);
    // Only the server-initiated close led to a reconnect.
    assert_eq!(snapshot.reconnects, 1);

    let pongs = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .unwrap()
        .unwrap();
    assert!(pongs >= 1);
}

#[tokio::test]
async fn test_cancel_during_reconnect_delay() {
    // Reserve a port and free it so the connect is refused.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let (stop_tx, shutdown) = Shutdown::channel();
    let mut orchestrator = SessionOrchestrator::new(settings(), fixed_clock(), shutdown.clone());
    let mut status = orchestrator.subscribe();
    let url = SecretString::new(format!("ws://{addr}"));

    let client = tokio::spawn(async move {
        let mut session = TransportSession::new(url, Duration::from_secs(60), shutdown);
        session.run(&mut orchestrator).await;
        orchestrator
    });

    // Wait for the loop to enter its reconnect delay.
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            status.changed().await.unwrap();
            if status.borrow_and_update().link == LinkState::Reconnecting {
                break;
            }
        }
    })
    .await
    .expect("never reached the reconnect delay");

    stop_tx.send(true).unwrap();
    let orchestrator = tokio::time::timeout(Duration::from_secs(5), client)
        .await
        .expect("cancel did not cut the reconnect delay short")
        .unwrap();

    assert_eq!(orchestrator.bets_placed(), 0);
    assert_eq!(orchestrator.snapshot().reconnects, 0);
    assert_eq!(orchestrator.snapshot().link, LinkState::Disconnected);
}

#[tokio::test]
async fn test_already_cancelled_session_never_connects() {
    let (stop_tx, shutdown) = Shutdown::channel();
    stop_tx.send(true).unwrap();

    let mut orchestrator = SessionOrchestrator::new(settings(), fixed_clock(), shutdown.clone());
    let mut session = TransportSession::new(
        SecretString::new("ws://127.0.0.1:1".into()),
        Duration::from_secs(60),
        shutdown,
    );

    tokio::time::timeout(Duration::from_secs(5), session.run(&mut orchestrator))
        .await
        .unwrap();
    assert_eq!(orchestrator.snapshot().link, LinkState::Disconnected);
}

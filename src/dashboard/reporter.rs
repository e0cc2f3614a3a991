//! Periodic status line.
//!
//! Logs a one-line summary of the session at a fixed interval, but only when
//! the snapshot changed since the last line.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::shutdown::Shutdown;
use crate::types::SessionSnapshot;

/// Human-readable status line for a snapshot.
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let target = snapshot
        .target
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    format!(
        "Retry count: {}/{} | Base stake: {} | Next stake: {} | Betting on: {}",
        snapshot.retry_count, snapshot.max_retries, snapshot.base_stake, snapshot.next_stake, target
    )
}

/// Spawn the reporter. Stops on shutdown or when the publisher goes away.
pub fn spawn_status_reporter(
    mut snapshots: watch::Receiver<SessionSnapshot>,
    interval: Duration,
    mut shutdown: Shutdown,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(10)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => break,
            }

            match snapshots.has_changed() {
                Ok(true) => {
                    let snapshot = snapshots.borrow_and_update().clone();
                    info!(
                        link = %snapshot.link,
                        round_time = %snapshot.round_time,
                        bets_placed = snapshot.bets_placed,
                        balance_delta = %snapshot.balance_delta,
                        "{}",
                        status_line(&snapshot)
                    );
                }
                Ok(false) => {}
                Err(_) => break,
            }
        }
        debug!("Status reporter stopped");
    })
}

//! Dashboard API route handlers.
//!
//! All endpoints return JSON built from the latest published snapshot.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::types::SessionSnapshot;

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    snapshots: watch::Receiver<SessionSnapshot>,
    started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(snapshots: watch::Receiver<SessionSnapshot>) -> Self {
        Self {
            snapshots,
            started_at: Utc::now(),
        }
    }

    fn latest(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }
}

pub type AppState = Arc<DashboardState>;

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub uptime_secs: i64,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub balance: Option<Decimal>,
    pub initial_balance: Option<Decimal>,
    pub delta: Decimal,
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        session: state.latest(),
    })
}

/// GET /api/balance
pub async fn get_balance(State(state): State<AppState>) -> Json<BalanceResponse> {
    let snapshot = state.latest();
    Json(BalanceResponse {
        balance: snapshot.balance,
        initial_balance: snapshot.initial_balance,
        delta: snapshot.balance_delta,
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

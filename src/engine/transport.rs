//! Feed transport.
//!
//! Holds one WebSocket connection at a time and loops
//! `connect → listen → reconnect` until shutdown. Every text frame is handed
//! to the [`SessionOrchestrator`] on this same task, so session state has a
//! single writer. Reconnects use a fixed delay and never give up.

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::engine::orchestrator::SessionOrchestrator;
use crate::engine::shutdown::Shutdown;
use crate::types::{LinkState, SessionError, TransportError};

/// Default delay between a lost connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Outbound seam
// ---------------------------------------------------------------------------

/// Where outbound text frames go. Each call sends one complete frame.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;
}

/// Write half of a live connection.
pub struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

impl WsSink {
    fn new(inner: SplitSink<WsStream, Message>) -> Self {
        Self { inner }
    }

    async fn pong(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.inner.send(Message::Pong(payload)).await?;
        Ok(())
    }

    /// Best-effort close handshake.
    async fn close(&mut self) {
        if let Err(e) = self.inner.close().await {
            debug!(error = %e, "Close handshake failed");
        }
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.inner.send(Message::Text(text)).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// How one connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenOutcome {
    Closed,
    Errored,
    Cancelled,
}

pub struct TransportSession {
    url: SecretString,
    reconnect_delay: Duration,
    shutdown: Shutdown,
}

impl TransportSession {
    pub fn new(url: SecretString, reconnect_delay: Duration, shutdown: Shutdown) -> Self {
        Self {
            url,
            reconnect_delay,
            shutdown,
        }
    }

    /// Run until shutdown, reconnecting after every close or failure.
    pub async fn run(&mut self, orchestrator: &mut SessionOrchestrator) {
        let span = info_span!("session", session_id = %Uuid::new_v4());
        self.run_loop(orchestrator).instrument(span).await
    }

    async fn run_loop(&mut self, orchestrator: &mut SessionOrchestrator) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            orchestrator.set_link_state(LinkState::Connecting);
            let outcome = match self.connect().await {
                Ok(Some(ws)) => {
                    info!("Connected to feed");
                    orchestrator.set_link_state(LinkState::Connected);
                    self.listen(ws, orchestrator).await
                }
                Ok(None) => ListenOutcome::Cancelled,
                Err(e) => {
                    error!(error = %e, "Connection failed");
                    ListenOutcome::Errored
                }
            };

            match outcome {
                ListenOutcome::Closed => orchestrator.set_link_state(LinkState::Closed),
                ListenOutcome::Errored => orchestrator.set_link_state(LinkState::Errored),
                ListenOutcome::Cancelled => break,
            }

            orchestrator.set_link_state(LinkState::Reconnecting);
            info!(
                delay_secs = self.reconnect_delay.as_secs_f64(),
                "Connection closed, reconnecting"
            );
            if !self.shutdown.sleep(self.reconnect_delay).await {
                break;
            }
            orchestrator.record_reconnect();
        }

        orchestrator.set_link_state(LinkState::Disconnected);
        info!("Session stopped");
    }

    /// Open the connection. `Ok(None)` if shutdown won the race.
    async fn connect(&mut self) -> Result<Option<WsStream>, TransportError> {
        tokio::select! {
            result = connect_async(self.url.expose_secret().as_str()) => {
                let (ws, response) = result?;
                debug!(status = %response.status(), "WebSocket handshake complete");
                Ok(Some(ws))
            }
            _ = self.shutdown.cancelled() => Ok(None),
        }
    }

    async fn listen(
        &mut self,
        ws: WsStream,
        orchestrator: &mut SessionOrchestrator,
    ) -> ListenOutcome {
        let (write, mut read) = ws.split();
        let mut sink = WsSink::new(write);

        loop {
            let frame = tokio::select! {
                frame = read.next() => frame,
                _ = self.shutdown.cancelled() => {
                    sink.close().await;
                    return ListenOutcome::Cancelled;
                }
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    match orchestrator.handle_text(&text, &mut sink).await {
                        Ok(reaction) => debug!(?reaction, "Frame handled"),
                        Err(SessionError::Decode(e)) => {
                            warn!(error = %e, "Discarding malformed frame");
                        }
                        Err(SessionError::RoundTime(e)) => {
                            warn!(error = %e, "Skipping frame with unreadable round time");
                        }
                        Err(SessionError::Transport(e)) => {
                            error!(error = %e, "Send failed");
                            return ListenOutcome::Errored;
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = sink.pong(payload).await {
                        error!(error = %e, "Pong failed");
                        return ListenOutcome::Errored;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "Feed closed by server");
                    sink.close().await;
                    return ListenOutcome::Closed;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    return ListenOutcome::Errored;
                }
                None => {
                    info!("Feed stream ended");
                    return ListenOutcome::Closed;
                }
            }
        }
    }
}

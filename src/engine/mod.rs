//! Core engine: the connection loop and the per-frame session handler.
//!
//! [`transport::TransportSession`] owns the socket and feeds every text frame
//! to [`orchestrator::SessionOrchestrator`]; both stop on [`shutdown::Shutdown`].

pub mod orchestrator;
pub mod shutdown;
pub mod transport;

//! SICBO-BOT: automated client for a real-time Sic Bo dice feed.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod activation;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod history;
pub mod protocol;
pub mod strategy;
pub mod types;

//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` (or the file named by `SICBO_CONFIG`) and deserializes
//! into strongly-typed structs. Every field has a default, so an empty file
//! is valid. The feed URL is referenced by env-var name and resolved at
//! runtime into a [`SecretString`].

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use tracing::warn;

use crate::engine::orchestrator::SessionSettings;

/// Env var that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "SICBO_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Stakes the table accepts as a base stake.
pub const ALLOWED_BASE_STAKES: [u64; 4] = [200, 500, 1000, 2000];
/// Accepted window sizes for target selection.
pub const ALLOWED_ROUNDS: [usize; 9] = [1, 2, 3, 5, 6, 7, 8, 9, 10];

const DEFAULT_BASE_STAKE: u64 = 200;
const DEFAULT_ROUNDS: usize = 5;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub timing: TimingConfig,
    pub activation: ActivationConfig,
    pub dashboard: DashboardConfig,
    pub status: StatusConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the env var holding the feed URL.
    pub url_env: String,
    /// Inline URL, used only when `url_env` is unset.
    pub url: Option<String>,
    pub base_stake: u64,
    pub rounds_to_consider: usize,
    pub max_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url_env: "SICBO_WS_URL".into(),
            url: None,
            base_stake: DEFAULT_BASE_STAKE,
            rounds_to_consider: DEFAULT_ROUNDS,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub reconnect_delay_secs: u64,
    pub settle_delay_secs: u64,
    pub exhausted_pause_secs: u64,
    pub round_time_tolerance_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: 3,
            settle_delay_secs: 9,
            exhausted_pause_secs: 1,
            round_time_tolerance_secs: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActivationConfig {
    pub enabled: bool,
    pub url_env: String,
    pub exit_delay_secs: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url_env: "SICBO_ACTIVATION_URL".into(),
            exit_delay_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StatusConfig {
    pub interval_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { interval_secs: 1 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Path from `SICBO_CONFIG`, or `config.toml`.
    pub fn default_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Replace out-of-range choices with their defaults.
    fn validate(&mut self) {
        if !ALLOWED_BASE_STAKES.contains(&self.session.base_stake) {
            warn!(
                base_stake = self.session.base_stake,
                allowed = ?ALLOWED_BASE_STAKES,
                fallback = DEFAULT_BASE_STAKE,
                "Invalid base stake, using default"
            );
            self.session.base_stake = DEFAULT_BASE_STAKE;
        }
        if !ALLOWED_ROUNDS.contains(&self.session.rounds_to_consider) {
            warn!(
                rounds_to_consider = self.session.rounds_to_consider,
                allowed = ?ALLOWED_ROUNDS,
                fallback = DEFAULT_ROUNDS,
                "Invalid rounds to consider, using default"
            );
            self.session.rounds_to_consider = DEFAULT_ROUNDS;
        }
    }

    /// Resolve the feed URL: the `url_env` variable first, then the inline `url`.
    pub fn resolve_url(&self) -> Result<SecretString> {
        match std::env::var(&self.session.url_env) {
            Ok(url) if !url.trim().is_empty() => Ok(SecretString::new(url)),
            _ => self
                .session
                .url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .map(SecretString::new)
                .with_context(|| {
                    format!(
                        "Feed URL not configured: set {} or [session].url",
                        self.session.url_env
                    )
                }),
        }
    }

    /// Activation endpoint, if the env var is set.
    pub fn activation_url(&self) -> Option<String> {
        std::env::var(&self.activation.url_env)
            .ok()
            .filter(|url| !url.trim().is_empty())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            base_stake: self.session.base_stake,
            rounds_to_consider: self.session.rounds_to_consider,
            max_retries: self.session.max_retries,
            round_time_tolerance: Duration::from_secs(self.timing.round_time_tolerance_secs),
            settle_delay: Duration::from_secs(self.timing.settle_delay_secs),
            exhausted_pause: Duration::from_secs(self.timing.exhausted_pause_secs),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.timing.reconnect_delay_secs)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status.interval_secs)
    }
}

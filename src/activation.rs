//! Startup activation check.
//!
//! A single yes/no gate evaluated before the session starts. The remote
//! check fetches a text document and treats a body of `1` as activated;
//! anything else, including any HTTP or network failure, is "not activated".

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait ActivationCheck: Send + Sync {
    async fn is_activated(&self) -> bool;
}

/// Used when activation is disabled in config.
pub struct AlwaysActivated;

#[async_trait]
impl ActivationCheck for AlwaysActivated {
    async fn is_activated(&self) -> bool {
        true
    }
}

/// Used when activation is enabled but no endpoint is configured.
pub struct NeverActivated;

#[async_trait]
impl ActivationCheck for NeverActivated {
    async fn is_activated(&self) -> bool {
        false
    }
}

pub struct RemoteActivation {
    http: Client,
    url: String,
}

impl RemoteActivation {
    pub fn new(url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("sicbo-bot/0.1.0")
            .build()
            .context("Failed to build HTTP client for activation check")?;
        Ok(Self { http, url })
    }

    async fn fetch(&self) -> Result<String> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Activation request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Activation endpoint returned {}", resp.status());
        }

        resp.text().await.context("Failed to read activation response")
    }
}

#[async_trait]
impl ActivationCheck for RemoteActivation {
    async fn is_activated(&self) -> bool {
        match self.fetch().await {
            Ok(body) => {
                debug!(body_len = body.len(), "Activation response received");
                body.trim() == "1"
            }
            Err(e) => {
                warn!(error = %e, "Activation check failed");
                false
            }
        }
    }
}

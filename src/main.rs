//! SICBO-BOT: automated client for a real-time Sic Bo dice feed.
//!
//! Entry point. Loads configuration, initialises structured logging, runs
//! the activation check, then drives the feed session until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use sicbo_bot::activation::{ActivationCheck, AlwaysActivated, NeverActivated, RemoteActivation};
use sicbo_bot::config::AppConfig;
use sicbo_bot::dashboard;
use sicbo_bot::dashboard::reporter::spawn_status_reporter;
use sicbo_bot::engine::orchestrator::SessionOrchestrator;
use sicbo_bot::engine::shutdown::Shutdown;
use sicbo_bot::engine::transport::TransportSession;
use sicbo_bot::strategy::round_clock::SystemClock;

const BANNER: &str = r#"
 ____  _        ____          ____        _
/ ___|(_) ___  | __ )  ___   | __ )  ___ | |_
\___ \| |/ __| |  _ \ / _ \  |  _ \ / _ \| __|
 ___) | | (__  | |_) | (_) | | |_) | (_) | |_
|____/|_|\___| |____/ \___/  |____/ \___/ \__|

  Sic Bo feed client
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::default_path();
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    // Pin the ring backend for wss:// before any TLS handshake.
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A TLS crypto provider was already installed");
    }

    println!("{BANNER}");
    info!(
        config = %config_path,
        base_stake = cfg.session.base_stake,
        rounds_to_consider = cfg.session.rounds_to_consider,
        max_retries = cfg.session.max_retries,
        "SICBO-BOT starting up"
    );

    // -- Activation ------------------------------------------------------

    let activation = build_activation(&cfg)?;
    if !activation.is_activated().await {
        warn!(
            exit_delay_secs = cfg.activation.exit_delay_secs,
            "Client is not activated, exiting"
        );
        tokio::time::sleep(Duration::from_secs(cfg.activation.exit_delay_secs)).await;
        return Ok(());
    }

    // -- Wiring ----------------------------------------------------------

    let url = cfg.resolve_url()?;
    let (stop_tx, shutdown) = Shutdown::channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, stopping"),
        }
        let _ = stop_tx.send(true);
    });

    let mut orchestrator =
        SessionOrchestrator::new(cfg.session_settings(), Arc::new(SystemClock), shutdown.clone());

    let reporter = spawn_status_reporter(
        orchestrator.subscribe(),
        cfg.status_interval(),
        shutdown.clone(),
    );

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(orchestrator.subscribe(), cfg.dashboard.port);
    }

    // -- Session ---------------------------------------------------------

    info!("Entering session loop. Press Ctrl+C to stop.");
    let mut session = TransportSession::new(url, cfg.reconnect_delay(), shutdown);
    session.run(&mut orchestrator).await;

    if let Err(e) = reporter.await {
        warn!(error = %e, "Status reporter task failed");
    }

    info!(
        bets_placed = orchestrator.bets_placed(),
        balance_delta = %orchestrator.balance().delta(),
        "SICBO-BOT shut down cleanly."
    );

    Ok(())
}

/// Pick the activation check from config.
fn build_activation(cfg: &AppConfig) -> Result<Box<dyn ActivationCheck>> {
    if !cfg.activation.enabled {
        return Ok(Box::new(AlwaysActivated));
    }
    match cfg.activation_url() {
        Some(url) => Ok(Box::new(RemoteActivation::new(url)?)),
        None => {
            warn!(
                url_env = %cfg.activation.url_env,
                "Activation enabled but no endpoint configured"
            );
            Ok(Box::new(NeverActivated))
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sicbo_bot=info"));

    let json_logging = std::env::var("SICBO_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

//! pointcast relay server — entry point.
//!
//! This binary relays pointer/orientation events from phone-class "remote"
//! clients to display-class "screen" clients in near-real-time, coalescing
//! the high-frequency position stream into batch broadcasts at a fixed
//! cadence (15 ms, just under 60 fps).
//!
//! The static screen/remote entry pages are *not* served here; any ordinary
//! web server can deliver them.  This process exposes only the WebSocket
//! endpoint both page types connect back to.
//!
//! # Usage
//!
//! ```text
//! pointcast-server [OPTIONS]
//!
//! Options:
//!   --port <PORT>               Listener port [default: 8090]
//!   --bind <IP>                 Bind address [default: 0.0.0.0]
//!   --advertise-host <IP>       IP screens are told to advertise to phones
//!                               [default: auto-detected LAN address]
//!   --batch-interval-ms <MS>    Positions broadcast cadence [default: 15]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                      | Default     | Description                 |
//! |-------------------------------|-------------|-----------------------------|
//! | `POINTCAST_PORT`              | `8090`      | Listener port               |
//! | `POINTCAST_BIND`              | `0.0.0.0`   | Bind address                |
//! | `POINTCAST_ADVERTISE_HOST`    | auto-detect | Advertised IP               |
//! | `POINTCAST_BATCH_INTERVAL_MS` | `15`        | Broadcast cadence in ms     |
//!
//! CLI arguments take precedence when both are present.  Log verbosity is
//! controlled by `RUST_LOG` (e.g. `RUST_LOG=pointcast_server=debug`).

use std::net::IpAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pointcast_server::config::RelayConfig;
use pointcast_server::local_addr::detect_local_ip;
use pointcast_server::ws_server::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// pointcast relay server.
///
/// Fans pointer/orientation events from many phone remotes out to screen
/// clients as rate-limited batch snapshots over WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "pointcast-server",
    about = "Batched pointer/orientation relay between phone remotes and display screens",
    version
)]
struct Cli {
    /// TCP port the WebSocket listener (and the advertised address) uses.
    #[arg(long, default_value_t = 8090, env = "POINTCAST_PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// `0.0.0.0` accepts connections from any interface — the normal
    /// deployment, since phones join over the venue network.
    #[arg(long, default_value = "0.0.0.0", env = "POINTCAST_BIND")]
    bind: String,

    /// IP address screens should tell phones to connect to.
    ///
    /// When omitted, the LAN-reachable address of this host is detected
    /// automatically (falling back to 127.0.0.1 with a warning).
    #[arg(long, env = "POINTCAST_ADVERTISE_HOST")]
    advertise_host: Option<String>,

    /// Milliseconds between successive `positions` broadcasts while at
    /// least one remote is connected.
    #[arg(long, default_value_t = 15, env = "POINTCAST_BATCH_INTERVAL_MS")]
    batch_interval_ms: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` or `--advertise-host` is not a valid IP
    /// address.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let bind_ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        let advertise_ip: IpAddr = match &self.advertise_host {
            Some(host) => host
                .parse()
                .with_context(|| format!("invalid advertise host: '{host}'"))?,
            None => detect_local_ip().unwrap_or_else(|e| {
                warn!("could not detect LAN address ({e}); advertising loopback");
                IpAddr::from([127, 0, 0, 1])
            }),
        };

        Ok(RelayConfig {
            bind_addr: (bind_ip, self.port).into(),
            advertised_addr: format!("{advertise_ip}:{}", self.port),
            batch_interval: Duration::from_millis(self.batch_interval_ms),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; default to info when unset or invalid.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_relay_config()?;

    info!(
        "pointcast starting — bind={}, advertised={}, batch={:?}",
        config.bind_addr, config.advertised_addr, config.batch_interval
    );

    // Graceful shutdown: Ctrl+C clears the flag, and the accept loop in
    // `run_server` checks it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("pointcast relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

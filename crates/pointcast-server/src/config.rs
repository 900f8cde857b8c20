//! Relay server configuration.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is populated from CLI arguments (see `main.rs`) or from defaults that
//! suit local development and tests.  Keeping it a plain struct — no global
//! state, no environment reads in here — means tests construct exactly the
//! configuration they need.

use std::net::SocketAddr;
use std::time::Duration;

use pointcast_core::BATCH_INTERVAL;

/// All runtime configuration for the relay server.
///
/// Build this once at startup and hand it to
/// [`crate::ws_server::run_server`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The address and port the WebSocket listener binds to.
    ///
    /// `0.0.0.0` accepts connections from any interface, which is the
    /// normal deployment: phones on the venue Wi-Fi must be able to reach
    /// the relay.
    pub bind_addr: SocketAddr,

    /// The `"<reachable-ip>:<port>"` string screens receive in their
    /// `initialize` message, for out-of-band use (e.g. showing visitors the
    /// URL to open on their phone).
    ///
    /// This is *advertised*, not bound: it should be an address phones can
    /// actually reach, which is why `main.rs` resolves the LAN IP rather
    /// than reusing the bind address.
    pub advertised_addr: String,

    /// Time between successive `positions` broadcasts while at least one
    /// remote is connected.  Defaults to [`BATCH_INTERVAL`] (15 ms, just
    /// under a 60 fps frame budget).
    pub batch_interval: Duration,
}

impl Default for RelayConfig {
    /// Defaults suitable for local development: bind everywhere on port
    /// 8090 and advertise loopback.
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address string.
            bind_addr: "0.0.0.0:8090".parse().unwrap(),
            advertised_addr: "127.0.0.1:8090".to_string(),
            batch_interval: BATCH_INTERVAL,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_8090() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.bind_addr.port(), 8090);
    }

    #[test]
    fn test_default_bind_is_any_interface() {
        let cfg = RelayConfig::default();
        assert!(cfg.bind_addr.ip().is_unspecified());
    }

    #[test]
    fn test_default_batch_interval_is_15ms() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.batch_interval, Duration::from_millis(15));
    }

    #[test]
    fn test_config_can_be_cloned() {
        // The accept loop shares the config across session tasks.
        let cfg = RelayConfig::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.bind_addr, cloned.bind_addr);
        assert_eq!(cfg.advertised_addr, cloned.advertised_addr);
    }
}

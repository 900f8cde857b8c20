//! pointcast-server library crate.
//!
//! This crate wraps the relay core (`pointcast-core`) in a WebSocket
//! transport and a CLI binary.
//!
//! # Architecture
//!
//! ```text
//! phones (remotes)        screens (displays)
//!    │ ws://host:8090/        │ ws://host:8090/screens
//!    ▼                        ▼
//! [pointcast-server]
//!   config/      RelayConfig (CLI/env → plain struct)
//!   ws_server/   accept loop, namespace routing, per-session tasks
//!   driver/      the hub event loop: commands + the real 15 ms interval
//!   local_addr/  LAN-reachable IP for `initialize` messages
//!         │
//!         ▼
//! [pointcast-core]  registry + scheduler + hub (no I/O)
//! ```
//!
//! # Layer rules
//!
//! - All state mutation happens inside the hub driver task; session tasks
//!   only translate socket frames into [`pointcast_core::HubCommand`]s and
//!   pump hub events back out.
//! - `config` and `local_addr` never touch the network at request time;
//!   they run once at startup.

/// Runtime configuration (bind address, advertised address, batch cadence).
pub mod config;

/// The hub driver: the single-threaded cooperative event loop.
pub mod driver;

/// Advertised-address detection for `initialize` messages.
pub mod local_addr;

/// WebSocket accept loop and per-session tasks.
pub mod ws_server;

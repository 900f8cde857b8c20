//! # pointcast-core
//!
//! The relay core for pointcast: a real-time fan-in/fan-out hub that takes
//! high-frequency pointer/orientation updates from many "remote" clients
//! (phones) and fans them out to "screen" clients (large displays) as
//! rate-limited batch snapshots.
//!
//! This crate contains no sockets, no listeners, and no clocks.  It defines:
//!
//! - **`domain`** – Identifier newtypes ([`RemoteId`], [`ScreenId`]) and the
//!   [`PointerRegistry`]: the in-memory map of active remotes and their most
//!   recent positions.
//!
//! - **`protocol`** – The JSON wire messages exchanged with remotes and
//!   screens ([`RemoteMsg`], [`ScreenMsg`]).  Positions are opaque JSON
//!   payloads; the relay stores and forwards them verbatim.
//!
//! - **`hub`** – The [`RelayHub`] event handlers and the [`BatchTimer`]
//!   state machine that decides when batch snapshots go out.
//!
//! # How the relay works
//!
//! ```text
//! remote connects      → push(id) broadcast to screens, batch timer armed
//! remote sends position → latest value stored in the registry
//! timer fires (15 ms)  → positions(snapshot) broadcast to screens
//! remote disconnects   → pop(id) broadcast; timer disarmed when no remotes remain
//! screen connects      → initialize(remoteIds, address) sent to that screen only
//! ```
//!
//! The surrounding server (see `pointcast-server`) drives the hub from a
//! single task, so every handler runs to completion before the next one
//! starts.  That serialization is what makes the registry snapshot
//! consistent and the push/positions/pop ordering guarantees hold.

pub mod domain;
pub mod hub;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `pointcast_core::RelayHub` instead of `pointcast_core::hub::RelayHub`.
pub use domain::ids::{RemoteId, ScreenId};
pub use domain::registry::{PointerRegistry, Position};
pub use hub::scheduler::{BatchTimer, FireOutcome};
pub use hub::{HubCommand, RelayHub, ScreenSender, BATCH_INTERVAL};
pub use protocol::messages::{RemoteMsg, ScreenMsg};

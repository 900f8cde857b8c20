//! JSON wire messages for the remote and screen channels.
//!
//! Every frame is a JSON object with a `"type"` field naming the event; the
//! remaining fields sit in the same object.  Serde's `#[serde(tag = "type")]`
//! attribute handles the discriminant automatically:
//!
//! ```json
//! {"type":"position","data":{"alpha":12.5,"beta":-3.0}}
//! {"type":"push","id":"7c9e6679-7425-40de-944b-e07fc1f90ae7"}
//! {"type":"positions","pointers":{"7c9e6679-…":{"alpha":12.5}}}
//! {"type":"initialize","remoteIds":["7c9e6679-…"],"address":"192.168.1.20:8090"}
//! ```
//!
//! # Why two direction-specific enums?
//!
//! Remotes only ever send `position`; screens only ever receive `push`,
//! `pop`, `positions`, and `initialize`.  Separate enums make it a
//! compile-time error to broadcast a remote-side message to screens or to
//! parse a screen-side event out of a remote frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::ids::RemoteId;
use crate::domain::registry::Position;

// ── Remote → hub messages ─────────────────────────────────────────────────────

/// Everything a remote (phone) can send to the relay.
///
/// The `data` payload is opaque: the relay never inspects it, it is stored
/// in the registry and forwarded to screens verbatim.  Malformed frames are
/// rejected at the JSON layer by the transport and skipped; a frame that
/// parses into this enum is always accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteMsg {
    /// The remote's current position/orientation reading.
    ///
    /// High-frequency: phones typically send this at sensor rate (60 Hz or
    /// more).  Only the latest value per remote survives until the next
    /// batch broadcast.
    Position {
        /// Opaque coordinates/orientation object, forwarded as-is.
        data: Position,
    },
}

// ── Hub → screen messages ─────────────────────────────────────────────────────

/// Everything a screen (display) can receive from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScreenMsg {
    /// A new remote joined.  Broadcast immediately (not batched): join
    /// notifications are low-frequency and benefit from low latency.
    Push {
        /// Id of the remote that connected.
        id: RemoteId,
    },

    /// A remote left.  Broadcast immediately, after its registry entry is
    /// gone, so no later `positions` frame can still contain the id.
    Pop {
        /// Id of the remote that disconnected.
        id: RemoteId,
    },

    /// One coalesced batch: the latest position of every remote that has
    /// reported one.  Broadcast at the batch cadence (15 ms by default)
    /// while at least one remote is connected and at least one position is
    /// known.
    Positions {
        /// RemoteId → latest opaque position payload.
        pointers: HashMap<RemoteId, Position>,
    },

    /// Sent to a single screen right after it connects (never broadcast).
    Initialize {
        /// Every currently connected remote, including ones that have not
        /// reported a position yet.
        #[serde(rename = "remoteIds")]
        remote_ids: Vec<RemoteId>,

        /// `"<reachable-ip>:<port>"` of the relay, for out-of-band use by
        /// the screen (e.g. rendering a "connect your phone" URL).
        address: String,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! PointerRegistry: the in-memory database of active remotes.
//!
//! The registry tracks two things per remote connection:
//!
//! - **Presence**: an entry exists from connection-accept until disconnect.
//! - **Position**: the most recent position payload the remote has reported,
//!   if any.  Prior values are overwritten, never queued — this is a
//!   latest-value-wins telemetry relay.
//!
//! Presence and position are deliberately decoupled: a remote that has
//! connected but not yet reported a position is visible to screens (it was
//! announced with `push` and is listed in `initialize`), but it does not
//! appear in `positions` snapshots until its first report arrives.
//!
//! # HashMap choice
//!
//! A `HashMap<RemoteId, Option<Position>>` provides O(1) upsert/remove by
//! connection id.  Iteration order is not guaranteed, which is fine: a
//! snapshot only has to reflect a single consistent instant, and the hub
//! mutates the registry from one task, so there is no tearing to worry
//! about.
//!
//! # Failure modes
//!
//! None.  Every operation succeeds; removing an absent id is a no-op.

use std::collections::HashMap;

use crate::domain::ids::RemoteId;

/// An opaque position/orientation payload reported by a remote.
///
/// The relay does not interpret its structure — whatever JSON the remote
/// sent is stored and forwarded verbatim to screens.
pub type Position = serde_json::Value;

/// In-memory map of every active remote and its latest position.
#[derive(Debug, Default)]
pub struct PointerRegistry {
    pointers: HashMap<RemoteId, Option<Position>>,
}

impl PointerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a presence entry for a newly connected remote.
    ///
    /// The entry carries no position yet, so the remote is excluded from
    /// snapshots until its first `position` report.  Registering an id that
    /// is already present keeps its stored position.
    pub fn register(&mut self, id: RemoteId) {
        self.pointers.entry(id).or_insert(None);
    }

    /// Inserts or overwrites the position for `id`.
    ///
    /// Always succeeds.  An upsert for an id with no presence entry creates
    /// one — in practice the transport delivers `connect` before the first
    /// `position` for the same remote, so this only happens in tests.
    pub fn upsert(&mut self, id: RemoteId, position: Position) {
        self.pointers.insert(id, Some(position));
    }

    /// Deletes `id`'s entry.
    ///
    /// Returns `true` if the remote was present.  Removing an absent id is
    /// a no-op (not an error) and returns `false`, so callers can avoid
    /// emitting a duplicate `pop`.
    pub fn remove(&mut self, id: RemoteId) -> bool {
        self.pointers.remove(&id).is_some()
    }

    /// True iff no remotes are connected.
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Number of connected remotes (including ones with no position yet).
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// Ids of every connected remote, for `initialize` messages.
    pub fn remote_ids(&self) -> Vec<RemoteId> {
        self.pointers.keys().copied().collect()
    }

    /// A consistent copy of all known positions for one batch broadcast.
    ///
    /// Contains exactly the remotes that have reported at least one
    /// position; connected-but-silent remotes are excluded.  The copy
    /// reflects every upsert/remove applied strictly before the call.
    pub fn snapshot(&self) -> HashMap<RemoteId, Position> {
        self.pointers
            .iter()
            .filter_map(|(id, pos)| pos.as_ref().map(|p| (*id, p.clone())))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Connection identifier newtypes.
//!
//! Each WebSocket connection is assigned a fresh UUID v4 for its lifetime.
//! The id has no meaning beyond correlating events from one connection with
//! its registry entry: it is never reused while the connection is open, and
//! screens treat it as an opaque string.
//!
//! Two distinct newtypes are used so that a screen id can never be passed
//! where a remote id is expected (and vice versa); with a bare `Uuid` alias
//! that mix-up would compile.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one remote (phone) connection.
///
/// Serializes as the canonical hyphenated UUID string, so it can be used
/// directly as a JSON object key in `positions` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(Uuid);

impl RemoteId {
    /// Generates a fresh random id for a newly accepted remote connection.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RemoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identity of one screen (display) connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(Uuid);

impl ScreenId {
    /// Generates a fresh random id for a newly accepted screen connection.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScreenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_ids_are_unique() {
        // Two freshly generated ids must never collide (UUID v4 randomness).
        let a = RemoteId::new();
        let b = RemoteId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remote_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means the JSON form is the bare UUID string,
        // not a wrapper object — screens rely on this for `positions` keys.
        let id = RemoteId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_remote_id_roundtrips_through_json() {
        let id = RemoteId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: RemoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_screen_ids_are_unique() {
        assert_ne!(ScreenId::new(), ScreenId::new());
    }

    #[test]
    fn test_display_matches_serialized_form() {
        let id = RemoteId::new();
        let display = id.to_string();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{display}\""));
    }
}

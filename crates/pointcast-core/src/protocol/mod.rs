//! Protocol layer for pointcast-core.
//!
//! Defines the JSON messages carried over the WebSocket transport.  The
//! relay speaks two directional vocabularies: what remotes send in, and
//! what screens receive.  See [`messages`].

pub mod messages;

pub use messages::{RemoteMsg, ScreenMsg};

//! Domain layer for pointcast-core.
//!
//! Pure types with no dependencies on I/O, networking, or async runtimes:
//!
//! - Identifier newtypes for the two kinds of connections
//! - The [`registry::PointerRegistry`]: presence and latest-position state
//!   for every active remote
//!
//! Nothing in this module can block, fail, or observe external state.

pub mod ids;
pub mod registry;

pub use ids::{RemoteId, ScreenId};
pub use registry::{PointerRegistry, Position};

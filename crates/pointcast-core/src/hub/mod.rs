//! RelayHub: the fan-in/fan-out core of the relay.
//!
//! The hub owns the only shared mutable state in the system — the
//! [`PointerRegistry`] and the [`BatchTimer`] — plus the roster of connected
//! screens.  It consumes events from both channel namespaces and translates
//! them into registry mutations and screen notifications:
//!
//! ```text
//! remotes namespace          screens namespace
//! ─────────────────          ─────────────────
//! connect      ─► register + broadcast push(id) + arm timer
//! position     ─► upsert latest value
//! disconnect   ─► remove + broadcast pop(id) + disarm when empty
//!                            connect ─► send initialize(remoteIds, address)
//! timer fire   ─► broadcast positions(snapshot) to all screens
//! ```
//!
//! # Concurrency model
//!
//! Every handler is synchronous and runs to completion with no await point:
//! the hub is driven from a single task (see `pointcast-server`'s hub
//! driver), so handlers are serialized and a batch emit either sees a
//! mutation completely or not at all.  Delivery to screens goes through
//! unbounded channel senders, whose `send` never blocks — a slow screen
//! buffers in its own channel instead of stalling the hub.
//!
//! # Ordering guarantees
//!
//! For any remote id, `push(id)` is broadcast before the registry can hold
//! a position for it, so it precedes every `positions` frame containing the
//! id.  On disconnect the registry entry is removed *before* `pop(id)` is
//! broadcast within the same handler, so `pop` follows the last `positions`
//! frame that included the id.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, trace};

use crate::domain::ids::{RemoteId, ScreenId};
use crate::domain::registry::{PointerRegistry, Position};
use crate::protocol::messages::ScreenMsg;

pub mod scheduler;

use scheduler::{BatchTimer, FireOutcome};

/// Time between successive `positions` broadcasts while remotes are active:
/// 15 ms, just under a 60 fps frame budget.
pub const BATCH_INTERVAL: Duration = Duration::from_millis(15);

/// Delivery capability for one screen: the hub pushes [`ScreenMsg`] values
/// into it, and the screen's writer task drains them onto the socket.
/// Tests pass the sending half of a plain in-memory channel instead.
pub type ScreenSender = UnboundedSender<ScreenMsg>;

// ── Hub input events ──────────────────────────────────────────────────────────

/// Every event the hub consumes, from both connection namespaces.
///
/// The transport layer turns socket activity into these commands and feeds
/// them through one channel, which is what serializes all handlers.
#[derive(Debug)]
pub enum HubCommand {
    /// A remote connection was accepted and assigned `id`.
    RemoteConnected { id: RemoteId },
    /// A remote reported a new position payload.
    RemotePosition { id: RemoteId, position: Position },
    /// A remote's connection ended (any cause).  The transport sends this
    /// at most once per connection.
    RemoteDisconnected { id: RemoteId },
    /// A screen connection was accepted; `sender` delivers its events.
    ScreenConnected { id: ScreenId, sender: ScreenSender },
    /// A screen's connection ended.
    ScreenDisconnected { id: ScreenId },
}

// ── The hub ───────────────────────────────────────────────────────────────────

/// Owns the registry, the batch timer state, and the screen roster.
///
/// A `RelayHub` is an ordinary owned value with no ambient globals, so tests
/// (and, in principle, multiple independent relays in one process) construct
/// their own.
#[derive(Debug)]
pub struct RelayHub {
    registry: PointerRegistry,
    timer: BatchTimer,
    screens: HashMap<ScreenId, ScreenSender>,
    /// `"<reachable-ip>:<port>"` handed to each screen in `initialize`.
    address: String,
}

impl RelayHub {
    /// Creates an empty hub.  `address` is the reachability address screens
    /// receive in their `initialize` message.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            registry: PointerRegistry::new(),
            timer: BatchTimer::new(),
            screens: HashMap::new(),
            address: address.into(),
        }
    }

    /// Dispatches one command to its handler.
    pub fn apply(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::RemoteConnected { id } => self.remote_connected(id),
            HubCommand::RemotePosition { id, position } => self.remote_position(id, position),
            HubCommand::RemoteDisconnected { id } => self.remote_disconnected(id),
            HubCommand::ScreenConnected { id, sender } => self.screen_connected(id, sender),
            HubCommand::ScreenDisconnected { id } => self.screen_disconnected(id),
        }
    }

    /// True iff a batch emit is pending.  The server keeps its real interval
    /// in lockstep with this.
    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Number of connected remotes.
    pub fn remote_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of connected screens.
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    // ── Remote events ─────────────────────────────────────────────────────────

    /// A remote connected: announce it to every screen immediately (join
    /// notifications are not batched) and make sure the batch timer runs.
    pub fn remote_connected(&mut self, id: RemoteId) {
        self.registry.register(id);
        self.broadcast(ScreenMsg::Push { id });
        self.timer.arm();
        info!("remote {id} connected ({} active)", self.registry.len());
    }

    /// A remote reported a position: store the latest value.  Nothing is
    /// sent now; the next batch fire picks it up.
    pub fn remote_position(&mut self, id: RemoteId, position: Position) {
        trace!("remote {id} position update");
        self.registry.upsert(id, position);
    }

    /// A remote disconnected: drop its entry, tell every screen, and stop
    /// the timer if it was the last one.
    ///
    /// The removal happens before the `pop` broadcast so that no later
    /// snapshot can contain the id.  A disconnect for an unknown id (never
    /// connected, or already removed) changes nothing and emits no
    /// duplicate `pop`.
    pub fn remote_disconnected(&mut self, id: RemoteId) {
        if !self.registry.remove(id) {
            debug!("disconnect for unknown remote {id} ignored");
            return;
        }
        self.broadcast(ScreenMsg::Pop { id });
        if self.registry.is_empty() {
            // Disarm eagerly instead of waiting for the next fire.
            self.timer.disarm();
        }
        info!("remote {id} disconnected ({} active)", self.registry.len());
    }

    // ── Screen events ─────────────────────────────────────────────────────────

    /// A screen connected: send it (and only it) the current world — every
    /// known remote id plus the relay's reachability address.
    pub fn screen_connected(&mut self, id: ScreenId, sender: ScreenSender) {
        let init = ScreenMsg::Initialize {
            remote_ids: self.registry.remote_ids(),
            address: self.address.clone(),
        };
        // A send failure means the screen vanished between accept and
        // registration; skip the roster insert so it is never broadcast to.
        if sender.send(init).is_err() {
            debug!("screen {id} went away before initialize");
            return;
        }
        self.screens.insert(id, sender);
        info!("screen {id} connected ({} screens)", self.screens.len());
    }

    /// A screen disconnected: forget its sender.
    pub fn screen_disconnected(&mut self, id: ScreenId) {
        if self.screens.remove(&id).is_some() {
            info!("screen {id} disconnected ({} screens)", self.screens.len());
        }
    }

    // ── Timer events ──────────────────────────────────────────────────────────

    /// One batch timer fire.
    ///
    /// With remotes connected, broadcasts a consistent snapshot of every
    /// known position; with none, records the stop (the timer stays
    /// disarmed until the next remote connects).  A snapshot with no
    /// positioned remotes — every connected remote still silent — is
    /// suppressed rather than broadcast as an empty map.
    pub fn batch_tick(&mut self) {
        match self.timer.on_fire(self.registry.is_empty()) {
            FireOutcome::Stopped => {
                debug!("batch timer stopped: no remotes");
            }
            FireOutcome::Broadcast => {
                let pointers = self.registry.snapshot();
                if pointers.is_empty() {
                    trace!("batch fire skipped: no positions reported yet");
                    return;
                }
                trace!("batch emit: {} pointers", pointers.len());
                self.broadcast(ScreenMsg::Positions { pointers });
            }
        }
    }

    // ── Delivery ──────────────────────────────────────────────────────────────

    /// Sends `msg` to every connected screen.
    ///
    /// A failed send means the screen's writer task is gone; its roster
    /// entry is pruned here so dead screens stop accumulating.
    fn broadcast(&mut self, msg: ScreenMsg) {
        self.screens.retain(|id, sender| {
            let alive = sender.send(msg.clone()).is_ok();
            if !alive {
                debug!("screen {id} dropped; pruned from roster");
            }
            alive
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

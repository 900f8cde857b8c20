//! WebSocket server: accept loop, namespace routing, and session tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections and completing the WebSocket upgrade.
//! 3. Routing each connection to a namespace by its upgrade request path:
//!    `/screens` joins the screens namespace, anything else is a remote
//!    (the remote entry page lives on a catch-all route, so phones may
//!    arrive on `/`, `/remote`, or whatever the captive portal used).
//! 4. Running one task per session that translates socket frames into
//!    [`HubCommand`]s (remotes) or pumps [`ScreenMsg`] events onto the
//!    socket (screens).
//! 5. Shutting down when the shared `running` flag is cleared.
//!
//! # Scalability
//!
//! Each session runs in its own Tokio task; the accept loop never blocks on
//! session I/O.  All sessions funnel into one unbounded command channel
//! consumed by the hub driver, which is what serializes every state
//! mutation (see `driver`).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{Request, Response},
        Error as WsError, Message as WsMessage,
    },
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use pointcast_core::{HubCommand, RelayHub, RemoteId, RemoteMsg, ScreenId};

use crate::config::RelayConfig;
use crate::driver::run_hub;

// ── Namespace routing ─────────────────────────────────────────────────────────

/// The two logical channel namespaces, selected by upgrade request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Phone-class clients that report positions.
    Remotes,
    /// Display-class clients that render all remotes' positions.
    Screens,
}

impl Namespace {
    /// Routes an upgrade request path to its namespace.  `/screens` (with
    /// or without a trailing segment) is the screens namespace; every other
    /// path is a remote, since the remote entry page lives on a catch-all
    /// route.
    pub fn from_path(path: &str) -> Self {
        if path == "/screens" || path.starts_with("/screens/") {
            Namespace::Screens
        } else {
            Namespace::Remotes
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the relay until `running` is set to `false`.
///
/// Binds the listener, spawns the hub driver task, and accepts connections
/// in a loop, handing each one to a dedicated session task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (port in use,
/// missing permission).  Everything after a successful bind is handled per
/// session and never takes the server down.
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;

    info!(
        "pointcast relay listening on {} (advertised as {})",
        config.bind_addr, config.advertised_addr
    );

    // The hub driver owns all relay state; sessions reach it through this
    // command channel only.
    let (hub_tx, hub_rx) = mpsc::unbounded_channel();
    let hub = RelayHub::new(config.advertised_addr.clone());
    let driver = tokio::spawn(run_hub(hub, hub_rx, config.batch_interval));

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout on accept() lets the loop observe the shutdown
        // flag even when nobody is connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let hub_tx = hub_tx.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, hub_tx).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g. fd exhaustion): log and keep
                // serving the sessions that already exist.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout with no connection; loop back to the flag check.
            }
        }
    }

    // Stop the driver; in-flight sessions lose their command channel and
    // wind down on their own.
    driver.abort();
    Ok(())
}

// ── Per-session handling ──────────────────────────────────────────────────────

/// Completes the WebSocket handshake, routes the connection to its
/// namespace, and runs the session to completion.  Logs the outcome; a
/// failed session never affects other connections.
async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub_tx: UnboundedSender<HubCommand>,
) {
    // Capture the request path during the upgrade handshake so the session
    // can be routed; `accept_hdr_async` calls us back with the request
    // before sending "101 Switching Protocols".
    let mut path = String::from("/");
    let callback = |req: &Request, resp: Response| {
        path = req.uri().path().to_string();
        Ok(resp)
    };

    let ws_stream = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed with {peer_addr}: {e}");
            return;
        }
    };

    match Namespace::from_path(&path) {
        Namespace::Remotes => run_remote_session(ws_stream, peer_addr, hub_tx).await,
        Namespace::Screens => run_screen_session(ws_stream, peer_addr, hub_tx).await,
    }
}

/// Runs one remote (phone) session.
///
/// The remote is announced to the hub on entry and — exactly once — marked
/// disconnected on exit, whatever ended the stream.  Position frames are
/// forwarded as they arrive; a malformed frame is logged and skipped, never
/// fatal: this is a best-effort telemetry relay, and the phone may recover
/// on its next sensor reading.
async fn run_remote_session(
    mut ws_stream: WebSocketStream<TcpStream>,
    peer_addr: SocketAddr,
    hub_tx: UnboundedSender<HubCommand>,
) {
    let id = RemoteId::new();
    debug!("remote {id} joined from {peer_addr}");

    if hub_tx.send(HubCommand::RemoteConnected { id }).is_err() {
        return; // relay is shutting down
    }

    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<RemoteMsg>(&text) {
                Ok(RemoteMsg::Position { data }) => {
                    if hub_tx
                        .send(HubCommand::RemotePosition { id, position: data })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    warn!("remote {id}: invalid frame ignored: {e}");
                }
            },
            Ok(WsMessage::Binary(_)) => {
                // The remote protocol is JSON text only.
                warn!("remote {id}: unexpected binary frame (ignored)");
            }
            Ok(WsMessage::Close(_)) => {
                debug!("remote {id}: close frame received");
                break;
            }
            // Protocol-level ping/pong is handled by tokio-tungstenite.
            Ok(_) => {}
            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => {
                debug!("remote {id}: connection closed");
                break;
            }
            Err(e) => {
                warn!("remote {id}: WebSocket error: {e}");
                break;
            }
        }
    }

    // Transport-level drop and clean close both end here: disconnect is an
    // event, not an error, and it fires at most once per connection.
    let _ = hub_tx.send(HubCommand::RemoteDisconnected { id });
    debug!("remote {id} left");
}

/// Runs one screen (display) session.
///
/// The screen registers a delivery channel with the hub (which immediately
/// answers with `initialize`), then a writer half pumps hub events onto the
/// socket as JSON text frames while the reader half waits for the
/// connection to end.  Screens send nothing the relay acts on.
async fn run_screen_session(
    ws_stream: WebSocketStream<TcpStream>,
    peer_addr: SocketAddr,
    hub_tx: UnboundedSender<HubCommand>,
) {
    let id = ScreenId::new();
    debug!("screen {id} joined from {peer_addr}");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    if hub_tx
        .send(HubCommand::ScreenConnected {
            id,
            sender: events_tx,
        })
        .is_err()
    {
        return;
    }

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // Writer: hub events → socket.  Ends when the hub drops the sender or
    // the socket dies (the hub prunes us on its next failed broadcast).
    let writer = tokio::spawn(async move {
        while let Some(msg) = events_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                        debug!("screen {id}: send failed (disconnected)");
                        break;
                    }
                }
                Err(e) => {
                    // ScreenMsg serialization cannot realistically fail;
                    // if it does, skip the frame rather than kill the screen.
                    error!("screen {id}: serialization error: {e}");
                }
            }
        }
    });

    // Reader: drain until the screen goes away.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(WsMessage::Close(_)) | Err(_) => break,
            Ok(_) => {} // screens have no inbound protocol
        }
    }

    let _ = hub_tx.send(HubCommand::ScreenDisconnected { id });
    writer.abort();
    debug!("screen {id} left");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screens_path_routes_to_screens() {
        assert_eq!(Namespace::from_path("/screens"), Namespace::Screens);
    }

    #[test]
    fn test_screens_subpath_routes_to_screens() {
        assert_eq!(Namespace::from_path("/screens/main"), Namespace::Screens);
    }

    #[test]
    fn test_root_routes_to_remotes() {
        assert_eq!(Namespace::from_path("/"), Namespace::Remotes);
    }

    #[test]
    fn test_any_other_path_routes_to_remotes() {
        // The remote page is served on a catch-all route: phones may arrive
        // on any path a captive portal or QR code produced.
        for path in ["/remote", "/foo/bar", "/screensaver", "/screensX"] {
            assert_eq!(Namespace::from_path(path), Namespace::Remotes, "{path}");
        }
    }

    #[test]
    fn test_screens_prefix_requires_segment_boundary() {
        // "/screensaver" must not be mistaken for the screens namespace.
        assert_eq!(Namespace::from_path("/screensaver"), Namespace::Remotes);
        assert_eq!(Namespace::from_path("/screens/"), Namespace::Screens);
    }
}

//! The hub driver: pointcast's single-threaded cooperative event loop.
//!
//! One task owns the [`RelayHub`] outright.  Session tasks feed it
//! [`HubCommand`]s through an unbounded channel, and this loop interleaves
//! those commands with batch timer ticks via `tokio::select!`.  Because the
//! hub never leaves this task, every handler runs to completion before the
//! next event is looked at: no locks, no torn snapshots, no race between a
//! disconnect and a fire.
//!
//! # Timer lockstep
//!
//! The hub's [`BatchTimer`](pointcast_core::BatchTimer) state machine says
//! *whether* an emit is pending; this loop owns the *actual*
//! `tokio::time::Interval` and keeps it in lockstep:
//!
//! - scheduler armed, no interval → create one (first fire lands a full
//!   interval after arming)
//! - scheduler disarmed, interval exists → drop it (an eager disarm on the
//!   last disconnect cancels the pending fire instead of letting it go
//!   stale)
//!
//! Dropping the `Interval` is the cancellation; it is inherently idempotent
//! because the lockstep check runs before every `select!`.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::debug;

use pointcast_core::{HubCommand, RelayHub};

/// Runs the hub event loop until every command sender is dropped.
///
/// `batch_interval` is the cadence of `positions` broadcasts while remotes
/// are connected (15 ms in production; tests pass whatever they like and
/// drive it with a paused clock).
pub async fn run_hub(
    mut hub: RelayHub,
    mut commands: UnboundedReceiver<HubCommand>,
    batch_interval: Duration,
) {
    let mut ticker: Option<Interval> = None;

    loop {
        // Re-establish the lockstep invariant before waiting: a real
        // interval exists iff the scheduler is armed.
        match (hub.timer_armed(), ticker.is_some()) {
            (true, false) => {
                let mut interval = time::interval(batch_interval);
                // A fire that comes late must not be followed by a
                // catch-up burst; the next one just waits a full interval.
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // `interval` completes its first tick immediately; consume
                // it so the first broadcast lands one interval after arming.
                interval.tick().await;
                ticker = Some(interval);
                debug!("batch interval started ({batch_interval:?})");
            }
            (false, true) => {
                ticker = None;
                debug!("batch interval cancelled");
            }
            _ => {}
        }

        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(cmd) => hub.apply(cmd),
                // All senders gone: the accept loop and every session have
                // shut down, so the relay is over.
                None => break,
            },
            // The tick branch pends forever while disarmed, so only
            // commands can wake the loop then.
            _ = tick(&mut ticker) => hub.batch_tick(),
        }
    }

    debug!("hub driver stopped");
}

/// Awaits the next batch tick, or forever if no interval is armed.
async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pointcast_core::{RemoteId, ScreenId, ScreenMsg};
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    const INTERVAL: Duration = Duration::from_millis(15);

    /// Spawns a driver with one attached screen.  Returns the command
    /// sender and the screen's receiver (initialize already consumed).
    async fn driver_with_screen() -> (UnboundedSender<HubCommand>, UnboundedReceiver<ScreenMsg>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_hub(RelayHub::new("10.0.0.1:8090"), cmd_rx, INTERVAL));

        let (screen_tx, mut screen_rx) = mpsc::unbounded_channel();
        cmd_tx
            .send(HubCommand::ScreenConnected {
                id: ScreenId::new(),
                sender: screen_tx,
            })
            .unwrap();

        // Let the driver process the registration, then discard initialize.
        tokio::task::yield_now().await;
        let init = screen_rx.recv().await.expect("initialize");
        assert!(matches!(init, ScreenMsg::Initialize { .. }));
        (cmd_tx, screen_rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ScreenMsg>) -> Vec<ScreenMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// The headline cadence property: a position reported right after
    /// connect is broadcast within one 15 ms interval.
    #[tokio::test(start_paused = true)]
    async fn test_position_is_broadcast_within_one_interval() {
        let (cmd_tx, mut screen_rx) = driver_with_screen().await;
        let r1 = RemoteId::new();

        cmd_tx.send(HubCommand::RemoteConnected { id: r1 }).unwrap();
        cmd_tx
            .send(HubCommand::RemotePosition {
                id: r1,
                position: json!({"x": 1, "y": 2}),
            })
            .unwrap();

        // One interval later (paused clock auto-advances) the snapshot is out.
        time::sleep(INTERVAL + Duration::from_millis(1)).await;

        let msgs = drain(&mut screen_rx);
        assert_eq!(msgs[0], ScreenMsg::Push { id: r1 });
        assert!(
            matches!(&msgs[1], ScreenMsg::Positions { pointers }
                if pointers.get(&r1) == Some(&json!({"x": 1, "y": 2}))),
            "expected a positions frame within one interval, got {msgs:?}"
        );
    }

    /// Two updates inside the same interval coalesce: exactly one
    /// `positions` frame goes out and it carries the latest value.
    #[tokio::test(start_paused = true)]
    async fn test_updates_within_one_interval_coalesce() {
        let (cmd_tx, mut screen_rx) = driver_with_screen().await;
        let r1 = RemoteId::new();

        cmd_tx.send(HubCommand::RemoteConnected { id: r1 }).unwrap();
        for i in 0..10 {
            cmd_tx
                .send(HubCommand::RemotePosition {
                    id: r1,
                    position: json!({"x": i}),
                })
                .unwrap();
        }

        time::sleep(INTERVAL + Duration::from_millis(1)).await;

        let msgs = drain(&mut screen_rx);
        let snapshots: Vec<_> = msgs
            .iter()
            .filter_map(|m| match m {
                ScreenMsg::Positions { pointers } => Some(pointers),
                _ => None,
            })
            .collect();
        assert_eq!(snapshots.len(), 1, "ten updates, one coalesced broadcast");
        assert_eq!(snapshots[0].get(&r1), Some(&json!({"x": 9})));
    }

    /// While a remote keeps its last position, every interval re-broadcasts
    /// the full snapshot at the fixed cadence.
    #[tokio::test(start_paused = true)]
    async fn test_broadcast_repeats_every_interval_while_active() {
        let (cmd_tx, mut screen_rx) = driver_with_screen().await;
        let r1 = RemoteId::new();

        cmd_tx.send(HubCommand::RemoteConnected { id: r1 }).unwrap();
        cmd_tx
            .send(HubCommand::RemotePosition {
                id: r1,
                position: json!({"x": 1}),
            })
            .unwrap();

        // Five intervals: five snapshots.
        time::sleep(INTERVAL * 5 + Duration::from_millis(1)).await;

        let snapshots = drain(&mut screen_rx)
            .iter()
            .filter(|m| matches!(m, ScreenMsg::Positions { .. }))
            .count();
        assert_eq!(snapshots, 5);
    }

    /// After the last disconnect the timer stops: no `positions` frame is
    /// ever broadcast again, no matter how much time passes.
    #[tokio::test(start_paused = true)]
    async fn test_no_broadcasts_after_last_disconnect() {
        let (cmd_tx, mut screen_rx) = driver_with_screen().await;
        let r1 = RemoteId::new();

        cmd_tx.send(HubCommand::RemoteConnected { id: r1 }).unwrap();
        cmd_tx
            .send(HubCommand::RemotePosition {
                id: r1,
                position: json!({"x": 1}),
            })
            .unwrap();
        time::sleep(INTERVAL + Duration::from_millis(1)).await;

        cmd_tx
            .send(HubCommand::RemoteDisconnected { id: r1 })
            .unwrap();
        time::sleep(INTERVAL * 100).await;

        let msgs = drain(&mut screen_rx);
        // push, one snapshot, pop — and then silence.
        assert_eq!(msgs.last(), Some(&ScreenMsg::Pop { id: r1 }));
        let after_pop = msgs
            .iter()
            .skip_while(|m| !matches!(m, ScreenMsg::Pop { .. }))
            .skip(1)
            .count();
        assert_eq!(after_pop, 0, "no frames may follow the final pop");
    }

    /// A disconnect-then-reconnect restarts the cadence from scratch.
    #[tokio::test(start_paused = true)]
    async fn test_timer_restarts_for_a_new_remote() {
        let (cmd_tx, mut screen_rx) = driver_with_screen().await;

        let r1 = RemoteId::new();
        cmd_tx.send(HubCommand::RemoteConnected { id: r1 }).unwrap();
        cmd_tx
            .send(HubCommand::RemoteDisconnected { id: r1 })
            .unwrap();
        time::sleep(INTERVAL * 3).await;
        drain(&mut screen_rx);

        let r2 = RemoteId::new();
        cmd_tx.send(HubCommand::RemoteConnected { id: r2 }).unwrap();
        cmd_tx
            .send(HubCommand::RemotePosition {
                id: r2,
                position: json!({"y": 7}),
            })
            .unwrap();
        time::sleep(INTERVAL + Duration::from_millis(1)).await;

        let msgs = drain(&mut screen_rx);
        assert_eq!(msgs[0], ScreenMsg::Push { id: r2 });
        assert!(matches!(&msgs[1], ScreenMsg::Positions { pointers }
            if pointers.contains_key(&r2)));
    }

    /// Dropping every command sender stops the driver task.
    #[tokio::test(start_paused = true)]
    async fn test_driver_stops_when_senders_are_dropped() {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<HubCommand>();
        let handle = tokio::spawn(run_hub(
            RelayHub::new("10.0.0.1:8090"),
            cmd_rx,
            INTERVAL,
        ));

        drop(cmd_tx);

        handle.await.expect("driver must exit cleanly");
    }
}

//! BatchTimer: the batch scheduler's armed/disarmed state machine.
//!
//! Rather than an implicit self-re-scheduling timeout, the scheduling
//! decision is an explicit two-state machine so the "exactly one pending
//! timer" invariant can be tested without a wall clock.  The machine never touches time itself: the server
//! keeps one real `tokio::time::Interval` in lockstep with [`BatchTimer::is_armed`]
//! and reports each fire through [`BatchTimer::on_fire`].
//!
//! ```text
//!            arm() [idempotent]
//! Disarmed ───────────────────────► Armed ──┐ on_fire(registry non-empty)
//!     ▲                               │  ▲  │   → FireOutcome::Broadcast
//!     │   disarm() [idempotent]       │  └──┘
//!     ├───────────────────────────────┤
//!     │   on_fire(registry empty)     │
//!     └───────────────────────────────┘
//!           → FireOutcome::Stopped
//! ```
//!
//! Invariant maintained by the hub: the timer is armed iff the registry is
//! non-empty, re-established on every transition to/from empty and on every
//! fire.

/// The two scheduler states: a batch emit is pending, or nothing is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TimerState {
    /// A periodic emit is scheduled.
    Armed,
    /// No timer pending; nothing will fire until `arm()` is called again.
    #[default]
    Disarmed,
}

/// What the hub should do in response to a timer fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Remotes are connected: broadcast a snapshot and keep the timer armed.
    Broadcast,
    /// No remotes remain (or the fire was stale): the timer is now disarmed
    /// and must not be re-armed until the next remote connects.
    Stopped,
}

/// Process-wide batch timer handle, either armed or disarmed.
#[derive(Debug, Default)]
pub struct BatchTimer {
    state: TimerState,
}

impl BatchTimer {
    /// A new timer starts disarmed: no remotes, no broadcasts.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a batch emit is currently pending.
    pub fn is_armed(&self) -> bool {
        self.state == TimerState::Armed
    }

    /// Arms the timer.  Idempotent: arming an armed timer changes nothing,
    /// so connect/disconnect churn within one interval can never schedule a
    /// second pending emit.  Returns `true` if this call did the arming.
    pub fn arm(&mut self) -> bool {
        let was_disarmed = self.state == TimerState::Disarmed;
        self.state = TimerState::Armed;
        was_disarmed
    }

    /// Disarms the timer immediately, cancelling the pending emit rather
    /// than waiting for the next natural fire.  Idempotent: disarming an
    /// already-disarmed timer is safe and a no-op.
    pub fn disarm(&mut self) -> bool {
        let was_armed = self.state == TimerState::Armed;
        self.state = TimerState::Disarmed;
        was_armed
    }

    /// Records a timer fire and decides what the hub does next.
    ///
    /// A fire with an empty registry disarms and stops — it does not re-arm,
    /// so no stray broadcast of an empty map can follow the last disconnect.
    /// A fire while disarmed (a stale tick that raced a disarm) is treated
    /// as already cancelled.
    pub fn on_fire(&mut self, registry_empty: bool) -> FireOutcome {
        if self.state == TimerState::Disarmed || registry_empty {
            self.state = TimerState::Disarmed;
            FireOutcome::Stopped
        } else {
            // Stays armed: the server re-schedules the next interval.
            FireOutcome::Broadcast
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_starts_disarmed() {
        let timer = BatchTimer::new();
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_arm_transitions_to_armed() {
        let mut timer = BatchTimer::new();
        assert!(timer.arm(), "first arm must report the transition");
        assert!(timer.is_armed());
    }

    #[test]
    fn test_arm_is_idempotent() {
        // Rapid connect churn within one interval must not double-arm.
        let mut timer = BatchTimer::new();
        timer.arm();
        assert!(!timer.arm(), "second arm must be a no-op");
        assert!(timer.is_armed());
    }

    #[test]
    fn test_disarm_is_idempotent() {
        let mut timer = BatchTimer::new();
        timer.arm();
        assert!(timer.disarm());
        assert!(!timer.disarm(), "second disarm must be a no-op");
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_fire_with_remotes_broadcasts_and_stays_armed() {
        let mut timer = BatchTimer::new();
        timer.arm();

        let outcome = timer.on_fire(false);

        assert_eq!(outcome, FireOutcome::Broadcast);
        assert!(timer.is_armed(), "timer must re-arm while remotes remain");
    }

    #[test]
    fn test_fire_with_empty_registry_stops() {
        let mut timer = BatchTimer::new();
        timer.arm();

        let outcome = timer.on_fire(true);

        assert_eq!(outcome, FireOutcome::Stopped);
        assert!(!timer.is_armed(), "timer must not re-arm on empty registry");
    }

    #[test]
    fn test_stale_fire_after_disarm_is_a_noop() {
        // A tick that was already in flight when the last remote
        // disconnected must not broadcast.
        let mut timer = BatchTimer::new();
        timer.arm();
        timer.disarm();

        assert_eq!(timer.on_fire(false), FireOutcome::Stopped);
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_rearm_after_stop_works() {
        // Lifecycle: armed → stopped on empty → armed again when a new
        // remote connects.
        let mut timer = BatchTimer::new();
        timer.arm();
        timer.on_fire(true);

        assert!(timer.arm());
        assert_eq!(timer.on_fire(false), FireOutcome::Broadcast);
    }
}

//! Refresh scheduler — writing toggles back without upsetting live preview.
//!
//! The host's live preview only reacts to typed input, and the host refuses
//! buffer writes while it evaluates the mapping that produced the new text.
//! So a toggle's result reaches the command line in two hops:
//!
//! 1. The toggle **requests** a write. Nothing touches the host yet; the
//!    controller queues the write to run after the current callback.
//! 2. The deferred write replaces the line, then **begins echo
//!    suppression**: it types a neutral key and deletes it again. Those two
//!    keystrokes wake the preview and come back as two change events.
//!
//! ```text
//!           request            begin_echo            2nd echo / timeout
//!   Idle ───────────▶ PendingWrite ─────────▶ SuppressingEcho ─────────▶ Idle
//!     ▲                    │                        │
//!     └──── cancel ────────┴──────── cancel ────────┘
//! ```
//!
//! While suppressing, every change event counts down the guard and is
//! swallowed; the one that reaches zero settles the line and the dashboard
//! is recomputed once. Outside of suppression, change events are the
//! user's own typing and are processed directly, without synthetic keys.

use std::time::{Duration, Instant};

use crate::host::SyntheticKey;

/// Number of change events one synthetic refresh produces.
pub const ECHO_EVENTS: u8 = 2;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    /// A write for `generation` is queued but hasn't run.
    PendingWrite { generation: u64 },
    /// `remaining` echoes are still expected, counting from `since`.
    SuppressingEcho { remaining: u8, since: Instant },
}

/// A write waiting for the next turn of the host's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub generation: u64,
    pub text: String,
    pub cursor: usize,
}

/// How to treat a change event from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Genuine user input: process it.
    User,
    /// One of our own keystrokes; more are on the way.
    Echo,
    /// The last of our own keystrokes: the line has settled.
    Settled,
}

/// The write/echo state machine.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    state: RefreshState,
    echo_timeout: Duration,
    neutral_key: char,
}

impl RefreshScheduler {
    #[must_use]
    pub const fn new(echo_timeout: Duration, neutral_key: char) -> Self {
        Self {
            state: RefreshState::Idle,
            echo_timeout,
            neutral_key,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> RefreshState {
        self.state
    }

    /// Echo events still expected.
    #[must_use]
    pub const fn guard(&self) -> u8 {
        match self.state {
            RefreshState::SuppressingEcho { remaining, .. } => remaining,
            _ => 0,
        }
    }

    /// Request a write of `text` with the cursor at `cursor`.
    ///
    /// The returned write must be run later, never inside the callback that
    /// requested it. A newer request supersedes a queued one.
    pub fn request(&mut self, generation: u64, text: String, cursor: usize) -> PendingWrite {
        if let RefreshState::SuppressingEcho { remaining, .. } = self.state {
            tracing::warn!(remaining, "write requested while echoes are outstanding");
        }
        self.state = RefreshState::PendingWrite { generation };
        tracing::debug!(generation, cursor, "refresh requested");
        PendingWrite {
            generation,
            text,
            cursor,
        }
    }

    /// True if `write` is the one the scheduler is waiting to run.
    #[must_use]
    pub fn is_current(&self, write: &PendingWrite) -> bool {
        self.state == RefreshState::PendingWrite {
            generation: write.generation,
        }
    }

    /// Arm the echo guard and return the keys to type.
    ///
    /// Called right before the keys are fed to the host, so the guard is set
    /// before the first echo can arrive.
    pub fn begin_echo(&mut self, now: Instant) -> [SyntheticKey; ECHO_EVENTS as usize] {
        self.state = RefreshState::SuppressingEcho {
            remaining: ECHO_EVENTS,
            since: now,
        };
        [SyntheticKey::Char(self.neutral_key), SyntheticKey::Backspace]
    }

    /// The deferred write failed or went stale: back to idle.
    pub fn abort(&mut self) {
        self.state = RefreshState::Idle;
    }

    /// Classify a change event from the host.
    pub fn on_line_changed(&mut self) -> LineChange {
        match self.state {
            RefreshState::SuppressingEcho { remaining, since } if remaining > 1 => {
                self.state = RefreshState::SuppressingEcho {
                    remaining: remaining - 1,
                    since,
                };
                tracing::trace!(remaining = remaining - 1, "echo suppressed");
                LineChange::Echo
            }
            RefreshState::SuppressingEcho { .. } => {
                self.state = RefreshState::Idle;
                tracing::trace!("echo settled");
                LineChange::Settled
            }
            RefreshState::Idle | RefreshState::PendingWrite { .. } => LineChange::User,
        }
    }

    /// Clear a guard whose echoes never came. Returns `true` if it did.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            RefreshState::SuppressingEcho { remaining, since }
                if now.saturating_duration_since(since) >= self.echo_timeout =>
            {
                tracing::warn!(remaining, "echo suppression timed out");
                self.state = RefreshState::Idle;
                true
            }
            _ => false,
        }
    }

    /// The session ended: drop everything.
    pub fn cancel(&mut self) {
        if self.state != RefreshState::Idle {
            tracing::debug!(state = ?self.state, "refresh cancelled");
        }
        self.state = RefreshState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RefreshScheduler {
        RefreshScheduler::new(Duration::from_millis(50), ' ')
    }

    #[test]
    fn starts_idle() {
        let s = scheduler();
        assert_eq!(s.state(), RefreshState::Idle);
        assert_eq!(s.guard(), 0);
    }

    #[test]
    fn idle_changes_are_user_input() {
        let mut s = scheduler();
        assert_eq!(s.on_line_changed(), LineChange::User);
        assert_eq!(s.on_line_changed(), LineChange::User);
        assert_eq!(s.state(), RefreshState::Idle);
    }

    #[test]
    fn request_moves_to_pending() {
        let mut s = scheduler();
        let write = s.request(3, "%s/a/b/".into(), 5);
        assert_eq!(s.state(), RefreshState::PendingWrite { generation: 3 });
        assert!(s.is_current(&write));
    }

    #[test]
    fn pending_changes_are_still_user_input() {
        let mut s = scheduler();
        s.request(1, String::new(), 0);
        assert_eq!(s.on_line_changed(), LineChange::User);
    }

    #[test]
    fn two_echoes_then_settled() {
        let mut s = scheduler();
        s.request(1, String::new(), 0);
        let keys = s.begin_echo(Instant::now());
        assert_eq!(keys, [SyntheticKey::Char(' '), SyntheticKey::Backspace]);
        assert_eq!(s.guard(), 2);
        assert_eq!(s.on_line_changed(), LineChange::Echo);
        assert_eq!(s.guard(), 1);
        assert_eq!(s.on_line_changed(), LineChange::Settled);
        assert_eq!(s.state(), RefreshState::Idle);
        // The guard never leaks into the next real keystroke.
        assert_eq!(s.on_line_changed(), LineChange::User);
    }

    #[test]
    fn newer_request_supersedes() {
        let mut s = scheduler();
        let first = s.request(1, "a".into(), 0);
        let second = s.request(2, "b".into(), 0);
        assert!(!s.is_current(&first));
        assert!(s.is_current(&second));
    }

    #[test]
    fn timeout_clears_guard() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.request(1, String::new(), 0);
        s.begin_echo(t0);
        s.on_line_changed();
        assert!(!s.tick(t0 + Duration::from_millis(10)));
        assert!(s.tick(t0 + Duration::from_millis(50)));
        assert_eq!(s.state(), RefreshState::Idle);
        assert_eq!(s.on_line_changed(), LineChange::User);
    }

    #[test]
    fn tick_when_idle_does_nothing() {
        let mut s = scheduler();
        assert!(!s.tick(Instant::now()));
    }

    #[test]
    fn cancel_resets_from_any_state() {
        let mut s = scheduler();
        s.request(1, String::new(), 0);
        s.cancel();
        assert_eq!(s.state(), RefreshState::Idle);

        s.request(2, String::new(), 0);
        s.begin_echo(Instant::now());
        s.cancel();
        assert_eq!(s.guard(), 0);
        assert_eq!(s.on_line_changed(), LineChange::User);
    }

    #[test]
    fn abort_returns_to_idle() {
        let mut s = scheduler();
        let write = s.request(1, String::new(), 0);
        s.abort();
        assert!(!s.is_current(&write));
    }
}

//! Controller — the event loop side of a compose session.
//!
//! Host events flow in through [`Controller::handle`]; toggles arrive
//! through [`Controller::apply`] or a keymap lookup in
//! [`Controller::handle_key`]. A toggle never writes to the host directly: it
//! queues a deferred write, and [`Controller::run_deferred`] runs the queue
//! once the current host callback has returned.
//!
//! ```text
//! key ─▶ apply ─▶ toggle engine ─▶ scheduler.request ─▶ deferred queue
//!                                                          │
//!        run_deferred ◀────────── next event-loop turn ◀───┘
//!             │
//!             ├─▶ host.set_line
//!             └─▶ scheduler.begin_echo ─▶ host.feed_typed ─▶ 2 × LineChanged
//!                                                             │
//!        handle(LineChanged) ─▶ Echo (swallowed) / Settled ─▶ dashboard
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use n_cmdline::{Operation, ParsedCommand, toggle};

use crate::config::Settings;
use crate::dashboard;
use crate::host::{Host, HostEvent};
use crate::refresh::{LineChange, PendingWrite, RefreshScheduler};
use crate::session::Session;

/// Ties a host to the session, the scheduler and the toggle engine.
#[derive(Debug)]
pub struct Controller<H: Host> {
    host: H,
    settings: Settings,
    session: Session,
    scheduler: RefreshScheduler,
    deferred: VecDeque<PendingWrite>,
    panel_open: bool,
}

impl<H: Host> Controller<H> {
    #[must_use]
    pub fn new(host: H, settings: Settings) -> Self {
        let session = Session::new(&settings.defaults);
        let scheduler = RefreshScheduler::new(settings.echo_timeout, settings.neutral_key);
        Self {
            host,
            settings,
            session,
            scheduler,
            deferred: VecDeque::new(),
            panel_open: false,
        }
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Writes waiting for the next event-loop turn.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    // -- Host events --------------------------------------------------------

    /// Handle one host event.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::SessionEntered { captured: None } => self.session.enter(),
            HostEvent::SessionEntered {
                captured: Some(captured),
            } => self.compose(&captured),
            HostEvent::LineChanged => self.line_changed(),
            HostEvent::SessionLeft => self.leave(),
        }
    }

    fn compose(&mut self, captured: &str) {
        match self.session.start(captured, None, &self.settings) {
            Ok(cmd) => {
                self.request_write(&cmd);
                self.refresh_dashboard();
            }
            Err(e) => tracing::warn!("compose ignored: {e}"),
        }
    }

    fn line_changed(&mut self) {
        match self.scheduler.on_line_changed() {
            LineChange::Echo => {}
            LineChange::Settled => self.refresh_dashboard(),
            LineChange::User => {
                let cmd = n_cmdline::parse(&self.host.line());
                self.session.observe(cmd.as_ref());
                self.refresh_dashboard();
            }
        }
    }

    fn leave(&mut self) {
        self.session.leave();
        self.scheduler.cancel();
        if self.panel_open {
            self.host.close_panel();
            self.panel_open = false;
        }
    }

    // -- Toggles ------------------------------------------------------------

    /// Run a keymapped operation. Returns `true` if the key is bound and the
    /// operation applied.
    pub fn handle_key(&mut self, key: &str) -> bool {
        match self.settings.keymap.get(key).copied() {
            Some(op) => self.apply(op),
            None => false,
        }
    }

    /// Apply a toggle to the live line. The write is deferred.
    ///
    /// Returns `false` (and changes nothing) if the line isn't a substitute
    /// command.
    pub fn apply(&mut self, op: Operation) -> bool {
        // Two toggles in one callback: build on the write not yet applied.
        let text = match self.deferred.back() {
            Some(write) if self.scheduler.is_current(write) => write.text.clone(),
            _ => self.host.line(),
        };
        let ctx = self
            .settings
            .toggle_context(self.session.restore_text(), self.session.fallback());
        let Some(toggled) = toggle::apply(&text, op, &ctx) else {
            tracing::debug!(%op, "not a substitute command, toggle ignored");
            return false;
        };
        self.session.record(&toggled.command);
        self.request_write(&toggled.command);
        true
    }

    fn request_write(&mut self, cmd: &ParsedCommand) {
        let write = self
            .scheduler
            .request(self.session.generation(), cmd.text(), cmd.cursor_offset());
        // One write per turn: a newer request in the same session replaces
        // the one still queued.
        match self.deferred.back_mut() {
            Some(queued) if queued.generation == write.generation => *queued = write,
            _ => self.deferred.push_back(write),
        }
    }

    // -- Event-loop turns ---------------------------------------------------

    /// Run the writes queued by earlier callbacks.
    ///
    /// Stale writes (from a closed session, or superseded by a newer
    /// request) are dropped. A write the host refuses is dropped too: there
    /// is nothing left to apply it to.
    pub fn run_deferred(&mut self, now: Instant) {
        while let Some(write) = self.deferred.pop_front() {
            if !self.session.is_live(write.generation) || !self.scheduler.is_current(&write) {
                tracing::debug!(generation = write.generation, "stale write dropped");
                continue;
            }

            if let Err(e) = self.host.set_line(&write.text, write.cursor) {
                tracing::warn!("deferred write failed: {e}");
                self.scheduler.abort();
                continue;
            }

            let keys = self.scheduler.begin_echo(now);
            if let Err(e) = self.host.feed_typed(&keys) {
                tracing::warn!("synthetic keys rejected: {e}");
                self.scheduler.abort();
                self.refresh_dashboard();
            }
        }
    }

    /// Periodic tick: expire an echo guard that waited too long.
    pub fn tick(&mut self, now: Instant) {
        if self.scheduler.tick(now) {
            self.refresh_dashboard();
        }
    }

    // -- Dashboard ----------------------------------------------------------

    fn refresh_dashboard(&mut self) {
        let shown = self.settings.panel.enabled && self.session.is_shown();
        if !shown {
            if self.panel_open {
                self.host.close_panel();
                self.panel_open = false;
            }
            return;
        }

        let cmd = n_cmdline::parse(&self.host.line());
        let lines = dashboard::render(cmd.as_ref(), self.session.mode(), &self.settings);
        if self.panel_open {
            self.host.update_panel(&lines);
        } else {
            self.host.open_panel(&lines);
            self.panel_open = true;
        }
    }

    /// The dashboard lines for the current state, or `None` when hidden.
    #[must_use]
    pub fn dashboard(&self) -> Option<Vec<String>> {
        if !self.session.is_shown() {
            return None;
        }
        let cmd = n_cmdline::parse(&self.host.line());
        Some(dashboard::render(cmd.as_ref(), self.session.mode(), &self.settings))
    }
}

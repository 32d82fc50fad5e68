//! Compose session state.
//!
//! A session spans one visit to the command line. It is in one of three
//! modes:
//!
//! | Mode           | Entered by                                      |
//! |----------------|-------------------------------------------------|
//! | `Inactive`     | startup, leaving the command line               |
//! | `Active`       | an explicit compose action                      |
//! | `AutoDetected` | the user typing a substitute command unprompted |
//!
//! Only one session exists at a time. Starting a compose while one is
//! `Active` is an error rather than a silent restart.
//!
//! The captured word and the last separator/dialect outlive the session:
//! they stay until the next compose overwrites them.

use n_cmdline::command;
use n_cmdline::range::with_letter;
use n_cmdline::tokenize;
use n_cmdline::{Dialect, Flags, ParsedCommand};

use crate::config::{Defaults, Settings};
use crate::error::SessionError;

/// Which kind of session, if any, is running.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    #[default]
    Inactive,
    Active,
    AutoDetected,
}

/// State shared by the toggle engine and the refresh scheduler.
#[derive(Debug, Clone)]
pub struct Session {
    mode: SessionMode,
    captured: String,
    separator: char,
    dialect: Option<Dialect>,
    /// Bumped whenever the command line opens or closes. Deferred work is
    /// tagged with it and dropped once it goes stale.
    generation: u64,
}

impl Session {
    /// An inactive session seeded with the configured defaults.
    #[must_use]
    pub fn new(defaults: &Defaults) -> Self {
        Self {
            mode: SessionMode::Inactive,
            captured: String::new(),
            separator: defaults.separator,
            dialect: defaults.dialect,
            generation: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// True while the dashboard should be visible.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.mode != SessionMode::Inactive
    }

    #[must_use]
    pub fn captured(&self) -> &str {
        &self.captured
    }

    #[must_use]
    pub const fn separator(&self) -> char {
        self.separator
    }

    #[must_use]
    pub const fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// True if work tagged with `generation` still belongs to a live session.
    #[must_use]
    pub fn is_live(&self, generation: u64) -> bool {
        self.is_shown() && self.generation == generation
    }

    /// The command line opened without a compose action.
    pub fn enter(&mut self) {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "command line entered");
    }

    /// Start an explicit compose from `captured` and build its first command.
    ///
    /// The command uses the configured range, separator, dialect and flags.
    /// Without an explicit `replace`, the replacement starts as a copy of the
    /// search.
    pub fn start(
        &mut self,
        captured: &str,
        replace: Option<&str>,
        settings: &Settings,
    ) -> Result<ParsedCommand, SessionError> {
        if self.mode == SessionMode::Active {
            return Err(SessionError::AlreadyActive);
        }

        let defaults = &settings.defaults;
        let sep = defaults.separator;

        let mut fields = vec![with_letter(&defaults.range), tokenize::escape(captured, sep)];
        if let Some(replace) = replace {
            fields.push(tokenize::escape(replace, sep));
        }
        let [range, search, replace, _] = command::normalize(&fields);

        let cmd = ParsedCommand {
            range,
            separator: sep,
            dialect: defaults.dialect,
            search,
            replace,
            flags: Flags::new(defaults.flags.clone()),
        };

        self.generation += 1;
        self.mode = SessionMode::Active;
        self.captured = captured.to_string();
        self.record(&cmd);
        tracing::debug!(generation = self.generation, captured, "compose session started");
        Ok(cmd)
    }

    /// React to text the user typed.
    ///
    /// A substitute command typed with no session running starts an
    /// auto-detected one; an auto-detected session ends when the line stops
    /// looking like a command. An explicit session stays active either way.
    pub fn observe(&mut self, cmd: Option<&ParsedCommand>) {
        match (self.mode, cmd) {
            (SessionMode::Inactive, Some(cmd)) => {
                self.mode = SessionMode::AutoDetected;
                self.record(cmd);
                tracing::debug!("substitute command detected");
            }
            (SessionMode::AutoDetected, None) => {
                self.mode = SessionMode::Inactive;
                tracing::debug!("substitute command no longer detected");
            }
            (_, Some(cmd)) => self.record(cmd),
            (_, None) => {}
        }
    }

    /// Remember the separator and dialect of the latest command.
    pub fn record(&mut self, cmd: &ParsedCommand) {
        self.separator = cmd.separator;
        self.dialect = cmd.dialect;
    }

    /// The command line closed.
    pub fn leave(&mut self) {
        self.mode = SessionMode::Inactive;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "command line left");
    }

    /// Text to refill an empty replacement with. Only for explicit sessions.
    #[must_use]
    pub fn restore_text(&self) -> Option<&str> {
        (self.mode == SessionMode::Active).then_some(self.captured.as_str())
    }

    /// Separator and dialect to build a command from mid-edit.
    #[must_use]
    pub fn fallback(&self) -> Option<(char, Option<Dialect>)> {
        (self.mode == SessionMode::Active).then_some((self.separator, self.dialect))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

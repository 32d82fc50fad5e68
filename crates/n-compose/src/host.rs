//! The host line editor, as seen from a compose session.
//!
//! [`Host`] is the seam between the session logic and whatever editor owns
//! the command line. [`MemoryHost`] implements it on top of an in-process
//! [`CommandLine`]: it is what the driver binary and the tests run against.

use std::collections::VecDeque;

use n_cmdline::CommandLine;

use crate::error::HostError;

/// A keystroke fed to the host as if the user typed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKey {
    Char(char),
    Backspace,
}

/// Notifications from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The command line opened. `captured` is set when a compose action
    /// opened it from a word or selection.
    SessionEntered { captured: Option<String> },
    /// The command-line text changed through typed input.
    LineChanged,
    /// The command line closed.
    SessionLeft,
}

/// What a compose session needs from the editor.
pub trait Host {
    /// Current command-line text.
    fn line(&self) -> String;

    /// Cursor position in the command line (char offset).
    fn cursor(&self) -> usize;

    /// Replace the command-line text and move the cursor.
    ///
    /// Does not count as typed input: no change event is produced.
    fn set_line(&mut self, text: &str, cursor: usize) -> Result<(), HostError>;

    /// Feed keys as typed input. Each key produces one change event.
    fn feed_typed(&mut self, keys: &[SyntheticKey]) -> Result<(), HostError>;

    /// Show the floating panel with `lines`.
    fn open_panel(&mut self, lines: &[String]);

    /// Replace the panel's contents.
    fn update_panel(&mut self, lines: &[String]);

    /// Hide the panel.
    fn close_panel(&mut self);
}

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

/// An in-process host: a command line, an event queue and a panel.
#[derive(Debug, Default)]
pub struct MemoryHost {
    cmdline: Option<CommandLine>,
    events: VecDeque<HostEvent>,
    panel: Option<Vec<String>>,
    locked: bool,
    synthetic_keys: usize,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the command line, optionally from a compose action.
    pub fn open(&mut self, captured: Option<&str>) {
        self.cmdline = Some(CommandLine::new());
        self.events.push_back(HostEvent::SessionEntered {
            captured: captured.map(str::to_string),
        });
    }

    /// Close the command line.
    pub fn close(&mut self) {
        if self.cmdline.take().is_some() {
            self.events.push_back(HostEvent::SessionLeft);
        }
    }

    /// True while the command line is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.cmdline.is_some()
    }

    /// The user types `ch`.
    pub fn type_char(&mut self, ch: char) -> Result<(), HostError> {
        self.apply_key(SyntheticKey::Char(ch))
    }

    /// The user types each char of `text`.
    pub fn type_str(&mut self, text: &str) -> Result<(), HostError> {
        text.chars().try_for_each(|ch| self.type_char(ch))
    }

    /// The user presses backspace.
    pub fn backspace(&mut self) -> Result<(), HostError> {
        self.apply_key(SyntheticKey::Backspace)
    }

    /// Refuse writes while held, like a host evaluating a mapping.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Next queued event.
    pub fn poll_event(&mut self) -> Option<HostEvent> {
        self.events.pop_front()
    }

    /// The panel contents, if shown.
    #[must_use]
    pub fn panel(&self) -> Option<&[String]> {
        self.panel.as_deref()
    }

    /// Synthetic keys fed so far.
    #[must_use]
    pub const fn synthetic_keys(&self) -> usize {
        self.synthetic_keys
    }

    fn apply_key(&mut self, key: SyntheticKey) -> Result<(), HostError> {
        let cl = self.cmdline.as_mut().ok_or(HostError::Closed)?;
        match key {
            SyntheticKey::Char(ch) => cl.insert_char(ch),
            SyntheticKey::Backspace => {
                cl.backspace();
            }
        }
        self.events.push_back(HostEvent::LineChanged);
        Ok(())
    }
}

impl Host for MemoryHost {
    fn line(&self) -> String {
        self.cmdline
            .as_ref()
            .map(|cl| cl.input().to_string())
            .unwrap_or_default()
    }

    fn cursor(&self) -> usize {
        self.cmdline.as_ref().map_or(0, CommandLine::cursor)
    }

    fn set_line(&mut self, text: &str, cursor: usize) -> Result<(), HostError> {
        if self.locked {
            return Err(HostError::TextLocked);
        }
        let cl = self.cmdline.as_mut().ok_or(HostError::Closed)?;
        cl.replace(text, cursor);
        Ok(())
    }

    fn feed_typed(&mut self, keys: &[SyntheticKey]) -> Result<(), HostError> {
        if self.locked {
            return Err(HostError::TextLocked);
        }
        for &key in keys {
            self.apply_key(key)?;
            self.synthetic_keys += 1;
        }
        Ok(())
    }

    fn open_panel(&mut self, lines: &[String]) {
        self.panel = Some(lines.to_vec());
    }

    fn update_panel(&mut self, lines: &[String]) {
        self.panel = Some(lines.to_vec());
    }

    fn close_panel(&mut self) {
        self.panel = None;
    }
}

//! The single-line command editor buffer.
//!
//! Holds the text being typed after `:` and a cursor measured in chars.
//! Typing goes through [`insert_char`](CommandLine::insert_char) and
//! [`backspace`](CommandLine::backspace); programmatic rewrites go through
//! [`replace`](CommandLine::replace), which sets text and cursor in one step.

use crate::command::{self, ParsedCommand};

/// The command-line input buffer.
///
/// The leading `:` is not stored; it belongs to the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    input: String,
    /// Char offset into `input`; `char_len()` means after the last char.
    cursor: usize,
}

impl CommandLine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: String::new(),
            cursor: 0,
        }
    }

    /// Create a command line holding `text` with the cursor at the end.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        Self {
            input: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of the input in chars.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Type `ch` at the cursor.
    pub fn insert_char(&mut self, ch: char) {
        let at = self.char_to_byte(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    /// Remove the char left of the cursor. `false` at the start of the line.
    pub fn backspace(&mut self) -> bool {
        let Some(prev) = self.cursor.checked_sub(1) else {
            return false;
        };
        let at = self.char_to_byte(prev);
        self.input.remove(at);
        self.cursor = prev;
        true
    }

    /// Move the cursor, clamped to the end of the input.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.char_len());
    }

    /// Replace the whole input and place the cursor (clamped).
    pub fn replace(&mut self, text: &str, cursor: usize) {
        self.input.clear();
        self.input.push_str(text);
        self.set_cursor(cursor);
    }

    /// True if the input is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Parse the current input as a substitute command.
    #[must_use]
    pub fn parse(&self) -> Option<ParsedCommand> {
        command::parse(&self.input)
    }

    fn char_to_byte(&self, offset: usize) -> usize {
        self.input
            .char_indices()
            .nth(offset)
            .map_or(self.input.len(), |(at, _)| at)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

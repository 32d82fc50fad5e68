//! Command-line ranges for `:s`.
//!
//! The range prefix picks which lines the substitution touches. Three forms
//! are canonical and take part in range cycling; everything else the user
//! types (`5,10`, `.`, an empty range for the current line) is kept as-is
//! until the next cycle replaces it.
//!
//! | Prefix | Kind              |
//! |--------|-------------------|
//! | `%`    | whole buffer      |
//! | `.,$`  | cursor to end     |
//! | `1,.`  | start to cursor   |

/// The letter that introduces a substitute command.
pub const COMMAND_LETTER: char = 's';

/// Returns `true` if `ch` may appear in a range prefix.
#[must_use]
pub const fn is_range_char(ch: char) -> bool {
    matches!(ch, '0'..='9' | '.' | ',' | '$' | '%')
}

/// Classification of a range prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmdRange {
    /// `%`: every line of the buffer.
    WholeBuffer,
    /// `.,$`: from the cursor line to the last line.
    CursorToEnd,
    /// `1,.`: from the first line to the cursor line.
    StartToCursor,
    /// Anything else, including the empty (current line) range.
    Other,
}

impl CmdRange {
    /// Classify a range token. The trailing command letter is optional.
    #[must_use]
    pub fn classify(range: &str) -> Self {
        let prefix = range.strip_suffix(COMMAND_LETTER).unwrap_or(range);
        match prefix {
            "%" => Self::WholeBuffer,
            ".,$" => Self::CursorToEnd,
            "1,." => Self::StartToCursor,
            _ => Self::Other,
        }
    }

    /// The next range in the cycle.
    ///
    /// `Other` sits where `StartToCursor` sits, so any non-canonical range
    /// cycles to the whole buffer.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::WholeBuffer => Self::CursorToEnd,
            Self::CursorToEnd => Self::StartToCursor,
            Self::StartToCursor | Self::Other => Self::WholeBuffer,
        }
    }

    /// The range prefix, without the command letter. `None` for `Other`.
    #[must_use]
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            Self::WholeBuffer => Some("%"),
            Self::CursorToEnd => Some(".,$"),
            Self::StartToCursor => Some("1,."),
            Self::Other => None,
        }
    }

    /// Human-readable name for the dashboard.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::WholeBuffer => "whole buffer",
            Self::CursorToEnd => "cursor to end",
            Self::StartToCursor => "start to cursor",
            Self::Other => "custom",
        }
    }
}

/// Append the command letter to a range prefix: `"%"` → `"%s"`.
#[must_use]
pub fn with_letter(prefix: &str) -> String {
    let mut range = String::with_capacity(prefix.len() + 1);
    range.push_str(prefix);
    range.push(COMMAND_LETTER);
    range
}

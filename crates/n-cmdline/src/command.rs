//! Substitute-command parsing — the `:[range]s/pat/rep/flags` grammar.
//!
//! While the user types on the command line, the current text is parsed on
//! every change into a [`ParsedCommand`]. Parsing never fails loudly: text
//! that isn't a substitute command yields `None`, and callers do nothing.
//!
//! # Grammar
//!
//! ```text
//! <range> <sep> [<dialect>] <search> <sep> <replace> <sep> <flags>
//! ```
//!
//! | Part      | Form                                                  |
//! |-----------|-------------------------------------------------------|
//! | `range`   | `[0-9.,$%]*` followed by the command letter `s`       |
//! | `sep`     | one char, not alphanumeric, whitespace or `\`         |
//! | `dialect` | `\v`, `\m`, `\M` or `\V`, or absent                   |
//! | `flags`   | zero or more flag chars, kept raw                     |
//!
//! A `sep` preceded by an odd number of backslashes belongs to the field.
//! Trailing parts may be missing: `%s/foo` is a valid (partial) command with
//! an empty replacement and no flags.
//!
//! # Detection policy
//!
//! Detection is strict: the char right after the command letter must be a
//! valid separator. `:set`, `:sort`, `:s` and `:%s` on their own are not
//! substitute commands.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::{self, Dialect};
use crate::flags::Flags;
use crate::range::COMMAND_LETTER;
use crate::tokenize;

/// `<range><letter><sep>` at the start of the line.
static COMMAND_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"^(?P<range>[0-9.,$%]*{COMMAND_LETTER})(?P<sep>[^\p{{Alphabetic}}\p{{N}}\s\\])");
    Regex::new(&pattern).expect("command head pattern is valid")
});

/// A bare range and command letter with nothing after it (`%s`, `.,$s`).
static BARE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"^[0-9.,$%]*{COMMAND_LETTER}$");
    Regex::new(&pattern).expect("bare range pattern is valid")
});

// ---------------------------------------------------------------------------
// ParsedCommand
// ---------------------------------------------------------------------------

/// A substitute command decomposed into its parts.
///
/// `search` excludes the dialect marker; [`Display`](fmt::Display) puts it
/// back. Fields hold raw text, escapes included, so serializing and parsing
/// again yields an equal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Range prefix plus the command letter, e.g. `"%s"` or `"s"`.
    pub range: String,

    /// Field separator.
    pub separator: char,

    /// Dialect marker at the start of the pattern, if any.
    pub dialect: Option<Dialect>,

    /// Pattern text after the dialect marker.
    pub search: String,

    /// Replacement text.
    pub replace: String,

    /// Flags field.
    pub flags: Flags,
}

impl ParsedCommand {
    /// Serialize back to command-line text.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Cursor position (char offset) right after the replacement field.
    ///
    /// This is where editing focus goes after every toggle: the length of
    /// the serialized text minus the closing separator and the flags.
    #[must_use]
    pub fn cursor_offset(&self) -> usize {
        self.text().chars().count() - 1 - self.flags.char_len()
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.separator;
        write!(
            f,
            "{}{sep}{}{}{sep}{}{sep}{}",
            self.range,
            dialect::marker_of(self.dialect),
            self.search,
            self.replace,
            self.flags,
        )
    }
}

// ---------------------------------------------------------------------------
// Detection and parsing
// ---------------------------------------------------------------------------

/// Returns `true` if `text` looks like a substitute command.
///
/// Range chars, the command letter, then a char that is neither alphanumeric
/// nor whitespace.
#[must_use]
pub fn is_command_like(text: &str) -> bool {
    COMMAND_HEAD.is_match(text)
}

/// Returns `true` if `text` is a range and command letter with nothing after
/// it, which is what the line looks like mid-edit, before a separator is typed.
#[must_use]
pub fn is_bare_range(text: &str) -> bool {
    BARE_RANGE.is_match(text)
}

/// Parse command-line text into a [`ParsedCommand`].
///
/// Returns `None` for anything that isn't [`is_command_like`].
#[must_use]
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let caps = COMMAND_HEAD.captures(text)?;
    let range = caps.name("range")?.as_str();
    let sep_match = caps.name("sep")?;
    let separator = sep_match.as_str().chars().next()?;
    let body = &text[sep_match.end()..];

    let mut fields = tokenize::splitn(body, separator, 3).into_iter();
    let raw_search = fields.next().unwrap_or_default();
    let replace = fields.next().unwrap_or_default();
    let flags = fields.next().unwrap_or_default();

    let (dialect, search) = Dialect::strip(&raw_search);

    Some(ParsedCommand {
        range: range.to_string(),
        separator,
        dialect,
        search: search.to_string(),
        replace,
        flags: Flags::new(flags),
    })
}

/// Returns `true` if `ch` can delimit the fields of a substitute command.
///
/// Backslash is excluded: the tokenizer always reads it as an escape.
#[must_use]
pub fn is_valid_separator(ch: char) -> bool {
    !ch.is_alphanumeric() && !ch.is_whitespace() && ch != '\\'
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Pad a `[range, search?, replace?, flags?]` part list to exactly four.
///
/// A missing search is empty, a missing replacement copies the search (so
/// the default replacement is a no-op), and missing flags are empty. Already
/// complete lists come back unchanged, so normalizing twice is the same as
/// normalizing once.
#[must_use]
pub fn normalize<S: AsRef<str>>(fields: &[S]) -> [String; 4] {
    debug_assert!(fields.len() <= 4, "at most four command parts, got {}", fields.len());

    let part = |i: usize| fields.get(i).map(|f| f.as_ref().to_string());

    let range = part(0).unwrap_or_default();
    let search = part(1).unwrap_or_default();
    let replace = part(2).unwrap_or_else(|| search.clone());
    let flags = part(3).unwrap_or_default();

    [range, search, replace, flags]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn cmd(range: &str, sep: char, search: &str, replace: &str, flags: &str) -> ParsedCommand {
        ParsedCommand {
            range: range.to_string(),
            separator: sep,
            dialect: None,
            search: search.to_string(),
            replace: replace.to_string(),
            flags: Flags::from(flags),
        }
    }

    // -- Detection ----------------------------------------------------------

    #[test]
    fn write_is_not_a_command() {
        assert!(!is_command_like("write"));
    }

    #[test]
    fn percent_range_is_a_command() {
        assert!(is_command_like("%s/foo/bar/"));
    }

    #[test]
    fn line_range_is_a_command() {
        assert!(is_command_like("1,10s/foo/bar/"));
    }

    #[test]
    fn set_and_sort_are_not_commands() {
        assert!(!is_command_like("set number"));
        assert!(!is_command_like("sort"));
        assert!(!is_command_like("%sort"));
    }

    #[test]
    fn bare_letter_is_not_a_command() {
        assert!(!is_command_like("s"));
        assert!(!is_command_like("%s"));
        assert!(!is_command_like("s foo"));
    }

    #[test]
    fn letter_must_follow_range_chars() {
        assert!(!is_command_like("x%s/a/b/"));
        assert!(!is_command_like(" %s/a/b/"));
    }

    #[test]
    fn backslash_is_not_a_separator() {
        assert!(!is_command_like(r"%s\a\b\"));
        assert_eq!(parse(r"%s\a\b\"), None);
        assert!(is_command_like(r"%s/\a/b/"));
    }

    #[test]
    fn bare_range_detection() {
        assert!(is_bare_range("%s"));
        assert!(is_bare_range(".,$s"));
        assert!(is_bare_range("s"));
        assert!(!is_bare_range("%s/"));
        assert!(!is_bare_range("set"));
    }

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn parse_full_command() {
        assert_eq!(parse("%s/foo/bar/g"), Some(cmd("%s", '/', "foo", "bar", "g")));
    }

    #[test]
    fn parse_empty_replacement() {
        assert_eq!(parse("%s/foo//g"), Some(cmd("%s", '/', "foo", "", "g")));
    }

    #[test]
    fn parse_separator_only() {
        assert_eq!(parse("%s/"), Some(cmd("%s", '/', "", "", "")));
    }

    #[test]
    fn parse_pattern_only() {
        assert_eq!(parse("s#foo"), Some(cmd("s", '#', "foo", "", "")));
    }

    #[test]
    fn parse_line_range() {
        assert_eq!(parse("1,10s/a/b/"), Some(cmd("1,10s", '/', "a", "b", "")));
    }

    #[test]
    fn parse_escaped_separator_stays_raw() {
        assert_eq!(
            parse(r"%s/a\/b/c\/d/"),
            Some(cmd("%s", '/', r"a\/b", r"c\/d", ""))
        );
    }

    #[test]
    fn parse_extra_separators_land_in_flags() {
        assert_eq!(parse("%s/a/b/g/x"), Some(cmd("%s", '/', "a", "b", "g/x")));
    }

    #[test]
    fn parse_detects_dialect() {
        let mut expected = cmd("%s", '/', "(foo)+", "bar", "");
        expected.dialect = Some(Dialect::VeryMagic);
        assert_eq!(parse(r"%s/\v(foo)+/bar/"), Some(expected));
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert_eq!(parse("write"), None);
        assert_eq!(parse("%s"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn parse_unicode_separator() {
        assert_eq!(parse("%s→a→b→"), Some(cmd("%s", '→', "a", "b", "")));
    }

    // -- Serialization ------------------------------------------------------

    #[test]
    fn serialize_puts_dialect_back() {
        let mut c = cmd("%s", '/', "foo", "bar", "gi");
        c.dialect = Some(Dialect::VeryNoMagic);
        assert_eq!(c.text(), r"%s/\Vfoo/bar/gi");
    }

    #[test]
    fn serialize_always_closes_replacement() {
        assert_eq!(cmd("s", '#', "a", "", "").text(), "s#a##");
    }

    #[test]
    fn round_trip() {
        let samples = [
            cmd("%s", '/', "foo", "bar", "g"),
            cmd("s", '#', r"a\#b", "", ""),
            cmd(".,$s", '?', "", "x", "gci"),
            cmd("1,.s", '@', r"\\", r"\1", "c"),
            ParsedCommand {
                dialect: Some(Dialect::Magic),
                ..cmd("%s", ':', "x", "y", "")
            },
        ];
        for c in samples {
            assert_eq!(parse(&c.text()), Some(c));
        }
    }

    #[test]
    fn parse_then_serialize_preserves_text() {
        for text in ["%s/foo/bar/g", r"s#a\#b#c#", r"%s/\vx/y/gi", "5,9s@a@@"] {
            assert_eq!(parse(text).map(|c| c.text()), Some(text.to_string()));
        }
    }

    #[test]
    fn cursor_offset_lands_after_replacement() {
        let c = cmd("%s", '/', "foo", "bar", "g");
        // "%s/foo/bar/g": after "bar", before "/g".
        assert_eq!(c.cursor_offset(), 10);
    }

    #[test]
    fn cursor_offset_counts_chars() {
        let c = cmd("%s", '/', "日本", "中", "");
        assert_eq!(c.cursor_offset(), "%s/日本/中".chars().count());
    }

    // -- Separators ---------------------------------------------------------

    #[test]
    fn valid_separators() {
        for ch in ['/', '?', '#', ':', '@', '_', '→'] {
            assert!(is_valid_separator(ch), "{ch:?}");
        }
        for ch in ['a', '1', ' ', '\\', 's'] {
            assert!(!is_valid_separator(ch), "{ch:?}");
        }
    }

    // -- Normalization ------------------------------------------------------

    #[test]
    fn normalize_range_only() {
        assert_eq!(normalize(&["%s"]), ["%s", "", "", ""].map(String::from));
    }

    #[test]
    fn normalize_copies_search_into_missing_replace() {
        assert_eq!(normalize(&["%s", "foo"]), ["%s", "foo", "foo", ""].map(String::from));
    }

    #[test]
    fn normalize_keeps_explicit_empty_replace() {
        assert_eq!(
            normalize(&["%s", "foo", ""]),
            ["%s", "foo", "", ""].map(String::from)
        );
    }

    #[test]
    fn normalize_complete_list_unchanged() {
        let full = ["s", "a", "b", "g"];
        assert_eq!(normalize(&full), full.map(String::from));
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs: [&[&str]; 4] = [&[], &["%s"], &["%s", "x"], &["s", "a", "b"]];
        for fields in inputs {
            let once = normalize(fields);
            assert_eq!(normalize(&once), once);
        }
    }
}

//! Toggle engine — reversible rewrites of a substitute command.
//!
//! Every operation takes the live command-line text, parses it, rewrites one
//! part of the [`ParsedCommand`] and hands back the new text together with
//! the cursor offset. The cursor always lands right after the replacement
//! field, so editing focus returns to the replacement after any toggle.
//!
//! | Operation          | Effect                                             |
//! |--------------------|----------------------------------------------------|
//! | `toggle_flag:<c>`  | Flip one flag, rebuild flags in alphabet order     |
//! | `toggle_replace`   | Clear the replacement, or restore it               |
//! | `cycle_range`      | `%` → `.,$` → `1,.` → `%`                          |
//! | `cycle_separator`  | Next separator not present in search or replace    |
//! | `cycle_dialect`    | Next marker in the dialect cycle                   |
//!
//! These are pure functions. Session state reaches them through
//! [`ToggleContext`].

use std::fmt;
use std::str::FromStr;

use crate::command::{self, ParsedCommand};
use crate::dialect::Dialect;
use crate::flags::Flags;
use crate::range::{CmdRange, with_letter};
use crate::tokenize;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A user-requested transformation of the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Add or remove one flag.
    ToggleFlag(char),
    /// Clear the replacement, or restore it when empty.
    ToggleReplace,
    /// Advance the range through its three canonical forms.
    CycleRange,
    /// Advance the separator through the candidate list.
    CycleSeparator,
    /// Advance the dialect marker through the dialect cycle.
    CycleDialect,
}

/// Error returned when an operation name can't be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation(pub String);

impl fmt::Display for UnknownOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operation `{}`", self.0)
    }
}

impl std::error::Error for UnknownOperation {}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toggle_replace" => Ok(Self::ToggleReplace),
            "cycle_range" => Ok(Self::CycleRange),
            "cycle_separator" => Ok(Self::CycleSeparator),
            "cycle_dialect" => Ok(Self::CycleDialect),
            _ => {
                let flag = s.strip_prefix("toggle_flag:").and_then(|rest| {
                    let mut chars = rest.chars();
                    let flag = chars.next()?;
                    chars.next().is_none().then_some(flag)
                });
                flag.map(Self::ToggleFlag)
                    .ok_or_else(|| UnknownOperation(s.to_string()))
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleFlag(c) => write!(f, "toggle_flag:{c}"),
            Self::ToggleReplace => f.write_str("toggle_replace"),
            Self::CycleRange => f.write_str("cycle_range"),
            Self::CycleSeparator => f.write_str("cycle_separator"),
            Self::CycleDialect => f.write_str("cycle_dialect"),
        }
    }
}

// ---------------------------------------------------------------------------
// Context and result
// ---------------------------------------------------------------------------

/// Everything outside the command text that a toggle may consult.
#[derive(Debug, Clone, Copy)]
pub struct ToggleContext<'a> {
    /// Flag alphabet, in canonical order.
    pub flag_alphabet: &'a [char],

    /// Separator candidates, in cycling order.
    pub separators: &'a [char],

    /// Dialect cycle; `None` is the "no marker" state.
    pub dialects: &'a [Option<Dialect>],

    /// Unescaped text to restore an empty replacement from. `None` restores
    /// from the current search instead.
    pub restore_text: Option<&'a str>,

    /// Separator and dialect to build a command from when the line is a bare
    /// range. `None` makes a bare range a no-op.
    pub fallback: Option<(char, Option<Dialect>)>,
}

/// The outcome of a successful toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
    /// The rewritten command.
    pub command: ParsedCommand,
    /// Its serialized text.
    pub text: String,
    /// Cursor offset (chars) right after the replacement field.
    pub cursor: usize,
}

impl From<ParsedCommand> for Toggled {
    fn from(command: ParsedCommand) -> Self {
        let text = command.text();
        let cursor = command.cursor_offset();
        Self {
            command,
            text,
            cursor,
        }
    }
}

/// Apply `op` to the command-line `text`.
///
/// Returns `None` when the text isn't a substitute command (and isn't a bare
/// range with a fallback available): the caller leaves the line alone.
#[must_use]
pub fn apply(text: &str, op: Operation, ctx: &ToggleContext<'_>) -> Option<Toggled> {
    let current = command::parse(text).or_else(|| from_fallback(text, ctx))?;
    let next = match op {
        Operation::ToggleFlag(flag) => toggle_flag(current, flag, ctx.flag_alphabet),
        Operation::ToggleReplace => toggle_replace(current, ctx.restore_text),
        Operation::CycleRange => cycle_range(current),
        Operation::CycleSeparator => cycle_separator(current, ctx.separators),
        Operation::CycleDialect => cycle_dialect(current, ctx.dialects),
    };
    Some(next.into())
}

/// Build an empty command from a bare range and the fallback parts.
fn from_fallback(text: &str, ctx: &ToggleContext<'_>) -> Option<ParsedCommand> {
    let (separator, dialect) = ctx.fallback?;
    if !command::is_bare_range(text) {
        return None;
    }
    Some(ParsedCommand {
        range: text.to_string(),
        separator,
        dialect,
        search: String::new(),
        replace: String::new(),
        flags: Flags::default(),
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Flip `flag`; the flags field comes back in `alphabet` order.
#[must_use]
pub fn toggle_flag(mut cmd: ParsedCommand, flag: char, alphabet: &[char]) -> ParsedCommand {
    cmd.flags = cmd.flags.toggled(flag, alphabet);
    cmd
}

/// Clear a non-empty replacement; refill an empty one.
///
/// An empty replacement is refilled from `restore` (escaped for the current
/// separator) or, without one, from the current search text.
#[must_use]
pub fn toggle_replace(mut cmd: ParsedCommand, restore: Option<&str>) -> ParsedCommand {
    if cmd.replace.is_empty() {
        cmd.replace = restore.map_or_else(
            || cmd.search.clone(),
            |text| tokenize::escape(text, cmd.separator),
        );
    } else {
        cmd.replace.clear();
    }
    cmd
}

/// Move the range one step along whole buffer → cursor to end → start to
/// cursor. Non-canonical ranges go to the whole buffer.
#[must_use]
pub fn cycle_range(mut cmd: ParsedCommand) -> ParsedCommand {
    let next = CmdRange::classify(&cmd.range).next();
    if let Some(prefix) = next.prefix() {
        cmd.range = with_letter(prefix);
    }
    cmd
}

/// Move to the next separator candidate that doesn't occur in the search or
/// replacement. If every other candidate occurs, the separator stays put.
///
/// Escapes of the old separator are dropped, since it is now plain text.
#[must_use]
pub fn cycle_separator(mut cmd: ParsedCommand, candidates: &[char]) -> ParsedCommand {
    let current = cmd.separator;
    let start = candidates
        .iter()
        .position(|&c| c == current)
        .map_or(0, |i| i + 1);

    let search = tokenize::unescape_delim(&cmd.search, current);
    let replace = tokenize::unescape_delim(&cmd.replace, current);

    let next = (0..candidates.len())
        .map(|step| candidates[(start + step) % candidates.len()])
        .take_while(|&c| c != current)
        .find(|&c| !search.contains(c) && !replace.contains(c));

    if let Some(separator) = next {
        cmd.separator = separator;
        cmd.search = search;
        cmd.replace = replace;
    }
    cmd
}

/// Move to the next dialect in `cycle`, rewriting only the marker.
///
/// A dialect missing from the cycle moves to its first entry. "No marker" is
/// skipped while the search itself opens with a marker text, since that text
/// would read back as the dialect.
#[must_use]
pub fn cycle_dialect(mut cmd: ParsedCommand, cycle: &[Option<Dialect>]) -> ParsedCommand {
    if cycle.is_empty() {
        return cmd;
    }
    let start = cycle
        .iter()
        .position(|&d| d == cmd.dialect)
        .map_or(0, |i| i + 1);
    let search_has_marker = Dialect::strip(&cmd.search).0.is_some();

    let next = (0..cycle.len())
        .map(|step| cycle[(start + step) % cycle.len()])
        .find(|d| d.is_some() || !search_has_marker);
    if let Some(dialect) = next {
        cmd.dialect = dialect;
    }
    cmd
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::command::parse;

    const FLAGS: [char; 3] = ['g', 'c', 'i'];
    const SEPARATORS: [char; 5] = ['/', '?', '#', ':', '@'];
    const DIALECTS: [Option<Dialect>; 5] = [
        None,
        Some(Dialect::VeryMagic),
        Some(Dialect::Magic),
        Some(Dialect::NoMagic),
        Some(Dialect::VeryNoMagic),
    ];

    fn ctx() -> ToggleContext<'static> {
        ToggleContext {
            flag_alphabet: &FLAGS,
            separators: &SEPARATORS,
            dialects: &DIALECTS,
            restore_text: None,
            fallback: None,
        }
    }

    fn run(text: &str, op: Operation) -> Option<String> {
        apply(text, op, &ctx()).map(|t| t.text)
    }

    // -- Operation names ----------------------------------------------------

    #[test]
    fn operation_names_round_trip() {
        for op in [
            Operation::ToggleFlag('g'),
            Operation::ToggleReplace,
            Operation::CycleRange,
            Operation::CycleSeparator,
            Operation::CycleDialect,
        ] {
            assert_eq!(op.to_string().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn operation_name_errors() {
        assert!("toggle_flag:".parse::<Operation>().is_err());
        assert!("toggle_flag:gc".parse::<Operation>().is_err());
        assert!("explode".parse::<Operation>().is_err());
    }

    // -- apply --------------------------------------------------------------

    #[test]
    fn non_command_is_noop() {
        assert_eq!(run("write", Operation::CycleRange), None);
        assert_eq!(run("%s", Operation::CycleRange), None);
    }

    #[test]
    fn bare_range_uses_fallback() {
        let ctx = ToggleContext {
            fallback: Some(('#', Some(Dialect::VeryMagic))),
            ..ctx()
        };
        let toggled = apply("%s", Operation::ToggleFlag('g'), &ctx).map(|t| t.text);
        assert_eq!(toggled.as_deref(), Some(r"%s#\v##g"));
    }

    #[test]
    fn cursor_lands_after_replacement() {
        let toggled = apply("%s/foo/bar/g", Operation::ToggleFlag('i'), &ctx());
        let toggled = toggled.map(|t| (t.text, t.cursor));
        assert_eq!(toggled, Some(("%s/foo/bar/gi".to_string(), 10)));
    }

    // -- Flags --------------------------------------------------------------

    #[test]
    fn toggle_flag_on_and_off() {
        assert_eq!(run("%s/a/b/gc", Operation::ToggleFlag('i')).as_deref(), Some("%s/a/b/gci"));
        assert_eq!(run("%s/a/b/gci", Operation::ToggleFlag('c')).as_deref(), Some("%s/a/b/gi"));
    }

    #[test]
    fn toggle_flag_closes_partial_command() {
        assert_eq!(run("%s/a", Operation::ToggleFlag('g')).as_deref(), Some("%s/a//g"));
    }

    // -- Replacement --------------------------------------------------------

    #[test]
    fn toggle_replace_clears() {
        assert_eq!(run("%s/foo/bar/g", Operation::ToggleReplace).as_deref(), Some("%s/foo//g"));
    }

    #[test]
    fn toggle_replace_restores_from_search() {
        assert_eq!(run("%s/foo//g", Operation::ToggleReplace).as_deref(), Some("%s/foo/foo/g"));
    }

    #[test]
    fn toggle_replace_restores_captured_text_escaped() {
        let ctx = ToggleContext {
            restore_text: Some("a/b"),
            ..ctx()
        };
        let toggled = apply(r"%s/\Va\/b//g", Operation::ToggleReplace, &ctx).map(|t| t.text);
        assert_eq!(toggled.as_deref(), Some(r"%s/\Va\/b/a\/b/g"));
    }

    #[test]
    fn toggle_replace_is_two_state() {
        let once = run("%s/foo/bar/", Operation::ToggleReplace).unwrap();
        let twice = run(&once, Operation::ToggleReplace).unwrap();
        let thrice = run(&twice, Operation::ToggleReplace).unwrap();
        assert_eq!(once, "%s/foo//");
        assert_eq!(twice, "%s/foo/foo/");
        assert_eq!(thrice, once);
    }

    // -- Range --------------------------------------------------------------

    #[test]
    fn cycle_range_order() {
        assert_eq!(run("%s/a/b/", Operation::CycleRange).as_deref(), Some(".,$s/a/b/"));
        assert_eq!(run(".,$s/a/b/", Operation::CycleRange).as_deref(), Some("1,.s/a/b/"));
        assert_eq!(run("1,.s/a/b/", Operation::CycleRange).as_deref(), Some("%s/a/b/"));
    }

    #[test]
    fn cycle_range_three_times_is_identity() {
        let start = parse("%s/a/b/g").unwrap();
        let end = cycle_range(cycle_range(cycle_range(start.clone())));
        assert_eq!(end, start);
    }

    #[test]
    fn cycle_range_custom_goes_to_whole_buffer() {
        assert_eq!(run("5,10s/a/b/", Operation::CycleRange).as_deref(), Some("%s/a/b/"));
        assert_eq!(run("s/a/b/", Operation::CycleRange).as_deref(), Some("%s/a/b/"));
    }

    // -- Separator ----------------------------------------------------------

    #[test]
    fn cycle_separator_advances() {
        assert_eq!(run("%s/a/b/g", Operation::CycleSeparator).as_deref(), Some("%s?a?b?g"));
    }

    #[test]
    fn cycle_separator_skips_candidates_in_text() {
        // `?` occurs in the search, so `#` is next.
        assert_eq!(run("%s/a?/b/", Operation::CycleSeparator).as_deref(), Some("%s#a?#b#"));
    }

    #[test]
    fn cycle_separator_drops_old_escapes() {
        assert_eq!(
            run(r"%s/a\/b/c/", Operation::CycleSeparator).as_deref(),
            Some("%s?a/b?c?")
        );
    }

    #[test]
    fn cycle_separator_wraps() {
        assert_eq!(run("%s@a@b@", Operation::CycleSeparator).as_deref(), Some("%s/a/b/"));
    }

    #[test]
    fn cycle_separator_unchanged_when_all_candidates_occur() {
        let text = r"%s/?#:@/x/";
        assert_eq!(run(text, Operation::CycleSeparator).as_deref(), Some(text));
    }

    #[test]
    fn cycle_separator_from_unlisted_starts_at_first() {
        assert_eq!(run("%s|a|b|", Operation::CycleSeparator).as_deref(), Some("%s/a/b/"));
    }

    #[test]
    fn cycle_separator_never_picks_char_in_text() {
        let candidates = SEPARATORS;
        let mut text = String::from("%s/x?y#/z:/g");
        for _ in 0..10 {
            text = run(&text, Operation::CycleSeparator).unwrap();
            let cmd = parse(&text).unwrap();
            let occurs = |c: char| cmd.search.contains(c) || cmd.replace.contains(c);
            let others_free = candidates.iter().any(|&c| c != cmd.separator && !occurs(c));
            assert!(!occurs(cmd.separator) || !others_free, "{text}");
        }
    }

    // -- Dialect ------------------------------------------------------------

    #[test]
    fn cycle_dialect_order() {
        let mut text = String::from("%s/foo/bar/");
        let mut seen = Vec::new();
        for _ in 0..5 {
            text = run(&text, Operation::CycleDialect).unwrap();
            seen.push(text.clone());
        }
        assert_eq!(
            seen,
            [
                r"%s/\vfoo/bar/",
                r"%s/\mfoo/bar/",
                r"%s/\Mfoo/bar/",
                r"%s/\Vfoo/bar/",
                r"%s/foo/bar/",
            ]
        );
    }

    #[test]
    fn cycle_dialect_not_in_cycle_goes_to_first() {
        let short = [Some(Dialect::VeryMagic), None];
        let cmd = parse(r"%s/\Mfoo/bar/").unwrap();
        assert_eq!(cycle_dialect(cmd, &short).dialect, Some(Dialect::VeryMagic));
    }

    #[test]
    fn cycle_dialect_leaves_search_text() {
        let cmd = parse(r"%s/\v(a|b)/c/").unwrap();
        let next = cycle_dialect(cmd, &DIALECTS);
        assert_eq!(next.search, "(a|b)");
        assert_eq!(next.dialect, Some(Dialect::Magic));
    }

    #[test]
    fn cycle_dialect_keeps_marker_when_search_opens_with_one() {
        let cmd = parse(r"%s/\v\Vx/y/").unwrap();
        let next = cycle_dialect(cmd, &[None, Some(Dialect::VeryMagic)]);
        assert_eq!(next.text(), r"%s/\v\Vx/y/");
        assert_eq!(parse(&next.text()), Some(next));
    }

    #[test]
    fn cycle_dialect_skips_none_when_search_opens_with_marker() {
        let cmd = parse(r"%s/\V\vx/y/").unwrap();
        let next = cycle_dialect(cmd, &DIALECTS);
        assert_eq!(next.text(), r"%s/\v\vx/y/");
        assert_eq!(parse(&next.text()), Some(next));
    }
}

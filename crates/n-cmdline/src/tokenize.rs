//! Escape-aware field splitting.
//!
//! The `:s` command line is a string of fields joined by a separator
//! character. A separator preceded by a backslash is part of the field, not a
//! boundary. The splitter never interprets escapes. A backslash and the char
//! after it are copied into the field verbatim, as one unit, so fields keep
//! their raw text and rejoining them with the separator reproduces the input.
//!
//! ```text
//! split(r"foo\/bar/baz/", '/')  →  ["foo\/bar", "baz", ""]
//! split(r"a\\/b", '/')          →  [r"a\\", "b"]
//! split("", '/')                →  [""]
//! ```

/// Split `text` at every unescaped occurrence of `delim`.
///
/// The final field is always emitted, even when empty, so `"a/b/"` yields
/// three fields and `""` yields one. Never fails.
#[must_use]
pub fn split(text: &str, delim: char) -> Vec<String> {
    splitn(text, delim, usize::MAX)
}

/// Like [`split`], but produce at most `max` fields.
///
/// Once `max - 1` boundaries have been consumed, the rest of the input goes
/// into the last field untouched, unescaped separators included. A `max` of
/// zero behaves like one.
#[must_use]
pub fn splitn(text: &str, delim: char, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = text.char_indices();

    while let Some((byte_idx, ch)) = chars.next() {
        if fields.len() + 1 == max {
            // Last field swallows everything that is left.
            current.push_str(&text[byte_idx..]);
            break;
        }
        if ch == '\\' {
            current.push(ch);
            if let Some((_, next)) = chars.next() {
                current.push(next);
            }
            continue;
        }
        if ch == delim {
            fields.push(std::mem::take(&mut current));
            continue;
        }
        current.push(ch);
    }

    fields.push(current);
    fields
}

/// Remove escapes of `delim`: `\<delim>` → `<delim>`.
///
/// All other `\X` pairs pass through unchanged, including `\\`, so an
/// escaped backslash in front of the delimiter is not mistaken for an
/// escape of the delimiter itself.
#[must_use]
pub fn unescape_delim(s: &str, delim: char) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) if next == delim => result.push(next),
                Some(next) => {
                    result.push(ch);
                    result.push(next);
                }
                None => result.push(ch),
            }
            continue;
        }
        result.push(ch);
    }
    result
}

/// Escape literal text for use as a field delimited by `delim`.
///
/// Backslashes are doubled and every `delim` gets a backslash in front, so
/// [`split`] sees the whole text as a single field.
#[must_use]
pub fn escape(text: &str, delim: char) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || ch == delim {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- split ---------------------------------------------------------------

    #[test]
    fn split_basic() {
        assert_eq!(split("foo/bar/g", '/'), ["foo", "bar", "g"]);
    }

    #[test]
    fn split_trailing_delimiter_emits_empty_field() {
        assert_eq!(split("a/b/", '/'), ["a", "b", ""]);
    }

    #[test]
    fn split_empty_string_is_one_empty_field() {
        assert_eq!(split("", '/'), [""]);
    }

    #[test]
    fn split_keeps_escaped_delimiter_raw() {
        assert_eq!(split(r"foo\/bar/baz", '/'), [r"foo\/bar", "baz"]);
    }

    #[test]
    fn split_escaped_backslash_does_not_escape_delimiter() {
        assert_eq!(split(r"a\\/b", '/'), [r"a\\", "b"]);
    }

    #[test]
    fn split_odd_backslashes_escape_delimiter() {
        assert_eq!(split(r"a\\\/b", '/'), [r"a\\\/b"]);
    }

    #[test]
    fn split_trailing_lone_backslash() {
        assert_eq!(split("a\\", '/'), ["a\\"]);
    }

    #[test]
    fn split_other_escapes_pass_through() {
        assert_eq!(split(r"(\w+)/\1", '/'), [r"(\w+)", r"\1"]);
    }

    #[test]
    fn split_consecutive_delimiters() {
        assert_eq!(split("//", '/'), ["", "", ""]);
    }

    #[test]
    fn split_unicode() {
        assert_eq!(split("日本#中#", '#'), ["日本", "中", ""]);
    }

    // -- splitn --------------------------------------------------------------

    #[test]
    fn splitn_caps_field_count() {
        assert_eq!(splitn("a/b/c/d", '/', 3), ["a", "b", "c/d"]);
    }

    #[test]
    fn splitn_fewer_fields_than_cap() {
        assert_eq!(splitn("a", '/', 3), ["a"]);
    }

    #[test]
    fn splitn_zero_is_one() {
        assert_eq!(splitn("a/b", '/', 0), ["a/b"]);
    }

    #[test]
    fn splitn_rejoins_losslessly() {
        let input = r"x\/y/z/g/extra";
        assert_eq!(splitn(input, '/', 3).join("/"), input);
    }

    // -- unescape_delim / escape --------------------------------------------

    #[test]
    fn unescape_basic() {
        assert_eq!(unescape_delim(r"foo\/bar", '/'), "foo/bar");
    }

    #[test]
    fn unescape_preserves_other_backslashes() {
        assert_eq!(unescape_delim(r"\1\n\\", '/'), r"\1\n\\");
    }

    #[test]
    fn unescape_escaped_backslash_before_delimiter() {
        assert_eq!(unescape_delim(r"a\\/b", '/'), r"a\\/b");
    }

    #[test]
    fn escape_backslash_and_delimiter() {
        assert_eq!(escape(r"a/b\c", '/'), r"a\/b\\c");
    }

    #[test]
    fn escaped_text_is_one_field() {
        let text = r"x/\/y";
        assert_eq!(split(&escape(text, '/'), '/').len(), 1);
    }
}

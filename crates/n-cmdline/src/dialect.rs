//! Regex dialect markers.
//!
//! A pattern may open with a two-character marker that selects how the rest
//! of it is interpreted. The four markers are mutually exclusive, and a
//! pattern without one uses the engine's default ("none" in the cycle).
//!
//! | Marker | Name          |
//! |--------|---------------|
//! | `\v`   | very magic    |
//! | `\m`   | magic         |
//! | `\M`   | nomagic       |
//! | `\V`   | very nomagic  |

use std::fmt;

/// A regex dialect selected by a marker at the start of the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `\v`: every ASCII punctuation char is special.
    VeryMagic,
    /// `\m`: the default interpretation, spelled out.
    Magic,
    /// `\M`: only `^` and `$` are special.
    NoMagic,
    /// `\V`: only the backslash is special.
    VeryNoMagic,
}

impl Dialect {
    /// All dialects, in marker-table order.
    pub const ALL: [Self; 4] = [
        Self::VeryMagic,
        Self::Magic,
        Self::NoMagic,
        Self::VeryNoMagic,
    ];

    /// The two-character marker that selects this dialect.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::VeryMagic => r"\v",
            Self::Magic => r"\m",
            Self::NoMagic => r"\M",
            Self::VeryNoMagic => r"\V",
        }
    }

    /// Human-readable name for the dashboard.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::VeryMagic => "very magic",
            Self::Magic => "magic",
            Self::NoMagic => "nomagic",
            Self::VeryNoMagic => "very nomagic",
        }
    }

    /// Look up a dialect by its exact marker.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.marker() == marker)
    }

    /// Split a leading dialect marker off `search`.
    ///
    /// Returns the detected dialect (if any) and the remaining pattern text.
    #[must_use]
    pub fn strip(search: &str) -> (Option<Self>, &str) {
        for dialect in Self::ALL {
            if let Some(rest) = search.strip_prefix(dialect.marker()) {
                return (Some(dialect), rest);
            }
        }
        (None, search)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Marker text for an optional dialect, empty for "none".
#[must_use]
pub fn marker_of(dialect: Option<Dialect>) -> &'static str {
    dialect.map_or("", Dialect::marker)
}

//! Substitution flags.
//!
//! The flags field is kept exactly as typed until a toggle touches it. A
//! toggle rebuilds the field from the configured alphabet, so toggled flags
//! always come out in alphabet order, deduplicated, with anything outside
//! the alphabet dropped.

use std::fmt;

/// The raw flags field of a substitute command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Flags(String);

impl Flags {
    /// Wrap a raw flags field.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The flags as they will be serialized.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the flag char appears in the field.
    #[must_use]
    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(flag)
    }

    /// True if the field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the field in chars.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Flip `flag` and rebuild the field in `alphabet` order.
    ///
    /// A flag outside the alphabet can't be turned on; toggling one only
    /// canonicalises the rest of the field.
    #[must_use]
    pub fn toggled(&self, flag: char, alphabet: &[char]) -> Self {
        let present = self.contains(flag);
        let mut seen = String::new();
        for &c in alphabet {
            let keep = if c == flag { !present } else { self.contains(c) };
            if keep && !seen.contains(c) {
                seen.push(c);
            }
        }
        Self(seen)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Flags {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

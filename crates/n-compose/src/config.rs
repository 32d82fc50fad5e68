//! User configuration — `~/.config/n-subst/config.yaml`.
//!
//! The file is optional and every key in it is optional. Whatever the user
//! provides is deep-merged over the defaults (mappings merge key by key,
//! everything else replaces), unknown keys are ignored, and the result is
//! validated into [`Settings`]. Validation is strict: an empty separator list
//! or a two-char flag is an error at startup, not a silently broken cycle.
//!
//! ```yaml
//! separators: ["/", "?", "#", ":", "@"]
//! dialects: [none, '\v', '\m', '\M', '\V']
//! flags: [g, c, i]
//! defaults:
//!   range: "%"
//!   flags: g
//!   dialect: none
//!   separator: /
//! keymap:
//!   "<M-g>": "toggle_flag:g"
//!   "<M-r>": cycle_range
//! panel:
//!   enabled: true
//!   width: 40
//! refresh:
//!   echo_timeout_ms: 50
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use n_cmdline::command::is_valid_separator;
use n_cmdline::range::is_range_char;
use n_cmdline::{Dialect, Operation, ToggleContext};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::ConfigError;

const APP_DIR: &str = "n-subst";

/// Spelling of the "no dialect marker" state in the config file.
const NO_DIALECT: &str = "none";

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

/// The configuration file as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Separator candidates, in cycling order.
    pub separators: Vec<String>,
    /// Dialect markers in cycling order; `none` (or empty) for no marker.
    pub dialects: Vec<String>,
    /// Flag alphabet, in canonical order.
    pub flags: Vec<String>,
    pub defaults: DefaultsConfig,
    /// Key name → operation name. An empty operation disables the key.
    pub keymap: BTreeMap<String, String>,
    pub panel: PanelConfig,
    pub refresh: RefreshConfig,
}

/// Values used when a compose session builds a fresh command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Range prefix without the command letter.
    pub range: String,
    pub flags: String,
    pub dialect: String,
    pub separator: String,
}

/// Floating status panel options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub enabled: bool,
    /// Panel width in terminal columns.
    pub width: usize,
    pub title: String,
}

/// Refresh scheduler options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// How long echo suppression may wait for its events.
    pub echo_timeout_ms: u64,
    /// The char typed and deleted to wake the live preview.
    pub neutral_key: String,
}

impl Default for Config {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_string()).collect() };
        let keymap = [
            ("<M-g>", "toggle_flag:g"),
            ("<M-c>", "toggle_flag:c"),
            ("<M-i>", "toggle_flag:i"),
            ("<M-e>", "toggle_replace"),
            ("<M-r>", "cycle_range"),
            ("<M-s>", "cycle_separator"),
            ("<M-m>", "cycle_dialect"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            separators: strings(&["/", "?", "#", ":", "@"]),
            dialects: strings(&[NO_DIALECT, r"\v", r"\m", r"\M", r"\V"]),
            flags: strings(&["g", "c", "i"]),
            defaults: DefaultsConfig::default(),
            keymap,
            panel: PanelConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            range: "%".to_string(),
            flags: "g".to_string(),
            dialect: NO_DIALECT.to_string(),
            separator: "/".to_string(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 40,
            title: "substitute".to_string(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            echo_timeout_ms: 50,
            neutral_key: " ".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated settings
// ---------------------------------------------------------------------------

/// Validated configuration, ready for the session and toggle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub separators: Vec<char>,
    pub dialects: Vec<Option<Dialect>>,
    pub flags: Vec<char>,
    pub defaults: Defaults,
    pub keymap: BTreeMap<String, Operation>,
    pub panel: PanelConfig,
    pub echo_timeout: Duration,
    pub neutral_key: char,
}

/// Validated compose defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub range: String,
    pub flags: String,
    pub dialect: Option<Dialect>,
    pub separator: char,
}

impl Settings {
    /// Toggle context over these settings plus the session's view.
    #[must_use]
    pub fn toggle_context<'a>(
        &'a self,
        restore_text: Option<&'a str>,
        fallback: Option<(char, Option<Dialect>)>,
    ) -> ToggleContext<'a> {
        ToggleContext {
            flag_alphabet: &self.flags,
            separators: &self.separators,
            dialects: &self.dialects,
            restore_text,
            fallback,
        }
    }

    /// Parse a YAML document and merge it over the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut merged = serde_yaml::to_value(Config::default())?;
        let overlay: Value = serde_yaml::from_str(yaml)?;
        merge(&mut merged, overlay);
        let config: Config = serde_yaml::from_value(merged)?;
        config.validate()
    }

    /// Load settings from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default file is optional; without
    /// it, the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_file() {
                Some(p) if p.exists() => p,
                Some(p) => {
                    tracing::debug!("Config file not found at {}, using defaults", p.display());
                    return Config::default().validate();
                }
                None => {
                    tracing::debug!("No config directory available, using defaults");
                    return Config::default().validate();
                }
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let settings = Self::from_yaml(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(settings)
    }
}

impl Config {
    /// Serialize as a YAML document, the same shape [`Settings::from_yaml`]
    /// reads.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check every value and convert to [`Settings`].
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let separators = self.validate_separators()?;
        let dialects = self.validate_dialects()?;
        let flags = self.validate_flags()?;
        let defaults = self.validate_defaults(&flags)?;
        let keymap = self.validate_keymap(&flags)?;

        if self.panel.width == 0 {
            return Err(ConfigError::invalid("panel.width", "must be greater than zero"));
        }
        if self.refresh.echo_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "refresh.echo_timeout_ms",
                "must be greater than zero",
            ));
        }
        let neutral_key = single_char(&self.refresh.neutral_key)
            .ok_or_else(|| ConfigError::invalid("refresh.neutral_key", "must be one char"))?;

        Ok(Settings {
            separators,
            dialects,
            flags,
            defaults,
            keymap,
            panel: self.panel.clone(),
            echo_timeout: Duration::from_millis(self.refresh.echo_timeout_ms),
            neutral_key,
        })
    }

    fn validate_separators(&self) -> Result<Vec<char>, ConfigError> {
        if self.separators.is_empty() {
            return Err(ConfigError::invalid("separators", "list is empty"));
        }
        let mut out = Vec::with_capacity(self.separators.len());
        for raw in &self.separators {
            let sep = single_char(raw)
                .filter(|&c| is_valid_separator(c))
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "separators",
                        format!("`{raw}` is not a single non-alphanumeric, non-space char"),
                    )
                })?;
            if out.contains(&sep) {
                return Err(ConfigError::invalid("separators", format!("`{sep}` listed twice")));
            }
            out.push(sep);
        }
        Ok(out)
    }

    fn validate_dialects(&self) -> Result<Vec<Option<Dialect>>, ConfigError> {
        if self.dialects.is_empty() {
            return Err(ConfigError::invalid("dialects", "list is empty"));
        }
        let mut out = Vec::with_capacity(self.dialects.len());
        for raw in &self.dialects {
            let dialect = parse_dialect(raw).ok_or_else(|| {
                ConfigError::invalid("dialects", format!("unknown dialect marker `{raw}`"))
            })?;
            if out.contains(&dialect) {
                return Err(ConfigError::invalid("dialects", format!("`{raw}` listed twice")));
            }
            out.push(dialect);
        }
        Ok(out)
    }

    fn validate_flags(&self) -> Result<Vec<char>, ConfigError> {
        if self.flags.is_empty() {
            return Err(ConfigError::invalid("flags", "list is empty"));
        }
        let mut out = Vec::with_capacity(self.flags.len());
        for raw in &self.flags {
            let flag = single_char(raw)
                .filter(|c| !c.is_whitespace())
                .ok_or_else(|| ConfigError::invalid("flags", format!("`{raw}` is not one char")))?;
            if out.contains(&flag) {
                return Err(ConfigError::invalid("flags", format!("`{flag}` listed twice")));
            }
            out.push(flag);
        }
        Ok(out)
    }

    fn validate_defaults(&self, alphabet: &[char]) -> Result<Defaults, ConfigError> {
        let d = &self.defaults;
        if !d.range.chars().all(is_range_char) {
            return Err(ConfigError::invalid(
                "defaults.range",
                format!("`{}` has chars outside `0-9.,$%`", d.range),
            ));
        }
        if let Some(bad) = d.flags.chars().find(|c| !alphabet.contains(c)) {
            return Err(ConfigError::invalid(
                "defaults.flags",
                format!("`{bad}` is not in the flag alphabet"),
            ));
        }
        let dialect = parse_dialect(&d.dialect).ok_or_else(|| {
            ConfigError::invalid("defaults.dialect", format!("unknown marker `{}`", d.dialect))
        })?;
        let separator = single_char(&d.separator)
            .filter(|&c| is_valid_separator(c))
            .ok_or_else(|| {
                ConfigError::invalid("defaults.separator", format!("`{}` is not a separator", d.separator))
            })?;

        // Rebuild through the alphabet so the default is canonical.
        let flags = alphabet.iter().filter(|c| d.flags.contains(**c)).collect();

        Ok(Defaults {
            range: d.range.clone(),
            flags,
            dialect,
            separator,
        })
    }

    fn validate_keymap(&self, alphabet: &[char]) -> Result<BTreeMap<String, Operation>, ConfigError> {
        let mut out = BTreeMap::new();
        for (key, name) in &self.keymap {
            if name.is_empty() {
                continue;
            }
            let op: Operation = name
                .parse()
                .map_err(|e| ConfigError::invalid("keymap", format!("{key}: {e}")))?;
            if let Operation::ToggleFlag(flag) = op {
                if !alphabet.contains(&flag) {
                    tracing::warn!("Dropping keymap {key}: flag `{flag}` is not in the alphabet");
                    continue;
                }
            }
            out.insert(key.clone(), op);
        }
        Ok(out)
    }
}

impl Default for Settings {
    /// The validated form of [`Config::default`].
    fn default() -> Self {
        Config::default()
            .validate()
            .expect("built-in config is valid")
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deep-merge `overlay` into `base`. Mappings merge per key; a null overlay
/// keeps the base; anything else replaces it.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn parse_dialect(raw: &str) -> Option<Option<Dialect>> {
    if raw.is_empty() || raw == NO_DIALECT {
        return Some(None);
    }
    Dialect::from_marker(raw).map(Some)
}

/// Base config directory.
///
/// `$XDG_CONFIG_HOME/n-subst` if set, else `~/.config/n-subst`.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|config| config.join(APP_DIR))
}

/// `~/.config/n-subst/config.yaml`
#[must_use]
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

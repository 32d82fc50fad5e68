//! # n-cmdline — Command-line text layer for n-subst
//!
//! Everything here is pure text processing with no session state:
//!
//! - **[`tokenize`]**: escape-aware field splitting
//! - **[`command`]**: `ParsedCommand`, substitute detection, parsing, normalization
//! - **[`range`]**: canonical ranges and the range cycle
//! - **[`dialect`]**: regex dialect markers
//! - **[`flags`]**: the flags field and canonical flag toggling
//! - **[`toggle`]**: the toggle engine, operations on a parsed command
//! - **[`cmdline`]**: the single-line command editor buffer

pub mod cmdline;
pub mod command;
pub mod dialect;
pub mod flags;
pub mod range;
pub mod tokenize;
pub mod toggle;

pub use cmdline::CommandLine;
pub use command::{ParsedCommand, is_command_like, normalize, parse};
pub use dialect::Dialect;
pub use flags::Flags;
pub use toggle::{Operation, ToggleContext, Toggled};

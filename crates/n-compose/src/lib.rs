//! # n-compose — Compose sessions for n-subst
//!
//! The stateful half of substitute composition, built on `n-cmdline`:
//!
//! | Module           | Role                                                    |
//! |------------------|---------------------------------------------------------|
//! | [`config`]       | YAML configuration, merged over defaults and validated  |
//! | [`session`]      | session modes, the captured word, staleness generations |
//! | [`refresh`]      | deferred writes and echo suppression                    |
//! | [`host`]         | the `Host` seam and the in-memory host                  |
//! | [`dashboard`]    | the status panel text                                   |
//! | [`controller`]   | event handling that ties the rest together              |
//! | [`error`]        | error types                                             |

pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod host;
pub mod refresh;
pub mod session;

pub use config::{Config, Settings};
pub use controller::Controller;
pub use error::{ConfigError, HostError, SessionError};
pub use host::{Host, HostEvent, MemoryHost, SyntheticKey};
pub use refresh::{RefreshScheduler, RefreshState};
pub use session::{Session, SessionMode};

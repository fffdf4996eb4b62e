//! Transport-agnostic request boundary for PostClip.
//!
//! Maps bookmark service outcomes to status codes and JSON envelopes so any
//! transport (HTTP server, CLI, extension host) can forward them verbatim.

pub mod api;
pub mod config;

pub use api::{ApiResponse, BookmarkApi};
pub use config::{ApiConfig, ConfigError};

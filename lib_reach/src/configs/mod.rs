//! # Configuration Modules
//!
//! This module holds the client's option set and its environment loader.

/// Provides `ReachOptions`, its defaults, validation and `.env` loading.
pub mod config_reach;

pub use config_reach::{ReachOptions, DEFAULT_BASE_URL};

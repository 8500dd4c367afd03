//! # lib_reach
//!
//! Client for the Versium REACH API: rate-paced, retrying append batches and
//! streamed listgen results.

// Declare the modules to re-export
pub mod configs;
pub mod core;
pub mod error;
pub mod loggers;
pub mod reach;
pub mod retrieve;

// Re-export the public surface
pub use configs::ReachOptions;
pub use error::{ConfigError, ReachError, Result};
pub use loggers::{Diagnostics, LogSink};
pub use reach::{
    input_record, AppendResponse, AppendTool, InputRecord, InputValue, ListgenRecord, ListgenResponse, ListgenTool,
    ReachClient,
};

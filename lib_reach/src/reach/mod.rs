//! # REACH API Module
//!
//! The Versium REACH surface built on top of the engine.
//!
//! ## Contained Modules:
//!
//! - **`apicall`**: URL and header construction for append and listgen calls.
//! - **`client`**: `ReachClient`, the public entry point.
//! - **`model`**: Input records, append responses and listgen responses.
//! - **`tools`**: Known endpoint names.

/// Request descriptors for REACH endpoints.
pub mod apicall;
/// The `ReachClient`.
pub mod client;
/// Request and response types.
pub mod model;
/// `AppendTool` and `ListgenTool`.
pub mod tools;

pub use client::ReachClient;
pub use model::{input_record, AppendEnvelope, AppendResponse, InputRecord, InputValue, ListgenRecord, ListgenResponse};
pub use tools::{AppendTool, ListgenTool, UnknownTool};

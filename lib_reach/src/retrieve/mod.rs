//! # Data Retrieval Module
//!
//! Everything that touches the wire, kept free of REACH-specific policy.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: The `Transport` trait, request/response carriers and the
//!   `reqwest`-backed production transport.
//! - **`timed_http`**: A wall-clock limit around one call that cancels the
//!   call when it fires.
//! - **`line_framer`**: Incremental splitting of a chunked body into lines.

/// Transport seam and the `reqwest` implementation.
pub mod ky_http;
/// Incremental newline framing over chunk streams.
pub mod line_framer;
/// Wall-clock timeout for single calls.
pub mod timed_http;

pub use ky_http::{ByteStream, HttpReply, ReqwestTransport, RequestDescriptor, StreamingReply, Transport};
pub use line_framer::{frame_lines, LineFramer};
pub use timed_http::timed_call;

//! # Orchestration Engine
//!
//! The transport-agnostic half of the client: how records are retried,
//! how batches are chunked and paced, and how streamed bodies are decoded.
//!
//! ## Contained Modules:
//!
//! - **`retry_driver`**: Per-record attempt loop and failure classification.
//! - **`dispatcher`**: Chunking, pacing and the per-client pacing clock.
//! - **`stream_consumer`**: Listgen response opening and NDJSON decoding.

/// Chunk scheduling with inter-chunk pacing.
pub mod dispatcher;
/// Per-record retry state machine.
pub mod retry_driver;
/// NDJSON record streams.
pub mod stream_consumer;

pub use dispatcher::{ChunkDispatcher, PacingClock};
pub use retry_driver::{classify, AttemptOutcome, FailureReason, RetryDriver, RetryPolicy};
pub use stream_consumer::{decode_records, open_listgen};

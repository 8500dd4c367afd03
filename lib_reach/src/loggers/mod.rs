/// Routes diagnostics to `tracing` and the caller's logging function.
pub mod sink;
/// Console subscriber setup for binaries.
#[cfg(feature = "loggers")]
pub mod subscriber;

pub use sink::{Diagnostics, LogSink};
#[cfg(feature = "loggers")]
pub use subscriber::init_tracing;

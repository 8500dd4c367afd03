//! # Diagnostic Routing
//!
//! The client reports retries, failures and pacing decisions two ways: as
//! `tracing` events (always) and through the caller's optional logging
//! function, which receives the message as a list of parts.

use std::sync::Arc;

use tracing::Level;

/// A caller-supplied receiver for diagnostic message parts.
pub type LogSink = Arc<dyn Fn(&[String]) + Send + Sync>;

/// # Diagnostics
///
/// Pairs the optional `LogSink` with the verbose flag. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<LogSink>,
    verbose: bool,
}

impl Diagnostics {
    pub fn new(sink: Option<LogSink>, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    /// Emit at `level` and forward to the sink.
    pub fn log(&self, level: Level, parts: &[String]) {
        let message = parts.join(" ");
        match level {
            Level::ERROR => tracing::error!(target: "lib_reach", "{}", message),
            Level::WARN => tracing::warn!(target: "lib_reach", "{}", message),
            Level::INFO => tracing::info!(target: "lib_reach", "{}", message),
            Level::DEBUG => tracing::debug!(target: "lib_reach", "{}", message),
            _ => tracing::trace!(target: "lib_reach", "{}", message),
        }
        if let Some(sink) = &self.sink {
            sink(parts);
        }
    }

    /// Progress chatter: always a debug event, forwarded to the sink only in verbose mode.
    pub fn verbose_log(&self, parts: &[String]) {
        tracing::debug!(target: "lib_reach", "{}", parts.join(" "));
        if self.verbose {
            if let Some(sink) = &self.sink {
                sink(parts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn capture() -> (LogSink, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_sink = Arc::clone(&seen);
        let sink: LogSink = Arc::new(move |parts: &[String]| {
            seen_in_sink.lock().unwrap().push(parts.to_vec());
        });
        (sink, seen)
    }

    #[test]
    fn log_forwards_parts_unchanged() {
        let (sink, seen) = capture();
        let diag = Diagnostics::new(Some(sink), false);
        diag.log(Level::WARN, &["Request error:".into(), "boom".into()]);
        assert_eq!(seen.lock().unwrap().as_slice(), &[vec!["Request error:".to_string(), "boom".to_string()]]);
    }

    #[test]
    fn verbose_log_respects_flag() {
        let (sink, seen) = capture();
        Diagnostics::new(Some(sink.clone()), false).verbose_log(&["quiet".into()]);
        assert!(seen.lock().unwrap().is_empty());

        Diagnostics::new(Some(sink), true).verbose_log(&["loud".into()]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn no_sink_is_silent() {
        Diagnostics::default().log(Level::ERROR, &["nobody listens".into()]);
    }
}

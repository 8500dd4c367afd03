//! # Chunked Rate-Paced Dispatcher
//!
//! Splits an append batch into chunks of `requests_per_second` records.
//! Every record of a chunk starts at once; the next chunk starts only after
//! all records of the current one have settled and at least the pacing
//! interval (one second plus the pad) has passed since the chunk started.
//!
//! The caller sees one item per chunk, in chunk order, each holding that
//! chunk's responses in input order. A fatal failure is yielded as the last
//! item; the records still in flight are dropped and nothing later starts.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::try_join_all;
use futures_util::{stream, Stream};
use tokio::time::Instant;
use tracing::Level;

use crate::core::retry_driver::RetryDriver;
use crate::error::{ReachError, Result};
use crate::loggers::Diagnostics;
use crate::reach::model::{AppendResponse, InputRecord};
use crate::retrieve::Transport;

/// # Pacing Clock
///
/// Remembers when the most recent chunk of any batch on a client started,
/// so back-to-back batches keep the same spacing as chunks within one.
#[derive(Debug, Default)]
pub struct PacingClock {
    last_chunk_start: Mutex<Option<Instant>>,
}

impl PacingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a new batch must still wait before its first chunk.
    pub fn remaining(&self, interval: Duration) -> Duration {
        self.last_chunk_start()
            .map(|started| interval.saturating_sub(started.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    /// Record a chunk start at the current instant.
    pub fn mark(&self) -> Instant {
        let now = Instant::now();
        *self.last_chunk_start.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);
        now
    }

    pub fn last_chunk_start(&self) -> Option<Instant> {
        *self.last_chunk_start.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// # Chunk Dispatcher
pub struct ChunkDispatcher<'a, T> {
    pub driver: RetryDriver<'a, T>,
    pub clock: &'a PacingClock,
    pub diagnostics: &'a Diagnostics,
    /// Records per chunk; at least 1.
    pub chunk_size: usize,
    pub pacing_interval: Duration,
}

impl<'a, T: Transport> ChunkDispatcher<'a, T> {
    /// Lazily run `inputs` as a paced sequence of chunks.
    ///
    /// Nothing is sent until the returned stream is polled. An empty batch
    /// yields a single empty item.
    pub fn run(
        self,
        tool: String,
        inputs: Vec<InputRecord>,
        output_types: Vec<String>,
    ) -> impl Stream<Item = Result<Vec<AppendResponse>>> + 'a
    where
        T: 'a,
    {
        let chunk_size = self.chunk_size.max(1);
        let mut chunks = VecDeque::new();
        let mut records = inputs.into_iter().peekable();
        while records.peek().is_some() {
            chunks.push_back(records.by_ref().take(chunk_size).collect::<Vec<_>>());
        }

        let batch = Batch {
            total: chunks.len(),
            index: 0,
            chunks,
            finished: false,
            tool,
            output_types,
            dispatcher: self,
        };

        stream::unfold(batch, |mut batch| async move {
            let item = batch.next_chunk().await?;
            Some((item, batch))
        })
    }

    /// Settle every record of one chunk. When `paced`, also hold until the
    /// pacing interval since the chunk start has elapsed.
    async fn process_chunk(
        &self,
        tool: &str,
        output_types: &[String],
        chunk: Vec<InputRecord>,
        paced: bool,
    ) -> Result<Vec<AppendResponse>> {
        let driver = self.driver;
        let settled = try_join_all(chunk.into_iter().map(|inputs| driver.run(tool, output_types, inputs)));

        if !paced {
            return settled.await;
        }

        let interval = self.pacing_interval;
        let window = async move {
            tokio::time::sleep(interval).await;
            Ok::<(), ReachError>(())
        };
        let ((), responses) = tokio::try_join!(window, settled)?;
        Ok(responses)
    }
}

struct Batch<'a, T> {
    dispatcher: ChunkDispatcher<'a, T>,
    tool: String,
    output_types: Vec<String>,
    chunks: VecDeque<Vec<InputRecord>>,
    index: usize,
    total: usize,
    finished: bool,
}

impl<T: Transport> Batch<'_, T> {
    async fn next_chunk(&mut self) -> Option<Result<Vec<AppendResponse>>> {
        if self.finished {
            return None;
        }

        if self.total == 0 {
            self.finished = true;
            self.dispatcher
                .diagnostics
                .log(Level::WARN, &["ReachClient.append: No input data was given.".to_string()]);
            return Some(Ok(Vec::new()));
        }

        if self.index == 0 {
            self.wait_for_previous_batch().await;
        }

        let Some(chunk) = self.chunks.pop_front() else {
            self.finished = true;
            return None;
        };
        self.index += 1;
        let is_last = self.chunks.is_empty();
        let diagnostics = self.dispatcher.diagnostics;

        diagnostics.verbose_log(&[format!("Processing chunk {} of {}...", self.index, self.total)]);
        let started = self.dispatcher.clock.mark();

        let result = self
            .dispatcher
            .process_chunk(&self.tool, &self.output_types, chunk, !is_last)
            .await;

        match result {
            Ok(responses) => {
                diagnostics.verbose_log(&[format!(
                    "Chunk {} of {} processed in {}ms",
                    self.index,
                    self.total,
                    started.elapsed().as_millis()
                )]);
                self.finished = is_last;
                Some(Ok(responses))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    async fn wait_for_previous_batch(&self) {
        let wait = self.dispatcher.clock.remaining(self.dispatcher.pacing_interval);
        if wait.is_zero() {
            return;
        }
        self.dispatcher.diagnostics.verbose_log(&[format!(
            "Waiting {}ms for rate limit window before starting batch...",
            wait.as_millis()
        )]);
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fresh_clock_never_waits() {
        let clock = PacingClock::new();
        assert_eq!(clock.remaining(Duration::from_millis(1100)), Duration::ZERO);
        assert!(clock.last_chunk_start().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_shrinks_with_elapsed_time() {
        let clock = PacingClock::new();
        clock.mark();
        let interval = Duration::from_millis(1100);
        assert_eq!(clock.remaining(interval), interval);

        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(clock.remaining(interval), Duration::from_millis(700));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(clock.remaining(interval), Duration::ZERO);
    }
}

//! # Line Framer
//!
//! Turns a body delivered in arbitrary chunks into complete `\n`-terminated
//! lines. A partial line is carried over between chunks; the final
//! unterminated remainder, if any, is yielded once the source ends.
//!
//! Each byte is scanned for a delimiter at most once: when a search comes up
//! empty the cursor is parked at the end of the buffer, so the next chunk
//! resumes from there instead of rescanning the carried-over tail.

use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt};

/// Carry-over state for one stream consumption.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
    cursor: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an incoming chunk. Empty chunks are no-ops.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// The next complete line, including its `\n`.
    pub fn next_line(&mut self) -> Option<Bytes> {
        match self.buffer[self.cursor..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let end = self.cursor + offset + 1;
                self.cursor = 0;
                Some(self.buffer.split_to(end).freeze())
            }
            None => {
                self.cursor = self.buffer.len();
                None
            }
        }
    }

    /// Take the unterminated remainder once the source is exhausted.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.cursor = 0;
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.split().freeze())
        }
    }

    /// Bytes held back waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

enum Phase {
    Reading,
    Drained,
    Done,
}

/// Lift `LineFramer` over a chunk stream.
///
/// Source errors are forwarded once and end the line stream; the carried
/// remainder is discarded in that case.
pub fn frame_lines<S, B, E>(source: S) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    stream::unfold(
        (source, LineFramer::new(), Phase::Reading),
        |(mut source, mut framer, mut phase)| async move {
            loop {
                match phase {
                    Phase::Done => return None,
                    Phase::Drained => {
                        return framer.finish().map(|rest| (Ok(rest), (source, framer, Phase::Done)));
                    }
                    Phase::Reading => {
                        if let Some(line) = framer.next_line() {
                            return Some((Ok(line), (source, framer, phase)));
                        }
                        match source.next().await {
                            Some(Ok(chunk)) => framer.push(chunk.as_ref()),
                            Some(Err(e)) => return Some((Err(e), (source, framer, Phase::Done))),
                            None => phase = Phase::Drained,
                        }
                    }
                }
            }
        },
    )
}

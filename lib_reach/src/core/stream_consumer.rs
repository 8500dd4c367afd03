//! # Stream Consumer
//!
//! Opens a listgen call and turns its newline-delimited JSON body into a
//! lazy stream of records.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tracing::Level;

use crate::error::{ReachError, Result};
use crate::loggers::Diagnostics;
use crate::reach::model::{InputRecord, ListgenResponse};
use crate::retrieve::{frame_lines, timed_call, ByteStream, RequestDescriptor, Transport};

/// Send a listgen request and wait for its response head.
///
/// `stream_timeout` bounds only the wait for status and headers; reading
/// the body afterwards is not timed. A non-2xx body is discarded unread.
pub async fn open_listgen<T: Transport>(
    transport: &T,
    request: RequestDescriptor,
    stream_timeout: Option<Duration>,
    inputs: InputRecord,
    diagnostics: &Diagnostics,
) -> Result<ListgenResponse> {
    let reply = timed_call(stream_timeout, transport.open_stream(request)).await?;

    if !reply.is_success() {
        diagnostics.log(Level::WARN, &[format!("Listgen request failed ({}).", reply.status)]);
        return Ok(ListgenResponse::new(false, reply.status, reply.headers, inputs, None));
    }

    Ok(ListgenResponse::new(true, reply.status, reply.headers, inputs, Some(reply.body)))
}

/// Decode every non-blank line of `body` as one `T`.
///
/// A line that fails to decode is yielded as `ReachError::MalformedLine`
/// and ends the stream, as does a transport error on the body.
pub fn decode_records<T>(body: Option<ByteStream>) -> BoxStream<'static, Result<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let Some(body) = body else {
        return stream::empty().boxed();
    };

    let lines = Box::pin(frame_lines(body));
    stream::unfold(Some(lines), |lines| async move {
        let mut lines = lines?;
        loop {
            match lines.next().await? {
                Ok(line) if is_blank(&line) => continue,
                Ok(line) => {
                    return match serde_json::from_slice::<T>(&line) {
                        Ok(record) => Some((Ok(record), Some(lines))),
                        Err(source) => Some((Err(malformed(&line, source)), None)),
                    };
                }
                Err(e) => return Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

fn is_blank(line: &Bytes) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

fn malformed(line: &[u8], source: serde_json::Error) -> ReachError {
    ReachError::MalformedLine {
        line: String::from_utf8_lossy(line).trim_end().to_string(),
        source,
    }
}

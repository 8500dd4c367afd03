//! Scripted transport shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use lib_reach::retrieve::{HttpReply, RequestDescriptor, StreamingReply, Transport};
use lib_reach::{LogSink, ReachError, ReachOptions, Result};
use reqwest::header::HeaderMap;
use tokio::time::Instant;

/// What the transport does for one `fetch`.
pub enum Reply {
    Status(u16, String),
    Delayed(Duration, u16, String),
    Fail(&'static str),
    Hang,
}

/// One scripted listgen response.
pub struct StreamScript {
    pub status: u16,
    pub chunks: Vec<&'static str>,
    pub head_delay: Duration,
}

impl StreamScript {
    pub fn ok(chunks: Vec<&'static str>) -> Self {
        Self {
            status: 200,
            chunks,
            head_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Call {
    pub at: Instant,
    pub request: RequestDescriptor,
}

impl Call {
    pub fn query(&self, key: &str) -> Vec<String> {
        self.request
            .url
            .query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }
}

type Handler = dyn Fn(&RequestDescriptor, usize) -> Reply + Send + Sync;

pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
    streams: Mutex<VecDeque<StreamScript>>,
}

impl MockTransport {
    /// `handler` gets the request and the number of calls made before it.
    pub fn new(handler: impl Fn(&RequestDescriptor, usize) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            streams: Mutex::new(VecDeque::new()),
        }
    }

    /// Answers every append with 200 and a one-match body echoing the email.
    pub fn ok() -> Self {
        Self::new(|req, _| Reply::Status(200, echo_body(req)))
    }

    pub fn with_stream(self, script: StreamScript) -> Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, request: &RequestDescriptor) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            at: Instant::now(),
            request: request.clone(),
        });
        calls.len() - 1
    }
}

impl Transport for MockTransport {
    async fn fetch(&self, request: RequestDescriptor) -> Result<HttpReply> {
        let index = self.record(&request);
        match (self.handler)(&request, index) {
            Reply::Status(status, body) => Ok(reply(status, body)),
            Reply::Delayed(delay, status, body) => {
                tokio::time::sleep(delay).await;
                Ok(reply(status, body))
            }
            Reply::Fail(message) => Err(ReachError::Transport(message.to_string())),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn open_stream(&self, request: RequestDescriptor) -> Result<StreamingReply> {
        self.record(&request);
        let script = self.streams.lock().unwrap().pop_front();
        let Some(script) = script else {
            return Err(ReachError::Transport("no stream scripted".into()));
        };
        tokio::time::sleep(script.head_delay).await;

        let chunks: Vec<Result<Bytes>> = script
            .chunks
            .into_iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Ok(StreamingReply {
            status: script.status,
            headers: HeaderMap::new(),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

fn reply(status: u16, body: String) -> HttpReply {
    HttpReply {
        status,
        headers: HeaderMap::new(),
        body,
    }
}

/// The `email` query value of a request, or an empty string.
pub fn email(req: &RequestDescriptor) -> String {
    req.url
        .query_pairs()
        .find(|(k, _)| k == "email")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

pub fn echo_body(req: &RequestDescriptor) -> String {
    serde_json::json!({
        "versium": {
            "num_matches": 1,
            "num_results": 1,
            "input_query": { "email": email(req) },
            "results": [{ "first": "John" }]
        }
    })
    .to_string()
}

pub fn options() -> ReachOptions {
    ReachOptions::new("test-key")
}

/// A logging function that records each message joined with spaces.
pub fn capture_logs() -> (LogSink, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: LogSink = Arc::new(move |parts: &[String]| {
        sink_seen.lock().unwrap().push(parts.join(" "));
    });
    (sink, seen)
}

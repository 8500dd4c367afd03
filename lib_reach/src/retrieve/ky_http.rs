//! # HTTP Transport
//!
//! The seam between the orchestration engine and the network. The engine
//! only ever sees `RequestDescriptor` in and `HttpReply`/`StreamingReply`
//! out, so tests can script responses without a server. `ReqwestTransport`
//! is the production implementation.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use url::Url;

use crate::error::Result;

/// A boxed stream of response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// # Request Descriptor
///
/// One fully-qualified GET request. Built fresh for every attempt because
/// the final attempt may carry a different query.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub headers: HeaderMap,
}

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A response whose body has not been read yet.
pub struct StreamingReply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl StreamingReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// # Transport
///
/// Performs single HTTP GETs. Implementations must not retry or time out
/// on their own behalf; both policies live in the engine.
pub trait Transport: Send + Sync {
    /// Send the request and read the whole body as text.
    fn fetch(&self, request: RequestDescriptor) -> impl Future<Output = Result<HttpReply>> + Send;

    /// Send the request and hand back the body unread.
    fn open_stream(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<StreamingReply>> + Send;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with this crate's user agent.
    pub fn new() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(concat!("lib_reach/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { inner })
    }

    /// Wrap an already configured client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl Transport for ReqwestTransport {
    async fn fetch(&self, request: RequestDescriptor) -> Result<HttpReply> {
        let response = self
            .inner
            .get(request.url)
            .headers(request.headers)
            .send()
            .await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(HttpReply { status, headers, body })
    }

    async fn open_stream(&self, request: RequestDescriptor) -> Result<StreamingReply> {
        let response = self
            .inner
            .get(request.url)
            .headers(request.headers)
            .send()
            .await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map(|chunk| chunk.map_err(Into::into));

        Ok(StreamingReply {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}

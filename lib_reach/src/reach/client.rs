//! # REACH Client
//!
//! The public entry point. A `ReachClient` owns its options, its transport
//! and the pacing clock shared by every append batch it runs.
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use lib_reach::{input_record, ReachClient, ReachOptions};
//!
//! # async fn demo() -> lib_reach::Result<()> {
//! let client = ReachClient::new(ReachOptions::new("my-api-key"))?;
//! let inputs = vec![input_record([("email", "doejohn@hotmail.com")])];
//! let outputs = vec!["address".to_string()];
//!
//! let mut batches = std::pin::pin!(client.append("contact", inputs, &outputs));
//! while let Some(chunk) = batches.next().await {
//!     for response in chunk? {
//!         println!("{} {}", response.http_status, response.match_found);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Concurrent `append` calls on one client share the pacing clock but are
//! not coordinated with each other; run batches one at a time to keep the
//! per-second ceiling.

use futures_util::{Stream, TryStreamExt};

use crate::configs::ReachOptions;
use crate::core::{open_listgen, ChunkDispatcher, PacingClock, RetryDriver, RetryPolicy};
use crate::error::Result;
use crate::loggers::Diagnostics;
use crate::reach::apicall::ApiCall;
use crate::reach::model::{AppendResponse, InputRecord, ListgenResponse};
use crate::retrieve::{ReqwestTransport, Transport};

/// # Reach Client
pub struct ReachClient<T: Transport = ReqwestTransport> {
    options: ReachOptions,
    diagnostics: Diagnostics,
    transport: T,
    api: ApiCall,
    policy: RetryPolicy,
    clock: PacingClock,
}

impl ReachClient<ReqwestTransport> {
    /// Validate `options` and build a client on the default `reqwest` transport.
    pub fn new(options: ReachOptions) -> Result<Self> {
        Self::with_transport(options, ReqwestTransport::new()?)
    }

    /// Build a client from `REACH_*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self> {
        Self::new(ReachOptions::from_env()?)
    }
}

impl<T: Transport> ReachClient<T> {
    /// Build a client on a caller-supplied transport.
    pub fn with_transport(options: ReachOptions, transport: T) -> Result<Self> {
        options.validate()?;
        let api = ApiCall::new(&options)?;
        let diagnostics = Diagnostics::new(options.logging_function.clone(), options.verbose);
        let policy = RetryPolicy::from_options(&options);

        Ok(Self {
            options,
            diagnostics,
            transport,
            api,
            policy,
            clock: PacingClock::new(),
        })
    }

    pub fn options(&self) -> &ReachOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Enrich `inputs` through the `tool` append endpoint.
    ///
    /// Yields one item per chunk of `requests_per_second` records, in input
    /// order. Every record gets a response, failed or not; only an HTTP 401
    /// comes through as an `Err`, after which the stream ends. Nothing is
    /// sent until the stream is polled.
    pub fn append<'a>(
        &'a self,
        tool: &str,
        inputs: Vec<InputRecord>,
        output_types: &[String],
    ) -> impl Stream<Item = Result<Vec<AppendResponse>>> + 'a {
        let dispatcher = ChunkDispatcher {
            driver: RetryDriver {
                transport: &self.transport,
                api: &self.api,
                policy: &self.policy,
                diagnostics: &self.diagnostics,
            },
            clock: &self.clock,
            diagnostics: &self.diagnostics,
            chunk_size: self.options.requests_per_second,
            pacing_interval: self.options.pacing_interval(),
        };
        dispatcher.run(tool.to_string(), inputs, output_types.to_vec())
    }

    /// Run a whole append batch and flatten the chunks.
    pub async fn append_all(
        &self,
        tool: &str,
        inputs: Vec<InputRecord>,
        output_types: &[String],
    ) -> Result<Vec<AppendResponse>> {
        let chunks: Vec<Vec<AppendResponse>> = self.append(tool, inputs, output_types).try_collect().await?;
        Ok(chunks.into_iter().flatten().collect())
    }

    /// Open a listgen stream for `inputs`.
    ///
    /// Resolves once the response head arrives, within `stream_timeout`.
    /// Records are read lazily through `ListgenResponse::records`.
    pub async fn listgen(
        &self,
        tool: &str,
        inputs: InputRecord,
        output_types: &[String],
    ) -> Result<ListgenResponse> {
        let request = self.api.listgen_request(tool, &inputs, output_types);
        open_listgen(
            &self.transport,
            request,
            self.options.stream_timeout,
            inputs,
            &self.diagnostics,
        )
        .await
    }
}

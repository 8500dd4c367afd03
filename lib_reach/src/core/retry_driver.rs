//! # Retry Driver
//!
//! Runs one input record to a settled `AppendResponse`, or aborts with a
//! fatal error. Each record moves through a small state machine:
//!
//! ```text
//! Attempting(n) --2xx------------------------------> Done(success)
//! Attempting(n) --retryable, n < max-1--(wait)-----> Attempting(n+1)
//! Attempting(n) --retryable, n == max-1------------> Done(terminal failure)
//! Attempting(n) --401------------------------------> Aborted(Unauthorized)
//! ```
//!
//! Retryable failures are non-2xx statuses, local timeouts and any other
//! transport error. A 401 is never retried: it is a property of the API
//! key, not of the record, so it aborts the whole batch.

use std::time::Duration;

use tracing::Level;

use crate::configs::ReachOptions;
use crate::error::{ReachError, Result};
use crate::loggers::Diagnostics;
use crate::reach::apicall::ApiCall;
use crate::reach::model::{AppendResponse, InputRecord};
use crate::retrieve::{timed_call, HttpReply, Transport};

/// Attempt budget and timing for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub wait_time: Duration,
    pub timeout: Option<Duration>,
    /// `rcfg_max_time` seconds sent with the final attempt.
    pub max_time_hint: Option<f64>,
}

impl RetryPolicy {
    pub fn from_options(options: &ReachOptions) -> Self {
        Self {
            max_retries: options.max_retries.max(1),
            wait_time: options.wait_time,
            timeout: options.timeout,
            max_time_hint: options.max_time_hint(),
        }
    }
}

/// Why an attempt did not succeed.
#[derive(Debug)]
pub enum FailureReason {
    /// A response arrived with a non-2xx, non-401 status.
    Status(HttpReply),
    Timeout(ReachError),
    Transport(ReachError),
}

impl FailureReason {
    /// The settled record when this was the last allowed attempt.
    fn into_response(self, inputs: InputRecord) -> AppendResponse {
        match self {
            FailureReason::Status(reply) => AppendResponse::from_reply(reply, inputs),
            FailureReason::Timeout(e) | FailureReason::Transport(e) => AppendResponse::from_failure(&e, inputs),
        }
    }
}

#[derive(Debug)]
pub enum AttemptOutcome {
    Success(HttpReply),
    Retryable(FailureReason),
    Fatal(ReachError),
}

/// Classify the result of one timed call.
pub fn classify(result: Result<HttpReply>) -> AttemptOutcome {
    match result {
        Ok(reply) if reply.status == 401 => AttemptOutcome::Fatal(ReachError::Unauthorized),
        Ok(reply) if reply.is_success() => AttemptOutcome::Success(reply),
        Ok(reply) => AttemptOutcome::Retryable(FailureReason::Status(reply)),
        Err(e) if e.is_fatal() => AttemptOutcome::Fatal(e),
        Err(e @ ReachError::Timeout(_)) => AttemptOutcome::Retryable(FailureReason::Timeout(e)),
        Err(e) => AttemptOutcome::Retryable(FailureReason::Transport(e)),
    }
}

enum DriverState {
    Attempting(u32),
    Done(AppendResponse),
    Aborted(ReachError),
}

/// # Retry Driver
///
/// Borrowed view over a client's transport, request builder, policy and
/// diagnostics; one instance serves every record of a batch.
pub struct RetryDriver<'a, T> {
    pub transport: &'a T,
    pub api: &'a ApiCall,
    pub policy: &'a RetryPolicy,
    pub diagnostics: &'a Diagnostics,
}

impl<T> Clone for RetryDriver<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RetryDriver<'_, T> {}

impl<'a, T: Transport> RetryDriver<'a, T> {
    /// Drive `inputs` to a settled response. Only a fatal failure is an `Err`.
    pub async fn run(self, tool: &str, output_types: &[String], inputs: InputRecord) -> Result<AppendResponse> {
        let mut state = DriverState::Attempting(0);
        loop {
            state = match state {
                DriverState::Attempting(n) => self.attempt(n, tool, output_types, &inputs).await,
                DriverState::Done(response) => return Ok(response),
                DriverState::Aborted(e) => return Err(e),
            };
        }
    }

    async fn attempt(&self, n: u32, tool: &str, output_types: &[String], inputs: &InputRecord) -> DriverState {
        let last_try = n + 1 >= self.policy.max_retries;
        let hint = if last_try { self.policy.max_time_hint } else { None };
        let request = self.api.append_request(tool, inputs, output_types, hint);

        let outcome = classify(timed_call(self.policy.timeout, self.transport.fetch(request)).await);

        let reason = match outcome {
            AttemptOutcome::Success(reply) => {
                return DriverState::Done(AppendResponse::from_reply(reply, inputs.clone()));
            }
            AttemptOutcome::Fatal(e) => {
                self.diagnostics.log(Level::ERROR, &[e.to_string()]);
                return DriverState::Aborted(e);
            }
            AttemptOutcome::Retryable(reason) => reason,
        };

        self.report(&reason, last_try);
        if last_try {
            return DriverState::Done(reason.into_response(inputs.clone()));
        }

        tokio::time::sleep(self.policy.wait_time).await;
        DriverState::Attempting(n + 1)
    }

    fn report(&self, reason: &FailureReason, last_try: bool) {
        let wait_ms = self.policy.wait_time.as_millis();
        let parts = match (reason, last_try) {
            (FailureReason::Status(reply), true) => {
                vec![format!("Request failed ({}), no retries remaining.", reply.status)]
            }
            (FailureReason::Status(reply), false) => {
                vec![format!("Request failed ({}), retrying after {wait_ms}ms...", reply.status)]
            }
            (FailureReason::Timeout(_), true) => vec!["Request timed out, no retries remaining.".to_string()],
            (FailureReason::Timeout(_), false) => {
                vec![format!("Request timed out, retrying after {wait_ms}ms...")]
            }
            (FailureReason::Transport(e), true) => {
                vec!["Request error:".to_string(), e.to_string(), "No retries remaining.".to_string()]
            }
            (FailureReason::Transport(e), false) => vec![
                "Request error:".to_string(),
                e.to_string(),
                format!("Retrying in {wait_ms}ms..."),
            ],
        };
        self.diagnostics.log(Level::WARN, &parts);
    }
}

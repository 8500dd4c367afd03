//! # Client Configuration
//!
//! `ReachOptions` carries every tunable of the client: credentials, pacing,
//! timeouts and retry policy. Values come either from the builder-style
//! setters or from the process environment (optionally seeded by a `.env`
//! file through `dotenvy`).

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::loggers::sink::LogSink;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.versium.com";

/// Slack subtracted from the local timeout when asking the API to answer in time.
const MAX_TIME_SLACK_MS: f64 = 200.0;
/// Floor for the `rcfg_max_time` hint, in seconds.
const MAX_TIME_FLOOR_SECS: f64 = 0.1;

/// # REACH Client Options
///
/// `None` for `timeout` or `stream_timeout` means the call is unbounded.
#[derive(Clone)]
pub struct ReachOptions {
    /// Sent as `x-versium-api-key` on every request.
    pub api_key: String,
    /// Chunk size of an append batch, and the ceiling on requests started per second.
    pub requests_per_second: usize,
    /// Wall-clock limit for one append attempt.
    pub timeout: Option<Duration>,
    /// Wall-clock limit for opening a listgen stream.
    pub stream_timeout: Option<Duration>,
    /// Total attempts per record, including the first.
    pub max_retries: u32,
    /// Fixed delay between attempts of the same record.
    pub wait_time: Duration,
    /// Added to the one second pacing window between chunk starts.
    pub rate_limit_pad: Duration,
    pub api_version: u32,
    pub base_url: String,
    /// Routes chunk progress and pre-batch waits to the logging function.
    pub verbose: bool,
    /// Optional receiver for diagnostic messages.
    pub logging_function: Option<LogSink>,
}

impl fmt::Debug for ReachOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReachOptions")
            .field("api_key", &"***")
            .field("requests_per_second", &self.requests_per_second)
            .field("timeout", &self.timeout)
            .field("stream_timeout", &self.stream_timeout)
            .field("max_retries", &self.max_retries)
            .field("wait_time", &self.wait_time)
            .field("rate_limit_pad", &self.rate_limit_pad)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("verbose", &self.verbose)
            .field("logging_function", &self.logging_function.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for ReachOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            requests_per_second: 20,
            timeout: Some(Duration::from_secs(10)),
            stream_timeout: Some(Duration::from_secs(300)),
            max_retries: 3,
            wait_time: Duration::from_millis(2000),
            rate_limit_pad: Duration::from_millis(100),
            api_version: 2,
            base_url: DEFAULT_BASE_URL.to_string(),
            verbose: false,
            logging_function: None,
        }
    }
}

impl ReachOptions {
    /// Default options for the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn requests_per_second(mut self, requests_per_second: usize) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn stream_timeout(mut self, stream_timeout: Option<Duration>) -> Self {
        self.stream_timeout = stream_timeout;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    #[must_use]
    pub fn rate_limit_pad(mut self, rate_limit_pad: Duration) -> Self {
        self.rate_limit_pad = rate_limit_pad;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the function that receives diagnostic message parts.
    ///
    /// ```
    /// use lib_reach::configs::ReachOptions;
    /// use std::sync::Arc;
    ///
    /// let options = ReachOptions::new("key")
    ///     .with_logging_function(Arc::new(|parts: &[String]| {
    ///         eprintln!("CLIENT LOG: {}", parts.join(" "));
    ///     }));
    /// assert!(options.logging_function.is_some());
    /// ```
    #[must_use]
    pub fn with_logging_function(mut self, sink: LogSink) -> Self {
        self.logging_function = Some(sink);
        self
    }

    /// Reject option sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.requests_per_second == 0 {
            return Err(ConfigError::ZeroRequestsPerSecond);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroMaxRetries);
        }
        Ok(())
    }

    /// Minimum spacing between two chunk starts.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(1000) + self.rate_limit_pad
    }

    /// The `rcfg_max_time` value, in seconds, asking the API to answer before
    /// the local timeout fires. `None` when append calls are unbounded.
    pub fn max_time_hint(&self) -> Option<f64> {
        self.timeout.map(|t| {
            let ms = t.as_secs_f64() * 1000.0;
            ((ms - MAX_TIME_SLACK_MS) / 1000.0).max(MAX_TIME_FLOOR_SECS)
        })
    }

    /// # Load From Environment
    ///
    /// Loads `.env` (if present) and then reads the `REACH_*` variables.
    /// Unset variables keep their defaults; `REACH_API_KEY` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build options from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::new(lookup("REACH_API_KEY").unwrap_or_default());

        if let Some(v) = lookup("REACH_QPS") {
            options.requests_per_second = parse_var("REACH_QPS", &v)?;
        }
        if let Some(v) = lookup("REACH_TIMEOUT_MS") {
            options.timeout = parse_limit("REACH_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("REACH_STREAM_TIMEOUT_MS") {
            options.stream_timeout = parse_limit("REACH_STREAM_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("REACH_MAX_RETRIES") {
            options.max_retries = parse_var("REACH_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("REACH_WAIT_MS") {
            options.wait_time = Duration::from_millis(parse_var("REACH_WAIT_MS", &v)?);
        }
        if let Some(v) = lookup("REACH_RATE_PAD_MS") {
            options.rate_limit_pad = Duration::from_millis(parse_var("REACH_RATE_PAD_MS", &v)?);
        }
        if let Some(v) = lookup("REACH_BASE_URL") {
            options.base_url = v;
        }
        if let Some(v) = lookup("REACH_VERBOSE") {
            options.verbose = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        options.validate()?;
        Ok(options)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// `0`, `inf`, `infinity` and `none` mean unbounded.
fn parse_limit(name: &str, value: &str) -> Result<Option<Duration>, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "0" | "inf" | "infinity" | "none" => Ok(None),
        _ => parse_var::<u64>(name, value).map(|ms| Some(Duration::from_millis(ms))),
    }
}

//! # REACH Data Model
//!
//! Inputs submitted to the API and the per-record outcomes handed back.

use std::collections::BTreeMap;
use std::fmt;

use futures_util::stream::BoxStream;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::stream_consumer;
use crate::error::{ReachError, Result};
use crate::retrieve::{ByteStream, HttpReply};

/// # Input Value
///
/// A scalar query value, or a list (sent as repeated `key[]` pairs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Text(String),
    Number(serde_json::Number),
    List(Vec<String>),
}

impl InputValue {
    /// The query-string representations of this value.
    pub fn query_values(&self) -> Vec<String> {
        match self {
            InputValue::Text(s) => vec![s.clone()],
            InputValue::Number(n) => vec![n.to_string()],
            InputValue::List(items) => items.clone(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, InputValue::List(_))
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query_values().join(","))
    }
}

impl From<&str> for InputValue {
    fn from(v: &str) -> Self {
        InputValue::Text(v.to_string())
    }
}

impl From<String> for InputValue {
    fn from(v: String) -> Self {
        InputValue::Text(v)
    }
}

impl From<i64> for InputValue {
    fn from(v: i64) -> Self {
        InputValue::Number(v.into())
    }
}

impl From<f64> for InputValue {
    fn from(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(InputValue::Number)
            .unwrap_or_else(|| InputValue::Text(v.to_string()))
    }
}

impl From<Vec<String>> for InputValue {
    fn from(v: Vec<String>) -> Self {
        InputValue::List(v)
    }
}

/// One entity to enrich: field name to value.
pub type InputRecord = BTreeMap<String, InputValue>;

/// Build an `InputRecord` from `(field, value)` pairs.
///
/// ```
/// use lib_reach::reach::model::{input_record, InputValue};
///
/// let record = input_record([("first", "John"), ("email", "jdoe@example.com")]);
/// assert_eq!(record["first"], InputValue::from("John"));
/// ```
pub fn input_record<K, V, I>(pairs: I) -> InputRecord
where
    K: Into<String>,
    V: Into<InputValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// # Append Response
///
/// The settled outcome for one input record. Produced for every input,
/// successful or not, so a batch's results line up with its inputs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub success: bool,
    /// `0` when no response was ever received.
    pub http_status: u16,
    #[serde(skip)]
    pub headers: HeaderMap,
    /// Best-effort JSON parse of `body_raw`; `None` when it did not parse.
    pub body: Option<Value>,
    pub body_raw: String,
    pub match_found: bool,
    pub inputs: InputRecord,
    /// The transport failure that exhausted the retries, if that is how it ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_error: Option<String>,
}

impl AppendResponse {
    /// Settle a record from the last response received for it.
    pub fn from_reply(reply: HttpReply, inputs: InputRecord) -> Self {
        let body: Option<Value> = serde_json::from_str(&reply.body).ok();
        let match_found = body
            .as_ref()
            .and_then(|b| b.pointer("/versium/num_matches"))
            .and_then(Value::as_f64)
            .is_some_and(|n| n != 0.0);

        Self {
            success: reply.is_success(),
            http_status: reply.status,
            headers: reply.headers,
            body,
            body_raw: reply.body,
            match_found,
            inputs,
            request_error: None,
        }
    }

    /// Settle a record that never got a response.
    pub fn from_failure(error: &ReachError, inputs: InputRecord) -> Self {
        Self {
            success: false,
            http_status: 0,
            headers: HeaderMap::new(),
            body: None,
            body_raw: String::new(),
            match_found: false,
            inputs,
            request_error: Some(error.to_string()),
        }
    }

    /// The typed `versium` envelope, if the body has one.
    pub fn envelope(&self) -> Option<AppendEnvelope> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_value(b.clone()).ok())
    }
}

/// Top-level shape of an append response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendEnvelope {
    pub versium: VersiumResult,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersiumResult {
    pub version: String,
    pub match_counts: Vec<u64>,
    pub num_matches: u64,
    pub num_results: u64,
    pub query_id: String,
    pub query_time: f64,
    pub results: Vec<BTreeMap<String, Value>>,
    pub input_query: BTreeMap<String, Value>,
}

/// One streamed listgen record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListgenRecord {
    #[serde(default)]
    pub contact_fields: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// # Listgen Response
///
/// Status and headers of a listgen call, plus its not-yet-read body.
pub struct ListgenResponse {
    pub success: bool,
    pub http_status: u16,
    pub headers: HeaderMap,
    pub inputs: InputRecord,
    body: Option<ByteStream>,
}

impl fmt::Debug for ListgenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListgenResponse")
            .field("success", &self.success)
            .field("http_status", &self.http_status)
            .field("headers", &self.headers)
            .field("inputs", &self.inputs)
            .field("body", &self.body.as_ref().map(|_| "{ stream }"))
            .finish()
    }
}

impl ListgenResponse {
    pub(crate) fn new(
        success: bool,
        http_status: u16,
        headers: HeaderMap,
        inputs: InputRecord,
        body: Option<ByteStream>,
    ) -> Self {
        Self {
            success,
            http_status,
            headers,
            inputs,
            body,
        }
    }

    /// Consume the response into its record stream.
    ///
    /// The stream is single-pass. It is empty when the call did not succeed.
    /// A line that is not valid JSON for `T` yields `ReachError::MalformedLine`
    /// and ends the stream.
    pub fn records<T>(self) -> BoxStream<'static, Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        stream_consumer::decode_records(self.body)
    }
}

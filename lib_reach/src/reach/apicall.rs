//! # REACH Request Construction
//!
//! Turns an endpoint name, one input record and the requested output types
//! into a `RequestDescriptor`. Nothing here is cached across attempts: the
//! retry driver asks for a fresh descriptor every time.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use url::Url;

use crate::configs::ReachOptions;
use crate::error::{ConfigError, ReachError, Result};
use crate::reach::model::InputRecord;
use crate::retrieve::RequestDescriptor;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-versium-api-key");
const MAX_TIME_PARAM: &str = "rcfg_max_time";
const OUTPUT_PARAM: &str = "output[]";

/// # API Call Builder
///
/// Holds the versioned base URL and the authentication header for one client.
#[derive(Debug, Clone)]
pub struct ApiCall {
    versioned_base: Url,
    api_key: HeaderValue,
}

impl ApiCall {
    pub fn new(options: &ReachOptions) -> Result<Self> {
        let mut versioned_base = Url::parse(&options.base_url)?;
        versioned_base
            .path_segments_mut()
            .map_err(|_| ReachError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(&format!("v{}", options.api_version));

        let mut api_key = HeaderValue::from_str(&options.api_key).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        Ok(Self { versioned_base, api_key })
    }

    /// Descriptor for one append attempt. `max_time` adds the
    /// `rcfg_max_time` hint, in seconds.
    pub fn append_request(
        &self,
        tool: &str,
        inputs: &InputRecord,
        output_types: &[String],
        max_time: Option<f64>,
    ) -> RequestDescriptor {
        let url = self.endpoint_url(tool, inputs, output_types, max_time);
        let mut headers = self.base_headers();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        RequestDescriptor { url, headers }
    }

    /// Descriptor for a listgen call.
    pub fn listgen_request(&self, tool: &str, inputs: &InputRecord, output_types: &[String]) -> RequestDescriptor {
        RequestDescriptor {
            url: self.endpoint_url(tool, inputs, output_types, None),
            headers: self.base_headers(),
        }
    }

    fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers
    }

    fn endpoint_url(&self, tool: &str, inputs: &InputRecord, output_types: &[String], max_time: Option<f64>) -> Url {
        let mut url = self.versioned_base.clone();
        // `new` already proved the base can carry path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(tool);
        }

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in inputs {
                let key = if value.is_list() { format!("{key}[]") } else { key.clone() };
                for v in value.query_values() {
                    query.append_pair(&key, &v);
                }
            }
            if let Some(seconds) = max_time {
                query.append_pair(MAX_TIME_PARAM, &seconds.to_string());
            }
            for output in output_types {
                query.append_pair(OUTPUT_PARAM, output);
            }
        }

        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reach::model::input_record;

    fn api() -> ApiCall {
        ApiCall::new(&ReachOptions::new("secret")).unwrap()
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[test]
    fn append_url_carries_inputs_outputs_and_hint() {
        let inputs = input_record([("email", "doejohn@hotmail.com")]);
        let outputs = vec!["address".to_string(), "phone".to_string()];
        let req = api().append_request("contact", &inputs, &outputs, Some(9.8));

        assert_eq!(req.url.path(), "/v2/contact");
        assert_eq!(
            pairs(&req.url),
            vec![
                ("email".into(), "doejohn@hotmail.com".into()),
                ("rcfg_max_time".into(), "9.8".into()),
                ("output[]".into(), "address".into()),
                ("output[]".into(), "phone".into()),
            ]
        );
        assert_eq!(req.headers["x-versium-api-key"], "secret");
        assert_eq!(req.headers[ACCEPT], "application/json");
    }

    #[test]
    fn list_values_become_repeated_bracket_keys() {
        let mut inputs = InputRecord::new();
        inputs.insert("domain".into(), vec!["versium.com".to_string(), "example.com".to_string()].into());
        let req = api().listgen_request("abm", &inputs, &["abm_email".to_string()]);

        assert_eq!(req.url.path(), "/v2/abm");
        assert_eq!(
            pairs(&req.url),
            vec![
                ("domain[]".into(), "versium.com".into()),
                ("domain[]".into(), "example.com".into()),
                ("output[]".into(), "abm_email".into()),
            ]
        );
        assert!(req.headers.get(ACCEPT).is_none());
    }

    #[test]
    fn tool_names_are_path_encoded() {
        let req = api().append_request("odd tool/x", &InputRecord::new(), &[], None);
        assert_eq!(req.url.path(), "/v2/odd%20tool%2Fx");
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn custom_base_and_version() {
        let options = ReachOptions::new("k").base_url("http://127.0.0.1:8080/").api_version(3);
        let req = ApiCall::new(&options).unwrap().append_request("c2b", &InputRecord::new(), &[], None);
        assert_eq!(req.url.as_str(), "http://127.0.0.1:8080/v3/c2b");
    }

    #[test]
    fn rejects_bad_base_and_key() {
        assert!(matches!(
            ApiCall::new(&ReachOptions::new("k").base_url("not a url")),
            Err(ReachError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiCall::new(&ReachOptions::new("bad\nkey")),
            Err(ReachError::Config(ConfigError::InvalidApiKey))
        ));
    }
}

// src/core/net.rs
//
// Blocking JSON GET against the remote API.

use std::{collections::BTreeMap, time::Duration};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::config::consts::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::{Error, Result};

/// Anything that can answer `endpoint + query` with a JSON document.
pub trait JsonSource {
    fn fetch_json(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value>;
}

pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// `headers` are sent with every request; a user-agent is added when missing.
    pub fn new(base_url: &str, headers: &BTreeMap<String, String>) -> Result<Self> {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|_| Error::Usage(format!("bad header name: {k}")))?;
            let value = HeaderValue::from_str(v)
                .map_err(|_| Error::Usage(format!("bad header value for {k}")))?;
            map.insert(name, value);
        }
        if !map.contains_key(reqwest::header::USER_AGENT) {
            map.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        }

        let client = Client::builder()
            .default_headers(map)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| Error::Fetch { endpoint: base_url.to_string(), source })?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

impl JsonSource for HttpSource {
    fn fetch_json(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.url(endpoint);
        debug!("GET {url} {params:?}");
        let fetch_err = |source: reqwest::Error| Error::Fetch { endpoint: endpoint.to_string(), source };

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?;
        resp.json::<Value>().map_err(fetch_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let src = HttpSource::new("https://api.hh.ru/", &BTreeMap::new()).unwrap();
        assert_eq!(src.url("/areas"), "https://api.hh.ru/areas");
        assert_eq!(src.url("vacancies"), "https://api.hh.ru/vacancies");
    }

    #[test]
    fn rejects_bad_header_names() {
        let mut h = BTreeMap::new();
        h.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(HttpSource::new("https://api.hh.ru", &h), Err(Error::Usage(_))));
    }
}

//! `RequestExecutor` backed by `reqwest`.
//!
//! One POST per attempt: the credential goes in `Authorization: Bearer`, the
//! batch payload is the body. Only a 2xx status counts as success.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use volley_core::{AttemptError, RequestExecutor};

use crate::error::HttpError;

/// Configuration for `HttpRequestExecutor`.
#[derive(Debug, Clone)]
pub struct HttpExecutorConfig {
    /// Timeout for each individual call.
    pub request_timeout: Duration,
    /// Static headers sent with every call.
    pub headers: BTreeMap<String, String>,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for HttpExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(8),
            headers: BTreeMap::new(),
            accept_invalid_certs: false,
        }
    }
}

/// Posts the batch payload to one upstream endpoint.
#[derive(Debug, Clone)]
pub struct HttpRequestExecutor {
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpRequestExecutor {
    /// Build an executor with its own connection pool.
    pub fn new(url: impl Into<String>, config: HttpExecutorConfig) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(header_map(&config.headers)?)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            url: url.into(),
            http,
            request_timeout: config.request_timeout,
        })
    }

    /// Executor for another endpoint sharing this one's client and pool.
    pub fn for_endpoint(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: self.http.clone(),
            request_timeout: self.request_timeout,
        }
    }

    fn classify(&self, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            AttemptError::Http(e.to_string())
        }
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |reason: String| HttpError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl RequestExecutor for HttpRequestExecutor {
    async fn execute(&self, credential: &str, payload: Bytes) -> Result<Bytes, AttemptError> {
        let resp = self
            .http
            .post(&self.url)
            .timeout(self.request_timeout)
            .bearer_auth(credential)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::Status {
                status: status.as_u16(),
            });
        }

        resp.bytes().await.map_err(|e| self.classify(e))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

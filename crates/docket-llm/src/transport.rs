//! HTTP transport seam
//!
//! Adapters build an [`HttpRequest`] and hand it to an [`HttpTransport`]. The
//! production transport is [`ReqwestTransport`]; tests substitute a scripted one
//! so that no test touches the network.

use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A JSON POST request
#[derive(Clone)]
pub struct HttpRequest {
    /// Absolute URL
    pub url: String,
    /// Extra headers, including authentication
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: Value,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpRequest {
    /// Create a request with no extra headers
    pub fn new(url: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout,
        }
    }

    /// Add a header, builder style
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of a header, matched case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry credentials, so only names are printed
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("headers", &names)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// A response with any status
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body
    pub body: String,
    /// `Retry-After` in seconds, when the server sent one
    pub retry_after: Option<u64>,
}

impl HttpResponse {
    /// Create a response without a `Retry-After` hint
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request exceeded its timeout
    #[error("request timed out")]
    Timeout,

    /// Could not connect
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other client error
    #[error("request failed: {0}")]
    Other(String),
}

/// Sends JSON POST requests
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the response, whatever its status
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a client with the crate user agent
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("docket/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().map_err(classify_reqwest_error)?;

        Ok(HttpResponse {
            status,
            body,
            retry_after,
        })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

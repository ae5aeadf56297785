//! Deterministic test doubles
//!
//! [`ScriptedTransport`] replays canned HTTP responses; [`MockEventExtractor`]
//! stands in for a whole provider. Both record their calls and share state
//! across clones.

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use docket_domain::{EventExtractor, EventRecord, FailureReason, Metadata};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport that replays scripted responses in order
///
/// # Examples
///
/// ```
/// use docket_llm::{HttpRequest, HttpTransport, ScriptedTransport};
/// use std::time::Duration;
///
/// let transport = ScriptedTransport::new().respond(429, "").respond(200, "ok");
/// let request = HttpRequest::new("https://x", serde_json::json!({}), Duration::from_secs(1));
/// assert_eq!(transport.post_json(&request).unwrap().status, 429);
/// assert_eq!(transport.post_json(&request).unwrap().body, "ok");
/// assert_eq!(transport.call_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    /// Create a transport with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with `status` and a raw body
    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.respond_with(HttpResponse::new(status, body))
    }

    /// Queue a 200 response with a JSON body
    pub fn respond_json(self, body: Value) -> Self {
        self.respond_with(HttpResponse::new(200, body.to_string()))
    }

    /// Queue a prepared response
    pub fn respond_with(self, response: HttpResponse) -> Self {
        lock(&self.script).push_back(Ok(response));
        self
    }

    /// Queue a transport failure
    pub fn fail(self, error: TransportError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Number of requests sent so far
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request sent so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl HttpTransport for ScriptedTransport {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response left".to_string())))
    }
}

/// Event extractor returning pre-configured results without network calls
#[derive(Debug, Clone)]
pub struct MockEventExtractor {
    default_result: Result<Vec<EventRecord>, FailureReason>,
    queued: Arc<Mutex<VecDeque<Result<Vec<EventRecord>, FailureReason>>>>,
    calls: Arc<Mutex<Vec<(String, Metadata)>>>,
    available: bool,
}

impl MockEventExtractor {
    /// Create a mock that returns `records` for every call
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self::with_result(Ok(records))
    }

    /// Create a mock that fails every call with `reason`
    pub fn failing(reason: FailureReason) -> Self {
        Self::with_result(Err(reason))
    }

    fn with_result(default_result: Result<Vec<EventRecord>, FailureReason>) -> Self {
        Self {
            default_result,
            queued: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            available: true,
        }
    }

    /// Queue a result for the next call, ahead of the default
    pub fn then(self, result: Result<Vec<EventRecord>, FailureReason>) -> Self {
        lock(&self.queued).push_back(result);
        self
    }

    /// Set what `is_available` reports
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Number of times `extract_events` was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Text and metadata of the most recent call
    pub fn last_call(&self) -> Option<(String, Metadata)> {
        lock(&self.calls).last().cloned()
    }
}

impl Default for MockEventExtractor {
    fn default() -> Self {
        Self::new(vec![EventRecord::new("Default mock event", "", "")])
    }
}

impl EventExtractor for MockEventExtractor {
    fn provider_key(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn extract_events(
        &self,
        text: &str,
        metadata: &Metadata,
    ) -> Result<Vec<EventRecord>, FailureReason> {
        lock(&self.calls).push((text.to_string(), metadata.clone()));
        lock(&self.queued)
            .pop_front()
            .unwrap_or_else(|| self.default_result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_scripted_transport_runs_dry() {
        let transport = ScriptedTransport::new();
        let request = HttpRequest::new("https://x", json!({}), Duration::from_secs(1));
        assert!(matches!(
            transport.post_json(&request),
            Err(TransportError::Other(_))
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_scripted_transport_clone_shares_state() {
        let a = ScriptedTransport::new().respond(200, "one");
        let b = a.clone();
        let request = HttpRequest::new("https://x", json!({"k": 1}), Duration::from_secs(1));

        assert_eq!(b.post_json(&request).unwrap().body, "one");
        assert_eq!(a.call_count(), 1);
        assert_eq!(a.last_request().unwrap().body, json!({"k": 1}));
    }

    #[test]
    fn test_mock_extractor_queue_then_default() {
        let mock = MockEventExtractor::new(vec![EventRecord::new("default", "", "")])
            .then(Err(FailureReason::NoEvents));

        assert!(mock.extract_events("a", &Metadata::new()).is_err());
        assert_eq!(
            mock.extract_events("b", &Metadata::new()).unwrap()[0].particulars,
            "default"
        );
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.last_call().unwrap().0, "b");
    }

    #[test]
    fn test_mock_extractor_availability() {
        assert!(MockEventExtractor::default().is_available());
        assert!(!MockEventExtractor::default().with_available(false).is_available());
    }
}

//! Retry with exponential backoff and HTTP status classification

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded retry policy for transient provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry (milliseconds)
    pub base_delay_ms: u64,
    /// Upper bound on any single delay (milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `max_attempts` times without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    ///
    /// Exponential: 1s, 2s, 4s with the defaults. A server `Retry-After` hint
    /// replaces the computed delay. Both are capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let computed = match retry_after {
            Some(secs) => secs.saturating_mul(1_000),
            None => self
                .base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))),
        };
        Duration::from_millis(computed.min(self.max_delay_ms))
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err("base_delay_ms cannot exceed max_delay_ms".to_string());
        }
        Ok(())
    }
}

/// Outcome of classifying one response
#[derive(Debug)]
enum Classified {
    Success(HttpResponse),
    Retry(LlmError, Option<u64>),
    Fatal(LlmError),
}

/// Map an HTTP status to an actionable error category
///
/// Returns `None` for 2xx.
pub fn classify_status(provider: &str, url: &str, response: &HttpResponse) -> Option<LlmError> {
    let status = response.status;
    match status {
        200..=299 => None,
        401 | 403 => Some(LlmError::Authentication {
            provider: provider.to_string(),
            status,
        }),
        404 => Some(LlmError::NotFound(url.to_string())),
        429 => Some(LlmError::RateLimited(provider.to_string())),
        502..=504 | 529 => Some(LlmError::UpstreamUnavailable(format!(
            "{} (HTTP {})",
            provider, status
        ))),
        _ => Some(LlmError::Communication(format!(
            "HTTP {}: {}",
            status,
            snippet(&response.body)
        ))),
    }
}

fn classify(provider: &str, request: &HttpRequest, response: HttpResponse) -> Classified {
    match classify_status(provider, &request.url, &response) {
        None => Classified::Success(response),
        Some(err @ (LlmError::RateLimited(_) | LlmError::UpstreamUnavailable(_))) => {
            Classified::Retry(err, response.retry_after)
        }
        Some(err) => Classified::Fatal(err),
    }
}

/// Send `request`, retrying rate limits, upstream outages and connection errors
///
/// Authentication, not-found and timeout failures are returned immediately.
pub fn send_with_retry(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    policy: &RetryPolicy,
    provider: &str,
) -> Result<HttpResponse, LlmError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_attempts {
        attempts += 1;
        debug!("{}: attempt {}/{} to {}", provider, attempts, max_attempts, request.url);

        let retry_after = match transport.post_json(request) {
            Ok(response) => match classify(provider, request, response) {
                Classified::Success(response) => return Ok(response),
                Classified::Fatal(err) => return Err(err),
                Classified::Retry(err, retry_after) => {
                    last_error = Some(err);
                    retry_after
                }
            },
            Err(TransportError::Timeout) => {
                return Err(LlmError::Timeout(request.timeout.as_secs()));
            }
            Err(TransportError::Connect(msg)) => {
                last_error = Some(LlmError::Communication(format!("connection failed: {}", msg)));
                None
            }
            Err(TransportError::Other(msg)) => {
                return Err(LlmError::Communication(msg));
            }
        };

        if attempts < max_attempts {
            let delay = policy.delay_for(attempts, retry_after);
            if let Some(err) = &last_error {
                warn!(
                    "{}: {} (attempt {}/{}), retrying in {:?}",
                    provider, err, attempts, max_attempts, delay
                );
            }
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        LlmError::Communication("Max retries exceeded".to_string())
    }))
}

fn snippet(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

//! Outbound HTTP for model providers
//!
//! A backend owns one [`HttpClient`]. [`HttpClient::send`] puts exactly one
//! request on the wire per call: the throttler grants one slot per attempt, so
//! transient failures are reported to the caller instead of being replayed
//! here. Non-success statuses become typed [`LlmError`]s with a scrubbed excerpt
//! of the body.

use crate::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Upper bound applied to every per-call timeout
const TIMEOUT_CEILING: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the TLS backend cannot initialize.
    pub fn new() -> Result<Self, LlmError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("HTTP client setup failed: {e}")))?;

        Ok(Self { inner })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    /// Send `request` once.
    ///
    /// # Errors
    ///
    /// | Outcome | Error |
    /// |---------|-------|
    /// | 400 | `BadRequest` |
    /// | 401, 403 | `ProviderAuth` |
    /// | 429 | `ProviderQuota` |
    /// | other 4xx | `Transport` |
    /// | 5xx | `ProviderOutage` |
    /// | connection failure | `Transport` |
    /// | timeout | `Timeout` |
    pub async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<Response, LlmError> {
        let timeout = timeout.min(TIMEOUT_CEILING);
        debug!(provider, timeout_secs = timeout.as_secs(), "Sending provider request");

        let response = match request.timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(LlmError::Timeout { duration: timeout }),
            Err(e) => {
                return Err(LlmError::Transport(format!(
                    "{provider} request failed: {}",
                    scrub_secrets(&e.to_string())
                )));
            }
        };

        let status = response.status();
        if status.is_server_error() {
            return Err(LlmError::ProviderOutage(format!(
                "{provider} returned server error: {status}"
            )));
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(client_error(status, provider, &body));
        }

        Ok(response)
    }
}

/// Typed error for a 4xx response.
///
/// The provider's explanation is kept (scrubbed and shortened) so quota wording
/// reaches failure classification.
fn client_error(status: StatusCode, provider: &str, body: &str) -> LlmError {
    let detail = body_excerpt(body);
    let detail = if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    };

    match status.as_u16() {
        400 => LlmError::BadRequest(format!("{provider} rejected request: {status}{detail}")),
        401 | 403 => {
            LlmError::ProviderAuth(format!("{provider} authentication failed: {status}{detail}"))
        }
        429 => LlmError::ProviderQuota(format!("{provider} rate limit exceeded: {status}{detail}")),
        _ => LlmError::Transport(format!("{provider} returned client error: {status}{detail}")),
    }
}

const EXCERPT_CHARS: usize = 300;

/// `error.message` from a Google-style JSON error body, else the trimmed body.
fn body_excerpt(body: &str) -> String {
    let text = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned());

    let scrubbed = scrub_secrets(&text);
    match scrubbed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &scrubbed[..cut]),
        None => scrubbed,
    }
}

#[allow(clippy::expect_used)]
static SECRET_PATTERNS: Lazy<[(Regex, &'static str); 3]> = Lazy::new(|| {
    [
        // user:pass@ in URLs
        (
            Regex::new(r"(https?://)[^:@\s]+:[^@\s]+@").expect("static regex"),
            "$1[REDACTED]@",
        ),
        // ?key= / &key= query parameters
        (
            Regex::new(r"([?&]key=)[^&\s)]+").expect("static regex"),
            "$1[REDACTED]",
        ),
        // bare tokens long enough to be API keys
        (
            Regex::new(r"\b[A-Za-z0-9_-]{32,}\b").expect("static regex"),
            "[REDACTED_KEY]",
        ),
    ]
});

/// Remove credentials from text headed for logs or error messages.
#[must_use]
pub fn scrub_secrets(text: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(text.to_owned(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

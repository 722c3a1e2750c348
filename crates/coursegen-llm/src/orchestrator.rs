//! Model fallback orchestration
//!
//! [`ModelFallbackOrchestrator::generate`] walks an ordered list of model
//! identifiers, taking one throttle slot per attempt, and returns the first
//! non-empty response. Failures are classified and recorded; none of them stop
//! the walk early.

use coursegen_config::Config;
use coursegen_utils::error::{AttemptFailure, FailureKind, GenerationError};
use coursegen_utils::logging::attempt_span;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::LlmError;
use crate::prompt::build_prompt;
use crate::throttle::RequestThrottler;
use crate::types::{ApiKey, GenerationParams, LlmBackend, LlmInvocation, Message};

/// Source of the provider API key.
pub trait CredentialSource: Send + Sync {
    /// The key, or `None` when no credential is configured.
    fn api_key(&self) -> Option<ApiKey>;

    /// Names reported to the user when the key is missing.
    fn env_vars(&self) -> Vec<String>;
}

/// Reads the key from the first non-empty variable in a list.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    vars: Vec<String>,
}

impl EnvCredentials {
    #[must_use]
    pub fn new(vars: Vec<String>) -> Self {
        Self { vars }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.llm.api_key_env.clone())
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Option<ApiKey> {
        self.vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .map(ApiKey::new)
    }

    fn env_vars(&self) -> Vec<String> {
        self.vars.clone()
    }
}

/// A fixed credential, or none at all.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Option<ApiKey>);

impl StaticCredentials {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(ApiKey::new(key)))
    }

    #[must_use]
    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self) -> Option<ApiKey> {
        self.0.clone()
    }

    fn env_vars(&self) -> Vec<String> {
        vec!["GOOGLE_API_KEY".to_string(), "GEMINI_API_KEY".to_string()]
    }
}

/// Successful generation with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub text: String,
    pub model_used: String,
    /// Failed attempts that preceded the successful one
    pub attempts: Vec<AttemptFailure>,
}

/// Classify a failed call for the fallback policy.
///
/// Typed variants decide first; for untyped errors the message is searched for
/// quota and rate-limit wording, then for a 400 status.
#[must_use]
pub fn classify_failure(err: &LlmError) -> FailureKind {
    match err {
        LlmError::ProviderQuota(_) => FailureKind::Quota,
        LlmError::BadRequest(_) => FailureKind::BadRequest,
        LlmError::Timeout { .. } | LlmError::EmptyResponse => FailureKind::Other,
        LlmError::Transport(msg)
        | LlmError::ProviderAuth(msg)
        | LlmError::ProviderOutage(msg)
        | LlmError::Misconfiguration(msg) => classify_message(msg),
    }
}

fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if lower.contains("quota") || lower.contains("rate limit") {
        FailureKind::Quota
    } else if lower.contains("400") {
        FailureKind::BadRequest
    } else {
        FailureKind::Other
    }
}

pub struct ModelFallbackOrchestrator {
    backend: Arc<dyn LlmBackend>,
    throttler: Arc<RequestThrottler>,
    credentials: Arc<dyn CredentialSource>,
    timeout: Duration,
    params: GenerationParams,
}

impl ModelFallbackOrchestrator {
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        throttler: Arc<RequestThrottler>,
        credentials: Arc<dyn CredentialSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            throttler,
            credentials,
            timeout,
            params: GenerationParams::COURSE,
        }
    }

    #[must_use]
    pub fn throttler(&self) -> &Arc<RequestThrottler> {
        &self.throttler
    }

    /// Generate course content for `prompt`, trying `models` in order.
    ///
    /// # Errors
    ///
    /// - `GenerationError::MissingCredential` if no API key is available; no
    ///   attempt is made and no throttle slot is taken
    /// - `GenerationError::AllModelsUnavailable` if every model failed (or the
    ///   list was empty)
    /// - `GenerationError::Cancelled` if `cancel` fired first
    pub async fn generate(
        &self,
        prompt: &str,
        models: &[String],
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerationError> {
        let Some(api_key) = self.credentials.api_key() else {
            error!("No API key found for the generation provider");
            return Err(GenerationError::MissingCredential {
                env_vars: self.credentials.env_vars(),
            });
        };

        let full_prompt = build_prompt(prompt);
        let mut attempts: Vec<AttemptFailure> = Vec::new();

        for (index, model) in models.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(GenerationError::Cancelled { attempted: index });
            }

            let Some(slot) = self.throttler.acquire_or_cancel(cancel).await else {
                info!(attempted = index, "Generation cancelled while throttled");
                return Err(GenerationError::Cancelled { attempted: index });
            };

            debug!(
                model = %model,
                attempt = index + 1,
                calls_in_window = slot.calls_in_window,
                "Trying model"
            );

            let invocation = LlmInvocation::new(
                model.as_str(),
                self.timeout,
                vec![Message::user(full_prompt.as_str())],
                api_key.clone(),
            )
            .with_params(self.params);

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(model = %model, attempted = index + 1, "Generation cancelled during model call");
                    return Err(GenerationError::Cancelled { attempted: index + 1 });
                }
                result = self.backend.invoke(invocation).instrument(attempt_span(model, index + 1)) => result,
            };

            let failure = match outcome {
                Ok(result) if !result.raw_response.trim().is_empty() => {
                    info!(
                        model = %model,
                        failed_attempts = attempts.len(),
                        "Successfully generated response"
                    );
                    return Ok(Generation {
                        text: result.raw_response,
                        model_used: model.clone(),
                        attempts,
                    });
                }
                Ok(_) => LlmError::EmptyResponse,
                Err(e) => e,
            };

            let kind = classify_failure(&failure);
            warn!(model = %model, kind = %kind, error = %failure, "Model failed, trying next model");
            attempts.push(AttemptFailure {
                model: model.clone(),
                kind,
                message: failure.to_string(),
            });
        }

        error!(attempts = attempts.len(), "All models failed");
        Err(GenerationError::AllModelsUnavailable { attempts })
    }
}

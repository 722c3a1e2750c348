//! Remote generation for coursegen
//!
//! - [`LlmBackend`]: one call to a remote model ([`GeminiBackend`] in production)
//! - [`RequestThrottler`]: spacing and per-window accounting for outbound calls
//! - [`ModelFallbackOrchestrator`]: ordered model fallback with failure classification

mod gemini_backend;
pub(crate) mod http_client;
#[cfg(any(test, feature = "test-utils"))]
mod mock_backend;
mod orchestrator;
mod prompt;
mod throttle;
mod types;


use std::sync::Arc;

pub use coursegen_config as config;
pub use coursegen_utils::error::{
    AttemptFailure, FailureKind, GenerationError, GenerationErrorKind, LlmError,
};

pub use gemini_backend::GeminiBackend;
pub use http_client::scrub_secrets;
#[cfg(any(test, feature = "test-utils"))]
pub use mock_backend::{MockBackend, MockReply};
pub use orchestrator::{
    CredentialSource, EnvCredentials, Generation, ModelFallbackOrchestrator, StaticCredentials,
    classify_failure,
};
pub use prompt::{SYSTEM_PROMPT, build_prompt};
pub use throttle::{CallSlot, RequestThrottler, ThrottleSettings};
pub use types::{
    ApiKey, GenerationParams, LlmBackend, LlmInvocation, LlmResult, Message, Role,
};

use crate::config::Config;

/// Build the production backend from configuration.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let backend = GeminiBackend::new_from_config(config)?;
    tracing::debug!(base_url = %config.llm.base_url, "Constructed Gemini backend");
    Ok(Arc::new(backend))
}

/// Build an orchestrator with its own throttler and environment credentials.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the backend cannot be constructed.
pub fn orchestrator_from_config(config: &Config) -> Result<ModelFallbackOrchestrator, LlmError> {
    Ok(ModelFallbackOrchestrator::new(
        backend_from_config(config)?,
        Arc::new(RequestThrottler::new(ThrottleSettings::from(&config.throttle))),
        Arc::new(EnvCredentials::from_config(config)),
        config.llm.timeout(),
    ))
}

//! Request and response types shared by every generation backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::LlmError;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Gemini names the assistant side "model"
    Model,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }
}

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl GenerationParams {
    /// Fixed parameters used for course generation.
    pub const COURSE: GenerationParams = GenerationParams {
        temperature: 0.7,
        max_output_tokens: 8192,
        top_p: 0.9,
        top_k: 40,
    };
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::COURSE
    }
}

/// API key wrapper that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for placing in request headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Everything a backend needs for one call
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Model identifier, e.g. `models/gemini-2.0-flash`
    pub model: String,
    pub timeout: Duration,
    /// Conversation turns, oldest first
    pub messages: Vec<Message>,
    pub params: GenerationParams,
    pub api_key: ApiKey,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
        api_key: ApiKey,
    ) -> Self {
        Self {
            model: model.into(),
            timeout,
            messages,
            params: GenerationParams::COURSE,
            api_key,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

/// Text returned by one successful call, with provider metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Concatenated candidate text
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub finish_reason: Option<String>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            finish_reason: None,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: Option<u64>, output: Option<u64>) -> Self {
        self.tokens_input = input;
        self.tokens_output = output;
        self
    }

    #[must_use]
    pub fn with_finish_reason(mut self, reason: Option<String>) -> Self {
        self.finish_reason = reason;
        self
    }
}

/// A remote text-generation provider.
///
/// The fallback orchestrator only talks to this trait; tests plug in a scripted
/// implementation.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one generation call against `inv.model`.
    ///
    /// # Errors
    ///
    /// Any provider, transport or timeout failure as an [`LlmError`]. An empty
    /// answer may be returned as `Ok`; the caller decides whether that counts.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}

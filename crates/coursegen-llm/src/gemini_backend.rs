//! Gemini HTTP backend
//!
//! Calls `POST {base_url}/{model}:generateContent` with the API key in the
//! `x-goog-api-key` header and concatenates the text parts of the first candidate.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{GenerationParams, LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use coursegen_config::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "gemini";

#[derive(Clone)]
pub struct GeminiBackend {
    client: HttpClient,
    base_url: String,
}

impl GeminiBackend {
    /// Create a backend talking to `base_url` (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(config.llm.base_url.clone())
    }

    /// Endpoint for a model identifier. Bare names get the `models/` prefix.
    fn endpoint(&self, model: &str) -> String {
        if model.starts_with("models/") || model.starts_with("tunedModels/") {
            format!("{}/{model}:generateContent", self.base_url)
        } else {
            format!("{}/models/{model}:generateContent", self.base_url)
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|msg| GeminiContent {
                role: Some(
                    match msg.role {
                        Role::User => "user",
                        Role::Model => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(msg.content.clone()),
                }],
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        debug!(
            provider = PROVIDER,
            model = %inv.model,
            max_output_tokens = inv.params.max_output_tokens,
            temperature = inv.params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let request_body = GeminiRequest {
            contents: Self::convert_messages(&inv.messages),
            generation_config: GeminiGenerationConfig::from(inv.params),
        };

        let request = self
            .client
            .post(&self.endpoint(&inv.model))
            .header("x-goog-api-key", inv.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .send(request, inv.timeout, PROVIDER)
            .await?;

        let response_body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        if let Some(reason) = response_body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::BadRequest(format!(
                "Gemini blocked the prompt: {reason}"
            )));
        }

        let candidate = response_body.candidates.first().ok_or(LlmError::EmptyResponse)?;
        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        debug!(
            provider = PROVIDER,
            model = %inv.model,
            chars = text.len(),
            finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
            "Received response from Gemini"
        );

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let usage = response_body.usage_metadata.unwrap_or_default();
        Ok(LlmResult::new(text, PROVIDER, inv.model)
            .with_tokens(usage.prompt_token_count, usage.candidates_token_count)
            .with_finish_reason(candidate.finish_reason.clone()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

impl From<GenerationParams> for GeminiGenerationConfig {
    fn from(params: GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
            top_p: params.top_p,
            top_k: params.top_k,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

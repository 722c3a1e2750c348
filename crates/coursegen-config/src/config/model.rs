use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::ConfigSource;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 300;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Model identifiers in order of preference.
pub const DEFAULT_MODELS: [&str; 6] = [
    "models/gemini-2.5-pro-preview-05-06",
    "models/gemini-2.0-flash-exp",
    "models/gemini-2.0-flash",
    "models/gemini-1.5-pro-latest",
    "models/gemini-1.5-flash-latest",
    "models/gemini-1.5-flash",
];

pub const DEFAULT_MIN_INTERVAL_MS: u64 = 4000;
pub const DEFAULT_WINDOW_SECS: u64 = 60;

pub const DEFAULT_ARTIFACT_DIR: &str = "generated_files";

/// Effective configuration after discovery and precedence resolution
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub throttle: ThrottleConfig,
    pub artifacts: ArtifactsConfig,
    /// Where each effective value came from
    pub source_attribution: HashMap<String, ConfigSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_deadline_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_deadline_secs: DEFAULT_REQUEST_DEADLINE_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmConfig {
    pub base_url: String,
    /// Environment variables consulted for the API key, in order
    pub api_key_env: Vec<String>,
    pub models: Vec<String>,
    pub timeout_secs: u64,
}

impl LlmConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.iter().map(ToString::to_string).collect(),
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrottleConfig {
    pub min_interval_ms: u64,
    pub window_secs: u64,
}

impl ThrottleConfig {
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
        }
    }
}

/// On-disk TOML shape. Every key is optional so partial files layer over defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub server: Option<TomlServer>,
    pub llm: Option<TomlLlm>,
    pub throttle: Option<TomlThrottle>,
    pub artifacts: Option<TomlArtifacts>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlServer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub request_deadline_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlLlm {
    pub base_url: Option<String>,
    pub api_key_env: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlThrottle {
    pub min_interval_ms: Option<u64>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlArtifacts {
    pub dir: Option<PathBuf>,
}

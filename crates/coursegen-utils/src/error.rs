//! Error taxonomy for coursegen
//!
//! Every fallible component reports through one of the enums in this module:
//!
//! - [`LlmError`] for a single remote generation call
//! - [`GenerationError`] for the terminal outcome of a fallback run
//! - [`RenderError`] for artifact encoding failures
//! - [`StoreError`] for artifact persistence and lookup
//! - [`ConfigError`] for configuration loading and validation
//!
//! [`CourseGenError`] wraps all of them for the CLI and maps each to an [`ExitCode`].

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Top-level error type for coursegen operations.
#[derive(Error, Debug)]
pub enum CourseGenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Artifact storage error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CourseGenError {
    /// Map this error to the process exit code used by the CLI.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CONFIG,
            Self::Generation(GenerationError::Cancelled { .. }) => ExitCode::CANCELLED,
            Self::Generation(_) => ExitCode::GENERATION_FAILED,
            Self::Render(_) => ExitCode::RENDER_FAILED,
            Self::Store(StoreError::Render(_)) => ExitCode::RENDER_FAILED,
            Self::Store(_) | Self::Io(_) | Self::Other(_) => ExitCode::INTERNAL,
        }
    }

    /// Render the error for a terminal user, including suggestions when available.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let (message, suggestions) = match self {
            Self::Config(e) => (e.user_message(), e.suggestions()),
            Self::Generation(e) => (e.user_message(), e.suggestions()),
            Self::Render(e) => (e.user_message(), e.suggestions()),
            Self::Store(e) => (e.user_message(), e.suggestions()),
            Self::Io(e) => (format!("I/O error: {e}"), Vec::new()),
            Self::Other(e) => (format!("{e:#}"), Vec::new()),
        };

        let mut out = format!("error: {message}");
        for suggestion in suggestions {
            out.push_str("\n  hint: ");
            out.push_str(&suggestion);
        }
        out
    }
}

/// Trait for user-facing error reporting with suggestions.
pub trait UserFriendlyError {
    /// A message suitable for showing to an end user.
    fn user_message(&self) -> String;

    /// Actions the user can take to resolve the error.
    fn suggestions(&self) -> Vec<String>;

    /// The category used to group similar errors.
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for grouping and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    Rendering,
    Storage,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Generation => write!(f, "Generation"),
            Self::Rendering => write!(f, "Rendering"),
            Self::Storage => write!(f, "Storage"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .coursegen/config.toml".to_string(),
                "Remove unknown sections or keys".to_string(),
            ],
            Self::InvalidValue { key, .. } => {
                vec![format!("Fix the value of '{key}' in the config file or environment")]
            }
            Self::NotFound { .. } => vec![
                "Pass an existing file to --config".to_string(),
                "Or remove --config to use discovery and defaults".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Failure of a single remote generation call.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, unparseable body, other 4xx)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota or rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// The provider rejected the request as malformed (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Provider service outage (5xx)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// The provider answered without any text
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// Backend configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

/// Classification of a failed attempt, used to pick a retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rate limit or quota exhaustion
    Quota,
    /// The request itself was rejected as malformed
    BadRequest,
    /// Anything else (transport, outage, empty response, ...)
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quota => write!(f, "quota"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One failed model attempt inside a fallback run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub model: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Suggestion attached to retryable generation failures.
pub const RETRY_SUGGESTION: &str = "Please try again in a few minutes, or check your API quota.";

/// Stable kind tag for [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    MissingCredential,
    AllModelsUnavailable,
    Cancelled,
}

/// Terminal failure of a fallback generation run.
///
/// Per-model failures never escape the orchestrator on their own; they are
/// collected into [`GenerationError::AllModelsUnavailable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(
        "Gemini API key not found. Please set {} environment variable.",
        env_vars.join(" or ")
    )]
    MissingCredential { env_vars: Vec<String> },

    #[error(
        "All AI models are currently unavailable. This might be due to rate limits or quota restrictions."
    )]
    AllModelsUnavailable { attempts: Vec<AttemptFailure> },

    #[error("Generation cancelled after {attempted} attempt(s)")]
    Cancelled { attempted: usize },
}

impl GenerationError {
    #[must_use]
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::MissingCredential { .. } => GenerationErrorKind::MissingCredential,
            Self::AllModelsUnavailable { .. } => GenerationErrorKind::AllModelsUnavailable,
            Self::Cancelled { .. } => GenerationErrorKind::Cancelled,
        }
    }

    /// Short actionable hint for the HTTP boundary.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingCredential { env_vars } => Some(format!(
                "Set {} and restart the server.",
                env_vars.join(" or ")
            )),
            Self::AllModelsUnavailable { .. } => Some(RETRY_SUGGESTION.to_string()),
            Self::Cancelled { .. } => None,
        }
    }
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::AllModelsUnavailable { attempts } if !attempts.is_empty() => {
                let tried: Vec<String> = attempts
                    .iter()
                    .map(|a| format!("{} ({})", a.model, a.kind))
                    .collect();
                format!("{self} Tried: {}", tried.join(", "))
            }
            _ => self.to_string(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingCredential { env_vars } => env_vars
                .iter()
                .map(|var| format!("export {var}=<your key>"))
                .collect(),
            Self::AllModelsUnavailable { .. } => vec![
                RETRY_SUGGESTION.to_string(),
                "Add a less loaded model to [llm] models".to_string(),
            ],
            Self::Cancelled { .. } => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Generation
    }
}

/// Failure while encoding an artifact.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error while writing artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build document package: {0}")]
    Package(String),

    #[error("Failed to build PDF: {0}")]
    Pdf(String),
}

impl UserFriendlyError for RenderError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Io(_) => vec!["Check free disk space and directory permissions".to_string()],
            Self::Package(_) | Self::Pdf(_) => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Rendering
    }
}

/// Artifact persistence and lookup failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid artifact name: {name}")]
    InvalidName { name: String },

    #[error("File not found: {name}")]
    NotFound { name: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to persist artifact: {0:#}")]
    Persist(anyhow::Error),
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidName { .. } => {
                vec!["Use a bare file name as shown by `coursegen files`".to_string()]
            }
            Self::NotFound { .. } => vec!["Run `coursegen files` to list artifacts".to_string()],
            Self::Io { .. } | Self::Persist(_) => {
                vec!["Check [artifacts] dir exists and is writable".to_string()]
            }
            Self::Render(e) => e.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Render(_) => ErrorCategory::Rendering,
            _ => ErrorCategory::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message_names_env_vars() {
        let err = GenerationError::MissingCredential {
            env_vars: vec!["GOOGLE_API_KEY".to_string(), "GEMINI_API_KEY".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("GOOGLE_API_KEY or GEMINI_API_KEY"));
        assert_eq!(err.kind(), GenerationErrorKind::MissingCredential);
        assert!(err.suggestion().unwrap().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_all_models_unavailable_has_retry_suggestion() {
        let err = GenerationError::AllModelsUnavailable {
            attempts: vec![AttemptFailure {
                model: "models/a".to_string(),
                kind: FailureKind::Quota,
                message: "429".to_string(),
            }],
        };
        assert_eq!(err.suggestion().as_deref(), Some(RETRY_SUGGESTION));
        assert!(err.user_message().contains("models/a (quota)"));
        assert_eq!(err.category(), ErrorCategory::Generation);
    }

    #[test]
    fn test_cancelled_has_no_suggestion() {
        let err = GenerationError::Cancelled { attempted: 2 };
        assert!(err.suggestion().is_none());
        assert_eq!(
            CourseGenError::from(err).to_exit_code(),
            ExitCode::CANCELLED
        );
    }

    #[test]
    fn test_exit_code_mapping() {
        let config = CourseGenError::from(ConfigError::InvalidFile("bad".to_string()));
        assert_eq!(config.to_exit_code(), ExitCode::CONFIG);

        let render = CourseGenError::from(RenderError::Pdf("boom".to_string()));
        assert_eq!(render.to_exit_code(), ExitCode::RENDER_FAILED);

        let store = CourseGenError::from(StoreError::NotFound {
            name: "x.pdf".to_string(),
        });
        assert_eq!(store.to_exit_code(), ExitCode::INTERNAL);
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::BadRequest).unwrap();
        assert_eq!(json, r#""bad_request""#);
        assert_eq!(FailureKind::Quota.to_string(), "quota");
    }

    #[test]
    fn test_display_for_user_includes_hints() {
        let err = CourseGenError::from(ConfigError::NotFound {
            path: "/nope.toml".to_string(),
        });
        let out = err.display_for_user();
        assert!(out.starts_with("error: Configuration file not found"));
        assert!(out.contains("hint: Pass an existing file to --config"));
    }
}

use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_HOME: &str = "COURSEGEN_HOME";
pub const ENV_HOST: &str = "COURSEGEN_HOST";
pub const ENV_PORT: &str = "COURSEGEN_PORT";
pub const ENV_ARTIFACT_DIR: &str = "COURSEGEN_ARTIFACT_DIR";
pub const ENV_MODELS: &str = "COURSEGEN_MODELS";

/// Raw environment overrides, captured once so discovery stays deterministic.
///
/// Values are kept as strings; parsing and validation happen during discovery so
/// that a malformed variable is reported with its name.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub home: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub artifact_dir: Option<PathBuf>,
    pub models: Option<String>,
}

impl EnvOverrides {
    /// Capture overrides from the process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture overrides through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            home: get(ENV_HOME).map(PathBuf::from),
            host: get(ENV_HOST),
            port: get(ENV_PORT),
            artifact_dir: get(ENV_ARTIFACT_DIR).map(PathBuf::from),
            models: get(ENV_MODELS),
        }
    }

    /// Model list from `COURSEGEN_MODELS`, split on commas.
    #[must_use]
    pub fn model_list(&self) -> Option<Vec<String>> {
        self.models.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(ToString::to_string)
                .collect()
        })
    }
}

/// Load `.env.local` from `dir` if present, otherwise `.env`.
///
/// Variables already set in the process environment are not overwritten.
/// Returns the file that was loaded, if any. A file that exists but fails to
/// parse is logged and skipped.
pub fn load_dotenv(dir: &Path) -> Option<PathBuf> {
    for name in [".env.local", ".env"] {
        let candidate = dir.join(name);
        if !candidate.is_file() {
            continue;
        }
        match dotenv::from_path(&candidate) {
            Ok(()) => {
                debug!(path = %candidate.display(), "Loaded environment file");
                return Some(candidate);
            }
            Err(e) => {
                tracing::warn!(path = %candidate.display(), error = %e, "Failed to load environment file");
                return None;
            }
        }
    }
    None
}

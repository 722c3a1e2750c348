use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::Config;

/// Origin of an effective configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    /// Environment variable name
    Env(String),
    Cli,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Env(var) => write!(f, "env ({var})"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

impl Config {
    /// Effective configuration as `key -> (value, source)` pairs.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut out = BTreeMap::new();
        let mut add = |key: &str, value: String| {
            let source = self
                .source_attribution
                .get(key)
                .map_or_else(|| ConfigSource::Default.to_string(), ToString::to_string);
            out.insert(key.to_string(), (value, source));
        };

        add("host", self.server.host.clone());
        add("port", self.server.port.to_string());
        add(
            "request_deadline_secs",
            self.server.request_deadline_secs.to_string(),
        );
        add("base_url", self.llm.base_url.clone());
        add("api_key_env", self.llm.api_key_env.join(","));
        add("models", self.llm.models.join(","));
        add("llm_timeout_secs", self.llm.timeout_secs.to_string());
        add("min_interval_ms", self.throttle.min_interval_ms.to_string());
        add("window_secs", self.throttle.window_secs.to_string());
        add("artifact_dir", self.artifacts.dir.display().to_string());

        out
    }
}

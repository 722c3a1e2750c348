use coursegen_utils::error::ConfigError;

use super::Config;

/// Upper bound on the minimum call spacing (10 minutes)
const MAX_MIN_INTERVAL_MS: u64 = 600_000;
const MAX_TIMEOUT_SECS: u64 = 3600;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(invalid("server.host", "must not be empty"));
        }
        if self.server.request_deadline_secs == 0 {
            return Err(invalid("server.request_deadline_secs", "must be greater than 0"));
        }

        if !(self.llm.base_url.starts_with("http://") || self.llm.base_url.starts_with("https://"))
        {
            return Err(invalid(
                "llm.base_url",
                format!("{} (must start with http:// or https://)", self.llm.base_url),
            ));
        }
        if self.llm.api_key_env.is_empty() {
            return Err(invalid("llm.api_key_env", "must name at least one variable"));
        }
        if self.llm.models.is_empty() {
            return Err(invalid("llm.models", "must list at least one model"));
        }
        if let Some(blank) = self.llm.models.iter().find(|m| m.trim().is_empty()) {
            return Err(invalid("llm.models", format!("blank model identifier {blank:?}")));
        }
        if self.llm.timeout_secs == 0 || self.llm.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "llm.timeout_secs",
                format!("{} (must be 1..={MAX_TIMEOUT_SECS})", self.llm.timeout_secs),
            ));
        }

        if self.throttle.min_interval_ms > MAX_MIN_INTERVAL_MS {
            return Err(invalid(
                "throttle.min_interval_ms",
                format!("exceeds maximum of {MAX_MIN_INTERVAL_MS}"),
            ));
        }
        if self.throttle.window_secs == 0 {
            return Err(invalid("throttle.window_secs", "must be greater than 0"));
        }

        if self.artifacts.dir.as_os_str().is_empty() {
            return Err(invalid("artifacts.dir", "must not be empty"));
        }

        Ok(())
    }
}

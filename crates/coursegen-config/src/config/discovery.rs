use anyhow::{Context, Result};
use coursegen_utils::error::ConfigError;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::env::{ENV_ARTIFACT_DIR, ENV_HOST, ENV_MODELS, ENV_PORT};
use super::model::TomlConfig;
use super::{CliArgs, Config, ConfigSource, EnvOverrides};

const CONFIG_DIR: &str = ".coursegen";
const CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for config file discovery and the
    /// process environment for overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file cannot be read or parsed, an
    /// override cannot be parsed, or the resulting values fail validation.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir()
            .map_err(|e| ConfigError::InvalidFile(format!("Failed to get current directory: {e}")))?;
        Self::discover_from(&start_dir, cli_args, &EnvOverrides::from_process_env())
    }

    /// Discover and load configuration from an explicit directory and environment.
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    ///
    /// # Errors
    ///
    /// See [`Config::discover`].
    pub fn discover_from(
        start_dir: &Path,
        cli_args: &CliArgs,
        env: &EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => match &env.home {
                Some(home) => {
                    let candidate = home.join(CONFIG_FILE);
                    candidate.is_file().then_some(candidate)
                }
                None => Self::discover_config_file_from(start_dir),
            },
        };

        if let Some(path) = &config_path {
            let file_config = load_config_file(path)
                .map_err(|e| ConfigError::InvalidFile(format!("{e:#}")))?;
            config.apply_file(file_config, path);
            debug!(path = %path.display(), "Loaded configuration file");
        }

        config.apply_env(env)?;
        config.apply_cli(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.coursegen/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current_dir = dir.parent();
        }

        None
    }

    fn apply_file(&mut self, file: TomlConfig, path: &Path) {
        let source = ConfigSource::ConfigFile(path.to_path_buf());
        let attribution = &mut self.source_attribution;
        let mut mark = |key: &str| {
            attribution.insert(key.to_string(), source.clone());
        };

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                self.server.host = host;
                mark("host");
            }
            if let Some(port) = server.port {
                self.server.port = port;
                mark("port");
            }
            if let Some(deadline) = server.request_deadline_secs {
                self.server.request_deadline_secs = deadline;
                mark("request_deadline_secs");
            }
        }

        if let Some(llm) = file.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
                mark("base_url");
            }
            if let Some(api_key_env) = llm.api_key_env {
                self.llm.api_key_env = api_key_env;
                mark("api_key_env");
            }
            if let Some(models) = llm.models {
                self.llm.models = models;
                mark("models");
            }
            if let Some(timeout) = llm.timeout_secs {
                self.llm.timeout_secs = timeout;
                mark("llm_timeout_secs");
            }
        }

        if let Some(throttle) = file.throttle {
            if let Some(min_interval) = throttle.min_interval_ms {
                self.throttle.min_interval_ms = min_interval;
                mark("min_interval_ms");
            }
            if let Some(window) = throttle.window_secs {
                self.throttle.window_secs = window;
                mark("window_secs");
            }
        }

        if let Some(artifacts) = file.artifacts
            && let Some(dir) = artifacts.dir
        {
            self.artifacts.dir = dir;
            mark("artifact_dir");
        }
    }

    fn apply_env(&mut self, env: &EnvOverrides) -> Result<(), ConfigError> {
        let mut mark = |key: &str, var: &str| {
            self.source_attribution
                .insert(key.to_string(), ConfigSource::Env(var.to_string()));
        };

        if let Some(host) = &env.host {
            self.server.host = host.clone();
            mark("host", ENV_HOST);
        }
        if let Some(raw) = &env.port {
            let port = raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_PORT.to_string(),
                    value: raw.clone(),
                })?;
            self.server.port = port;
            mark("port", ENV_PORT);
        }
        if let Some(dir) = &env.artifact_dir {
            self.artifacts.dir = dir.clone();
            mark("artifact_dir", ENV_ARTIFACT_DIR);
        }
        if let Some(models) = env.model_list() {
            self.llm.models = models;
            mark("models", ENV_MODELS);
        }

        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        let mut mark = |key: &str| {
            self.source_attribution
                .insert(key.to_string(), ConfigSource::Cli);
        };

        if let Some(host) = &cli.host {
            self.server.host = host.clone();
            mark("host");
        }
        if let Some(port) = cli.port {
            self.server.port = port;
            mark("port");
        }
        if let Some(dir) = &cli.artifact_dir {
            self.artifacts.dir = dir.clone();
            mark("artifact_dir");
        }
        if let Some(models) = &cli.models {
            self.llm.models = models.clone();
            mark("models");
        }
    }
}

/// Load configuration from a TOML file
fn load_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: TomlConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;
    Ok(config)
}

//! Configuration for coursegen
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults.

pub mod config;

pub use config::{
    ArtifactsConfig, CliArgs, Config, ConfigSource, EnvOverrides, LlmConfig, ServerConfig,
    ThrottleConfig, load_dotenv,
};

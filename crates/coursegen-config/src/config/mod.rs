//! Configuration management for coursegen
//!
//! TOML files live at `.coursegen/config.toml` and may contain `[server]`,
//! `[llm]`, `[throttle]`, and `[artifacts]` sections. Every key is optional.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [llm]
//! models = ["models/gemini-2.0-flash", "models/gemini-1.5-flash"]
//!
//! [throttle]
//! min_interval_ms = 4000
//! ```

mod cli_args;
mod discovery;
mod env;
mod model;
mod sources;
mod validation;

pub use cli_args::CliArgs;
pub use env::{EnvOverrides, load_dotenv};
pub use model::*;
pub use sources::ConfigSource;

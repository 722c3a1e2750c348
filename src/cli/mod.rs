//! Command-line interface for coursegen
//!
//! - `args`: clap definitions
//! - `run`: entry point, configuration and dispatch
//! - `commands`: command implementations

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, KindArg, build_cli};
pub use run::run;

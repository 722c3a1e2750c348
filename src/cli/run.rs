//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, loads `.env`, initializes logging, discovers the
//! configuration, creates the tokio runtime and dispatches. It prints every error
//! itself; main.rs only maps the returned code to the process exit status.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use coursegen_config::load_dotenv;
use coursegen_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;
use crate::{CliArgs, Config, CourseGenError, ExitCode};

/// Main CLI execution function.
///
/// # Errors
///
/// Returns the exit code for the failure after printing a report to stderr.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    // Before tracing init so RUST_LOG from .env applies
    let dotenv_path = std::env::current_dir()
        .ok()
        .and_then(|cwd| load_dotenv(&cwd));

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging unavailable: {e}");
    }
    if let Some(path) = &dotenv_path {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        host: match &cli.command {
            Commands::Serve { host, .. } => host.clone(),
            _ => None,
        },
        port: match &cli.command {
            Commands::Serve { port, .. } => *port,
            _ => None,
        },
        artifact_dir: cli.artifact_dir.clone(),
        models: (!cli.models.is_empty()).then(|| cli.models.clone()),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report(&CourseGenError::from(err))),
    };

    for (key, (value, source)) in config.effective_config() {
        debug!(key = %key, value = %value, source = %source, "Effective config");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let shutdown = CancellationToken::new();
    let result = rt.block_on(async {
        let interrupt = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, cancelling");
                    interrupt.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
            }
        });

        match cli.command {
            Commands::Serve { .. } => commands::execute_serve(&config, shutdown.clone()).await,
            Commands::Generate {
                prompt,
                render,
                json,
            } => {
                commands::execute_generate(
                    &config,
                    prompt,
                    render.map(Into::into),
                    json,
                    &shutdown,
                )
                .await
            }
            Commands::Render { kind, input } => {
                commands::execute_render(&config, kind.into(), input.as_deref())
            }
            Commands::Files { json } => commands::execute_files(&config, json),
        }
    });

    result.map_err(|err| report(&err))
}

fn report(err: &CourseGenError) -> ExitCode {
    eprintln!("{}", err.display_for_user());
    err.to_exit_code()
}

//! Logging setup for coursegen
//!
//! Structured logging goes through `tracing`. The CLI calls [`init_tracing`] once at
//! startup; library code only emits events and spans.

use std::io::IsTerminal;
use tracing::{Level, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Default filter directive when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "coursegen=debug,info"
    } else {
        "coursegen=info,warn"
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the built-in filter. In verbose mode span
/// close events are logged, which gives per-request and per-attempt durations.
///
/// # Errors
///
/// Returns an error if a global subscriber was already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color())
        .with_target(verbose)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_span_events(FmtSpan::CLOSE).compact())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.compact())
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one HTTP request or CLI command.
pub fn request_span(operation: &str, request_id: u64) -> tracing::Span {
    span!(
        Level::INFO,
        "request",
        operation = %operation,
        request_id = request_id,
    )
}

/// Span wrapping one model attempt inside a fallback run.
pub fn attempt_span(model: &str, attempt: usize) -> tracing::Span {
    span!(Level::DEBUG, "attempt", model = %model, attempt = attempt)
}

//! coursegen - AI course generator
//!
//! Turns a natural-language request into course content through a throttled,
//! fallback-capable call to Gemini, then renders that content into slide decks
//! (PPTX), paged documents (PDF) or Markdown outlines.
//!
//! coursegen can be used in two ways:
//! - **Server**: `coursegen serve` exposes the HTTP API (`/chat`, `/generate_ppt`,
//!   `/generate_pdf`, `/generate_outline`, `/download/:filename`, `/files`)
//! - **CLI**: `coursegen generate`, `coursegen render` and `coursegen files`
//!
//! # Quick Start
//!
//! ```bash
//! export GOOGLE_API_KEY=...
//! coursegen serve --port 5000
//!
//! # One-off generation rendered straight to a PDF
//! coursegen generate "Intro to Rust ownership" --render pdf
//! ```
//!
//! # Crates
//!
//! - `coursegen-utils`: error taxonomy, exit codes, logging, atomic writes
//! - `coursegen-config`: configuration discovery and precedence
//! - `coursegen-llm`: throttling, model fallback, Gemini backend
//! - `coursegen-artifacts`: segmentation, renderers, artifact store

pub mod cli;
pub mod server;

pub use coursegen_artifacts as artifacts;
pub use coursegen_config as config;
pub use coursegen_llm as llm;

pub use coursegen_artifacts::{
    ArtifactKind, ArtifactRenderer, ArtifactStore, SegmentedDocument, StoredArtifact, StoredFile,
    segment,
};
pub use coursegen_config::{CliArgs, Config};
pub use coursegen_llm::{Generation, ModelFallbackOrchestrator, RequestThrottler};
pub use coursegen_utils::error::{CourseGenError, GenerationError, UserFriendlyError};
pub use coursegen_utils::exit_codes::ExitCode;
pub use server::{AppState, router, serve};

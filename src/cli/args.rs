//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use coursegen_artifacts::ArtifactKind;

/// coursegen - AI course generator
#[derive(Parser, Debug)]
#[command(name = "coursegen")]
#[command(about = "Generate course content with Gemini and render it as PPTX, PDF or Markdown")]
#[command(long_about = r#"
coursegen forwards a course request to Gemini, falling back through an ordered list
of models under a shared rate limit, and renders the answer into slide decks,
paged documents or outlines.

EXAMPLES:
  # Run the HTTP API on the default port (5000)
  coursegen serve

  # Generate content and save it as a PDF
  coursegen generate "Beginner course on SQL joins" --render pdf

  # Render an existing text file as a slide deck
  coursegen render --kind pptx notes.txt

  # List stored artifacts
  coursegen files --json

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  The config file is discovered by searching upward from CWD for .coursegen/config.toml
  COURSEGEN_HOME or --config select a file explicitly
  .env.local (or .env) in the working directory is loaded first

CREDENTIALS:
  GOOGLE_API_KEY, then GEMINI_API_KEY
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory where artifacts are stored
    #[arg(long, global = true)]
    pub artifact_dir: Option<PathBuf>,

    /// Comma-separated model identifiers, most preferred first
    #[arg(long, global = true, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate course content from a request
    ///
    /// The request is read from stdin when not given as an argument.
    Generate {
        /// Course request text
        prompt: Option<String>,

        /// Also render the result and save it to the artifact directory
        #[arg(long, value_enum)]
        render: Option<KindArg>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render text into an artifact without calling a model
    Render {
        /// Artifact type
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// List stored artifacts
    Files {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Artifact type as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Pptx,
    Pdf,
    Outline,
}

impl From<KindArg> for ArtifactKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Pptx => ArtifactKind::SlideDeck,
            KindArg::Pdf => ArtifactKind::PagedDocument,
            KindArg::Outline => ArtifactKind::Outline,
        }
    }
}

/// Build the CLI command structure without parsing arguments.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_serve_with_global_flags() {
        let cli = Cli::try_parse_from([
            "coursegen",
            "serve",
            "--port",
            "8080",
            "--models",
            "models/a,models/b",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.models, vec!["models/a", "models/b"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_render_kind_maps_to_artifact_kind() {
        let cli = Cli::try_parse_from(["coursegen", "render", "--kind", "pdf", "notes.txt"]).unwrap();
        match cli.command {
            Commands::Render { kind, input } => {
                assert_eq!(ArtifactKind::from(kind), ArtifactKind::PagedDocument);
                assert_eq!(input, Some(PathBuf::from("notes.txt")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["coursegen", "render", "--kind", "docx"]).is_err());
    }
}

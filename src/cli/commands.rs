//! Command implementations

use anyhow::Context;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info};

use coursegen_artifacts::{
    ArtifactKind, ArtifactStore, StoredArtifact, renderer_for, segment,
};
use coursegen_llm::orchestrator_from_config;
use coursegen_utils::logging::request_span;

use crate::{Config, CourseGenError};

pub(super) async fn execute_serve(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<(), CourseGenError> {
    crate::server::serve(config, shutdown).await
}

#[derive(Serialize)]
struct GenerateOutput<'a> {
    response: &'a str,
    model_used: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<&'a StoredArtifact>,
}

pub(super) async fn execute_generate(
    config: &Config,
    prompt: Option<String>,
    render: Option<ArtifactKind>,
    json: bool,
    cancel: &CancellationToken,
) -> Result<(), CourseGenError> {
    let prompt = match prompt {
        Some(prompt) => prompt,
        None => read_stdin()?,
    };
    if prompt.trim().is_empty() {
        return Err(anyhow::anyhow!("Course request is empty").into());
    }

    let orchestrator =
        orchestrator_from_config(config).context("Failed to construct the generation backend")?;

    let generation = orchestrator
        .generate(&prompt, &config.llm.models, cancel)
        .instrument(request_span("generate", 0))
        .await?;

    let artifact = match render {
        Some(kind) => Some(save_artifact(config, kind, &generation.text)?),
        None => None,
    };

    if json {
        let output = GenerateOutput {
            response: &generation.text,
            model_used: &generation.model_used,
            artifact: artifact.as_ref(),
        };
        let rendered =
            serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{rendered}");
    } else {
        println!("{}", generation.text);
        eprintln!("Model used: {}", generation.model_used);
        if let Some(artifact) = &artifact {
            eprintln!("Saved {}", artifact.path);
        }
    }

    Ok(())
}

pub(super) fn execute_render(
    config: &Config,
    kind: ArtifactKind,
    input: Option<&Path>,
) -> Result<(), CourseGenError> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => read_stdin()?,
    };

    let artifact = save_artifact(config, kind, &content)?;
    println!("{}", artifact.path);
    Ok(())
}

pub(super) fn execute_files(config: &Config, json: bool) -> Result<(), CourseGenError> {
    let store = ArtifactStore::open(&config.artifacts.dir)?;
    let files = store.list()?;

    if json {
        let rendered = serde_json::to_string_pretty(&serde_json::json!({ "files": files }))
            .context("Failed to serialize file listing")?;
        println!("{rendered}");
        return Ok(());
    }

    if files.is_empty() {
        println!("No artifacts in {}", store.dir());
        return Ok(());
    }
    for file in &files {
        println!("{:>10}  {}", file.size, file.name);
    }
    Ok(())
}

fn save_artifact(
    config: &Config,
    kind: ArtifactKind,
    content: &str,
) -> Result<StoredArtifact, CourseGenError> {
    let store = ArtifactStore::open(&config.artifacts.dir)?;
    let doc = segment(content);
    let artifact = store.save(renderer_for(kind).as_ref(), &doc)?;
    info!(
        filename = %artifact.filename,
        sections = doc.len(),
        blocks = doc.block_count(),
        "Rendered artifact"
    );
    Ok(artifact)
}

fn read_stdin() -> Result<String, CourseGenError> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}

//! Route handlers
//!
//! Request bodies are taken as raw bytes and parsed here, so a missing or
//! malformed body produces the same 400 JSON as a missing field.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{Instrument, error, info, warn};

use coursegen_artifacts::{ArtifactKind, ArtifactStore, renderer_for, segment};
use coursegen_utils::error::{GenerationError, StoreError};
use coursegen_utils::logging::request_span;

use super::AppState;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenderRequest {
    course_content: Option<String>,
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

pub(super) async fn home() -> impl IntoResponse {
    Json(json!({
        "message": "AI Course Generator API is running",
        "status": "active",
    }))
}

pub(super) async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    let request = serde_json::from_slice::<ChatRequest>(&body).ok();
    let Some((message, session_id)) = request.and_then(|r| {
        r.message
            .filter(|m| !m.trim().is_empty())
            .map(|m| (m, r.session_id.unwrap_or_else(|| "default".to_string())))
    }) else {
        return failure(StatusCode::BAD_REQUEST, "Message is required");
    };

    let span = request_span("chat", state.request_id());
    async move {
        let preview: String = message.chars().take(50).collect();
        info!(session_id = %session_id, preview = %preview, "Chat request");

        let (cancel, _guard) = state.request_token();
        match state
            .orchestrator
            .generate(&message, &state.models, &cancel)
            .await
        {
            Ok(generation) => Json(json!({
                "success": true,
                "response": generation.text,
                "model_used": generation.model_used,
            }))
            .into_response(),
            Err(err) => generation_failure(&err),
        }
    }
    .instrument(span)
    .await
}

fn generation_failure(err: &GenerationError) -> Response {
    let status = match err {
        GenerationError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::MissingCredential { .. } | GenerationError::AllModelsUnavailable { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    warn!(kind = ?err.kind(), error = %err, "Generation failed");

    let mut body = json!({ "success": false, "error": err.to_string() });
    if let Some(suggestion) = err.suggestion() {
        body["suggestion"] = json!(suggestion);
    }
    (status, Json(body)).into_response()
}

pub(super) async fn generate_ppt(State(state): State<AppState>, body: Bytes) -> Response {
    render_artifact(state, ArtifactKind::SlideDeck, &body).await
}

pub(super) async fn generate_pdf(State(state): State<AppState>, body: Bytes) -> Response {
    render_artifact(state, ArtifactKind::PagedDocument, &body).await
}

pub(super) async fn generate_outline(State(state): State<AppState>, body: Bytes) -> Response {
    render_artifact(state, ArtifactKind::Outline, &body).await
}

async fn render_artifact(state: AppState, kind: ArtifactKind, body: &[u8]) -> Response {
    let Some(content) = serde_json::from_slice::<RenderRequest>(body)
        .ok()
        .and_then(|r| r.course_content)
    else {
        return failure(StatusCode::BAD_REQUEST, "Course content is required");
    };

    let span = request_span(kind.extension(), state.request_id());
    let failed = format!("Failed to create {}", kind.label());

    async move {
        let store = Arc::clone(&state.store);
        let saved = tokio::task::spawn_blocking(move || {
            let doc = segment(&content);
            store.save(renderer_for(kind).as_ref(), &doc)
        })
        .await;

        match saved {
            Ok(Ok(artifact)) => Json(json!({
                "success": true,
                "filename": artifact.filename,
                "download_url": format!("/download/{}", artifact.filename),
            }))
            .into_response(),
            Ok(Err(err)) => {
                error!(kind = %kind, error = %err, "Artifact creation failed");
                failure(StatusCode::INTERNAL_SERVER_ERROR, &failed)
            }
            Err(join_err) => {
                error!(kind = %kind, error = %join_err, "Render task failed");
                failure(StatusCode::INTERNAL_SERVER_ERROR, &failed)
            }
        }
    }
    .instrument(span)
    .await
}

pub(super) async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    let lookup = filename.clone();
    let path = match with_store(&state, move |store| store.resolve(&lookup)).await {
        Ok(path) => path,
        Err(StoreError::NotFound { .. }) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "File not found" })),
            )
                .into_response();
        }
        Err(err @ StoreError::InvalidName { .. }) => {
            warn!(filename = %filename, "Rejected download name");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() })))
                .into_response();
        }
        Err(err) => {
            error!(filename = %filename, error = %err, "Download lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "File not found" })),
            )
                .into_response();
        }
        Err(err) => {
            error!(path = %path, error = %err, "Download read failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    let mime = path
        .extension()
        .and_then(ArtifactKind::from_extension)
        .map_or("application/octet-stream", ArtifactKind::mime_type);

    info!(filename = %filename, bytes = bytes.len(), "Serving download");
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub(super) async fn list_files(State(state): State<AppState>) -> Response {
    match with_store(&state, |store| store.list()).await {
        Ok(files) => Json(json!({ "files": files })).into_response(),
        Err(err) => {
            error!(error = %err, "Listing artifacts failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// Run a filesystem-bound store operation on the blocking pool.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, StoreError>
where
    F: FnOnce(&ArtifactStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| StoreError::Persist(anyhow::anyhow!("store task failed: {e}")))?
}

//! HTTP boundary
//!
//! An axum router over the orchestrator and the artifact store. Routes:
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | liveness message |
//! | POST | `/chat` | generate course content |
//! | POST | `/generate_ppt` | render a slide deck |
//! | POST | `/generate_pdf` | render a paged document |
//! | POST | `/generate_outline` | render a Markdown outline |
//! | GET | `/download/:filename` | stored artifact as an attachment |
//! | GET | `/files` | stored artifact listing |

mod handlers;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use coursegen_artifacts::ArtifactStore;
use coursegen_config::Config;
use coursegen_llm::{ModelFallbackOrchestrator, orchestrator_from_config};
use coursegen_utils::error::CourseGenError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<ModelFallbackOrchestrator>,
    models: Arc<[String]>,
    store: Arc<ArtifactStore>,
    shutdown: CancellationToken,
    request_deadline: Duration,
    next_request_id: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(
        orchestrator: Arc<ModelFallbackOrchestrator>,
        models: Vec<String>,
        store: Arc<ArtifactStore>,
        shutdown: CancellationToken,
        request_deadline: Duration,
    ) -> Self {
        Self {
            orchestrator,
            models: models.into(),
            store,
            shutdown,
            request_deadline,
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Build the production state: Gemini backend, environment credentials and
    /// the configured artifact directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be constructed or the artifact
    /// directory cannot be created.
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Result<Self, CourseGenError> {
        let orchestrator = orchestrator_from_config(config)
            .context("Failed to construct the generation backend")?;
        let store = ArtifactStore::open(&config.artifacts.dir)?;

        Ok(Self::new(
            Arc::new(orchestrator),
            config.llm.models.clone(),
            Arc::new(store),
            shutdown,
            config.server.request_deadline(),
        ))
    }

    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Token for one request: cancelled on shutdown or once the deadline passes.
    ///
    /// The returned guard cancels the token when dropped, which also ends the
    /// deadline timer.
    fn request_token(&self) -> (CancellationToken, tokio_util::sync::DropGuard) {
        let token = self.shutdown.child_token();
        let timer_token = token.clone();
        let deadline = self.request_deadline;

        tokio::spawn(async move {
            tokio::select! {
                () = timer_token.cancelled() => {}
                () = tokio::time::sleep(deadline) => {
                    info!(deadline_secs = deadline.as_secs(), "Request deadline reached");
                    timer_token.cancel();
                }
            }
        });

        let guard = token.clone().drop_guard();
        (token, guard)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/chat", post(handlers::chat))
        .route("/generate_ppt", post(handlers::generate_ppt))
        .route("/generate_pdf", post(handlers::generate_pdf))
        .route("/generate_outline", post(handlers::generate_outline))
        .route("/download/:filename", get(handlers::download))
        .route("/files", get(handlers::list_files))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the state cannot be built, the address cannot be bound,
/// or the server fails while running.
pub async fn serve(config: &Config, shutdown: CancellationToken) -> Result<(), CourseGenError> {
    let state = AppState::from_config(config, shutdown.clone())?;
    let app = router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(
        address = %address,
        models = config.llm.models.len(),
        artifact_dir = %config.artifacts.dir.display(),
        "AI Course Generator API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Shutting down HTTP server");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

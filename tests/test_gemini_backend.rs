//! Gemini backend against a local stub server.
//!
//! The stub answers `generateContent` by model name prefix (`ok`, `quota`, `bad`,
//! `down`) and records when each request arrived, so these tests see exactly what
//! went over the wire for every throttle slot.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use coursegen::GenerationError;
use coursegen::llm::{
    FailureKind, GeminiBackend, LlmBackend, ModelFallbackOrchestrator, RequestThrottler,
    StaticCredentials, ThrottleSettings,
};

const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Default)]
struct StubLog {
    arrivals: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl StubLog {
    fn models(&self) -> Vec<String> {
        self.arrivals.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    fn gaps(&self) -> Vec<Duration> {
        let arrivals = self.arrivals.lock().unwrap();
        arrivals.windows(2).map(|w| w[1].1.duration_since(w[0].1)).collect()
    }
}

async fn generate_content(
    State(log): State<StubLog>,
    Path(call): Path<String>,
    headers: HeaderMap,
) -> Response {
    let model = call.trim_end_matches(":generateContent").to_string();
    log.arrivals.lock().unwrap().push((model.clone(), Instant::now()));

    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if model.starts_with("quota") {
        let body = json!({"error": {"code": 429, "message": "Quota exceeded for metric generate_content", "status": "RESOURCE_EXHAUSTED"}});
        (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
    } else if model.starts_with("bad") {
        let body = json!({"error": {"code": 400, "message": "Invalid argument", "status": "INVALID_ARGUMENT"}});
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    } else if model.starts_with("down") {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": format!("MODULE 1: from {model}")}]},
                "finishReason": "STOP"
            }]
        }))
        .into_response()
    }
}

/// Serve the stub on an ephemeral port; returns its `v1beta` base URL.
async fn spawn_stub(log: StubLog) -> String {
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate_content))
        .with_state(log);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1beta")
}

fn orchestrator(base_url: &str) -> ModelFallbackOrchestrator {
    let backend: Arc<dyn LlmBackend> = Arc::new(GeminiBackend::new(base_url).unwrap());
    ModelFallbackOrchestrator::new(
        backend,
        Arc::new(RequestThrottler::new(ThrottleSettings {
            min_interval: MIN_INTERVAL,
            window: Duration::from_secs(60),
        })),
        Arc::new(StaticCredentials::new("test-key")),
        Duration::from_secs(10),
    )
}

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_server_error_is_sent_once_per_slot() {
    let log = StubLog::default();
    let orchestrator = orchestrator(&spawn_stub(log.clone()).await);

    let err = orchestrator
        .generate("Rust", &models(&["down-a"]), &CancellationToken::new())
        .await
        .unwrap_err();

    let GenerationError::AllModelsUnavailable { attempts } = err else {
        panic!("expected AllModelsUnavailable, got {err:?}");
    };
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].kind, FailureKind::Other);
    assert_eq!(log.models(), vec!["down-a"]);
    assert_eq!(orchestrator.throttler().calls_in_window().await, 1);
}

#[tokio::test]
async fn test_every_remote_call_takes_a_spaced_slot() {
    let log = StubLog::default();
    let orchestrator = orchestrator(&spawn_stub(log.clone()).await);

    let err = orchestrator
        .generate(
            "Rust",
            &models(&["down-a", "down-b", "down-c"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::AllModelsUnavailable { ref attempts } if attempts.len() == 3));
    assert_eq!(log.models(), vec!["down-a", "down-b", "down-c"]);
    assert_eq!(orchestrator.throttler().calls_in_window().await, 3);
    for gap in log.gaps() {
        // Arrival jitter on loopback is well under the 20ms slack
        assert!(gap >= MIN_INTERVAL - Duration::from_millis(20), "gap {gap:?}");
    }
}

#[tokio::test]
async fn test_status_codes_classify_and_fall_through() {
    let log = StubLog::default();
    let orchestrator = orchestrator(&spawn_stub(log.clone()).await);

    let generation = orchestrator
        .generate(
            "Rust",
            &models(&["quota-a", "bad-b", "ok-c", "ok-d"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(generation.model_used, "ok-c");
    assert_eq!(generation.text, "MODULE 1: from ok-c");
    let kinds: Vec<FailureKind> = generation.attempts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![FailureKind::Quota, FailureKind::BadRequest]);
    assert!(generation.attempts[0].message.contains("Quota exceeded"));
    assert_eq!(log.models(), vec!["quota-a", "bad-b", "ok-c"]);
    assert_eq!(orchestrator.throttler().calls_in_window().await, 3);
}

#[tokio::test]
async fn test_rejected_key_is_not_retried() {
    let log = StubLog::default();
    let base_url = spawn_stub(log.clone()).await;
    let orchestrator = ModelFallbackOrchestrator::new(
        Arc::new(GeminiBackend::new(base_url).unwrap()),
        Arc::new(RequestThrottler::new(ThrottleSettings {
            min_interval: Duration::ZERO,
            window: Duration::from_secs(60),
        })),
        Arc::new(StaticCredentials::new("wrong-key")),
        Duration::from_secs(10),
    );

    let err = orchestrator
        .generate("Rust", &models(&["ok-a", "ok-b"]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::AllModelsUnavailable { ref attempts } if attempts.len() == 2));
    assert_eq!(log.models(), vec!["ok-a", "ok-b"]);
}

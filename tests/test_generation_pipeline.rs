//! End-to-end pipeline: fallback generation, segmentation, rendering, storage.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use coursegen::artifacts::renderer_for;
use coursegen::config::{CliArgs, Config, EnvOverrides};
use coursegen::llm::{
    FailureKind, MockBackend, MockReply, ModelFallbackOrchestrator, RequestThrottler,
    StaticCredentials, ThrottleSettings,
};
use coursegen::{AppState, ArtifactKind, ArtifactStore, segment};

const COURSE: &str = "MODULE 1: Ownership\nMoves\nBorrows\n\nMODULE 2: Lifetimes\nElision";

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test(start_paused = true)]
async fn test_fallback_output_renders_every_artifact_kind() {
    let backend = Arc::new(
        MockBackend::new()
            .with_reply("models/a", MockReply::BadRequest)
            .with_reply("models/b", MockReply::Outage)
            .with_reply("models/c", MockReply::Text(COURSE.to_string())),
    );
    let orchestrator = ModelFallbackOrchestrator::new(
        backend.clone(),
        Arc::new(RequestThrottler::new(ThrottleSettings::default())),
        Arc::new(StaticCredentials::new("test-key")),
        Duration::from_secs(30),
    );

    let start = Instant::now();
    let generation = orchestrator
        .generate(
            "Rust memory model",
            &models(&["models/a", "models/b", "models/c"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // Three attempts, spaced by the default four second interval
    assert!(start.elapsed() >= Duration::from_secs(8));
    assert_eq!(generation.model_used, "models/c");
    let kinds: Vec<FailureKind> = generation.attempts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![FailureKind::BadRequest, FailureKind::Other]);

    let doc = segment(&generation.text);
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.block_count(), 3);

    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    for kind in ArtifactKind::ALL {
        let saved = store.save(renderer_for(kind).as_ref(), &doc).unwrap();
        assert_eq!(saved.kind, kind);
        assert!(saved.bytes_written > 0);
    }

    let files = store.list().unwrap();
    assert_eq!(files.len(), 3);

    let pptx = files.iter().find(|f| f.name.ends_with(".pptx")).unwrap();
    let bytes = std::fs::read(store.resolve(&pptx.name).unwrap()).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let slides = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .count();
    assert_eq!(slides, doc.len() + 1);
}

#[tokio::test(start_paused = true)]
async fn test_separate_orchestrators_share_one_throttler() {
    let throttler = Arc::new(RequestThrottler::new(ThrottleSettings::default()));
    let build = |reply: &str| {
        ModelFallbackOrchestrator::new(
            Arc::new(MockBackend::new().with_reply("m", MockReply::Text(reply.to_string()))),
            Arc::clone(&throttler),
            Arc::new(StaticCredentials::new("test-key")),
            Duration::from_secs(30),
        )
    };
    let first = build("one");
    let second = build("two");
    let cancel = CancellationToken::new();
    let list = models(&["m"]);

    let start = Instant::now();
    let (a, b) = tokio::join!(
        first.generate("a", &list, &cancel),
        second.generate("b", &list, &cancel)
    );

    assert_eq!(a.unwrap().text, "one");
    assert_eq!(b.unwrap().text, "two");
    assert!(start.elapsed() >= Duration::from_secs(4));
    assert_eq!(throttler.calls_in_window().await, 2);
}

#[tokio::test]
async fn test_app_state_from_config_creates_artifact_dir() {
    let root = TempDir::new().unwrap();
    let artifact_dir = root.path().join("out").join("generated_files");
    let cli = CliArgs {
        artifact_dir: Some(artifact_dir.clone()),
        ..CliArgs::default()
    };

    let config =
        Config::discover_from(root.path(), &cli, &EnvOverrides::from_lookup(|_| None)).unwrap();
    let state = AppState::from_config(&config, CancellationToken::new()).unwrap();

    assert!(artifact_dir.is_dir());
    assert_eq!(state.store().dir().as_std_path(), artifact_dir);
}

use async_trait::async_trait;
use lens_engine::{
    Engine, EngineConfig, FetchError, LensSession, MemoryFetcher, SourceFetcher,
};
use lens_page::PageDocument;
use lens_scanner::ScanReason;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};

const PAGE: &str = r#"{
  "elements": [
    { "id": "slow", "attributes": { "data-source-file": "src/Slow.tsx", "data-source-line": "1" } },
    { "id": "fast", "attributes": { "data-source-file": "src/Fast.tsx", "data-source-line": "2" } }
  ]
}"#;

/// Answers each path after its own delay.
struct DelayedFetcher {
    delays: HashMap<&'static str, Duration>,
}

#[async_trait]
impl SourceFetcher for DelayedFetcher {
    async fn fetch_source(&self, path: &str) -> Result<String, FetchError> {
        let delay = self.delays.get(path).copied().unwrap_or_default();
        time::sleep(delay).await;
        Ok(format!("// {path}"))
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        debounce_ms: 300,
        max_wait_ms: 2_000,
        initial_retry_ms: Vec::new(),
        ..Default::default()
    }
}

fn session(config: EngineConfig, fetcher: Arc<dyn SourceFetcher>) -> LensSession<PageDocument> {
    let doc = PageDocument::from_json(PAGE).expect("page");
    LensSession::start(Engine::new(doc, config).expect("engine"), fetcher)
}

#[tokio::test(start_paused = true)]
async fn debounced_triggers_coalesce_into_one_scan() {
    let session = session(config(), Arc::new(MemoryFetcher::new()));
    let mut updates = session.subscribe_updates();
    let start = Instant::now();

    for _ in 0..3 {
        session.trigger(ScanReason::HeadMutation).await.expect("trigger");
        time::sleep(Duration::from_millis(100)).await;
    }

    let update = updates.recv().await.expect("update");
    assert_eq!(update.reason, ScanReason::HeadMutation);
    assert!(update.changed);
    assert_eq!(update.files, 2);
    // last trigger at ~200ms plus the 300ms quiet period
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(start.elapsed() < Duration::from_millis(600));

    time::sleep(Duration::from_secs(5)).await;
    assert!(updates.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn continuous_triggers_are_bounded_by_max_wait() {
    let session = session(config(), Arc::new(MemoryFetcher::new()));
    let mut updates = session.subscribe_updates();
    let start = Instant::now();

    let trigger_session = session.clone();
    let triggers = tokio::spawn(async move {
        for _ in 0..30 {
            let _ = trigger_session.trigger(ScanReason::Navigation).await;
            time::sleep(Duration::from_millis(100)).await;
        }
    });

    let update = updates.recv().await.expect("update");
    assert_eq!(update.reason, ScanReason::Navigation);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2_200));
    triggers.abort();
}

#[tokio::test(start_paused = true)]
async fn initial_retries_stop_rebuilding_once_stable() {
    let config = EngineConfig {
        initial_retry_ms: vec![500, 1_000],
        ..config()
    };
    let session = session(config, Arc::new(MemoryFetcher::new()));
    let mut updates = session.subscribe_updates();

    session.initialize().await.expect("initialize");
    assert_eq!(session.engine().lock().await.rebuild_count(), 1);

    let first = updates.recv().await.expect("first retry");
    assert_eq!(first.reason, ScanReason::InitialRetry(1));
    assert!(!first.changed);

    let second = updates.recv().await.expect("second retry");
    assert_eq!(second.reason, ScanReason::InitialRetry(2));
    assert_eq!(second.rebuild_count, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_does_not_overwrite_newer_content() {
    let fetcher = DelayedFetcher {
        delays: HashMap::from([
            ("src/Slow.tsx", Duration::from_millis(500)),
            ("src/Fast.tsx", Duration::from_millis(10)),
        ]),
    };
    let session = session(config(), Arc::new(fetcher));
    session.initialize().await.expect("initialize");

    let engine = session.engine();
    let (slow, fast) = {
        let engine = engine.lock().await;
        (
            engine.document().element_by_id("slow").expect("slow"),
            engine.document().element_by_id("fast").expect("fast"),
        )
    };

    let (slow_applied, fast_applied) = tokio::join!(session.hover(slow), async {
        time::sleep(Duration::from_millis(1)).await;
        session.hover(fast).await
    });
    assert!(!slow_applied);
    assert!(fast_applied);

    let snapshot = engine.lock().await.displayed_snapshot().expect("snapshot");
    assert_eq!(snapshot.file_path, "src/Fast.tsx");
    assert_eq!(snapshot.text, "// src/Fast.tsx");
}

#[tokio::test(start_paused = true)]
async fn toggle_off_cancels_pending_scans() {
    let session = session(config(), Arc::new(MemoryFetcher::new()));
    let mut updates = session.subscribe_updates();

    session.trigger(ScanReason::HeadMutation).await.expect("trigger");
    let enabled = session
        .handle_message(r#"{"action":"toggle","checked":false}"#)
        .await
        .expect("message");
    assert_eq!(enabled, Some(false));

    time::sleep(Duration::from_secs(3)).await;
    assert!(updates.try_recv().is_err());
    assert!(!session.engine().lock().await.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn refresh_runs_without_waiting_for_the_debounce() {
    let session = session(config(), Arc::new(MemoryFetcher::new()));
    let mut updates = session.subscribe_updates();
    let start = Instant::now();

    session.refresh().await.expect("refresh");
    let update = updates.recv().await.expect("update");
    assert_eq!(update.reason, ScanReason::Refresh);
    assert!(start.elapsed() < Duration::from_millis(300));
}

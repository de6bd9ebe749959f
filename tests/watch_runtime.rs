// tests/watch_runtime.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use assetpipe::config::Target;
use assetpipe::engine::{FileChange, RuntimeEvent, WatchCore, WatchOptions, WatchRuntime};
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::pipeline::{PipelineRunner, Transform};
use assetpipe::types::ChangeKind;
use assetpipe_test_utils::fake_transform::{GatedTransform, RecordingTransform};
use assetpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const DEBOUNCE: Duration = Duration::from_millis(80);

struct Harness {
    tx: mpsc::Sender<RuntimeEvent>,
    runtime: WatchRuntime,
}

fn harness(transform: Arc<dyn Transform>, target: Target) -> Harness {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/lib/a.js", "a");
    fs.add_file("/proj/lib/b.js", "b");
    fs.add_file("/proj/lib/c.js", "c");

    let runner = Arc::new(PipelineRunner::new(Arc::new(fs), transform, 2));
    let (tx, rx) = mpsc::channel(64);
    let runtime = WatchRuntime::new(
        WatchCore::new(WatchOptions { debounce: DEBOUNCE }),
        tx.clone(),
        rx,
        runner,
        Arc::new(target),
    );
    Harness { tx, runtime }
}

fn scripts() -> Target {
    Target::new("scripts", "/proj", vec!["lib/**/*.js".to_string()], "dist")
}

fn changed(path: &str) -> RuntimeEvent {
    RuntimeEvent::FileChanged(FileChange::new(path, ChangeKind::Modified))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn rapid_changes_coalesce_into_one_run() -> TestResult {
    init_tracing();
    let recorder = Arc::new(RecordingTransform::new());
    let Harness { tx, runtime } = harness(recorder.clone(), scripts());
    let handle = tokio::spawn(runtime.run());

    for path in ["/proj/lib/a.js", "/proj/lib/b.js", "/proj/lib/a.js"] {
        tx.send(changed(path)).await?;
        sleep(Duration::from_millis(10)).await;
    }

    with_timeout(wait_until(|| recorder.count() == 3)).await;
    // Leave room for a (wrong) second run to show up.
    sleep(DEBOUNCE * 3).await;
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    let summary = with_timeout(handle).await??;
    assert_eq!(summary.runs_started, 1);
    assert_eq!(summary.changes_seen, 3);
    assert_eq!(recorder.count(), 3);
    Ok(())
}

#[tokio::test]
async fn changes_during_a_run_trigger_exactly_one_follow_up() -> TestResult {
    let gated = Arc::new(GatedTransform::new());
    let target = Target::new("one", "/proj", vec!["lib/a.js".to_string()], "dist");
    let Harness { tx, runtime } = harness(gated.clone(), target);
    let handle = tokio::spawn(runtime.run());

    tx.send(changed("/proj/lib/a.js")).await?;
    with_timeout(gated.wait_started()).await;

    for _ in 0..3 {
        tx.send(changed("/proj/lib/a.js")).await?;
    }
    gated.release(1);

    with_timeout(gated.wait_started()).await;
    gated.release(1);
    sleep(DEBOUNCE * 3).await;

    assert_eq!(gated.applications(), 2);
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    let summary = with_timeout(handle).await??;
    assert_eq!(summary.runs_started, 2);
    Ok(())
}

#[tokio::test]
async fn stop_during_a_run_waits_for_it_to_finish() -> TestResult {
    let gated = Arc::new(GatedTransform::new());
    let target = Target::new("one", "/proj", vec!["lib/a.js".to_string()], "dist");
    let Harness { tx, runtime } = harness(gated.clone(), target);
    let handle = tokio::spawn(runtime.run());

    tx.send(changed("/proj/lib/a.js")).await?;
    with_timeout(gated.wait_started()).await;

    tx.send(RuntimeEvent::ShutdownRequested).await?;
    sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished(), "runtime must wait for the in-flight run");

    gated.release(1);
    let summary = with_timeout(handle).await??;
    assert_eq!(summary.runs_started, 1);
    assert_eq!(summary.runs_failed, 0);
    Ok(())
}

#[tokio::test]
async fn stop_while_debouncing_discards_pending_changes() -> TestResult {
    let recorder = Arc::new(RecordingTransform::new());
    let Harness { tx, runtime } = harness(recorder.clone(), scripts());
    let handle = tokio::spawn(runtime.run());

    tx.send(changed("/proj/lib/a.js")).await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    let summary = with_timeout(handle).await??;
    sleep(DEBOUNCE * 2).await;
    assert_eq!(summary.runs_started, 0);
    assert_eq!(recorder.count(), 0);
    Ok(())
}

#[tokio::test]
async fn incremental_runs_only_touch_changed_sources() -> TestResult {
    let recorder = Arc::new(RecordingTransform::new());
    let Harness { tx, runtime } = harness(recorder.clone(), scripts());
    let handle = tokio::spawn(runtime.incremental(true).run());

    tx.send(changed("/proj/lib/b.js")).await?;
    tx.send(RuntimeEvent::FileChanged(FileChange::new(
        "/proj/lib/gone.js",
        ChangeKind::Deleted,
    )))
    .await?;

    with_timeout(wait_until(|| recorder.count() == 1)).await;
    sleep(DEBOUNCE * 2).await;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;

    assert_eq!(recorder.applied_sources(), vec![PathBuf::from("/proj/lib/b.js")]);
    Ok(())
}

#[tokio::test]
async fn run_errors_do_not_stop_the_watcher() -> TestResult {
    let recorder = Arc::new(RecordingTransform::new());
    // Sources live outside the configured source root, so every run errors.
    let target = scripts().with_source_root("elsewhere");
    let Harness { tx, runtime } = harness(recorder.clone(), target);
    let handle = tokio::spawn(runtime.run());

    tx.send(changed("/proj/lib/a.js")).await?;
    sleep(DEBOUNCE * 3).await;
    tx.send(changed("/proj/lib/b.js")).await?;
    sleep(DEBOUNCE * 3).await;
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    let summary = with_timeout(handle).await??;
    assert_eq!(summary.runs_started, 2);
    assert_eq!(summary.runs_failed, 2);
    assert_eq!(recorder.count(), 0);
    Ok(())
}

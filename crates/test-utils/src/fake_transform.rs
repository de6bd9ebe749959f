use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::mapping::AssetMapping;
use assetpipe::pipeline::{Transform, TransformFuture, TransformOutcome};
use tokio::sync::{Notify, Semaphore};

/// A fake transform that:
/// - records every mapping it was handed
/// - optionally sleeps before reporting `Written`
/// - tracks how many applications were in flight at once.
#[derive(Default)]
pub struct RecordingTransform {
    applied: Arc<Mutex<Vec<AssetMapping>>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn applied(&self) -> Vec<AssetMapping> {
        self.applied.lock().unwrap().clone()
    }

    pub fn applied_sources(&self) -> Vec<PathBuf> {
        self.applied().into_iter().map(|m| m.source).collect()
    }

    pub fn count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Transform for RecordingTransform {
    fn apply<'a>(&'a self, mapping: &'a AssetMapping) -> TransformFuture<'a> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.applied.lock().unwrap().push(mapping.clone());

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(TransformOutcome::Written)
        })
    }
}

/// Fails (or panics) for sources with one of the given file names and
/// reports `Written` for everything else.
pub struct FailingTransform {
    fail_names: HashSet<String>,
    panic_names: HashSet<String>,
}

impl FailingTransform {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|s| s.to_string()).collect(),
            panic_names: HashSet::new(),
        }
    }

    pub fn panicking_on(names: &[&str]) -> Self {
        Self {
            fail_names: HashSet::new(),
            panic_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Transform for FailingTransform {
    fn apply<'a>(&'a self, mapping: &'a AssetMapping) -> TransformFuture<'a> {
        Box::pin(async move {
            let name = mapping
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.panic_names.contains(&name) {
                panic!("transform blew up on {name}");
            }
            if self.fail_names.contains(&name) {
                anyhow::bail!("cannot transform {name}");
            }
            Ok(TransformOutcome::Written)
        })
    }
}

/// Blocks every application until the test opens the gate.
///
/// Used to hold a run "in flight" while more events arrive.
pub struct GatedTransform {
    gate: Arc<Semaphore>,
    started: Arc<Notify>,
    applications: AtomicUsize,
}

impl GatedTransform {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            started: Arc::new(Notify::new()),
            applications: AtomicUsize::new(0),
        }
    }

    /// Let `n` more applications finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until some application has started since the last call.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn applications(&self) -> usize {
        self.applications.load(Ordering::SeqCst)
    }
}

impl Default for GatedTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for GatedTransform {
    fn apply<'a>(&'a self, _mapping: &'a AssetMapping) -> TransformFuture<'a> {
        Box::pin(async move {
            self.applications.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            let permit = self.gate.acquire().await?;
            permit.forget();
            Ok(TransformOutcome::Written)
        })
    }
}

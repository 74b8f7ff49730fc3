//! Shared utilities for config store integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{
    fs,
    future::Future,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use confkeeper::config_store::{
    ConfigChange, ConfigError, FileEvent, FileEventKinds, FsWatcher, Subscription,
    WatchSubscription,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Upper bound for anything that converges asynchronously.
pub const CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates a temp dir holding `app.yml` with `content`.
pub fn setup_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("app.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Polls `check` until it returns true or the convergence timeout passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + CONVERGENCE_TIMEOUT;

    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    false
}

/// Gives spawned tasks time to drain already-queued events.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

/// Waits for the next change on a subscription.
pub async fn next_change(subscription: &mut Subscription) -> ConfigChange {
    tokio::time::timeout(CONVERGENCE_TIMEOUT, subscription.recv())
        .await
        .expect("timed out waiting for config change")
        .expect("subscription closed")
}

struct FakeState {
    events: Mutex<Option<mpsc::UnboundedReceiver<FileEvent>>>,
    watched: Mutex<Vec<PathBuf>>,
    released: AtomicBool,
    fail: bool,
}

/// Watcher driven by the test instead of the filesystem.
#[derive(Clone)]
pub struct FakeWatcher {
    state: Arc<FakeState>,
}

/// Test side of a `FakeWatcher`.
pub struct FakeEvents {
    sender: mpsc::UnboundedSender<FileEvent>,
    state: Arc<FakeState>,
}

struct ReleaseGuard(Arc<FakeState>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.released.store(true, Ordering::SeqCst);
    }
}

/// Creates a fake watcher and the handle used to emit its events.
pub fn fake_watcher() -> (FakeWatcher, FakeEvents) {
    fake(false)
}

/// Creates a fake watcher whose subscription always fails.
pub fn failing_watcher() -> FakeWatcher {
    fake(true).0
}

fn fake(fail: bool) -> (FakeWatcher, FakeEvents) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let state = Arc::new(FakeState {
        events: Mutex::new(Some(receiver)),
        watched: Mutex::new(Vec::new()),
        released: AtomicBool::new(false),
        fail,
    });

    (
        FakeWatcher {
            state: state.clone(),
        },
        FakeEvents { sender, state },
    )
}

#[async_trait]
impl FsWatcher for FakeWatcher {
    async fn watch_dir(&self, dir: &Path) -> Result<WatchSubscription, ConfigError> {
        if self.state.fail {
            return Err(ConfigError::FileWatcherInit {
                details: "fake watcher refused".to_string(),
            });
        }

        self.state.watched.lock().unwrap().push(dir.to_path_buf());

        let receiver = self
            .state
            .events
            .lock()
            .unwrap()
            .take()
            .expect("fake watcher subscribed twice");

        Ok(WatchSubscription::new(
            UnboundedReceiverStream::new(receiver),
            ReleaseGuard(self.state.clone()),
        ))
    }
}

impl FakeEvents {
    /// Emits an event for `path` with the given kinds.
    pub fn emit(&self, path: &Path, kinds: FileEventKinds) {
        self.sender.send(FileEvent::new(path, kinds)).unwrap();
    }

    /// Emits a modification event for `path`.
    pub fn modified(&self, path: &Path) {
        self.emit(path, FileEventKinds::MODIFIED);
    }

    /// Directories the store subscribed to.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.state.watched.lock().unwrap().clone()
    }

    /// Whether the store has dropped its subscription.
    pub fn is_released(&self) -> bool {
        self.state.released.load(Ordering::SeqCst)
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bitflags::bitflags;
use futures::{Stream, StreamExt, stream::BoxStream};
use notify::{
    Event, EventKind, RecursiveMode, Watcher, event::ModifyKind, recommended_watcher,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use super::ConfigError;

bitflags! {
    /// Set of change kinds reported together for one file event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileEventKinds: u8 {
        /// File was created
        const CREATED = 1;
        /// File contents or metadata were modified
        const MODIFIED = 1 << 1;
        /// File was removed
        const REMOVED = 1 << 2;
        /// File was renamed or moved
        const RENAMED = 1 << 3;
        /// Any other change the backend reports
        const OTHER = 1 << 4;
    }
}

impl FileEventKinds {
    /// Maps a notify event kind onto a kind set. Access events map to the empty set.
    pub fn from_notify(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::CREATED,
            EventKind::Modify(ModifyKind::Name(_)) => Self::RENAMED,
            EventKind::Modify(_) => Self::MODIFIED,
            EventKind::Remove(_) => Self::REMOVED,
            EventKind::Access(_) => Self::empty(),
            EventKind::Any | EventKind::Other => Self::OTHER,
        }
    }
}

/// A batch of filesystem changes observed in a watched directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEvent {
    /// Paths affected by the change
    pub paths: Vec<PathBuf>,
    /// The kinds of change that occurred
    pub kinds: FileEventKinds,
}

impl FileEvent {
    /// Creates an event for a single path.
    pub fn new(path: impl Into<PathBuf>, kinds: FileEventKinds) -> Self {
        Self {
            paths: vec![path.into()],
            kinds,
        }
    }

    /// Whether the event may concern `file`.
    ///
    /// Paths are compared by file name since watched directories report
    /// absolute paths. An event without paths is assumed to concern it.
    pub fn concerns(&self, file: &Path) -> bool {
        self.paths.is_empty()
            || self
                .paths
                .iter()
                .any(|path| path.file_name() == file.file_name())
    }
}

/// An active directory subscription.
///
/// Yields events until the subscription is dropped. The guard holds whatever
/// resource keeps the underlying watch alive.
pub struct WatchSubscription {
    events: BoxStream<'static, FileEvent>,
    guard: Box<dyn Send>,
}

impl WatchSubscription {
    /// Bundles an event stream with the guard that keeps it alive.
    pub fn new<S, G>(events: S, guard: G) -> Self
    where
        S: Stream<Item = FileEvent> + Send + 'static,
        G: Send + 'static,
    {
        Self {
            events: events.boxed(),
            guard: Box::new(guard),
        }
    }

    pub(super) fn into_parts(self) -> (BoxStream<'static, FileEvent>, Box<dyn Send>) {
        (self.events, self.guard)
    }
}

/// Capability to subscribe to changes in a directory.
///
/// The store only ever consumes the returned stream; implementations never
/// touch store state directly. Tests inject fakes through this trait.
#[async_trait]
pub trait FsWatcher: Send + Sync + 'static {
    /// Starts watching `dir` non-recursively.
    ///
    /// # Errors
    /// Returns an error if the subscription cannot be established.
    async fn watch_dir(&self, dir: &Path) -> Result<WatchSubscription, ConfigError>;
}

/// Cross-platform watcher backed by the notify crate.
///
/// Converts notify's callback events into an async stream over an unbounded
/// channel, since file events are infrequent but bursty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatcher;

#[async_trait]
impl FsWatcher for NotifyWatcher {
    async fn watch_dir(&self, dir: &Path) -> Result<WatchSubscription, ConfigError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "file watcher reported an error");
                    return;
                }
            };

            let kinds = FileEventKinds::from_notify(&event.kind);
            if kinds.is_empty() {
                return;
            }

            let _ = event_tx.send(FileEvent {
                paths: event.paths,
                kinds,
            });
        })
        .map_err(|e| ConfigError::FileWatcherInit {
            details: e.to_string(),
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::FileWatch {
                path: dir.to_path_buf(),
                details: e.to_string(),
            })?;

        Ok(WatchSubscription::new(
            UnboundedReceiverStream::new(event_rx),
            watcher,
        ))
    }
}

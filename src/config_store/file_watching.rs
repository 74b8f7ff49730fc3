use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::{sync::mpsc::WeakUnboundedSender, task::JoinHandle};
use tracing::{debug, error, info, trace, warn};

use super::{
    ConfigError,
    actor::{StoreCommand, StoreState},
    file_watcher::{FileEvent, FileEventKinds, FsWatcher},
};

/// Keeps a directory subscription and its forwarding task alive.
///
/// Owned by the store actor; dropping it releases the subscription and stops
/// forwarding, so a watcher never outlives its store.
pub(super) struct WatchGuard {
    _subscription: Box<dyn Send>,
    forwarder: JoinHandle<()>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Directory to watch for a source file.
///
/// Editors often replace files through rename, which a watch on the file
/// itself would miss.
pub(super) fn watch_dir_for(source_path: &Path) -> PathBuf {
    match source_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Subscribes to the directory containing `source_path` and forwards every
/// event into the store inbox.
///
/// The inbox is held weakly so forwarding never keeps a store alive.
///
/// # Errors
/// Returns error if the watcher cannot subscribe to the directory.
pub(super) async fn watch_source<W>(
    watcher: &W,
    source_path: &Path,
    inbox: WeakUnboundedSender<StoreCommand>,
) -> Result<WatchGuard, ConfigError>
where
    W: FsWatcher + ?Sized,
{
    let dir = watch_dir_for(source_path);
    let subscription = watcher.watch_dir(&dir).await?;
    let (mut events, subscription) = subscription.into_parts();

    info!(dir = %dir.display(), "watching config directory");

    let forwarder = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let Some(inbox) = inbox.upgrade() else {
                break;
            };

            if inbox.send(StoreCommand::FileChanged(event)).is_err() {
                break;
            }
        }

        debug!("file event forwarding ended");
    });

    Ok(WatchGuard {
        _subscription: subscription,
        forwarder,
    })
}

impl StoreState {
    /// Reacts to a filesystem event for the watched directory.
    ///
    /// A modification of the source file triggers exactly one reload whose
    /// failure is only logged, as no caller is waiting on it. Removal keeps
    /// the last good tree. Every other kind is ignored.
    pub(super) fn handle_file_event(&mut self, event: &FileEvent) {
        if !event.concerns(&self.source_path) {
            trace!(store = %self.name, paths = ?event.paths, "ignoring event for other file");
            return;
        }

        if event.kinds.contains(FileEventKinds::MODIFIED) {
            if let Err(e) = self.reload() {
                error!(
                    store = %self.name,
                    error = %e,
                    "reload after file change failed, keeping last good config"
                );
            }
        } else if event.kinds.contains(FileEventKinds::REMOVED) {
            warn!(
                store = %self.name,
                path = %self.source_path.display(),
                "config source removed, serving last good config"
            );
        } else {
            trace!(store = %self.name, kinds = ?event.kinds, "ignoring file event");
        }
    }
}

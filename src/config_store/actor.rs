use std::path::PathBuf;

use tokio::sync::{
    mpsc::{self, UnboundedReceiver, error::TrySendError},
    oneshot,
};
use tracing::{debug, info, warn};

use super::{
    ChangeSource, ConfigChange, ConfigError, ConfigPath, Value, diff::diff_trees,
    file_watcher::FileEvent, file_watching::WatchGuard, path_ops, value::load_document,
};

/// Requests processed by the store actor, strictly in arrival order.
pub(super) enum StoreCommand {
    /// Resolve a path against the current tree
    Get {
        path: ConfigPath,
        reply: oneshot::Sender<Option<Value>>,
    },
    /// Copy out the whole tree
    Snapshot { reply: oneshot::Sender<Value> },
    /// Assign an in-memory override
    Put {
        path: ConfigPath,
        value: Value,
        reply: oneshot::Sender<Result<(), ConfigError>>,
    },
    /// Reparse the source file
    Reload {
        reply: oneshot::Sender<Result<(), ConfigError>>,
    },
    /// Register a change subscriber
    Subscribe {
        id: usize,
        pattern: String,
        sender: mpsc::Sender<ConfigChange>,
    },
    /// Remove a change subscriber by ID
    Unsubscribe { id: usize },
    /// Filesystem change forwarded from the watcher
    FileChanged(FileEvent),
    /// Release the watcher and terminate
    Stop { reply: oneshot::Sender<()> },
}

/// Subscriber registered with the actor
struct ActorSubscription {
    id: usize,
    pattern: String,
    sender: mpsc::Sender<ConfigChange>,
}

/// State owned exclusively by the store actor task.
pub(super) struct StoreState {
    pub(super) name: String,
    tree: Value,
    pub(super) source_path: PathBuf,
    pub(super) watch_enabled: bool,
    watcher: Option<WatchGuard>,
    subscriptions: Vec<ActorSubscription>,
}

impl StoreState {
    pub(super) fn new(
        name: String,
        tree: Value,
        source_path: PathBuf,
        watcher: Option<WatchGuard>,
    ) -> Self {
        Self {
            name,
            tree,
            source_path,
            watch_enabled: watcher.is_some(),
            watcher,
            subscriptions: Vec::new(),
        }
    }

    /// Reparses the source file, replacing the tree only on success.
    pub(super) fn reload(&mut self) -> Result<(), ConfigError> {
        let new_tree = load_document(&self.source_path)?;
        let old_tree = std::mem::replace(&mut self.tree, new_tree);

        info!(
            store = %self.name,
            path = %self.source_path.display(),
            "config reloaded"
        );

        if !self.subscriptions.is_empty() {
            let changes = diff_trees(&old_tree, &self.tree, ChangeSource::Reload);
            self.broadcast(changes);
        }

        Ok(())
    }

    fn put(&mut self, path: &ConfigPath, value: Value) -> Result<(), ConfigError> {
        let old_tree = (!self.subscriptions.is_empty()).then(|| self.tree.clone());

        path_ops::assign(&mut self.tree, path, value)?;
        debug!(store = %self.name, path = %path, "config override applied");

        if let Some(old_tree) = old_tree {
            let changes = diff_trees(&old_tree, &self.tree, ChangeSource::Put);
            self.broadcast(changes);
        }

        Ok(())
    }

    /// Delivers changes to every subscriber whose pattern matches.
    ///
    /// Subscribers whose receiver is gone are dropped; a full subscriber
    /// misses the change.
    fn broadcast(&mut self, changes: Vec<ConfigChange>) {
        let store = &self.name;

        for change in changes {
            self.subscriptions.retain(|sub| {
                if !path_ops::path_matches(&change.path, &sub.pattern) {
                    return true;
                }

                match sub.sender.try_send(change.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        warn!(store = %store, subscriber = sub.id, path = %change.path, "subscriber lagging, change dropped");
                        true
                    }
                    Err(TrySendError::Closed(_)) => false,
                }
            });
        }
    }

    fn release_watcher(&mut self) {
        if self.watcher.take().is_some() {
            debug!(store = %self.name, "file watcher released");
        }
    }
}

/// The actor loop that owns the store state.
///
/// Commands are handled one at a time, so reads, overrides, reloads and
/// watcher events observe a total order matching their arrival. The loop ends
/// on `Stop` or once every store handle has been dropped; the watcher is
/// released either way.
pub(super) async fn store_actor_loop(
    mut state: StoreState,
    mut inbox: UnboundedReceiver<StoreCommand>,
) {
    while let Some(command) = inbox.recv().await {
        match command {
            StoreCommand::Get { path, reply } => {
                let value = path_ops::resolve(&state.tree, &path).cloned();
                let _ = reply.send(value);
            }

            StoreCommand::Snapshot { reply } => {
                let _ = reply.send(state.tree.clone());
            }

            StoreCommand::Put { path, value, reply } => {
                let _ = reply.send(state.put(&path, value));
            }

            StoreCommand::Reload { reply } => {
                let result = state.reload();
                if let Err(e) = &result {
                    warn!(store = %state.name, error = %e, "reload failed, keeping last good config");
                }
                let _ = reply.send(result);
            }

            StoreCommand::Subscribe {
                id,
                pattern,
                sender,
            } => {
                state.subscriptions.push(ActorSubscription {
                    id,
                    pattern,
                    sender,
                });
            }

            StoreCommand::Unsubscribe { id } => {
                state.subscriptions.retain(|sub| sub.id != id);
            }

            StoreCommand::FileChanged(event) => {
                state.handle_file_event(&event);
            }

            StoreCommand::Stop { reply } => {
                state.release_watcher();
                let _ = reply.send(());
                break;
            }
        }
    }

    state.release_watcher();
    info!(
        store = %state.name,
        watched = state.watch_enabled,
        "config store stopped"
    );
}

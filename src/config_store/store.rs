use std::{
    fmt,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::de::DeserializeOwned;
use tokio::sync::{
    mpsc::{self, UnboundedSender},
    oneshot,
};
use tracing::{info, instrument, warn};

use crate::config::StoreOptions;

use super::{
    ConfigError, ConfigPath, Subscription, Value,
    actor::{StoreCommand, StoreState, store_actor_loop},
    broadcast::SUBSCRIPTION_CAPACITY,
    file_watcher::{FsWatcher, NotifyWatcher},
    file_watching::watch_source,
    value::load_document,
};

/// Handle to a running configuration store.
///
/// The store owns one YAML-backed configuration tree inside a dedicated actor
/// task. Every operation on any clone of this handle is queued into the same
/// inbox and processed one at a time, so callers never observe a partially
/// applied reload or override.
///
/// The store stops when `stop` is called or when the last handle is dropped.
#[derive(Clone)]
pub struct ConfigStore {
    name: Arc<str>,
    source_path: Arc<Path>,
    watching: bool,
    inbox: UnboundedSender<StoreCommand>,
    next_subscription_id: Arc<AtomicUsize>,
}

impl ConfigStore {
    /// Starts a store for the file named in `options`.
    ///
    /// The initial parse happens before this returns. A missing or malformed
    /// file is logged and the store starts with an empty tree. When
    /// `watch_fs` is set, the directory containing the file is watched with
    /// the platform's native watcher.
    ///
    /// # Errors
    /// Returns `ConfigError::FileWatcherInit` or `ConfigError::FileWatch` if
    /// the watcher cannot be set up.
    pub async fn start(options: StoreOptions) -> Result<Self, ConfigError> {
        Self::start_with_watcher(options, NotifyWatcher).await
    }

    /// Starts a store using `watcher` as the filesystem watch capability.
    ///
    /// The watcher is only consulted when `options.watch_fs` is set.
    ///
    /// # Errors
    /// Returns any error the watcher reports while subscribing.
    #[instrument(skip_all, fields(store = options.display_name()))]
    pub async fn start_with_watcher<W>(options: StoreOptions, watcher: W) -> Result<Self, ConfigError>
    where
        W: FsWatcher,
    {
        let name = options.display_name().to_string();
        let source_path = options.config_file.clone();

        let tree = match load_document(&source_path) {
            Ok(tree) => {
                info!(path = %source_path.display(), "config loaded");
                tree
            }
            Err(e) => {
                warn!(error = %e, "initial config load failed, starting with empty config");
                Value::empty_mapping()
            }
        };

        let (inbox, inbox_rx) = mpsc::unbounded_channel();

        let watch_guard = if options.watch_fs {
            Some(watch_source(&watcher, &source_path, inbox.downgrade()).await?)
        } else {
            None
        };

        let state = StoreState::new(name.clone(), tree, source_path.clone(), watch_guard);
        tokio::spawn(store_actor_loop(state, inbox_rx));

        Ok(Self {
            name: Arc::from(name),
            source_path: Arc::from(source_path),
            watching: options.watch_fs,
            inbox,
            next_subscription_id: Arc::new(AtomicUsize::new(1)),
        })
    }

    /// The name this store is addressed by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing YAML file.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Whether the store reloads on filesystem changes.
    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Retrieves the value stored at `path`.
    ///
    /// A bare string is a single top-level key; pass a slice or array of keys
    /// for nested access.
    ///
    /// # Errors
    /// * `ConfigError::NotFound` - If any key along the path is missing, a step
    ///   goes through a non-mapping value, or the stored value is null
    /// * `ConfigError::StoreStopped` - If the store is no longer running
    pub async fn get(&self, path: impl Into<ConfigPath>) -> Result<Value, ConfigError> {
        let path = path.into();
        let value = self
            .request(|reply| StoreCommand::Get {
                path: path.clone(),
                reply,
            })
            .await?;

        value.ok_or_else(|| ConfigError::NotFound {
            path: path.to_string(),
        })
    }

    /// Retrieves a value the caller's contract guarantees is present.
    ///
    /// Only for values that must exist; use `get` for optional configuration.
    ///
    /// # Panics
    /// Panics if nothing is stored at `path` or the store has stopped.
    #[allow(clippy::panic)]
    pub async fn get_required(&self, path: impl Into<ConfigPath>) -> Value {
        match self.get(path).await {
            Ok(value) => value,
            Err(e) => panic!("required config value unavailable: {e}"),
        }
    }

    /// Retrieves the value at `path` deserialized into `T`.
    ///
    /// # Errors
    /// * `ConfigError::NotFound` - If nothing is stored at the path
    /// * `ConfigError::TypeMismatch` - If the value does not deserialize into `T`
    /// * `ConfigError::StoreStopped` - If the store is no longer running
    pub async fn get_as<T>(&self, path: impl Into<ConfigPath>) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let path = path.into();
        let value = self.get(path.clone()).await?;
        value.deserialize_into(&path)
    }

    /// Returns a copy of the whole configuration tree.
    ///
    /// # Errors
    /// Returns `ConfigError::StoreStopped` if the store is no longer running.
    pub async fn snapshot(&self) -> Result<Value, ConfigError> {
        self.request(|reply| StoreCommand::Snapshot { reply }).await
    }

    /// Sets an in-memory override at `path`.
    ///
    /// Missing intermediate mappings are created. The source file is never
    /// written, and the next reload discards the override.
    ///
    /// # Errors
    /// * `ConfigError::EmptyPath` - If the path has no keys
    /// * `ConfigError::StoreStopped` - If the store is no longer running
    pub async fn put(
        &self,
        path: impl Into<ConfigPath>,
        value: impl Into<Value>,
    ) -> Result<(), ConfigError> {
        let path = path.into();
        let value = value.into();

        self.request(|reply| StoreCommand::Put { path, value, reply })
            .await?
    }

    /// Re-reads and reparses the source file.
    ///
    /// On success the tree is replaced as a whole; on failure the previous
    /// tree stays in place and keeps being served.
    ///
    /// # Errors
    /// * `ConfigError::Io` - If the file cannot be read
    /// * `ConfigError::Parse` - If the file is not valid YAML
    /// * `ConfigError::StoreStopped` - If the store is no longer running
    pub async fn reload(&self) -> Result<(), ConfigError> {
        self.request(|reply| StoreCommand::Reload { reply }).await?
    }

    /// Subscribes to changes whose path matches `pattern`.
    ///
    /// Patterns are dot-separated keys where `*` matches any single key, and
    /// a pattern also matches every path below it (`"server"` matches
    /// `server.port`). Changes are produced by `put` and successful reloads.
    ///
    /// # Errors
    /// Returns `ConfigError::StoreStopped` if the store is no longer running.
    pub fn subscribe(&self, pattern: &str) -> Result<Subscription, ConfigError> {
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);

        self.inbox
            .send(StoreCommand::Subscribe {
                id,
                pattern: pattern.to_string(),
                sender,
            })
            .map_err(|_| self.stopped())?;

        Ok(Subscription::new(
            id,
            pattern.to_string(),
            self.inbox.downgrade(),
            receiver,
        ))
    }

    /// Stops the store and releases its file watcher.
    ///
    /// Requests queued before the stop are still answered; later requests on
    /// any clone of this handle fail with `ConfigError::StoreStopped`.
    ///
    /// # Errors
    /// Returns `ConfigError::StoreStopped` if the store had already stopped.
    #[instrument(skip_all, fields(store = %self.name))]
    pub async fn stop(self) -> Result<(), ConfigError> {
        self.request(|reply| StoreCommand::Stop { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> StoreCommand,
    ) -> Result<T, ConfigError> {
        let (reply, response) = oneshot::channel();

        self.inbox
            .send(command(reply))
            .map_err(|_| self.stopped())?;

        response.await.map_err(|_| self.stopped())
    }

    fn stopped(&self) -> ConfigError {
        ConfigError::StoreStopped {
            name: self.name.to_string(),
        }
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("name", &self.name)
            .field("source_path", &self.source_path)
            .field("watching", &self.watching)
            .finish()
    }
}


use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::{
    config::StoreOptions,
    config_store::{ConfigError, ConfigStore, FsWatcher, NotifyWatcher},
};

/// Registry of independent config stores addressed by name.
///
/// Each registered store has its own actor, tree and watcher; nothing is
/// shared between them. Cloning the registry shares the same set of stores.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: Arc<RwLock<HashMap<String, ConfigStore>>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a store and registers it under its name.
    ///
    /// # Errors
    /// * `ConfigError::DuplicateStore` - If a store with the same name is registered
    /// * Any error `ConfigStore::start` returns
    pub async fn start(&self, options: StoreOptions) -> Result<ConfigStore, ConfigError> {
        self.start_with_watcher(options, NotifyWatcher).await
    }

    /// Starts a store with an injected watcher and registers it under its name.
    ///
    /// # Errors
    /// * `ConfigError::DuplicateStore` - If a store with the same name is registered
    /// * Any error `ConfigStore::start_with_watcher` returns
    #[instrument(skip_all, fields(store = options.display_name()))]
    pub async fn start_with_watcher<W>(
        &self,
        options: StoreOptions,
        watcher: W,
    ) -> Result<ConfigStore, ConfigError>
    where
        W: FsWatcher,
    {
        let name = options.display_name().to_string();
        let mut stores = self.stores.write().await;

        if stores.contains_key(&name) {
            return Err(ConfigError::DuplicateStore { name });
        }

        let store = ConfigStore::start_with_watcher(options, watcher).await?;
        stores.insert(name, store.clone());

        Ok(store)
    }

    /// Returns a handle to the store registered under `name`.
    pub async fn get(&self, name: &str) -> Option<ConfigStore> {
        self.stores.read().await.get(name).cloned()
    }

    /// Names of all registered stores, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stops and unregisters the store named `name`.
    ///
    /// Returns `false` if no such store was registered.
    ///
    /// # Errors
    /// Returns `ConfigError::StoreStopped` if the store had already stopped.
    pub async fn stop(&self, name: &str) -> Result<bool, ConfigError> {
        let removed = self.stores.write().await.remove(name);

        match removed {
            Some(store) => {
                store.stop().await?;
                info!(store = name, "config store unregistered");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stops and unregisters every store.
    ///
    /// All stores are stopped even if some fail; the first failure is returned.
    ///
    /// # Errors
    /// Returns `ConfigError::StoreStopped` if a store had already stopped.
    pub async fn stop_all(&self) -> Result<(), ConfigError> {
        let stores: Vec<ConfigStore> = self
            .stores
            .write()
            .await
            .drain()
            .map(|(_, store)| store)
            .collect();

        let mut first_error = None;
        for store in stores {
            if let Err(e) = store.stop().await {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

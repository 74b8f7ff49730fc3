//! Store construction options and source file location.
//!
//! `StoreOptions` names the file a store is backed by and whether it follows
//! filesystem changes. Applications that ship a default configuration can
//! use `AppConfigLocator` to pick between a deployment root and the bundled
//! file.

mod paths;

#[cfg(test)]
mod tests;

pub use paths::AppConfigLocator;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name given to stores constructed without one.
pub const DEFAULT_STORE_NAME: &str = "default";

/// Options recognized when starting a config store.
///
/// Deserializable so hosts can embed them in their own configuration:
///
/// ```yaml
/// config_file: /etc/myapp/config.yml
/// watch_fs: true
/// name: myapp
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Path to the YAML source document.
    pub config_file: PathBuf,

    /// Reload automatically when the source file is modified.
    #[serde(default)]
    pub watch_fs: bool,

    /// Identity used to address this store among others in the process.
    #[serde(default)]
    pub name: Option<String>,
}

impl StoreOptions {
    /// Options for an unwatched, unnamed store backed by `config_file`.
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            watch_fs: false,
            name: None,
        }
    }

    /// Options for the file an application locator resolves to.
    pub fn for_app(locator: &AppConfigLocator) -> Self {
        Self::new(locator.resolve()).named(locator.app_name())
    }

    /// Enables or disables filesystem-driven reloads.
    pub fn watch(mut self, watch_fs: bool) -> Self {
        self.watch_fs = watch_fs;
        self
    }

    /// Sets the store's identity.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The store's identity, or `DEFAULT_STORE_NAME` when unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_STORE_NAME)
    }
}

impl From<PathBuf> for StoreOptions {
    fn from(config_file: PathBuf) -> Self {
        Self::new(config_file)
    }
}

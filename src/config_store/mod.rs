//! YAML-backed configuration store with live reload.
//!
//! A `ConfigStore` owns one parsed YAML document in a dedicated actor task,
//! serves nested lookups and in-memory overrides, and optionally reloads the
//! document when the file changes on disk.

mod actor;
mod broadcast;
mod changes;
mod diff;
mod file_watcher;
mod file_watching;
mod path_ops;
mod store;
mod value;

#[cfg(test)]
mod tests;

pub use broadcast::Subscription;
pub use changes::{ChangeSource, ConfigChange, ConfigError};
pub use diff::diff_trees;
pub use file_watcher::{FileEvent, FileEventKinds, FsWatcher, NotifyWatcher, WatchSubscription};
pub use path_ops::{assign, resolve};
pub use store::ConfigStore;
pub use value::{ConfigPath, Mapping, Value, load_document, parse_document};

/// A specialized `Result` type for config store operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

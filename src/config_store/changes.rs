use std::{
    fmt,
    path::{Path, PathBuf},
    time::Instant,
};

use serde::de::DeserializeOwned;

use super::{ConfigPath, Value};

/// What caused a configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// An in-memory override through `put`
    Put,
    /// A reparse of the source file, explicit or triggered by the watcher
    Reload,
}

/// A single field-level change in the configuration tree.
///
/// Produced by diffing the tree before and after a `put` or a reload and
/// delivered to matching subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChange {
    /// Location of the changed node.
    pub path: ConfigPath,
    /// The previous value, `None` if the key did not exist.
    pub old_value: Option<Value>,
    /// The new value, `None` if the key was removed.
    pub new_value: Option<Value>,
    /// What caused the change.
    pub source: ChangeSource,
    /// When the change was observed.
    pub timestamp: Instant,
}

impl ConfigChange {
    /// Creates a new configuration change stamped with the current time.
    pub fn new(
        path: ConfigPath,
        old_value: Option<Value>,
        new_value: Option<Value>,
        source: ChangeSource,
    ) -> Self {
        Self {
            path,
            old_value,
            new_value,
            source,
            timestamp: Instant::now(),
        }
    }

    /// Whether the change removed the key.
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }

    /// Extracts the new value as a specific type.
    ///
    /// # Errors
    /// Returns `ConfigError::NotFound` if the key was removed and
    /// `ConfigError::TypeMismatch` if the value does not deserialize into `T`.
    pub fn extract<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        match &self.new_value {
            Some(value) => value.deserialize_into(&self.path),
            None => Err(ConfigError::NotFound {
                path: self.path.to_string(),
            }),
        }
    }
}

/// Errors that can occur during configuration store operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Nothing is stored at the requested path.
    #[error("no config value at '{path}'")]
    NotFound {
        /// The path that was looked up
        path: String,
    },

    /// A write was attempted with a path that has no keys.
    #[error("cannot assign to an empty config path")]
    EmptyPath,

    /// The source document is not valid YAML.
    #[error("failed to parse YAML from '{path}': {details}")]
    Parse {
        /// File the document was read from
        path: PathBuf,
        /// Parse error details
        details: String,
    },

    /// The source document could not be read.
    #[error("I/O error on '{path}': {details}")]
    Io {
        /// Path where the I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("failed to initialize file watcher: {details}")]
    FileWatcherInit {
        /// File watcher initialization error details
        details: String,
    },

    /// The watcher reported an error for a watched path.
    #[error("file watcher error for '{path}': {details}")]
    FileWatch {
        /// Path being watched when the error occurred
        path: PathBuf,
        /// File watcher error details
        details: String,
    },

    /// A value exists but does not convert into the requested type.
    #[error("type mismatch at '{path}': expected {expected_type}, {details}")]
    TypeMismatch {
        /// The path of the value
        path: String,
        /// The requested type name
        expected_type: &'static str,
        /// Deserializer error details
        details: String,
    },

    /// The store's actor has terminated.
    #[error("config store '{name}' is stopped")]
    StoreStopped {
        /// Name of the stopped store
        name: String,
    },

    /// A store with this name is already registered.
    #[error("config store '{name}' is already registered")]
    DuplicateStore {
        /// The conflicting name
        name: String,
    },
}

impl ConfigError {
    /// Creates a parse error for a document read from `path`.
    pub fn parse(error: impl fmt::Display, path: &Path) -> Self {
        ConfigError::Parse {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }

    /// Creates an I/O error for `path`.
    pub fn io(error: impl fmt::Display, path: &Path) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }

    /// Whether this is the normal "nothing stored here" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}

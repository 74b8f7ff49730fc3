//! Confkeeper - process-local YAML configuration store.
//!
//! Loads a YAML document into an in-memory tree owned by a single actor task
//! and serves nested lookups, ephemeral overrides and reloads through it. The
//! main features include:
//!
//! - Path-based access into nested mappings (`["server", "port"]`)
//! - In-memory overrides that are never written back to disk
//! - Optional reload on file modification via a directory watch
//! - Change subscriptions filtered by path pattern
//! - Named stores for hosting several independent configurations
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use confkeeper::{config::StoreOptions, config_store::ConfigStore};
//!
//! # async fn run() -> confkeeper::Result<()> {
//! let store = ConfigStore::start(StoreOptions::new("config/app.yml").watch(true)).await?;
//!
//! let port = store.get(["server", "port"]).await?;
//! store.put(["feature", "beta"], true).await?;
//! # Ok(())
//! # }
//! ```

/// Store construction options and source file location.
pub mod config;

/// YAML-backed configuration store with live reload.
pub mod config_store;

/// Registry of named config stores.
pub mod store_registry;

/// Tracing subscriber setup for host processes.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use config_store::{ConfigError, ConfigPath, ConfigStore, Result, Value};
pub use store_registry::StoreRegistry;

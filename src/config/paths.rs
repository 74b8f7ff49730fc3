use std::{
    env,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

/// Locates an application's configuration file
///
/// The file lives at `<root>/config/<app>.yml`, where the root comes from an
/// environment variable (default `<APP>_ROOT`, upper-cased with dashes turned
/// into underscores) and falls back to the current directory. When that file
/// does not exist, the default shipped with the application is used instead.
///
/// ```no_run
/// use confkeeper::config::AppConfigLocator;
///
/// let locator = AppConfigLocator::new("billing")
///     .bundled(concat!(env!("CARGO_MANIFEST_DIR"), "/config/billing.yml"));
/// let path = locator.resolve();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfigLocator {
    app_name: String,
    root_env: String,
    bundled: Option<PathBuf>,
}

impl AppConfigLocator {
    /// Creates a locator for `app_name` reading the root from `<APP>_ROOT`.
    pub fn new(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        let root_env = format!("{}_ROOT", app_name.to_uppercase().replace('-', "_"));

        Self {
            app_name,
            root_env,
            bundled: None,
        }
    }

    /// Overrides the environment variable naming the root directory.
    pub fn root_env(mut self, var: impl Into<String>) -> Self {
        self.root_env = var.into();
        self
    }

    /// Sets the default file shipped with the application.
    pub fn bundled(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundled = Some(path.into());
        self
    }

    /// The application name.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The environment variable consulted for the root directory.
    pub fn root_env_var(&self) -> &str {
        &self.root_env
    }

    /// Returns the root directory: the environment override, else the
    /// current directory.
    pub fn root(&self) -> Option<PathBuf> {
        env::var_os(&self.root_env)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
    }

    /// Returns the root-relative candidate path, whether or not it exists.
    pub fn candidate(&self) -> Option<PathBuf> {
        self.root().map(|root| self.relative_to(&root))
    }

    /// Resolves the configuration file to load.
    ///
    /// Prefers the root-relative file when it exists, then the bundled
    /// default. Without a bundled default, the candidate is returned even if
    /// missing so the store starts empty and logs why.
    pub fn resolve(&self) -> PathBuf {
        let candidate = self.candidate();

        if let Some(path) = candidate.as_ref().filter(|path| path.exists()) {
            debug!(app = %self.app_name, path = %path.display(), "using root config file");
            return path.clone();
        }

        match &self.bundled {
            Some(bundled) => {
                info!(
                    app = %self.app_name,
                    candidate = ?candidate,
                    bundled = %bundled.display(),
                    "config file not found under root, using bundled default"
                );
                bundled.clone()
            }
            None => candidate.unwrap_or_else(|| self.relative_to(Path::new("."))),
        }
    }

    fn relative_to(&self, root: &Path) -> PathBuf {
        root.join("config").join(format!("{}.yml", self.app_name))
    }
}

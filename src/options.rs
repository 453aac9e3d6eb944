//! Caller-facing configuration of the resolution pass itself: which
//! providers, which prefix, which validators and hooks, what to watch.
//!
//! `Options` is a chained builder ending in [`load`](Options::load) for
//! one-shot use, or handed to [`Loader::new`](crate::Loader::new) for the
//! reloadable path:
//!
//! ```ignore
//! let config: AppConfig = Options::new()
//!     .provider(DefaultsProvider::<AppConfig>::new())
//!     .provider(FileProvider::new("config.json"))
//!     .provider(EnvProvider)
//!     .prefix("app")
//!     .load()?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::HotfigError;
use crate::keymap::{KeyMapper, ScreamingSnake};
use crate::provider::{DefaultsProvider, EnvProvider, FileProvider, Provider};
use crate::record::Record;
use crate::resolve::resolve;

/// Caller-supplied whole-record validator.
pub type ValidatorFn<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;
/// Reload hook: receives the old and the new instance.
pub type ReloadFn<T> = Arc<dyn Fn(Arc<T>, Arc<T>) + Send + Sync>;
/// Reload-failure hook.
pub type ReloadErrorFn = Arc<dyn Fn(&HotfigError) + Send + Sync>;

#[derive(Debug, Clone)]
pub(crate) struct WatchTarget {
    pub(crate) path: PathBuf,
    pub(crate) every: Duration,
}

pub struct Options<T> {
    pub(crate) providers: Vec<Box<dyn Provider>>,
    pub(crate) prefix: Option<String>,
    pub(crate) mapper: Arc<dyn KeyMapper>,
    pub(crate) validator: Option<ValidatorFn<T>>,
    pub(crate) on_reload: Option<ReloadFn<T>>,
    pub(crate) on_reload_error: Option<ReloadErrorFn>,
    pub(crate) watch: Option<WatchTarget>,
}

impl<T: Record + 'static> Options<T> {
    /// Start empty. With no providers configured, resolution uses the
    /// implicit stack `[DefaultsProvider<T>, EnvProvider]`.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            prefix: None,
            mapper: Arc::new(ScreamingSnake),
            validator: None,
            on_reload: None,
            on_reload_error: None,
            watch: None,
        }
    }

    /// The conventional stack for a service: annotation defaults, a `.env`
    /// file in the working directory, then the process environment on top.
    pub fn from_env() -> Self {
        Self::new()
            .provider(DefaultsProvider::<T>::new())
            .provider(FileProvider::new(".env"))
            .provider(EnvProvider)
    }

    /// Append a provider. Order is priority: later providers override
    /// earlier ones key-by-key.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Qualify every lookup key with `<PREFIX>_`. Stored uppercased; an
    /// empty prefix means no prefixing. When a prefix is configured,
    /// unprefixed keys from prefix-aware sources are ignored entirely.
    pub fn prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.to_uppercase();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Swap the field-name mapper. Pair with
    /// [`DefaultsProvider::with_mapper`] if the defaults provider is in the
    /// stack explicitly.
    pub fn mapper(mut self, mapper: impl KeyMapper + 'static) -> Self {
        self.mapper = Arc::new(mapper);
        self
    }

    /// Whole-record validator, run after the required check.
    pub fn validator(mut self, validate: impl Fn(&T) -> Result<(), String> + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validate));
        self
    }

    /// Called with `(old, new)` after the watcher swaps in a semantically
    /// different instance. Runs on its own task, never under the loader's
    /// write lock.
    pub fn on_reload(mut self, hook: impl Fn(Arc<T>, Arc<T>) + Send + Sync + 'static) -> Self {
        self.on_reload = Some(Arc::new(hook));
        self
    }

    /// Called when a watcher-triggered resolution fails. The held instance
    /// stays untouched and polling continues.
    pub fn on_reload_error(mut self, hook: impl Fn(&HotfigError) + Send + Sync + 'static) -> Self {
        self.on_reload_error = Some(Arc::new(hook));
        self
    }

    /// Watch `path` for modification-time changes every `every`, once
    /// [`Loader::start_watching`](crate::Loader::start_watching) is called.
    pub fn watch(mut self, path: impl Into<PathBuf>, every: Duration) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        self.watch = Some(WatchTarget { path, every });
        self
    }

    /// One-shot resolution: merge providers, bind, validate. Stateless;
    /// nothing is retained between calls.
    pub fn load(&self) -> Result<T, HotfigError> {
        resolve(self)
    }

    /// [`load`](Options::load), panicking on failure. For callers that
    /// prefer fail-fast startup over error plumbing.
    pub fn must_load(&self) -> T {
        match self.load() {
            Ok(config) => config,
            Err(err) => panic!("hotfig: failed to load configuration: {err}"),
        }
    }
}

impl<T: Record + 'static> Default for Options<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;
    use crate::provider::MapProvider;

    #[test]
    fn prefix_is_uppercased_and_empty_means_none() {
        let options = Options::<TestConfig>::new().prefix("app");
        assert_eq!(options.prefix.as_deref(), Some("APP"));
        let options = Options::<TestConfig>::new().prefix("");
        assert_eq!(options.prefix, None);
    }

    #[test]
    fn watch_target_is_absolutized() {
        let options =
            Options::<TestConfig>::new().watch("config.json", Duration::from_secs(5));
        assert!(options.watch.as_ref().unwrap().path.is_absolute());
    }

    #[test]
    fn from_env_stacks_defaults_dotenv_and_environment() {
        let options = Options::<TestConfig>::from_env();
        assert_eq!(options.providers.len(), 3);
    }

    #[test]
    fn must_load_returns_config() {
        let config = Options::<TestConfig>::new()
            .provider(DefaultsProvider::<TestConfig>::new())
            .must_load();
        assert_eq!(config.port, 8080);
    }

    #[test]
    #[should_panic(expected = "failed to load configuration")]
    fn must_load_panics_on_error() {
        let _ = Options::<TestConfig>::new()
            .provider(MapProvider::new([("PORT", "not-a-port")]))
            .must_load();
    }
}

//! The reloadable loader: a concurrency-safe holder for the latest resolved
//! instance plus its version, and the watch-cycle state machine.
//!
//! Readers go through an [`arc-swap`](arc_swap) cell holding one allocation
//! with both the instance and its version, so `get`/`version`/`snapshot`
//! are wait-free and can never observe a torn pair. Writers (the explicit
//! [`load`](Loader::load) and the background watcher) serialize on a small
//! mutex held only for the swap itself; resolution (provider I/O, binding,
//! validation) always runs outside it.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::HotfigError;
use crate::options::Options;
use crate::record::Record;
use crate::resolve::resolve;
use crate::watch;

pub(crate) struct Snapshot<T> {
    pub(crate) config: Arc<T>,
    pub(crate) version: u64,
}

/// A successful watcher swap: the displaced instance, its replacement, and
/// the new version.
pub(crate) struct Swapped<T> {
    pub(crate) old: Option<Arc<T>>,
    pub(crate) new: Arc<T>,
    pub(crate) version: u64,
}

/// State shared between the loader handle and the watch task.
pub(crate) struct Shared<T: Record> {
    pub(crate) options: Options<T>,
    current: ArcSwapOption<Snapshot<T>>,
    swap: Mutex<()>,
}

impl<T: Record + 'static> Shared<T> {
    pub(crate) fn resolve_once(&self) -> Result<T, HotfigError> {
        resolve(&self.options)
    }

    pub(crate) fn version(&self) -> u64 {
        self.current.load().as_ref().map_or(0, |snapshot| snapshot.version)
    }

    pub(crate) fn get(&self) -> Option<Arc<T>> {
        self.current.load().as_ref().map(|snapshot| snapshot.config.clone())
    }

    pub(crate) fn snapshot(&self) -> Option<(Arc<T>, u64)> {
        self.current
            .load()
            .as_ref()
            .map(|snapshot| (snapshot.config.clone(), snapshot.version))
    }

    /// Swap in unconditionally, incrementing the version. The explicit
    /// `load()` path: a caller-requested resolution is always a new version,
    /// identical content or not.
    pub(crate) fn swap_in(&self, config: T) -> (Arc<T>, u64) {
        let _guard = self.swap.lock().unwrap_or_else(PoisonError::into_inner);
        let version = self.version() + 1;
        let config = Arc::new(config);
        self.current.store(Some(Arc::new(Snapshot {
            config: config.clone(),
            version,
        })));
        (config, version)
    }

    /// Swap in only if the new instance differs structurally from the held
    /// one. The watcher path: a no-op reload keeps the version untouched.
    pub(crate) fn swap_if_changed(&self, config: T) -> Option<Swapped<T>>
    where
        T: PartialEq,
    {
        let _guard = self.swap.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load_full();
        if let Some(current) = &current
            && *current.config == config
        {
            return None;
        }
        let version = current.as_ref().map_or(0, |snapshot| snapshot.version) + 1;
        let new = Arc::new(config);
        self.current.store(Some(Arc::new(Snapshot {
            config: new.clone(),
            version,
        })));
        Some(Swapped {
            old: current.map(|snapshot| snapshot.config.clone()),
            new,
            version,
        })
    }

    pub(crate) fn report_reload_error(&self, err: &HotfigError) {
        tracing::error!(error = %err, "configuration reload failed");
        if let Some(hook) = &self.options.on_reload_error {
            hook(err);
        }
    }
}

struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A hot-reloadable configuration holder.
///
/// ```ignore
/// let loader = Loader::new(
///     Options::<AppConfig>::new()
///         .provider(FileProvider::new("config.json"))
///         .watch("config.json", Duration::from_secs(5)),
/// );
/// let config = loader.load()?;
/// loader.start_watching()?;
/// // ... loader.get() always returns the latest validated instance
/// loader.stop_watching().await;
/// ```
pub struct Loader<T: Record> {
    shared: Arc<Shared<T>>,
    watching: Mutex<Option<WatchHandle>>,
}

impl<T: Record + 'static> Loader<T> {
    pub fn new(options: Options<T>) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                current: ArcSwapOption::empty(),
                swap: Mutex::new(()),
            }),
            watching: Mutex::new(None),
        }
    }

    /// Run one resolution pass and swap the result in.
    ///
    /// Resolution happens outside any lock, so concurrent readers are never
    /// blocked on provider I/O. On success the version increments
    /// unconditionally; on failure the held instance and version are left
    /// untouched.
    pub fn load(&self) -> Result<Arc<T>, HotfigError> {
        let resolved = self.shared.resolve_once()?;
        let (config, version) = self.shared.swap_in(resolved);
        tracing::debug!(version, "configuration loaded");
        Ok(config)
    }

    /// [`load`](Loader::load), panicking on failure.
    pub fn must_load(&self) -> Arc<T> {
        match self.load() {
            Ok(config) => config,
            Err(err) => panic!("hotfig: failed to load configuration: {err}"),
        }
    }

    /// The most recently swapped-in instance, or `None` before the first
    /// successful load. Wait-free; never touches provider I/O.
    pub fn get(&self) -> Option<Arc<T>> {
        self.shared.get()
    }

    /// The current version: 0 before the first success, then strictly
    /// increasing with each successful swap.
    pub fn version(&self) -> u64 {
        self.shared.version()
    }

    /// Instance and version as one consistent pair; both always come from
    /// the same successful resolution.
    pub fn snapshot(&self) -> Option<(Arc<T>, u64)> {
        self.shared.snapshot()
    }
}

impl<T> Loader<T>
where
    T: Record + PartialEq + Send + Sync + 'static,
{
    /// Start the background poll cycle. Must be called within a Tokio
    /// runtime.
    ///
    /// No-op when already watching, and when no watch target is configured
    /// (watching was simply not requested). Fails on a zero poll interval,
    /// and when no instance is held yet and the initial load fails; that
    /// failure is also reported through the reload-error hook, and the
    /// loader stays idle.
    pub fn start_watching(&self) -> Result<(), HotfigError> {
        let mut watching = self
            .watching
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if watching.is_some() {
            return Ok(());
        }

        let Some(target) = self.shared.options.watch.clone() else {
            return Ok(());
        };
        if target.every.is_zero() {
            tracing::error!("watch interval must be greater than zero");
            return Err(HotfigError::InvalidPollInterval);
        }

        if self.shared.get().is_none() {
            match self.shared.resolve_once() {
                Ok(config) => {
                    self.shared.swap_in(config);
                }
                Err(err) => {
                    self.shared.report_reload_error(&err);
                    return Err(err);
                }
            }
        }

        let baseline = std::fs::metadata(&target.path)
            .and_then(|meta| meta.modified())
            .ok();
        let cancel = CancellationToken::new();
        tracing::debug!(
            path = %target.path.display(),
            every = ?target.every,
            "configuration watcher started"
        );
        let task = tokio::spawn(watch::run(
            self.shared.clone(),
            target,
            cancel.clone(),
            baseline,
        ));
        *watching = Some(WatchHandle { cancel, task });
        Ok(())
    }

    /// Stop watching and wait for the background task, including any
    /// in-flight reload callbacks, to finish. After this returns, no reload
    /// callback will fire. Idempotent; a no-op when not watching.
    pub async fn stop_watching(&self) {
        let handle = self
            .watching
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(WatchHandle { cancel, task }) = handle else {
            return;
        };
        cancel.cancel();
        let _ = task.await;
        tracing::debug!("configuration watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;
    use crate::provider::{DefaultsProvider, MapProvider};

    fn defaults_only() -> Options<TestConfig> {
        Options::new().provider(DefaultsProvider::<TestConfig>::new())
    }

    #[test]
    fn version_zero_and_empty_before_first_load() {
        let loader = Loader::new(defaults_only());
        assert_eq!(loader.version(), 0);
        assert!(loader.get().is_none());
        assert!(loader.snapshot().is_none());
    }

    #[test]
    fn load_establishes_version_one() {
        let loader = Loader::new(defaults_only());
        let config = loader.load().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(loader.version(), 1);
        assert_eq!(loader.get().unwrap().port, 8080);
    }

    #[test]
    fn explicit_load_always_increments_even_when_unchanged() {
        let loader = Loader::new(defaults_only());
        loader.load().unwrap();
        loader.load().unwrap();
        loader.load().unwrap();
        assert_eq!(loader.version(), 3);
    }

    #[test]
    fn failed_load_leaves_state_untouched() {
        let loader = Loader::new(
            Options::<TestConfig>::new().provider(MapProvider::new([("PORT", "8080")])),
        );
        loader.load().unwrap();
        assert_eq!(loader.version(), 1);

        let bad = Loader::new(
            Options::<TestConfig>::new().provider(MapProvider::new([("PORT", "oops")])),
        );
        assert!(bad.load().is_err());
        assert_eq!(bad.version(), 0);
        assert!(bad.get().is_none());
    }

    #[test]
    fn snapshot_pairs_instance_with_version() {
        let loader = Loader::new(defaults_only());
        loader.load().unwrap();
        let (config, version) = loader.snapshot().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(version, 1);
    }

    #[test]
    fn watcher_swap_skips_identical_instance() {
        let loader = Loader::new(defaults_only());
        loader.load().unwrap();

        let same = loader.shared.resolve_once().unwrap();
        assert!(loader.shared.swap_if_changed(same).is_none());
        assert_eq!(loader.version(), 1);

        let mut different = loader.shared.resolve_once().unwrap();
        different.port = 9999;
        let swapped = loader.shared.swap_if_changed(different).unwrap();
        assert_eq!(swapped.version, 2);
        assert_eq!(swapped.old.unwrap().port, 8080);
        assert_eq!(swapped.new.port, 9999);
        assert_eq!(loader.version(), 2);
    }

    #[test]
    fn concurrent_readers_see_consistent_pairs() {
        let loader = Arc::new(Loader::new(defaults_only()));
        loader.load().unwrap();

        let reader = {
            let loader = loader.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    if let Some((config, version)) = loader.snapshot() {
                        // Every version corresponds to one fully validated
                        // instance; the pair can never tear.
                        assert!(version >= 1);
                        assert_eq!(config.port, 8080);
                    }
                }
            })
        };

        for _ in 0..50 {
            loader.load().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(loader.version(), 51);
    }
}

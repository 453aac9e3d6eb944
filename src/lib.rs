//! Layered, hot-reloadable typed configuration. Define a record, stack your
//! sources, and go.
//!
//! ```ignore
//! hotfig::record! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct AppConfig {
//!         pub host: String [default = "localhost"],
//!         pub port: u16 [default = "8080"],
//!         pub database_url: String [required],
//!         pub api_key: String [required, secret],
//!         pub timeout: std::time::Duration [default = "30s"],
//!     }
//! }
//!
//! let config: AppConfig = hotfig::Options::new().load()?;
//! ```
//!
//! With no providers configured, that call reads `default = "..."`
//! annotations and the process environment: `database_url` loads from
//! `DATABASE_URL`, `api_key` from `API_KEY`. Field names canonicalize with
//! acronym-aware boundaries, so a hand-written `Record` impl can expose
//! `DatabaseURL` or `HTTPServer` and land on `DATABASE_URL` / `HTTP_SERVER`
//! all the same.
//!
//! # Layering
//!
//! Configuration is resolved from an ordered provider stack; each layer is
//! sparse and later layers win key-by-key:
//!
//! ```ignore
//! let config: AppConfig = Options::new()
//!     .provider(DefaultsProvider::<AppConfig>::new()) // annotations
//!     .provider(FileProvider::new("app.json"))        // file overrides defaults
//!     .provider(EnvProvider)                          // env overrides file
//!     .prefix("app")
//!     .load()?;
//! ```
//!
//! Every provider flattens to the same currency: canonical upper-snake keys
//! mapped to a small closed [`Value`] set. Custom sources implement
//! [`Provider`] in a dozen lines.
//!
//! # Prefixing
//!
//! With `.prefix("app")`, lookups use `APP_`-qualified keys. Sources that
//! spell keys out unprefixed (defaults, files, maps) are qualified by the
//! merger; the process environment is taken literally: `APP_PORT` binds,
//! a stray `PORT` is ignored. Environment-variable contracts stay exact.
//!
//! # Validation
//!
//! Three checks, in order, first failure wins: `required` annotations
//! (zero-value detection), the [`Options::validator`] callback, and the
//! record's own [`Record::validate`]. Failures carry the offending
//! canonical key where one exists.
//!
//! # Hot reload
//!
//! [`Loader`] holds the latest validated instance behind an
//! [`arc-swap`](arc_swap) cell and can poll a file's modification time in
//! the background:
//!
//! ```ignore
//! let loader = Loader::new(
//!     Options::<AppConfig>::new()
//!         .provider(FileProvider::new("app.json"))
//!         .watch("app.json", Duration::from_secs(5))
//!         .on_reload(|old, new| tracing::info!(?old, ?new, "config changed")),
//! );
//! loader.start_watching()?;                 // needs a Tokio runtime
//! let config = loader.get();                // wait-free, always consistent
//! loader.stop_watching().await;             // joins; no late callbacks
//! ```
//!
//! An explicit [`Loader::load`] always bumps the version, even when nothing
//! changed: the caller asked, the caller gets a new generation. The
//! watcher is pickier: it re-resolves on a timestamp change but swaps and
//! notifies only when the result differs structurally from the held
//! instance, so `touch`-style writes stay invisible to subscribers.
//!
//! Failed reloads never disturb the held instance: they are reported
//! through [`Options::on_reload_error`] and the `tracing` events this crate
//! emits, and the next poll tick tries again.

pub mod error;

mod bind;
mod coerce;
mod keymap;
mod loader;
mod merge;
mod options;
mod print;
mod provider;
mod record;
mod resolve;
mod validate;
mod value;
mod watch;

#[cfg(test)]
mod fixtures;

pub use coerce::{CoerceError, FromValue};
pub use error::HotfigError;
pub use keymap::{KeyMapper, ScreamingSnake};
pub use loader::Loader;
pub use options::{Options, ReloadErrorFn, ReloadFn, ValidatorFn};
pub use print::{print, print_to, render};
pub use provider::{DefaultsProvider, EnvProvider, FileProvider, MapProvider, Provider};
pub use record::{FieldMeta, FieldVisitor, Record};
pub use value::{FlatMap, Value};

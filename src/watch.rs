//! The background poll loop behind [`Loader::start_watching`](crate::Loader::start_watching).
//!
//! Change detection is modification-timestamp comparison only: a tick that
//! cannot stat the target observes no change and the loop keeps going. A
//! failed re-resolution is reported out-of-band and never touches the held
//! instance; the next tick is the retry mechanism. Reload hooks run on their
//! own tasks and are drained before the loop task exits, which is what lets
//! `stop_watching` promise that no hook fires after it returns.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::loader::Shared;
use crate::options::WatchTarget;
use crate::record::Record;

pub(crate) async fn run<T>(
    shared: Arc<Shared<T>>,
    target: WatchTarget,
    cancel: CancellationToken,
    mut last_seen: Option<SystemTime>,
) where
    T: Record + PartialEq + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(target.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut callbacks = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Reap hook tasks that have already finished.
        while callbacks.try_join_next().is_some() {}

        let modified = match std::fs::metadata(&target.path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if last_seen.is_some_and(|seen| modified <= seen) {
            continue;
        }
        last_seen = Some(modified);

        match shared.resolve_once() {
            Err(err) => shared.report_reload_error(&err),
            Ok(config) => match shared.swap_if_changed(config) {
                None => {
                    tracing::debug!(
                        path = %target.path.display(),
                        "watched file changed but configuration did not"
                    );
                }
                Some(swapped) => {
                    tracing::info!(version = swapped.version, "configuration reloaded");
                    if let (Some(old), Some(hook)) =
                        (swapped.old, shared.options.on_reload.clone())
                    {
                        let new = swapped.new;
                        callbacks.spawn(async move { hook(old, new) });
                    }
                }
            },
        }
    }

    while callbacks.join_next().await.is_some() {}
}

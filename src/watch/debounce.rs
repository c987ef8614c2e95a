// src/watch/debounce.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::errors::{DevloopError, Result};
use crate::project::FileSet;
use crate::project::evaluator::normalize_lexically;
use crate::types::ChangeEvent;
use crate::watch::event::WatchSignal;
use crate::watch::watcher::WatchOutcome;

/// Wait for the first burst of changes to members of `set` and return its
/// last event once `quiet` has passed without another qualifying event.
///
/// Events for paths outside the set neither arm nor reset the timer.
/// Cancellation wins over a pending change.
pub async fn debounce(
    rx: &mut UnboundedReceiver<WatchSignal>,
    set: &FileSet,
    quiet: Duration,
    cancel: &CancellationToken,
) -> Result<WatchOutcome> {
    let mut pending: Option<ChangeEvent> = None;
    let timer = tokio::time::sleep(quiet);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("observation cancelled");
                return Ok(WatchOutcome::Cancelled);
            }

            _ = &mut timer, if pending.is_some() => {
                if let Some(change) = pending.take() {
                    debug!(path = %change.path.display(), kind = ?change.kind, "debounced change");
                    return Ok(WatchOutcome::Changed(change));
                }
            }

            signal = rx.recv() => match signal {
                Some(WatchSignal::Change(change)) => {
                    if !is_member(set, &change.path) {
                        trace!(path = %change.path.display(), "ignoring change outside file set");
                        continue;
                    }
                    trace!(path = %change.path.display(), kind = ?change.kind, "qualifying change");
                    pending = Some(change);
                    timer.as_mut().reset(Instant::now() + quiet);
                }
                Some(WatchSignal::Error { path, message }) => {
                    return Err(DevloopError::watch_setup(
                        path.unwrap_or_else(|| fallback_path(set)),
                        message,
                    ));
                }
                None => {
                    return Err(DevloopError::watch_setup(
                        fallback_path(set),
                        "file watcher stopped delivering events",
                    ));
                }
            },
        }
    }
}

fn is_member(set: &FileSet, path: &Path) -> bool {
    set.contains(path) || set.contains(&normalize_lexically(path))
}

fn fallback_path(set: &FileSet) -> PathBuf {
    set.directories()
        .into_iter()
        .next()
        .unwrap_or_else(|| PathBuf::from("."))
}

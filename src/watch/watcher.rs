// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use notify::{Config, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::{DevloopError, Result};
use crate::project::FileSet;
use crate::types::ChangeEvent;
use crate::watch::debounce::debounce;
use crate::watch::event::WatchSignal;

/// Result of observing one file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    Changed(ChangeEvent),
    Cancelled,
}

/// Something that can wait for the next relevant change to a file set.
///
/// The watch loop holds one observer for its whole lifetime and calls
/// `observe` once per iteration with that iteration's file set.
pub trait ChangeObserver: Send {
    fn observe<'a>(
        &'a mut self,
        set: &'a FileSet,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<WatchOutcome>> + Send + 'a>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    pub debounce: Duration,
    pub use_polling: bool,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            use_polling: false,
            poll_interval: Duration::from_millis(1_000),
        }
    }
}

/// [`ChangeObserver`] backed by `notify`.
///
/// A fresh subscription is made for every `observe` call and dropped when it
/// returns, so nothing is watched while the loop is stopping or resolving.
#[derive(Debug, Clone, Default)]
pub struct FileWatcher {
    options: WatchOptions,
}

impl FileWatcher {
    pub fn new(options: WatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Subscribe to every directory holding a member of `set`.
    ///
    /// The returned watcher must be kept alive for as long as events are
    /// wanted.
    fn subscribe(
        &self,
        set: &FileSet,
        tx: mpsc::UnboundedSender<WatchSignal>,
    ) -> Result<Box<dyn Watcher + Send>> {
        // Runs on notify's thread; the receiver going away just means the
        // observation already finished.
        let handler = move |res: notify::Result<notify::Event>| {
            for signal in WatchSignal::from_notify(res) {
                if tx.send(signal).is_err() {
                    break;
                }
            }
        };

        let directories = set.directories();
        let first_dir = backend_error_path(&directories);

        let mut watcher: Box<dyn Watcher + Send> = if self.options.use_polling {
            let config = Config::default().with_poll_interval(self.options.poll_interval);
            Box::new(
                PollWatcher::new(handler, config)
                    .map_err(|e| DevloopError::watch_setup(&first_dir, e.to_string()))?,
            )
        } else {
            Box::new(
                RecommendedWatcher::new(handler, Config::default())
                    .map_err(|e| DevloopError::watch_setup(&first_dir, e.to_string()))?,
            )
        };

        for dir in &directories {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| DevloopError::watch_setup(dir, e.to_string()))?;
        }

        info!(
            directories = directories.len(),
            files = set.len(),
            polling = self.options.use_polling,
            "watching file set"
        );
        Ok(watcher)
    }
}

/// Path named when the notify backend itself cannot be created.
fn backend_error_path(directories: &BTreeSet<PathBuf>) -> PathBuf {
    directories.iter().next().cloned().unwrap_or_default()
}

impl ChangeObserver for FileWatcher {
    fn observe<'a>(
        &'a mut self,
        set: &'a FileSet,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<WatchOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let _watcher = self.subscribe(set, tx)?;

            let outcome = debounce(&mut rx, set, self.options.debounce, &cancel).await;
            debug!(?outcome, "observation finished");
            outcome
        })
    }
}

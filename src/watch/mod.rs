// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Subscribing `notify` to the directories of a resolved [`FileSet`].
//! - Filtering notifications down to members of that set.
//! - Coalescing bursts (editor saves, checkouts) into a single change.
//!
//! It does **not** know about processes or restarts; it only answers "what
//! changed next?" for one file set at a time.
//!
//! [`FileSet`]: crate::project::FileSet

pub mod debounce;
pub mod event;
pub mod watcher;

pub use debounce::debounce;
pub use event::{WatchSignal, change_events};
pub use watcher::{ChangeObserver, FileWatcher, WatchOptions, WatchOutcome};

// src/exec/mod.rs

//! Process execution layer.
//!
//! This module owns the single child process of the watch loop, using
//! `tokio::process::Command`.
//!
//! - [`backend`] provides the `ProcessSupervisor` trait the loop talks to,
//!   which tests replace with a fake implementation.
//! - [`child`] is the real supervisor: spawn, wait, graceful-then-forced
//!   stop.
//! - [`kill`] signals the whole process tree, per platform.

pub mod backend;
pub mod child;
pub mod kill;

pub use backend::ProcessSupervisor;
pub use child::{ChildSupervisor, DEFAULT_GRACE_PERIOD, ITERATION_ENV, WATCH_ENV};
pub use kill::{ProcessTree, TreeScope};

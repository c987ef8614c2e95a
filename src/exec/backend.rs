// src/exec/backend.rs

//! Pluggable process supervisor abstraction.
//!
//! The watch loop talks to a `ProcessSupervisor` instead of spawning
//! processes itself, so tests can swap in a fake that records start/stop
//! times and scripts exits.
//!
//! - [`super::child::ChildSupervisor`] is the production implementation.
//! - Every operation returns a boxed future, matching the other async seams
//!   of the crate.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::types::{ExitCode, ProcessSpec};

/// Owner of at most one running child process.
pub trait ProcessSupervisor: Send {
    /// Launch `spec` as the child for loop iteration `iteration` and return
    /// its pid.
    ///
    /// Callers must `stop` the previous child first.
    fn start<'a>(
        &'a mut self,
        spec: &'a ProcessSpec,
        iteration: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u32>> + Send + 'a>>;

    /// Stop the child and everything it spawned: graceful request first,
    /// forced after the grace period. No-op when nothing is running.
    fn stop(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Resolve when the child exits on its own.
    ///
    /// Must be cancel-safe: dropping the future leaves the child untouched.
    /// Never resolves when no child is running.
    fn wait_for_exit(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitCode>> + Send + '_>>;
}

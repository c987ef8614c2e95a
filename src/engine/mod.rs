// src/engine/mod.rs

//! The watch-and-restart loop.
//!
//! - [`core`]: the pure state machine. Consumes [`LoopEvent`]s and returns
//!   [`LoopCommand`]s; no Tokio, no processes, no filesystem.
//! - [`runtime`]: the async shell that executes commands against a
//!   resolver, a change observer and a process supervisor.
//! - [`shutdown`]: Ctrl+C escalation feeding the shared cancellation token.

use crate::types::ExitCode;

/// Something that happened, fed into [`core::LoopCore::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// Kick off the first iteration.
    Begin,
    /// The file set for this iteration is ready.
    Resolved,
    ResolveFailed,
    /// The child process is running.
    Launched,
    LaunchFailed,
    /// A debounced change on a watched file.
    Changed,
    /// The child exited without being asked to.
    Exited(ExitCode),
    CancelRequested,
    /// The watcher could not be set up or broke while observing.
    WatchFailed,
    /// The supervisor confirmed no child is alive.
    Stopped,
}

/// What the async shell must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    Resolve,
    Launch,
    /// Wait for a change, a child exit or cancellation.
    Await,
    Stop,
    Exit(LoopExit),
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    ResolveFailed,
    LaunchFailed,
    WatchFailed,
}

impl LoopExit {
    /// Process exit code for the binary.
    pub fn exit_code(self) -> i32 {
        match self {
            LoopExit::Cancelled => 0,
            LoopExit::ResolveFailed | LoopExit::LaunchFailed | LoopExit::WatchFailed => 1,
        }
    }
}

/// Where the loop goes once the child is confirmed stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterStop {
    Restart,
    Terminate(LoopExit),
}

/// States of the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Resolving,
    Starting,
    Running,
    Stopping(AfterStop),
    Terminated(LoopExit),
}

pub mod core;
pub mod runtime;
pub mod shutdown;

pub use core::{LoopCore, LoopStep};
pub use runtime::WatchLoop;
pub use shutdown::{ShutdownSignal, ShutdownState};

// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{DevloopError, Result};
use crate::exec::ProcessSupervisor;
use crate::project::{FileSet, FileSetResolver};
use crate::reporter::Reporter;
use crate::types::{ExitCode, ProcessSpec};
use crate::watch::{ChangeObserver, WatchOutcome};

use super::core::LoopCore;
use super::{LoopCommand, LoopEvent, LoopExit};

/// Drives [`LoopCore`] against a resolver, a change observer and a process
/// supervisor.
///
/// This is a pure IO shell: every decision about what happens next is made
/// by the core. Each command executed here yields exactly one event that is
/// fed back into the core.
pub struct WatchLoop<R, O, S>
where
    R: FileSetResolver,
    O: ChangeObserver,
    S: ProcessSupervisor,
{
    core: LoopCore,
    resolver: R,
    observer: O,
    supervisor: S,
    spec: ProcessSpec,
    reporter: Arc<dyn Reporter>,
    cancel: CancellationToken,
    current: Option<FileSet>,
    fatal: Option<DevloopError>,
}

impl<R, O, S> fmt::Debug for WatchLoop<R, O, S>
where
    R: FileSetResolver,
    O: ChangeObserver,
    S: ProcessSupervisor,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchLoop")
            .field("core", &self.core)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<R, O, S> WatchLoop<R, O, S>
where
    R: FileSetResolver,
    O: ChangeObserver,
    S: ProcessSupervisor,
{
    pub fn new(
        resolver: R,
        observer: O,
        supervisor: S,
        spec: ProcessSpec,
        reporter: Arc<dyn Reporter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            core: LoopCore::new(),
            resolver,
            observer,
            supervisor,
            spec,
            reporter,
            cancel,
            current: None,
            fatal: None,
        }
    }

    /// Run until cancelled or until a fatal error.
    ///
    /// Resolution and launch failures are returned as `Err`. A watcher
    /// failure is reported here and ends the loop with
    /// [`LoopExit::WatchFailed`]. Either way the child is stopped before
    /// this returns.
    pub async fn run(mut self) -> Result<LoopExit> {
        info!(command = %self.spec.command_line(), "watch loop started");

        let mut pending = VecDeque::from([LoopEvent::Begin]);

        while let Some(event) = pending.pop_front() {
            debug!(?event, state = ?self.core.state(), "loop event");
            let step = self.core.step(event);

            for command in step.commands {
                if let LoopCommand::Exit(exit) = command {
                    return self.finish(exit);
                }
                let next = self.execute(command).await?;
                pending.push_back(next);
            }
        }

        Err(DevloopError::Other(anyhow::anyhow!(
            "watch loop stalled in state {:?}",
            self.core.state()
        )))
    }

    fn finish(mut self, exit: LoopExit) -> Result<LoopExit> {
        info!(?exit, "watch loop finished");
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(exit),
        }
    }

    async fn execute(&mut self, command: LoopCommand) -> Result<LoopEvent> {
        match command {
            LoopCommand::Resolve => Ok(self.resolve()),
            LoopCommand::Launch => Ok(self.launch().await),
            LoopCommand::Await => Ok(self.await_next().await),
            LoopCommand::Stop => {
                self.supervisor.stop().await?;
                debug!("child stopped");
                Ok(LoopEvent::Stopped)
            }
            LoopCommand::Exit(exit) => Err(DevloopError::Other(anyhow::anyhow!(
                "exit {exit:?} must be handled by the loop"
            ))),
        }
    }

    fn resolve(&mut self) -> LoopEvent {
        if self.cancel.is_cancelled() {
            return LoopEvent::CancelRequested;
        }

        match self.resolver.resolve() {
            Ok(set) => {
                self.reporter.verbose(&format!(
                    "Watching {} file(s) from {} project(s)",
                    set.len(),
                    set.projects().count()
                ));
                self.current = Some(set);
                LoopEvent::Resolved
            }
            Err(err) => {
                self.current = None;
                self.fatal = Some(err);
                LoopEvent::ResolveFailed
            }
        }
    }

    async fn launch(&mut self) -> LoopEvent {
        let iteration = self.core.iteration();
        self.reporter
            .verbose(&format!("Running {}", self.spec.command_line()));

        match self.supervisor.start(&self.spec, iteration).await {
            Ok(pid) => {
                debug!(pid, iteration, "launched");
                self.reporter.output("Started");
                LoopEvent::Launched
            }
            Err(err) => {
                self.fatal = Some(err);
                LoopEvent::LaunchFailed
            }
        }
    }

    /// Race cancellation, the next file change and the child's own exit.
    async fn await_next(&mut self) -> LoopEvent {
        let Some(set) = self.current.as_ref() else {
            warn!("running without a resolved file set");
            return LoopEvent::WatchFailed;
        };
        let cancel = self.cancel.clone();

        tokio::select! {
            biased;

            _ = cancel.cancelled() => LoopEvent::CancelRequested,

            outcome = self.observer.observe(set, cancel.clone()) => match outcome {
                Ok(WatchOutcome::Changed(change)) => {
                    self.reporter
                        .output(&format!("File changed: {}", change.path.display()));
                    LoopEvent::Changed
                }
                Ok(WatchOutcome::Cancelled) => LoopEvent::CancelRequested,
                Err(err) => {
                    self.reporter.error(&err.to_string());
                    LoopEvent::WatchFailed
                }
            },

            exit = self.supervisor.wait_for_exit() => {
                let code = match exit {
                    Ok(code) => code,
                    Err(err) => {
                        warn!(error = %err, "failed to wait for child");
                        None
                    }
                };
                self.reporter.output(&exit_message(code));
                LoopEvent::Exited(code)
            }
        }
    }
}

fn exit_message(code: ExitCode) -> String {
    match code {
        Some(0) => "Exited".to_string(),
        Some(code) => format!("Exited with exit code {code}"),
        None => "Exited after being terminated by a signal".to_string(),
    }
}

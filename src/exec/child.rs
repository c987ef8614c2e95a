// src/exec/child.rs

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{DevloopError, Result};
use crate::exec::backend::ProcessSupervisor;
use crate::exec::kill::{ProcessTree, TreeScope};
use crate::types::{ExitCode, ProcessSpec};

/// Set to `1` in the child's environment.
pub const WATCH_ENV: &str = "DEVLOOP_WATCH";
/// Set to the 1-based loop iteration in the child's environment.
pub const ITERATION_ENV: &str = "DEVLOOP_WATCH_ITERATION";

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// The one child the supervisor owns.
///
/// Dropping it before its stop completed kills its whole tree, so an
/// abandoned stop leaves nothing behind.
#[derive(Debug)]
struct SupervisedProcess {
    child: Child,
    tree: ProcessTree,
    /// Set once `wait_for_exit` has reaped the child.
    exited: Option<ExitStatus>,
    stopped: bool,
}

impl SupervisedProcess {
    fn pid(&self) -> u32 {
        self.tree.root()
    }

    fn record_exit(&mut self, status: ExitStatus) {
        self.exited = Some(status);
        self.tree.root_exited();
    }
}

impl Drop for SupervisedProcess {
    fn drop(&mut self) {
        // kill_on_drop only reaches the leader; take the rest of the tree too.
        if !self.stopped {
            debug!(pid = self.pid(), "child dropped before it was stopped; killing its tree");
            self.tree.kill_now();
        }
    }
}

/// [`ProcessSupervisor`] spawning real processes with `tokio::process`.
///
/// The child inherits stdin, stdout and stderr, so its output reaches the
/// terminal unmodified.
#[derive(Debug)]
pub struct ChildSupervisor {
    grace_period: Duration,
    scope: TreeScope,
    current: Option<SupervisedProcess>,
}

impl Default for ChildSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ChildSupervisor {
    /// Children share our process group when stdin is a terminal.
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            scope: TreeScope::for_stdin(),
            current: None,
        }
    }

    pub fn with_scope(mut self, scope: TreeScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn scope(&self) -> TreeScope {
        self.scope
    }

    /// Pid of the live child, if any.
    pub fn pid(&self) -> Option<u32> {
        self.current
            .as_ref()
            .filter(|p| p.exited.is_none())
            .map(SupervisedProcess::pid)
    }

    fn command(&self, spec: &ProcessSpec, iteration: u32) -> Command {
        let mut cmd = Command::new(spec.executable());
        cmd.args(spec.args())
            .current_dir(spec.working_dir())
            .env(WATCH_ENV, "1")
            .env(ITERATION_ENV, iteration.to_string())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        for (key, value) in spec.env() {
            cmd.env(key, value);
        }

        #[cfg(unix)]
        if self.scope == TreeScope::Group {
            cmd.process_group(0);
        }

        cmd
    }

    async fn stop_process(&self, mut process: SupervisedProcess) -> Result<()> {
        let pid = process.pid();

        if process.exited.is_none() {
            if let Some(status) = process.child.try_wait()? {
                process.record_exit(status);
            }
        }

        if let Some(status) = process.exited {
            debug!(pid, %status, "child already exited; sweeping its tree");
            process.tree.kill().await?;
            process.stopped = true;
            return Ok(());
        }

        if process.tree.request_stop()? {
            debug!(pid, grace = ?self.grace_period, "graceful stop requested");
            match tokio::time::timeout(self.grace_period, process.child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    process.record_exit(status);
                    info!(pid, %status, "child stopped gracefully");
                    // Descendants that ignored the request are still around.
                    process.tree.kill().await?;
                    process.stopped = true;
                    return Ok(());
                }
                Err(_) => {
                    warn!(pid, grace = ?self.grace_period, "child did not stop in time; killing");
                }
            }
        }

        process.tree.kill().await?;
        // The tree kill already signalled the leader; this only reaps it.
        if let Err(err) = process.child.start_kill() {
            debug!(pid, error = %err, "start_kill after tree kill failed");
        }
        let status = process.child.wait().await?;
        process.record_exit(status);
        process.stopped = true;
        info!(pid, %status, "child killed");
        Ok(())
    }
}

impl ProcessSupervisor for ChildSupervisor {
    fn start<'a>(
        &'a mut self,
        spec: &'a ProcessSpec,
        iteration: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u32>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(pid) = self.pid() {
                warn!(pid, "start called while a child is alive; stopping it first");
            }
            if let Some(previous) = self.current.take() {
                self.stop_process(previous).await?;
            }

            let mut cmd = self.command(spec, iteration);
            let child = cmd.spawn().map_err(|source| DevloopError::Launch {
                program: spec.executable().to_string(),
                source,
            })?;

            let pid = child.id().ok_or_else(|| DevloopError::Launch {
                program: spec.executable().to_string(),
                source: std::io::Error::other("child exited before its pid was read"),
            })?;

            info!(pid, iteration, scope = ?self.scope, command = %spec.command_line(), "child started");
            self.current = Some(SupervisedProcess {
                child,
                tree: ProcessTree::new(pid, self.scope),
                exited: None,
                stopped: false,
            });
            Ok(pid)
        })
    }

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match self.current.take() {
                Some(process) => self.stop_process(process).await,
                None => Ok(()),
            }
        })
    }

    fn wait_for_exit(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitCode>> + Send + '_>> {
        Box::pin(async move {
            let Some(process) = self.current.as_mut() else {
                return std::future::pending().await;
            };

            if let Some(status) = process.exited {
                return Ok(status.code());
            }

            let status = process.child.wait().await?;
            process.record_exit(status);
            info!(pid = process.pid(), %status, "child exited on its own");
            Ok(status.code())
        })
    }
}

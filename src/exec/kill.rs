// src/exec/kill.rs

//! Signalling a whole child process tree.
//!
//! A child started from a terminal stays in our foreground process group,
//! so it can read the terminal and gets Ctrl+C like any foreground job. Its
//! tree is then found by following parent links. Without a terminal the
//! child leads its own process group and the group is signalled instead.
//! On Windows there is no graceful request; the forced step uses
//! `taskkill /T`.

use std::collections::BTreeSet;
use std::io::{self, IsTerminal};

/// How the members of a child's tree are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeScope {
    /// The child leads its own process group.
    Group,
    /// The child shares our process group; its members are its descendants.
    Descendants,
}

impl TreeScope {
    /// `Descendants` when stdin is a terminal the child should keep using.
    pub fn for_stdin() -> Self {
        if io::stdin().is_terminal() {
            TreeScope::Descendants
        } else {
            TreeScope::Group
        }
    }
}

/// A launched child and everything it started.
#[derive(Debug)]
pub struct ProcessTree {
    root: u32,
    #[cfg_attr(not(unix), allow(dead_code))]
    scope: TreeScope,
    /// Cleared once the root has been reaped; its pid may be reused after.
    #[cfg_attr(not(unix), allow(dead_code))]
    root_alive: bool,
    /// Descendants seen so far. Kept so members orphaned by the root's exit
    /// are still reached.
    #[cfg_attr(not(unix), allow(dead_code))]
    known: BTreeSet<u32>,
}

impl ProcessTree {
    pub fn new(root: u32, scope: TreeScope) -> Self {
        Self {
            root,
            scope,
            root_alive: true,
            known: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    pub fn root_exited(&mut self) {
        self.root_alive = false;
    }

    /// Ask the tree to shut down.
    ///
    /// Returns `false` when the platform has no graceful request, in which
    /// case the caller should go straight to [`ProcessTree::kill`].
    pub fn request_stop(&mut self) -> io::Result<bool> {
        imp::request_stop(self)
    }

    /// Forcibly terminate the tree. Succeeds when it is already gone.
    pub async fn kill(&mut self) -> io::Result<()> {
        imp::kill(self).await
    }

    /// Best-effort synchronous variant of [`ProcessTree::kill`] for `Drop`
    /// paths, where nothing can be awaited and errors have nowhere to go.
    pub fn kill_now(&mut self) {
        imp::kill_now(self)
    }
}

#[cfg(unix)]
mod imp {
    use std::collections::HashMap;
    use std::io;

    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill as signal_pid, killpg};
    use nix::unistd::Pid;
    use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
    use tracing::trace;

    use super::{ProcessTree, TreeScope};

    fn raw_pid(pid: u32) -> io::Result<Pid> {
        i32::try_from(pid)
            .map(Pid::from_raw)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))
    }

    fn ignore_gone(result: nix::Result<()>) -> io::Result<()> {
        match result {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }

    /// Every live descendant of `root`, threads excluded.
    fn descendants(root: u32) -> Vec<u32> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for (pid, process) in system.processes() {
            if process.thread_kind().is_some() {
                continue;
            }
            if let Some(parent) = process.parent() {
                children.entry(parent.as_u32()).or_default().push(pid.as_u32());
            }
        }

        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(pid) = stack.pop() {
            if let Some(kids) = children.get(&pid) {
                found.extend_from_slice(kids);
                stack.extend_from_slice(kids);
            }
        }
        found
    }

    fn signal_tree(tree: &mut ProcessTree, signal: Signal) -> io::Result<()> {
        match tree.scope {
            TreeScope::Group => ignore_gone(killpg(raw_pid(tree.root)?, signal)),
            TreeScope::Descendants => {
                if tree.root_alive {
                    tree.known.extend(descendants(tree.root));
                    ignore_gone(signal_pid(raw_pid(tree.root)?, signal))?;
                }
                for &pid in &tree.known {
                    ignore_gone(signal_pid(raw_pid(pid)?, signal))?;
                }
                trace!(root = tree.root, members = tree.known.len(), ?signal, "signalled tree");
                Ok(())
            }
        }
    }

    pub fn request_stop(tree: &mut ProcessTree) -> io::Result<bool> {
        signal_tree(tree, Signal::SIGTERM)?;
        Ok(true)
    }

    pub async fn kill(tree: &mut ProcessTree) -> io::Result<()> {
        signal_tree(tree, Signal::SIGKILL)
    }

    pub fn kill_now(tree: &mut ProcessTree) {
        let _ = signal_tree(tree, Signal::SIGKILL);
    }
}

#[cfg(windows)]
mod imp {
    use std::io;
    use std::process::Stdio;

    use tokio::process::Command;
    use tracing::debug;

    use super::ProcessTree;

    pub fn request_stop(_tree: &mut ProcessTree) -> io::Result<bool> {
        Ok(false)
    }

    pub async fn kill(tree: &mut ProcessTree) -> io::Result<()> {
        let status = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &tree.root.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        // Non-zero when the process is already gone.
        debug!(pid = tree.root, ?status, "taskkill finished");
        Ok(())
    }

    pub fn kill_now(tree: &mut ProcessTree) {
        let _ = std::process::Command::new("taskkill")
            .args(["/T", "/F", "/PID", &tree.root.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

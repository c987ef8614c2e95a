use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use devloop::errors::{DevloopError, Result};
use devloop::exec::ProcessSupervisor;
use devloop::project::{FileSet, FileSetResolver};
use devloop::reporter::{ReportLevel, Reporter};
use devloop::types::{ChangeEvent, ChangeKind, ExitCode, ProcessSpec};
use devloop::watch::{ChangeObserver, WatchOutcome};

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Reporter that records every message, regardless of level filters.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    messages: Arc<Mutex<Vec<(ReportLevel, String)>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(ReportLevel, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn at(&self, level: ReportLevel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: ReportLevel, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

impl Reporter for RecordingReporter {
    fn output(&self, message: &str) {
        self.push(ReportLevel::Output, message);
    }

    fn warn(&self, message: &str) {
        self.push(ReportLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(ReportLevel::Error, message);
    }

    fn verbose(&self, message: &str) {
        self.push(ReportLevel::Verbose, message);
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolver returning a fixed file set, optionally failing from the n-th
/// call on.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    set: FileSet,
    fail_from_call: Option<usize>,
    calls: Arc<Mutex<usize>>,
}

impl StaticResolver {
    pub fn new(set: FileSet) -> Self {
        Self {
            set,
            fail_from_call: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Calls `1..call` succeed, call `call` and later fail.
    pub fn failing_from(mut self, call: usize) -> Self {
        self.fail_from_call = Some(call);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl FileSetResolver for StaticResolver {
    fn resolve(&mut self) -> Result<FileSet> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        match self.fail_from_call {
            Some(n) if call >= n => Err(DevloopError::evaluation(
                "/fake/root.devproj",
                "scripted resolution failure",
            )),
            _ => Ok(self.set.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Observer whose outcomes are pushed by the test through an
/// [`ObserverHandle`].
#[derive(Debug)]
pub struct ScriptedObserver {
    rx: mpsc::UnboundedReceiver<Result<WatchOutcome>>,
    observed: Arc<Mutex<Vec<FileSet>>>,
}

#[derive(Debug, Clone)]
pub struct ObserverHandle {
    tx: mpsc::UnboundedSender<Result<WatchOutcome>>,
    observed: Arc<Mutex<Vec<FileSet>>>,
}

impl ScriptedObserver {
    pub fn new() -> (Self, ObserverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let observed = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                rx,
                observed: Arc::clone(&observed),
            },
            ObserverHandle { tx, observed },
        )
    }
}

impl ObserverHandle {
    /// Deliver a change on `path` to the next (or current) observation.
    pub fn change(&self, path: impl Into<PathBuf>) {
        let _ = self.tx.send(Ok(WatchOutcome::Changed(ChangeEvent::new(
            path,
            ChangeKind::Modified,
        ))));
    }

    /// Make the next (or current) observation fail.
    pub fn fail(&self, message: &str) {
        let _ = self
            .tx
            .send(Err(DevloopError::watch_setup("/fake", message)));
    }

    /// Number of `observe` calls so far.
    pub fn observations(&self) -> usize {
        self.observed.lock().unwrap().len()
    }

    pub fn observed_sets(&self) -> Vec<FileSet> {
        self.observed.lock().unwrap().clone()
    }
}

impl ChangeObserver for ScriptedObserver {
    fn observe<'a>(
        &'a mut self,
        set: &'a FileSet,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<WatchOutcome>> + Send + 'a>> {
        self.observed.lock().unwrap().push(set.clone());
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Ok(WatchOutcome::Cancelled),
                next = self.rx.recv() => match next {
                    Some(outcome) => outcome,
                    None => {
                        cancel.cancelled().await;
                        Ok(WatchOutcome::Cancelled)
                    }
                },
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCall {
    Start { iteration: u32 },
    Stop,
}

#[derive(Debug, Default)]
struct SupervisorState {
    calls: Vec<(SupervisorCall, Instant)>,
    alive: bool,
    overlapped: bool,
    exited: bool,
    current_iteration: u32,
}

/// Read side of a [`FakeSupervisor`], kept by the test.
#[derive(Debug, Clone)]
pub struct SupervisorProbe {
    state: Arc<Mutex<SupervisorState>>,
}

impl SupervisorProbe {
    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(c, _)| *c)
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(SupervisorCall, Instant)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn starts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SupervisorCall::Start { .. }))
            .count()
    }

    pub fn stops(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SupervisorCall::Stop))
            .count()
    }

    pub fn alive(&self) -> bool {
        self.state.lock().unwrap().alive
    }

    /// Whether `start` was ever called while a child was alive.
    pub fn overlapped(&self) -> bool {
        self.state.lock().unwrap().overlapped
    }

    /// Poll until `start` has been called `n` times.
    pub async fn wait_for_starts(&self, n: usize) {
        while self.starts() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Supervisor that never spawns anything.
///
/// Exits are scripted per iteration; a child with no scripted exit runs
/// until stopped.
#[derive(Debug)]
pub struct FakeSupervisor {
    state: Arc<Mutex<SupervisorState>>,
    exits: HashMap<u32, (ExitCode, Duration)>,
    hang_on_stop: bool,
    fail_start: bool,
    stop_delay: Duration,
}

impl FakeSupervisor {
    pub fn new() -> (Self, SupervisorProbe) {
        let state = Arc::new(Mutex::new(SupervisorState::default()));
        (
            Self {
                state: Arc::clone(&state),
                exits: HashMap::new(),
                hang_on_stop: false,
                fail_start: false,
                stop_delay: Duration::ZERO,
            },
            SupervisorProbe { state },
        )
    }

    /// The child of `iteration` exits with `code` after `after`.
    pub fn exit_on(mut self, iteration: u32, code: ExitCode, after: Duration) -> Self {
        self.exits.insert(iteration, (code, after));
        self
    }

    /// `stop` never completes.
    pub fn hang_on_stop(mut self) -> Self {
        self.hang_on_stop = true;
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Time a `stop` takes, to widen race windows.
    pub fn stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }
}

impl ProcessSupervisor for FakeSupervisor {
    fn start<'a>(
        &'a mut self,
        spec: &'a ProcessSpec,
        iteration: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u32>> + Send + 'a>> {
        Box::pin(async move {
            if self.fail_start {
                return Err(DevloopError::Launch {
                    program: spec.executable().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
                });
            }

            let mut state = self.state.lock().unwrap();
            if state.alive {
                state.overlapped = true;
            }
            state.alive = true;
            state.exited = false;
            state.current_iteration = iteration;
            state
                .calls
                .push((SupervisorCall::Start { iteration }, Instant::now()));
            Ok(1000 + iteration)
        })
    }

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.hang_on_stop {
                std::future::pending::<()>().await;
            }
            if !self.stop_delay.is_zero() {
                tokio::time::sleep(self.stop_delay).await;
            }

            let mut state = self.state.lock().unwrap();
            state.alive = false;
            state.calls.push((SupervisorCall::Stop, Instant::now()));
            Ok(())
        })
    }

    fn wait_for_exit(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitCode>> + Send + '_>> {
        Box::pin(async move {
            let scripted = {
                let state = self.state.lock().unwrap();
                if !state.alive || state.exited {
                    None
                } else {
                    self.exits.get(&state.current_iteration).copied()
                }
            };

            let Some((code, after)) = scripted else {
                return std::future::pending().await;
            };

            tokio::time::sleep(after).await;
            self.state.lock().unwrap().exited = true;
            Ok(code)
        })
    }
}

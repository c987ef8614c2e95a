// src/engine/core.rs

//! Pure watch-loop state machine.
//!
//! `Resolving -> Starting -> Running -> Stopping -> Resolving ...`, ending in
//! `Terminated`. The core tracks whether a child is alive and only ever asks
//! for a launch after the previous child was confirmed stopped, so two
//! restarts can never overlap.
//!
//! It is driven by [`super::runtime::WatchLoop`] and unit tested without any
//! Tokio, channels or processes.

use tracing::debug;

use crate::engine::{AfterStop, LoopCommand, LoopEvent, LoopExit, LoopState};

/// Decision returned after handling one [`LoopEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopStep {
    /// Commands for the IO shell, in order.
    pub commands: Vec<LoopCommand>,
    /// Whether the shell should keep driving the loop.
    pub keep_running: bool,
}

#[derive(Debug, Clone)]
pub struct LoopCore {
    state: LoopState,
    child_alive: bool,
    iteration: u32,
}

impl Default for LoopCore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopCore {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            child_alive: false,
            iteration: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether a launched child has not yet been confirmed stopped.
    pub fn child_alive(&self) -> bool {
        self.child_alive
    }

    /// Number of launches requested so far (1-based once running).
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn step(&mut self, event: LoopEvent) -> LoopStep {
        use LoopEvent as E;
        use LoopState as S;

        let commands = match (self.state, event) {
            (S::Idle, E::Begin) => self.enter_resolving(),

            (S::Idle | S::Resolving | S::Starting, E::CancelRequested) => {
                self.terminate(LoopExit::Cancelled)
            }

            (S::Resolving, E::Resolved) => {
                debug_assert!(!self.child_alive, "resolving while a child is alive");
                self.state = S::Starting;
                self.iteration += 1;
                vec![LoopCommand::Launch]
            }
            (S::Resolving, E::ResolveFailed) => self.terminate(LoopExit::ResolveFailed),

            (S::Starting, E::Launched) => {
                self.child_alive = true;
                self.state = S::Running;
                vec![LoopCommand::Await]
            }
            (S::Starting, E::LaunchFailed) => self.terminate(LoopExit::LaunchFailed),

            (S::Running, E::Changed) => self.enter_stopping(AfterStop::Restart),
            (S::Running, E::Exited(_)) => self.enter_stopping(AfterStop::Restart),
            (S::Running, E::CancelRequested) => {
                self.enter_stopping(AfterStop::Terminate(LoopExit::Cancelled))
            }
            (S::Running, E::WatchFailed) => {
                self.enter_stopping(AfterStop::Terminate(LoopExit::WatchFailed))
            }

            // Cancellation while a stop is in flight turns a restart into a
            // shutdown; the stop itself is already under way.
            (S::Stopping(AfterStop::Restart), E::CancelRequested) => {
                self.state = S::Stopping(AfterStop::Terminate(LoopExit::Cancelled));
                Vec::new()
            }
            (S::Stopping(after), E::Stopped) => {
                self.child_alive = false;
                match after {
                    AfterStop::Restart => self.enter_resolving(),
                    AfterStop::Terminate(exit) => self.terminate(exit),
                }
            }

            (state, event) => {
                debug!(?state, ?event, "ignoring event not relevant to current loop state");
                Vec::new()
            }
        };

        LoopStep {
            commands,
            keep_running: !matches!(self.state, S::Terminated(_)),
        }
    }

    fn enter_resolving(&mut self) -> Vec<LoopCommand> {
        self.state = LoopState::Resolving;
        vec![LoopCommand::Resolve]
    }

    fn enter_stopping(&mut self, after: AfterStop) -> Vec<LoopCommand> {
        self.state = LoopState::Stopping(after);
        vec![LoopCommand::Stop]
    }

    fn terminate(&mut self, exit: LoopExit) -> Vec<LoopCommand> {
        debug_assert!(!self.child_alive, "terminating while a child is alive");
        self.state = LoopState::Terminated(exit);
        vec![LoopCommand::Exit(exit)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(core: &mut LoopCore, events: &[LoopEvent]) -> Vec<LoopCommand> {
        events
            .iter()
            .flat_map(|e| core.step(*e).commands)
            .collect()
    }

    #[test]
    fn change_restarts_through_stop_and_resolve() {
        let mut core = LoopCore::new();
        let commands = drive(
            &mut core,
            &[
                LoopEvent::Begin,
                LoopEvent::Resolved,
                LoopEvent::Launched,
                LoopEvent::Changed,
                LoopEvent::Stopped,
                LoopEvent::Resolved,
                LoopEvent::Launched,
            ],
        );

        assert_eq!(
            commands,
            vec![
                LoopCommand::Resolve,
                LoopCommand::Launch,
                LoopCommand::Await,
                LoopCommand::Stop,
                LoopCommand::Resolve,
                LoopCommand::Launch,
                LoopCommand::Await,
            ]
        );
        assert_eq!(core.iteration(), 2);
        assert!(core.child_alive());
    }

    #[test]
    fn child_exit_is_not_fatal() {
        let mut core = LoopCore::new();
        drive(&mut core, &[LoopEvent::Begin, LoopEvent::Resolved, LoopEvent::Launched]);

        let step = core.step(LoopEvent::Exited(Some(1)));
        assert_eq!(step.commands, vec![LoopCommand::Stop]);
        assert!(step.keep_running);

        let step = core.step(LoopEvent::Stopped);
        assert_eq!(step.commands, vec![LoopCommand::Resolve]);
        assert_eq!(core.state(), LoopState::Resolving);
    }

    #[test]
    fn cancellation_stops_then_terminates() {
        let mut core = LoopCore::new();
        drive(&mut core, &[LoopEvent::Begin, LoopEvent::Resolved, LoopEvent::Launched]);

        let step = core.step(LoopEvent::CancelRequested);
        assert_eq!(step.commands, vec![LoopCommand::Stop]);
        assert!(step.keep_running);

        let step = core.step(LoopEvent::Stopped);
        assert_eq!(step.commands, vec![LoopCommand::Exit(LoopExit::Cancelled)]);
        assert!(!step.keep_running);
        assert!(!core.child_alive());
    }

    #[test]
    fn resolve_and_launch_failures_are_fatal() {
        let mut core = LoopCore::new();
        let step = {
            core.step(LoopEvent::Begin);
            core.step(LoopEvent::ResolveFailed)
        };
        assert_eq!(step.commands, vec![LoopCommand::Exit(LoopExit::ResolveFailed)]);
        assert!(!step.keep_running);

        let mut core = LoopCore::new();
        drive(&mut core, &[LoopEvent::Begin, LoopEvent::Resolved]);
        let step = core.step(LoopEvent::LaunchFailed);
        assert_eq!(step.commands, vec![LoopCommand::Exit(LoopExit::LaunchFailed)]);
        assert!(!step.keep_running);
    }

    #[test]
    fn cancel_during_restart_stop_becomes_shutdown() {
        let mut core = LoopCore::new();
        drive(
            &mut core,
            &[
                LoopEvent::Begin,
                LoopEvent::Resolved,
                LoopEvent::Launched,
                LoopEvent::Changed,
            ],
        );

        assert!(core.step(LoopEvent::CancelRequested).commands.is_empty());
        let step = core.step(LoopEvent::Stopped);
        assert_eq!(step.commands, vec![LoopCommand::Exit(LoopExit::Cancelled)]);
    }

    #[test]
    fn watch_failure_stops_child_then_terminates() {
        let mut core = LoopCore::new();
        drive(&mut core, &[LoopEvent::Begin, LoopEvent::Resolved, LoopEvent::Launched]);

        assert_eq!(core.step(LoopEvent::WatchFailed).commands, vec![LoopCommand::Stop]);
        let step = core.step(LoopEvent::Stopped);
        assert_eq!(step.commands, vec![LoopCommand::Exit(LoopExit::WatchFailed)]);
        assert_eq!(LoopExit::WatchFailed.exit_code(), 1);
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut core = LoopCore::new();
        let step = core.step(LoopEvent::Changed);
        assert!(step.commands.is_empty());
        assert_eq!(core.state(), LoopState::Idle);
    }
}

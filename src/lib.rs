// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod project;
pub mod reporter;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cli::CliArgs;
use crate::config::Settings;
use crate::engine::{ShutdownSignal, ShutdownState, WatchLoop};
use crate::errors::Result;
use crate::exec::ChildSupervisor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::{ProjectFileSetFactory, load_manifest, locate_project};
use crate::reporter::{ConsoleReporter, Reporter};
use crate::watch::FileWatcher;

/// Exit code when a fatal error ends the loop.
pub const FAILURE_EXIT_CODE: i32 = 1;
/// Exit code after a second interrupt forced the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project location and manifest loading
/// - settings from manifest, CLI and environment
/// - the watch loop (resolver, file watcher, child supervisor)
/// - Ctrl-C escalation
///
/// Returns the process exit code. Fatal errors are reported exactly once
/// through the console reporter.
pub async fn run(args: CliArgs) -> i32 {
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(args.reporter_config()));

    match run_with_reporter(args, Arc::clone(&reporter)).await {
        Ok(code) => code,
        Err(err) => {
            reporter.error(&err.to_string());
            FAILURE_EXIT_CODE
        }
    }
}

async fn run_with_reporter(args: CliArgs, reporter: Arc<dyn Reporter>) -> Result<i32> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let work_dir = std::env::current_dir()?;

    let project = locate_project(fs.as_ref(), &work_dir, args.project.as_deref())?;
    let manifest = load_manifest(fs.as_ref(), &project)?;
    let settings = Settings::from_sources(&args, &project, &manifest, |key| {
        std::env::var(key).ok()
    })?;
    debug!(?settings, "settings resolved");
    reporter.verbose(&format!("Project: {}", settings.project.display()));

    let shutdown = Arc::new(ShutdownSignal::new());
    spawn_interrupt_listener(Arc::clone(&shutdown), Arc::clone(&reporter));

    let watch_loop = WatchLoop::new(
        ProjectFileSetFactory::from_manifests(&settings.project, Arc::clone(&fs)),
        FileWatcher::new(settings.watch.clone()),
        ChildSupervisor::new(settings.grace_period),
        settings.spec.clone(),
        Arc::clone(&reporter),
        shutdown.token(),
    );

    // The loop is dropped when forced; a child dropped mid-run or mid-stop
    // takes its tree with it.
    tokio::select! {
        result = watch_loop.run() => Ok(result?.exit_code()),
        _ = shutdown.forced() => {
            debug!("forced exit");
            Ok(FORCED_EXIT_CODE)
        }
    }
}

/// Feed every Ctrl+C into `shutdown` until it is forced.
fn spawn_interrupt_listener(shutdown: Arc<ShutdownSignal>, reporter: Arc<dyn Reporter>) {
    tokio::spawn(async move {
        loop {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for Ctrl+C");
                return;
            }

            match shutdown.request() {
                ShutdownState::GracefulRequested => {
                    reporter.output("Shutdown requested. Press Ctrl+C again to force exit.");
                }
                ShutdownState::Forced => return,
                ShutdownState::NotRequested => {}
            }
        }
    });
}

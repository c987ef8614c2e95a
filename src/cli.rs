// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::reporter::ReporterConfig;

/// Command-line arguments for `devloop`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "devloop",
    version,
    about = "Watch a project's sources and restart its program whenever they change.",
    long_about = None
)]
pub struct CliArgs {
    /// Project file, or a directory holding exactly one `.devproj` file.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Suppress progress messages; warnings and errors are still shown.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show verbose progress messages.
    #[arg(short, long)]
    pub verbose: bool,

    /// Program to run. Overrides `[run].program` and `DEVLOOP_PROGRAM`.
    #[arg(long, value_name = "EXE")]
    pub program: Option<String>,

    /// Quiet period before a burst of file changes triggers a restart.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Time a stopping program gets before it is killed.
    #[arg(long, value_name = "MS")]
    pub grace_period_ms: Option<u64>,

    /// Poll the filesystem instead of relying on native notifications.
    #[arg(long)]
    pub poll: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Arguments passed to the program; replace `[run].args` when given.
    #[arg(last = true, value_name = "ARGS")]
    pub program_args: Vec<String>,
}

impl CliArgs {
    /// Console verbosity. Available before any project is loaded, so
    /// location and manifest errors are reported the same way.
    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

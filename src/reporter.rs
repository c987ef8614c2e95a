// src/reporter.rs

//! User-facing console messages.
//!
//! Internal diagnostics go through `tracing` (see [`crate::logging`]); the
//! reporter is the narrow channel for what the developer should read while
//! iterating: "Started", "File changed: ...", "Exited with exit code 1".
//!
//! Quiet/verbose mode is fixed when the reporter is built.

use std::io::{IsTerminal, Write};

/// Leveled text sink used by the watch loop and the binary.
pub trait Reporter: Send + Sync {
    fn output(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn verbose(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Output,
    Warn,
    Error,
    Verbose,
}

/// Which levels are shown.
///
/// `quiet` hides output, `verbose` shows verbose; warnings and errors are
/// always shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterConfig {
    pub quiet: bool,
    pub verbose: bool,
}

impl ReporterConfig {
    pub fn enabled(&self, level: ReportLevel) -> bool {
        match level {
            ReportLevel::Output => !self.quiet,
            ReportLevel::Verbose => self.verbose,
            ReportLevel::Warn | ReportLevel::Error => true,
        }
    }
}

const PREFIX: &str = "devloop : ";
const RESET: &str = "\x1B[39m";
const DARK_GRAY: &str = "\x1B[90m";
const YELLOW: &str = "\x1B[93m";
const RED: &str = "\x1B[91m";

/// Prefix a message and, for terminals, colour it by level.
///
/// Output keeps the program's default colour and only greys the prefix.
pub fn format_line(level: ReportLevel, message: &str, color: bool) -> String {
    if !color {
        return format!("{PREFIX}{message}");
    }

    let prefix = format!("{DARK_GRAY}{PREFIX}{RESET}");
    let body_color = match level {
        ReportLevel::Output => None,
        ReportLevel::Verbose => Some(DARK_GRAY),
        ReportLevel::Warn => Some(YELLOW),
        ReportLevel::Error => Some(RED),
    };

    match body_color {
        Some(code) => format!("{prefix}{code}{message}{RESET}"),
        None => format!("{prefix}{message}"),
    }
}

/// Reporter writing output/verbose to stdout and warn/error to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    config: ReporterConfig,
    stdout_color: bool,
    stderr_color: bool,
}

impl ConsoleReporter {
    pub fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            stdout_color: std::io::stdout().is_terminal(),
            stderr_color: std::io::stderr().is_terminal(),
        }
    }

    fn write(&self, level: ReportLevel, message: &str) {
        if !self.config.enabled(level) {
            return;
        }

        // A closed console is not worth failing the watch loop over.
        match level {
            ReportLevel::Output | ReportLevel::Verbose => {
                let line = format_line(level, message, self.stdout_color);
                let _ = writeln!(std::io::stdout().lock(), "{line}");
            }
            ReportLevel::Warn | ReportLevel::Error => {
                let line = format_line(level, message, self.stderr_color);
                let _ = writeln!(std::io::stderr().lock(), "{line}");
            }
        }
    }
}

impl Reporter for ConsoleReporter {
    fn output(&self, message: &str) {
        self.write(ReportLevel::Output, message);
    }

    fn warn(&self, message: &str) {
        self.write(ReportLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(ReportLevel::Error, message);
    }

    fn verbose(&self, message: &str) {
        self.write(ReportLevel::Verbose, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_hides_output_but_not_errors() {
        let cfg = ReporterConfig {
            quiet: true,
            verbose: false,
        };
        assert!(!cfg.enabled(ReportLevel::Output));
        assert!(!cfg.enabled(ReportLevel::Verbose));
        assert!(cfg.enabled(ReportLevel::Warn));
        assert!(cfg.enabled(ReportLevel::Error));
    }

    #[test]
    fn verbose_enables_verbose() {
        let cfg = ReporterConfig {
            quiet: false,
            verbose: true,
        };
        assert!(cfg.enabled(ReportLevel::Verbose));
        assert!(cfg.enabled(ReportLevel::Output));
    }

    #[test]
    fn plain_lines_are_only_prefixed() {
        assert_eq!(
            format_line(ReportLevel::Error, "boom", false),
            "devloop : boom"
        );
    }

    #[test]
    fn colored_lines_wrap_body_by_level() {
        let line = format_line(ReportLevel::Warn, "careful", true);
        assert_eq!(line, "\x1B[90mdevloop : \x1B[39m\x1B[93mcareful\x1B[39m");

        let line = format_line(ReportLevel::Output, "Started", true);
        assert_eq!(line, "\x1B[90mdevloop : \x1B[39mStarted");
    }
}

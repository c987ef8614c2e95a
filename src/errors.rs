// src/errors.rs

//! Crate-wide error type.
//!
//! Resolution and launch failures travel all the way out to `main`; watch
//! setup failures are reported by the watch loop itself and end the loop.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("failed to evaluate project {}: {message}", project.display())]
    ProjectEvaluation { project: PathBuf, message: String },

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch {}: {message}", path.display())]
    WatchSetup { path: PathBuf, message: String },

    #[error("{0}")]
    Locate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DevloopError {
    pub fn evaluation(project: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DevloopError::ProjectEvaluation {
            project: project.into(),
            message: message.into(),
        }
    }

    pub fn watch_setup(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DevloopError::WatchSetup {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DevloopError>;

// src/project/loader.rs

use std::path::Path;

use crate::errors::{DevloopError, Result};
use crate::fs::FileSystem;
use crate::project::manifest::{ProjectManifest, RawProjectManifest};

/// Extension of project description files.
pub const PROJECT_EXTENSION: &str = "devproj";

/// Read and deserialize a project file without semantic validation.
pub fn load_raw(fs: &dyn FileSystem, path: &Path) -> Result<RawProjectManifest> {
    let contents = fs
        .read_to_string(path)
        .map_err(|e| DevloopError::evaluation(path, format!("{e:#}")))?;

    toml::from_str(&contents).map_err(|e| DevloopError::evaluation(path, e.to_string()))
}

/// Read, deserialize and validate a project file.
///
/// Every failure is a [`DevloopError::ProjectEvaluation`] naming `path`, so
/// the user can tell which project in a reference chain is broken.
pub fn load_manifest(fs: &dyn FileSystem, path: &Path) -> Result<ProjectManifest> {
    let raw = load_raw(fs, path)?;
    ProjectManifest::try_from(raw).map_err(|e| match e {
        DevloopError::Config(msg) => DevloopError::evaluation(path, msg),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn missing_file_names_the_project() {
        let fs = MockFileSystem::new();
        let err = load_manifest(&fs, Path::new("/ws/missing.devproj")).unwrap_err();
        match err {
            DevloopError::ProjectEvaluation { project, .. } => {
                assert_eq!(project, Path::new("/ws/missing.devproj"));
            }
            other => panic!("expected ProjectEvaluation, got {other:?}"),
        }
    }

    #[test]
    fn toml_syntax_error_is_an_evaluation_error() {
        let fs = MockFileSystem::new();
        fs.add_file("/ws/app.devproj", "references = [");
        let err = load_manifest(&fs, Path::new("/ws/app.devproj")).unwrap_err();
        assert!(matches!(err, DevloopError::ProjectEvaluation { .. }));
        assert!(err.to_string().contains("/ws/app.devproj"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let fs = MockFileSystem::new();
        fs.add_file("/ws/app.devproj", "[items]\nsources = [\"*.rs\"]\n");
        let err = load_manifest(&fs, Path::new("/ws/app.devproj")).unwrap_err();
        assert!(matches!(err, DevloopError::ProjectEvaluation { .. }));
    }

    #[test]
    fn validation_failures_name_the_project() {
        let fs = MockFileSystem::new();
        fs.add_file("/ws/app.devproj", "[watch]\npoll_interval_ms = 0\n");
        let err = load_manifest(&fs, Path::new("/ws/app.devproj")).unwrap_err();
        match err {
            DevloopError::ProjectEvaluation { project, message } => {
                assert_eq!(project, Path::new("/ws/app.devproj"));
                assert!(message.contains("poll_interval_ms"));
            }
            other => panic!("expected ProjectEvaluation, got {other:?}"),
        }
    }
}

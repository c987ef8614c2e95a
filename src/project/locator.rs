// src/project/locator.rs

use std::path::{Path, PathBuf};

use crate::errors::{DevloopError, Result};
use crate::fs::FileSystem;
use crate::project::loader::PROJECT_EXTENSION;

/// Find the single project file to watch.
///
/// - `explicit` naming a file: that file, which must exist.
/// - `explicit` naming a directory, or no `explicit` (then `work_dir`): the
///   directory must contain exactly one `*.devproj` file.
///
/// Relative `explicit` paths are taken relative to `work_dir`.
pub fn locate_project(
    fs: &dyn FileSystem,
    work_dir: &Path,
    explicit: Option<&Path>,
) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => work_dir.join(p),
        None => work_dir.to_path_buf(),
    };

    if fs.is_file(&candidate) {
        return Ok(candidate);
    }

    if !fs.is_dir(&candidate) {
        return Err(DevloopError::Locate(format!(
            "the project file '{}' does not exist",
            candidate.display()
        )));
    }

    let mut projects: Vec<PathBuf> = fs
        .read_dir(&candidate)
        .map_err(|e| DevloopError::Locate(format!("{e:#}")))?
        .into_iter()
        .filter(|p| fs.is_file(p) && p.extension().is_some_and(|ext| ext == PROJECT_EXTENSION))
        .collect();

    match projects.len() {
        0 => Err(DevloopError::Locate(format!(
            "could not find a .{PROJECT_EXTENSION} file in '{}'; use --project to name one",
            candidate.display()
        ))),
        1 => Ok(projects.remove(0)),
        _ => Err(DevloopError::Locate(format!(
            "multiple .{PROJECT_EXTENSION} files found in '{}'; use --project to pick one",
            candidate.display()
        ))),
    }
}

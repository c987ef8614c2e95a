// src/project/validate.rs

use std::path::{Component, Path};

use crate::errors::{DevloopError, Result};
use crate::project::items::build_globset;
use crate::project::manifest::{ProjectManifest, RawProjectManifest};

impl TryFrom<RawProjectManifest> for ProjectManifest {
    type Error = DevloopError;

    fn try_from(raw: RawProjectManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;
        Ok(ProjectManifest::new_unchecked(raw))
    }
}

fn validate_raw_manifest(raw: &RawProjectManifest) -> Result<()> {
    validate_references(raw)?;
    validate_patterns(raw)?;
    validate_output_dirs(raw)?;
    validate_run(raw)?;
    validate_watch(raw)?;
    Ok(())
}

fn validate_references(raw: &RawProjectManifest) -> Result<()> {
    for reference in &raw.references {
        if reference.trim().is_empty() {
            return Err(DevloopError::Config(
                "`references` must not contain empty paths".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_patterns(raw: &RawProjectManifest) -> Result<()> {
    let lists = [
        ("compile", &raw.items.compile),
        ("content", &raw.items.content),
        ("watch", &raw.items.watch),
        ("exclude", &raw.items.exclude),
    ];

    for (name, patterns) in lists {
        build_globset(patterns)
            .map_err(|e| DevloopError::Config(format!("[items].{name}: {e:#}")))?;
    }
    Ok(())
}

fn validate_output_dirs(raw: &RawProjectManifest) -> Result<()> {
    for dir in &raw.project.output_dirs {
        let escapes = Path::new(dir)
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if dir.trim().is_empty() || escapes {
            return Err(DevloopError::Config(format!(
                "[project].output_dirs entry '{dir}' must be a relative path inside the project"
            )));
        }
    }
    Ok(())
}

fn validate_run(raw: &RawProjectManifest) -> Result<()> {
    if let Some(program) = &raw.run.program {
        if program.trim().is_empty() {
            return Err(DevloopError::Config(
                "[run].program must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_watch(raw: &RawProjectManifest) -> Result<()> {
    if raw.watch.debounce_ms == 0 {
        return Err(DevloopError::Config(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.watch.poll_interval_ms == 0 {
        return Err(DevloopError::Config(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

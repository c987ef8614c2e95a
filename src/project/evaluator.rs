// src/project/evaluator.rs

//! Evaluation of a single project: which files it declares and which other
//! projects it references. The transitive walk lives in [`super::resolver`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{DevloopError, Result};
use crate::fs::FileSystem;
use crate::project::items::{ItemPatterns, collect_items};
use crate::project::loader::load_manifest;
use crate::types::ItemKind;

/// Result of evaluating one project file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluatedProject {
    /// Existing files the project declares, including the project file.
    pub items: Vec<(PathBuf, ItemKind)>,
    /// Referenced project files, as absolute paths.
    pub references: Vec<PathBuf>,
}

/// Turns a project path into its items and references.
///
/// Production code uses [`ManifestEvaluator`]; tests can count or script
/// evaluations without touching the filesystem.
pub trait ProjectEvaluator: Send + Sync {
    fn evaluate(&self, project: &Path) -> Result<EvaluatedProject>;

    /// Key under which a project is recorded as visited.
    fn normalize(&self, project: &Path) -> PathBuf {
        normalize_lexically(project)
    }
}

/// Evaluates `.devproj` manifests through a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct ManifestEvaluator {
    fs: Arc<dyn FileSystem>,
}

impl ManifestEvaluator {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl ProjectEvaluator for ManifestEvaluator {
    fn evaluate(&self, project: &Path) -> Result<EvaluatedProject> {
        let manifest = load_manifest(self.fs.as_ref(), project)?;
        let project_dir = project
            .parent()
            .ok_or_else(|| DevloopError::evaluation(project, "project file has no parent directory"))?;

        let patterns = ItemPatterns::new(&manifest.items, &manifest.project.output_dirs)
            .map_err(|e| DevloopError::evaluation(project, format!("{e:#}")))?;

        let mut items = collect_items(self.fs.as_ref(), project_dir, &patterns)
            .map_err(|e| DevloopError::evaluation(project, format!("{e:#}")))?;
        items.push((project.to_path_buf(), ItemKind::Project));

        let references = manifest
            .references
            .iter()
            .map(|r| normalize_lexically(&project_dir.join(r)))
            .collect();

        debug!(
            project = %project.display(),
            items = items.len(),
            ?references,
            "evaluated project"
        );

        Ok(EvaluatedProject { items, references })
    }

    fn normalize(&self, project: &Path) -> PathBuf {
        let lexical = normalize_lexically(project);
        self.fs.canonicalize(&lexical).unwrap_or(lexical)
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let last_is_normal = matches!(last, Some(Component::Normal(_)));
                // `..` at the root stays at the root.
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                if last_is_normal {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

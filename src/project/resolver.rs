// src/project/resolver.rs

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::errors::{DevloopError, Result};
use crate::fs::FileSystem;
use crate::project::evaluator::{ManifestEvaluator, ProjectEvaluator};
use crate::project::file_set::FileSet;

/// Produces the file set for the next watch-loop iteration.
///
/// Called again after every restart, because adding a source file or a
/// project reference changes what has to be watched.
pub trait FileSetResolver: Send {
    fn resolve(&mut self) -> Result<FileSet>;
}

/// Resolver bound to one root project, backed by a [`ProjectEvaluator`].
pub struct ProjectFileSetFactory<E: ProjectEvaluator> {
    root: PathBuf,
    evaluator: E,
}

impl ProjectFileSetFactory<ManifestEvaluator> {
    /// Resolver reading `.devproj` manifests through `fs`.
    pub fn from_manifests(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self::new(root, ManifestEvaluator::new(fs))
    }
}

impl<E: ProjectEvaluator> ProjectFileSetFactory<E> {
    pub fn new(root: impl Into<PathBuf>, evaluator: E) -> Self {
        Self {
            root: root.into(),
            evaluator,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl<E: ProjectEvaluator> FileSetResolver for ProjectFileSetFactory<E> {
    fn resolve(&mut self) -> Result<FileSet> {
        resolve_file_set(&self.evaluator, &self.root)
    }
}

/// Evaluate `root` and every project it transitively references, and union
/// their items.
///
/// The walk is an explicit breadth-first worklist over a visited set keyed
/// by the evaluator's normalized project path. A project is evaluated at
/// most once per call, so reference cycles terminate.
pub fn resolve_file_set(evaluator: &dyn ProjectEvaluator, root: &Path) -> Result<FileSet> {
    let root = evaluator.normalize(root);

    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<(PathBuf, Option<PathBuf>)> = VecDeque::new();
    queue.push_back((root, None));

    let mut builder = FileSet::builder();

    while let Some((project, referrer)) = queue.pop_front() {
        if !visited.insert(project.clone()) {
            trace!(project = %project.display(), "project already evaluated");
            continue;
        }

        let evaluated = evaluator
            .evaluate(&project)
            .map_err(|e| attach_referrer(e, referrer.as_deref()))?;

        builder.add_project(&project);
        for (path, kind) in evaluated.items {
            builder.add_file(path, kind);
        }

        for reference in evaluated.references {
            let reference = evaluator.normalize(&reference);
            if !visited.contains(&reference) {
                queue.push_back((reference, Some(project.clone())));
            }
        }
    }

    let file_set = builder.build();
    debug!(
        projects = visited.len(),
        files = file_set.len(),
        "resolved file set"
    );
    Ok(file_set)
}

fn attach_referrer(err: DevloopError, referrer: Option<&Path>) -> DevloopError {
    match (err, referrer) {
        (DevloopError::ProjectEvaluation { project, message }, Some(referrer)) => {
            DevloopError::ProjectEvaluation {
                project,
                message: format!("{message} (referenced from {})", referrer.display()),
            }
        }
        (err, _) => err,
    }
}

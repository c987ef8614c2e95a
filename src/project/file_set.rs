// src/project/file_set.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::types::ItemKind;

/// Snapshot of everything one resolution pass decided to watch.
///
/// Built once per watch-loop iteration and never mutated afterwards, so the
/// watcher can borrow it without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<PathBuf, ItemKind>,
    projects: BTreeSet<PathBuf>,
}

impl FileSet {
    pub fn builder() -> FileSetBuilder {
        FileSetBuilder::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn kind_of(&self, path: &Path) -> Option<ItemKind> {
        self.files.get(path).copied()
    }

    /// Watched paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, ItemKind)> {
        self.files.iter().map(|(p, k)| (p.as_path(), *k))
    }

    /// Project files that contributed to this set.
    pub fn projects(&self) -> impl Iterator<Item = &Path> {
        self.projects.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Directories that must be observed to see every member change.
    pub fn directories(&self) -> BTreeSet<PathBuf> {
        self.files
            .keys()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect()
    }
}

/// Accumulates items across projects; the first kind recorded for a path
/// wins.
#[derive(Debug, Default)]
pub struct FileSetBuilder {
    files: BTreeMap<PathBuf, ItemKind>,
    projects: BTreeSet<PathBuf>,
}

impl FileSetBuilder {
    pub fn add_file(&mut self, path: impl Into<PathBuf>, kind: ItemKind) -> &mut Self {
        self.files.entry(path.into()).or_insert(kind);
        self
    }

    pub fn add_project(&mut self, project: impl Into<PathBuf>) -> &mut Self {
        self.projects.insert(project.into());
        self
    }

    pub fn build(self) -> FileSet {
        FileSet {
            files: self.files,
            projects: self.projects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_keep_first_kind() {
        let mut builder = FileSet::builder();
        builder
            .add_file("/ws/a.rs", ItemKind::Compile)
            .add_file("/ws/a.rs", ItemKind::Watch)
            .add_file("/ws/b.json", ItemKind::Content);
        let set = builder.build();

        assert_eq!(set.len(), 2);
        assert_eq!(set.kind_of(Path::new("/ws/a.rs")), Some(ItemKind::Compile));
    }

    #[test]
    fn directories_are_deduplicated_parents() {
        let mut builder = FileSet::builder();
        builder
            .add_file("/ws/app/src/a.rs", ItemKind::Compile)
            .add_file("/ws/app/src/b.rs", ItemKind::Compile)
            .add_file("/ws/app/app.devproj", ItemKind::Project);
        let dirs: Vec<PathBuf> = builder.build().directories().into_iter().collect();

        assert_eq!(
            dirs,
            vec![PathBuf::from("/ws/app"), PathBuf::from("/ws/app/src")]
        );
    }
}

// src/project/items.rs

//! Item patterns of a single project and the directory walk that expands
//! them into concrete files.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::trace;

use crate::fs::FileSystem;
use crate::project::manifest::ItemsSection;
use crate::types::ItemKind;

/// Directories that are never part of a project's items.
const ALWAYS_SKIPPED_DIRS: &[&str] = &[".git"];

/// Compiled `[items]` globs plus the output directories to skip.
///
/// Patterns are matched against paths relative to the project directory,
/// with forward slashes (e.g. `"src/main.rs"`). `*` does not cross `/`;
/// use `**` for that.
#[derive(Clone)]
pub struct ItemPatterns {
    compile: GlobSet,
    content: GlobSet,
    watch: GlobSet,
    exclude: GlobSet,
    output_dirs: Vec<String>,
}

impl fmt::Debug for ItemPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemPatterns")
            .field("output_dirs", &self.output_dirs)
            .finish_non_exhaustive()
    }
}

impl ItemPatterns {
    pub fn new(items: &ItemsSection, output_dirs: &[String]) -> Result<Self> {
        Ok(Self {
            compile: build_globset(&items.compile).context("building compile globset")?,
            content: build_globset(&items.content).context("building content globset")?,
            watch: build_globset(&items.watch).context("building watch globset")?,
            exclude: build_globset(&items.exclude).context("building exclude globset")?,
            output_dirs: output_dirs
                .iter()
                .map(|d| d.trim_end_matches('/').replace('\\', "/"))
                .collect(),
        })
    }

    /// Which item list claims `rel_path`, if any.
    ///
    /// Excludes win over everything; otherwise compile, content and watch are
    /// tried in that order and the first match decides the kind.
    pub fn classify(&self, rel_path: &str) -> Option<ItemKind> {
        if self.exclude.is_match(rel_path) {
            return None;
        }
        if self.compile.is_match(rel_path) {
            Some(ItemKind::Compile)
        } else if self.content.is_match(rel_path) {
            Some(ItemKind::Content)
        } else if self.watch.is_match(rel_path) {
            Some(ItemKind::Watch)
        } else {
            None
        }
    }

    /// Whether the directory at `rel_dir` must not be descended into.
    pub fn skips_dir(&self, rel_dir: &str) -> bool {
        let name = rel_dir.rsplit('/').next().unwrap_or(rel_dir);
        ALWAYS_SKIPPED_DIRS.contains(&name) || self.output_dirs.iter().any(|d| d == rel_dir)
    }
}

/// Build a GlobSet from string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Walk `project_dir` and collect every file claimed by `patterns`.
///
/// Only files that exist at walk time are returned. Output directories are
/// pruned before descending, so nothing under them is ever listed. Each
/// directory is walked once by its canonical path; symlinked aliases of a
/// directory already walked are skipped.
pub fn collect_items(
    fs: &dyn FileSystem,
    project_dir: &Path,
    patterns: &ItemPatterns,
) -> Result<Vec<(PathBuf, ItemKind)>> {
    let mut items = Vec::new();
    let mut stack = vec![project_dir.to_path_buf()];
    let mut walked = HashSet::new();
    walked.insert(canonical_dir(fs, project_dir));

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let Some(rel_str) = relative_str(project_dir, &path) else {
                continue;
            };

            if fs.is_dir(&path) {
                if patterns.skips_dir(&rel_str) {
                    trace!(dir = %rel_str, "skipping directory");
                } else if walked.insert(canonical_dir(fs, &path)) {
                    stack.push(path);
                } else {
                    trace!(dir = %rel_str, "directory already walked through another path");
                }
            } else if fs.is_file(&path) {
                if let Some(kind) = patterns.classify(&rel_str) {
                    items.push((path, kind));
                }
            }
        }
    }

    Ok(items)
}

fn canonical_dir(fs: &dyn FileSystem, dir: &Path) -> PathBuf {
    fs.canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// `path` relative to `root` with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn patterns(compile: &[&str], content: &[&str], exclude: &[&str]) -> ItemPatterns {
        let items = ItemsSection {
            compile: compile.iter().map(|s| s.to_string()).collect(),
            content: content.iter().map(|s| s.to_string()).collect(),
            watch: vec![],
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        };
        ItemPatterns::new(&items, &["bin".to_string(), "obj".to_string()]).unwrap()
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let p = patterns(&["src/*.rs"], &[], &[]);
        assert_eq!(p.classify("src/main.rs"), Some(ItemKind::Compile));
        assert_eq!(p.classify("src/nested/mod.rs"), None);
    }

    #[test]
    fn exclude_beats_every_list() {
        let p = patterns(&["**/*.rs"], &["**/*"], &["**/generated.rs"]);
        assert_eq!(p.classify("src/generated.rs"), None);
        assert_eq!(p.classify("src/lib.rs"), Some(ItemKind::Compile));
        assert_eq!(p.classify("README.md"), Some(ItemKind::Content));
    }

    #[test]
    fn walk_prunes_output_and_git_dirs() {
        let fs = MockFileSystem::new();
        fs.add_file("/ws/app/src/main.rs", "");
        fs.add_file("/ws/app/bin/debug/main.rs", "");
        fs.add_file("/ws/app/obj/cache.rs", "");
        fs.add_file("/ws/app/.git/hooks/pre-commit.rs", "");
        fs.add_file("/ws/app/src/bin/tool.rs", "");

        let p = patterns(&["**/*.rs"], &[], &[]);
        let mut found: Vec<PathBuf> = collect_items(&fs, Path::new("/ws/app"), &p)
            .unwrap()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        found.sort();

        // Only the top-level `bin` is an output dir; `src/bin` is a source dir.
        assert_eq!(
            found,
            vec![
                PathBuf::from("/ws/app/src/bin/tool.rs"),
                PathBuf::from("/ws/app/src/main.rs"),
            ]
        );
    }
}

// src/project/mod.rs

//! Project model and file set resolution.
//!
//! A project is a `.devproj` TOML file naming source items and references
//! to other projects. This module turns a root project into the flat
//! [`FileSet`] the watcher observes:
//!
//! - [`manifest`], [`loader`], [`validate`]: the file format.
//! - [`items`]: glob patterns and the directory walk.
//! - [`evaluator`]: one project -> items + references.
//! - [`resolver`]: transitive walk over references.
//! - [`locator`]: finding the root project on disk.

pub mod evaluator;
pub mod file_set;
pub mod items;
pub mod loader;
pub mod locator;
pub mod manifest;
pub mod resolver;
pub mod validate;

pub use evaluator::{EvaluatedProject, ManifestEvaluator, ProjectEvaluator};
pub use file_set::FileSet;
pub use loader::{PROJECT_EXTENSION, load_manifest};
pub use locator::locate_project;
pub use manifest::{ProjectManifest, RawProjectManifest};
pub use resolver::{FileSetResolver, ProjectFileSetFactory, resolve_file_set};

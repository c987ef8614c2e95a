// src/project/manifest.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// A project description file as read from TOML.
///
/// ```toml
/// references = ["../core/core.devproj"]
///
/// [project]
/// name = "api"
/// output_dirs = ["bin", "obj"]
///
/// [items]
/// compile = ["src/**/*.rs"]
/// content = ["static/**/*"]
/// watch = ["config/*.json"]
/// exclude = ["**/*.tmp"]
///
/// [run]
/// program = "cargo"
/// args = ["run"]
///
/// [watch]
/// debounce_ms = 300
/// ```
///
/// Every section is optional. `[run]` and `[watch]` are only honoured on the
/// root project; referenced projects contribute items and references only.
///
/// Use [`ProjectManifest::try_from`] (or the loader) to obtain a validated
/// manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProjectManifest {
    /// Other projects this one depends on, relative to this file's directory.
    #[serde(default)]
    pub references: Vec<String>,

    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub items: ItemsSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated manifest.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    pub references: Vec<String>,
    pub project: ProjectSection,
    pub items: ItemsSection,
    pub run: RunSection,
    pub watch: WatchSection,
}

impl ProjectManifest {
    /// Construct without validation. Only the validator should call this.
    pub(crate) fn new_unchecked(raw: RawProjectManifest) -> Self {
        Self {
            references: raw.references,
            project: raw.project,
            items: raw.items,
            run: raw.run,
            watch: raw.watch,
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Display name; the file stem is used when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Build output directories, relative to the project directory.
    ///
    /// These are never walked: the running program writes into them and
    /// watching them would make every build restart itself.
    #[serde(default = "default_output_dirs")]
    pub output_dirs: Vec<String>,
}

fn default_output_dirs() -> Vec<String> {
    vec!["bin".to_string(), "obj".to_string(), "target".to_string()]
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            output_dirs: default_output_dirs(),
        }
    }
}

/// `[items]` section: glob patterns relative to the project directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemsSection {
    #[serde(default)]
    pub compile: Vec<String>,

    #[serde(default)]
    pub content: Vec<String>,

    #[serde(default)]
    pub watch: Vec<String>,

    /// Removes matches from all three lists above.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[run]` section: what to launch for the root project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[watch]` section: watcher and supervisor tuning for the root project.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Quiet period before a burst of changes counts as one change.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a stopping child gets after the graceful request.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Poll the filesystem instead of using native notifications.
    #[serde(default)]
    pub use_polling: bool,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_grace_period_ms() -> u64 {
    5_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            grace_period_ms: default_grace_period_ms(),
            use_polling: false,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

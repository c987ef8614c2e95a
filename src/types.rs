use std::fmt;
use std::path::{Path, PathBuf};

/// What kind of project item contributed a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    /// Compilable sources (`[items].compile`).
    Compile,
    /// Content / embedded files (`[items].content`).
    Content,
    /// Files the project explicitly asks to be watched (`[items].watch`).
    Watch,
    /// A project description file itself.
    Project,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemKind::Compile => "compile",
            ItemKind::Content => "content",
            ItemKind::Watch => "watch",
            ItemKind::Project => "project",
        };
        f.write_str(s)
    }
}

/// Kind of a single filesystem notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Renamed,
}

/// One filesystem notification for one absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Exit code of a child process. `None` when it was ended by a signal.
pub type ExitCode = Option<i32>;

/// What to launch on each iteration of the watch loop.
///
/// Built once by the outer layer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    executable: String,
    working_dir: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(
        executable: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        Self {
            executable: executable.into(),
            working_dir: working_dir.into(),
            args,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Human-readable command line, used for verbose reporting.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_args_with_spaces() {
        let spec = ProcessSpec::new(
            "cargo",
            "/tmp",
            vec!["run".into(), "--".into(), "hello world".into()],
        );
        assert_eq!(spec.command_line(), "cargo run -- \"hello world\"");
    }

    #[test]
    fn item_kind_displays_lowercase() {
        assert_eq!(ItemKind::Content.to_string(), "content");
    }
}

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use devloop::project::FileSet;
use devloop::types::{ItemKind, ProcessSpec};

/// Builder writing a `.devproj` manifest to disk.
pub struct ProjectBuilder {
    dir: PathBuf,
    name: String,
    references: Vec<String>,
    compile: Vec<String>,
    content: Vec<String>,
    watch: Vec<String>,
    exclude: Vec<String>,
    program: Option<String>,
    args: Vec<String>,
}

impl ProjectBuilder {
    /// Manifest `<dir>/<name>.devproj`.
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            dir: dir.into(),
            name: name.to_string(),
            references: vec![],
            compile: vec![],
            content: vec![],
            watch: vec![],
            exclude: vec![],
            program: None,
            args: vec![],
        }
    }

    pub fn reference(mut self, path: &str) -> Self {
        self.references.push(path.to_string());
        self
    }

    pub fn compile(mut self, pattern: &str) -> Self {
        self.compile.push(pattern.to_string());
        self
    }

    pub fn content(mut self, pattern: &str) -> Self {
        self.content.push(pattern.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.exclude.push(pattern.to_string());
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.program = Some(program.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn to_toml(&self) -> String {
        let mut out = format!("references = {}\n\n", toml_list(&self.references));

        out.push_str("[items]\n");
        out.push_str(&format!("compile = {}\n", toml_list(&self.compile)));
        out.push_str(&format!("content = {}\n", toml_list(&self.content)));
        out.push_str(&format!("watch = {}\n", toml_list(&self.watch)));
        out.push_str(&format!("exclude = {}\n", toml_list(&self.exclude)));

        if let Some(program) = &self.program {
            out.push_str("\n[run]\n");
            out.push_str(&format!("program = {program:?}\n"));
            out.push_str(&format!("args = {}\n", toml_list(&self.args)));
        }
        out
    }

    /// Write the manifest, creating the directory, and return its path.
    pub fn write(self) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.devproj", self.name));
        fs::write(&path, self.to_toml())?;
        Ok(path)
    }
}

fn toml_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> io::Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}

/// File set of compile items.
pub fn file_set<P: AsRef<Path>>(paths: &[P]) -> FileSet {
    let mut builder = FileSet::builder();
    for p in paths {
        builder.add_file(p.as_ref(), ItemKind::Compile);
    }
    builder.build()
}

/// `sh -c <script>` in the temp directory.
pub fn sh_spec(script: &str) -> ProcessSpec {
    ProcessSpec::new(
        "sh",
        std::env::temp_dir(),
        vec!["-c".to_string(), script.to_string()],
    )
}

// src/config/settings.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::errors::{DevloopError, Result};
use crate::project::ProjectManifest;
use crate::types::ProcessSpec;
use crate::watch::WatchOptions;

/// Fallback program when neither `--program` nor `[run].program` is set.
pub const PROGRAM_ENV: &str = "DEVLOOP_PROGRAM";
/// Truthy values ("1", "true", "yes", "on") switch to the polling watcher.
pub const POLLING_ENV: &str = "DEVLOOP_USE_POLLING_WATCHER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root project file.
    pub project: PathBuf,
    pub spec: ProcessSpec,
    pub watch: WatchOptions,
    pub grace_period: Duration,
}

impl Settings {
    /// Merge CLI arguments over the root project's manifest.
    ///
    /// `env` looks up environment variables; pass `|k| std::env::var(k).ok()`
    /// in production.
    pub fn from_sources(
        args: &CliArgs,
        project: &Path,
        manifest: &ProjectManifest,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let program = args
            .program
            .clone()
            .or_else(|| manifest.run.program.clone())
            .or_else(|| env(PROGRAM_ENV))
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                DevloopError::Config(format!(
                    "no program to run: pass --program, set [run].program in {} or set {PROGRAM_ENV}",
                    project.display()
                ))
            })?;

        let program_args = if args.program_args.is_empty() {
            manifest.run.args.clone()
        } else {
            args.program_args.clone()
        };

        let working_dir = project
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let extra_env = manifest
            .run
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let spec = ProcessSpec::new(program, working_dir, program_args).with_env(extra_env);

        let debounce_ms = args.debounce_ms.unwrap_or(manifest.watch.debounce_ms);
        if debounce_ms == 0 {
            return Err(DevloopError::Config(
                "--debounce-ms must be >= 1 (got 0)".to_string(),
            ));
        }
        let grace_period_ms = args
            .grace_period_ms
            .unwrap_or(manifest.watch.grace_period_ms);

        let use_polling = args.poll
            || manifest.watch.use_polling
            || env(POLLING_ENV).is_some_and(|v| is_truthy(&v));

        Ok(Self {
            project: project.to_path_buf(),
            spec,
            watch: WatchOptions {
                debounce: Duration::from_millis(debounce_ms),
                use_polling,
                poll_interval: Duration::from_millis(manifest.watch.poll_interval_ms),
            },
            grace_period: Duration::from_millis(grace_period_ms),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::RawProjectManifest;

    fn manifest(toml_src: &str) -> ProjectManifest {
        let raw: RawProjectManifest = toml::from_str(toml_src).unwrap();
        ProjectManifest::try_from(raw).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn manifest_supplies_defaults() {
        let m = manifest(
            r#"
            [run]
            program = "cargo"
            args = ["run"]
            env = { RUST_LOG = "debug" }

            [watch]
            debounce_ms = 150
            grace_period_ms = 2000
            "#,
        );

        let s = Settings::from_sources(
            &CliArgs::default(),
            Path::new("/ws/api/api.devproj"),
            &m,
            no_env,
        )
        .unwrap();

        assert_eq!(s.spec.executable(), "cargo");
        assert_eq!(s.spec.args(), ["run".to_string()]);
        assert_eq!(s.spec.working_dir(), Path::new("/ws/api"));
        assert_eq!(
            s.spec.env(),
            [("RUST_LOG".to_string(), "debug".to_string())]
        );
        assert_eq!(s.watch.debounce, Duration::from_millis(150));
        assert_eq!(s.grace_period, Duration::from_millis(2000));
        assert!(!s.watch.use_polling);
    }

    #[test]
    fn cli_overrides_manifest() {
        let m = manifest("[run]\nprogram = \"cargo\"\nargs = [\"run\"]\n");
        let args = CliArgs {
            program: Some("node".to_string()),
            program_args: vec!["server.js".to_string()],
            debounce_ms: Some(50),
            poll: true,
            quiet: true,
            ..CliArgs::default()
        };

        let s = Settings::from_sources(&args, Path::new("/ws/api/api.devproj"), &m, no_env)
            .unwrap();

        assert_eq!(s.spec.executable(), "node");
        assert_eq!(s.spec.args(), ["server.js".to_string()]);
        assert_eq!(s.watch.debounce, Duration::from_millis(50));
        assert!(s.watch.use_polling);
    }

    #[test]
    fn environment_fallbacks() {
        let m = manifest("");
        let env = |key: &str| match key {
            PROGRAM_ENV => Some("make".to_string()),
            POLLING_ENV => Some("True".to_string()),
            _ => None,
        };

        let s = Settings::from_sources(&CliArgs::default(), Path::new("/ws/a.devproj"), &m, env)
            .unwrap();
        assert_eq!(s.spec.executable(), "make");
        assert!(s.watch.use_polling);
    }

    #[test]
    fn missing_program_is_a_config_error() {
        let m = manifest("");
        let err = Settings::from_sources(&CliArgs::default(), Path::new("/ws/a.devproj"), &m, no_env)
            .unwrap_err();
        assert!(matches!(err, DevloopError::Config(_)));
        assert!(err.to_string().contains(PROGRAM_ENV));
    }

    #[test]
    fn zero_debounce_from_cli_is_rejected() {
        let m = manifest("[run]\nprogram = \"cargo\"\n");
        let args = CliArgs {
            debounce_ms: Some(0),
            ..CliArgs::default()
        };
        assert!(Settings::from_sources(&args, Path::new("/ws/a.devproj"), &m, no_env).is_err());
    }
}

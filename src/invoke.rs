//! Engine invocation: argument building, fast-fail validation, and a hard
//! wall-clock timeout around the subprocess.
//!
//! Process spawning sits behind [`ProcessRunner`] so orchestration logic can
//! be exercised against a scripted fake without touching the system.

use crate::error::RunError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default wall-clock budget for one engine run.
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
/// Captured streams and exit status of a finished subprocess.
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
/// Capability to run an external program with a bounded wall clock.
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, capturing stdout/stderr/exit code.
    ///
    /// Returns `RunError::Timeout` when the budget elapses; the child is
    /// killed, never left running.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        limit: Duration,
    ) -> Result<ExecOutput, RunError>;
}

/// Real subprocess execution via tokio.
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        limit: Duration,
    ) -> Result<ExecOutput, RunError> {
        debug!(program = %program.display(), ?args, "spawning");
        // kill_on_drop guarantees the child is terminated when the timeout
        // drops the pending output future.
        let fut = Command::new(program).args(args).kill_on_drop(true).output();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => {
                let out = result?;
                Ok(ExecOutput {
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                    exit_code: out.status.code(),
                })
            }
            Err(_) => Err(RunError::Timeout(limit.as_secs())),
        }
    }
}

/// Build the engine argument list for one run. `--no-git-ignore` forces
/// explicitly named targets to be scanned even when source control ignores
/// them; `--metrics=off` disables phoning home.
pub fn build_args(config: &Path, targets: &[PathBuf]) -> Vec<String> {
    let mut args = vec![
        "--config".to_string(),
        config.to_string_lossy().to_string(),
        "--json".to_string(),
        "--no-git-ignore".to_string(),
        "--metrics=off".to_string(),
    ];
    for t in targets {
        args.push(t.to_string_lossy().to_string());
    }
    args
}

/// Invoke the engine against `targets` with the given rule config.
///
/// Validates the config path and every target before spawning; a missing
/// path is reported without the subprocess ever starting. The exit code is
/// captured but not interpreted here: the engine overloads non-zero to also
/// mean "findings present".
pub async fn invoke(
    runner: &dyn ProcessRunner,
    engine: &Path,
    targets: &[PathBuf],
    config: &Path,
    limit: Duration,
) -> Result<ExecOutput, RunError> {
    if !config.exists() {
        return Err(RunError::ConfigNotFound(config.to_path_buf()));
    }
    for target in targets {
        if !target.exists() {
            return Err(RunError::TargetNotFound(target.clone()));
        }
    }
    let args = build_args(config, targets);
    runner.run(engine, &args, limit).await
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted process runner shared by the install and runner tests.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub enum Canned {
        Exit {
            code: i32,
            stdout: String,
            stderr: String,
        },
        TimedOut,
    }

    impl Canned {
        pub fn ok(stdout: &str) -> Self {
            Canned::Exit {
                code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            }
        }

        pub fn fail(stderr: &str) -> Self {
            Canned::Exit {
                code: 1,
                stdout: String::new(),
                stderr: stderr.to_string(),
            }
        }
    }

    /// Responds with canned outcomes keyed by the program's file stem, in
    /// push order, falling back to a per-program default and finally to a
    /// generic non-zero exit.
    #[derive(Default)]
    pub struct ScriptedRunner {
        scripts: Mutex<HashMap<String, VecDeque<Canned>>>,
        fallbacks: Mutex<HashMap<String, Canned>>,
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, program: &str, canned: Canned) {
            self.scripts
                .lock()
                .unwrap()
                .entry(program.to_string())
                .or_default()
                .push_back(canned);
        }

        pub fn set_fallback(&self, program: &str, canned: Canned) {
            self.fallbacks
                .lock()
                .unwrap()
                .insert(program.to_string(), canned);
        }

        pub fn calls_for(&self, program: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| stem(p) == program)
                .count()
        }

        pub fn last_args_for(&self, program: &str) -> Option<Vec<String>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(p, _)| stem(p) == program)
                .map(|(_, a)| a.clone())
        }
    }

    fn stem(p: &Path) -> String {
        p.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &Path,
            args: &[String],
            limit: Duration,
        ) -> Result<ExecOutput, RunError> {
            let key = stem(program);
            self.calls
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec()));
            let canned = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&key)
                .and_then(|q| q.pop_front())
                .or_else(|| self.fallbacks.lock().unwrap().get(&key).cloned())
                .unwrap_or(Canned::Exit {
                    code: 1,
                    stdout: String::new(),
                    stderr: String::new(),
                });
            match canned {
                Canned::Exit {
                    code,
                    stdout,
                    stderr,
                } => Ok(ExecOutput {
                    stdout,
                    stderr,
                    exit_code: Some(code),
                }),
                Canned::TimedOut => Err(RunError::Timeout(limit.as_secs())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Canned, ScriptedRunner};
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_build_args_flags_then_targets() {
        let args = build_args(
            Path::new("rules"),
            &[PathBuf::from("a.py"), PathBuf::from("src")],
        );
        assert_eq!(
            args,
            vec![
                "--config",
                "rules",
                "--json",
                "--no-git-ignore",
                "--metrics=off",
                "a.py",
                "src"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_target_fails_without_spawning() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("rules");
        fs::create_dir(&config).unwrap();
        let runner = ScriptedRunner::new();

        let err = invoke(
            &runner,
            Path::new("semgrep"),
            &[dir.path().join("nope.py")],
            &config,
            ANALYSIS_TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RunError::TargetNotFound(_)));
        assert_eq!(runner.calls_for("semgrep"), 0);
    }

    #[tokio::test]
    async fn test_missing_config_is_distinct_from_missing_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a.py");
        fs::write(&target, "x = 1\n").unwrap();
        let runner = ScriptedRunner::new();

        let err = invoke(
            &runner,
            Path::new("semgrep"),
            &[target],
            &dir.path().join("no-rules"),
            ANALYSIS_TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RunError::ConfigNotFound(_)));
        assert_eq!(runner.calls_for("semgrep"), 0);
    }

    #[tokio::test]
    async fn test_invoke_passes_streams_through() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("rules.yml");
        fs::write(&config, "rules: []\n").unwrap();
        let target = dir.path().join("a.py");
        fs::write(&target, "x = 1\n").unwrap();

        let runner = ScriptedRunner::new();
        runner.push("semgrep", Canned::ok("{\"results\": []}"));

        let out = invoke(
            &runner,
            Path::new("semgrep"),
            &[target.clone()],
            &config,
            ANALYSIS_TIMEOUT,
        )
        .await
        .unwrap();
        assert!(out.succeeded());
        assert_eq!(out.stdout, "{\"results\": []}");
        let args = runner.last_args_for("semgrep").unwrap();
        assert_eq!(args[0], "--config");
        assert!(args.contains(&target.to_string_lossy().to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_kills_on_timeout() {
        // A sleeping child must be terminated, not merely abandoned.
        let started = std::time::Instant::now();
        let err = SystemRunner
            .run(
                Path::new("sleep"),
                &["5".to_string()],
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}

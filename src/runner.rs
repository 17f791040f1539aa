//! Runner facade composing locate, install, invoke, and parse.
//!
//! `run` never surfaces a fault to its caller: every failure path lands in
//! the result's `errors` list with `success=false`, so editor extensions and
//! CI steps can call it without exception scaffolding.

use crate::error::RunError;
use crate::install::{probe_version, InstallGate, Installer, SnapshotFn};
use crate::invoke::{self, ProcessRunner, SystemRunner, ANALYSIS_TIMEOUT};
use crate::locate::{self, EngineLocation, Environment};
use crate::models::ScanResult;
use crate::parse;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Orchestrates one engine run per `run` call. Engine paths and results are
/// call-scoped; only the install gate persists across calls.
pub struct Runner {
    rules_dir: PathBuf,
    timeout: Duration,
    auto_install: bool,
    engine_override: Option<PathBuf>,
    exec: Arc<dyn ProcessRunner>,
    gate: Arc<InstallGate>,
    snapshot: Option<SnapshotFn>,
}

impl Runner {
    /// Runner over a rules file or directory, with real process execution
    /// and a fresh environment snapshot per locator pass.
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Runner {
            rules_dir: rules_dir.into(),
            timeout: ANALYSIS_TIMEOUT,
            auto_install: false,
            engine_override: None,
            exec: Arc::new(SystemRunner),
            gate: Arc::new(InstallGate::new()),
            snapshot: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Install the engine automatically when the locator comes up empty.
    pub fn with_auto_install(mut self, yes: bool) -> Self {
        self.auto_install = yes;
        self
    }

    /// Configured engine path checked before every other locator strategy.
    pub fn with_engine_override(mut self, path: Option<PathBuf>) -> Self {
        self.engine_override = path;
        self
    }

    /// Substitute the process-execution capability (tests, sandboxes).
    pub fn with_exec(mut self, exec: Arc<dyn ProcessRunner>) -> Self {
        self.exec = exec;
        self
    }

    /// Share an install gate across runners within one process.
    pub fn with_gate(mut self, gate: Arc<InstallGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Substitute the environment-snapshot source (tests).
    pub fn with_snapshot(mut self, snapshot: SnapshotFn) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    fn snapshot(&self) -> Environment {
        match &self.snapshot {
            Some(f) => f(),
            None => Environment::capture(self.engine_override.clone()),
        }
    }

    fn installer(&self) -> Installer {
        let snap: SnapshotFn = match &self.snapshot {
            Some(f) => f.clone(),
            None => {
                let explicit = self.engine_override.clone();
                Arc::new(move || Environment::capture(explicit.clone()))
            }
        };
        Installer::new(self.gate.clone(), self.exec.clone(), snap)
    }

    /// Ensure the engine is installed and verified (doctor `--install`).
    pub async fn ensure_installed(&self) -> Result<(), RunError> {
        self.installer().ensure_installed().await
    }

    /// Run the engine against `targets`.
    ///
    /// `rule_file` selects one file inside the rules directory; otherwise
    /// the whole directory is handed to the engine as `--config`.
    pub async fn run(&self, targets: &[PathBuf], rule_file: Option<&str>) -> ScanResult {
        let config = match rule_file {
            Some(f) => self.rules_dir.join(f),
            None => self.rules_dir.clone(),
        };

        let engine = match self.resolve_engine().await {
            Ok(loc) => loc,
            Err(e) => return ScanResult::failure(e.to_string()),
        };
        debug!(engine = %engine.path.display(), strategy = engine.strategy.as_str(), "running scan");

        let out = match invoke::invoke(
            self.exec.as_ref(),
            &engine.path,
            targets,
            &config,
            self.timeout,
        )
        .await
        {
            Ok(o) => o,
            Err(e) => return ScanResult::failure(e.to_string()),
        };

        if out.stdout.is_empty() {
            // Exit codes are overloaded (non-zero can mean "findings"), so
            // only the absence of JSON counts as an engine failure here.
            return ScanResult::failure(
                RunError::EmptyOutput(out.stderr.trim().to_string()).to_string(),
            );
        }
        parse::parse_output(&out.stdout)
    }

    async fn resolve_engine(&self) -> Result<EngineLocation, RunError> {
        if let Some(loc) = locate::locate(&self.snapshot()) {
            return Ok(loc);
        }
        if !self.auto_install {
            return Err(RunError::NotInstalled);
        }
        self.installer().ensure_installed().await?;
        // Re-run the full locator on a fresh snapshot; the install changed
        // the environment.
        locate::locate(&self.snapshot()).ok_or(RunError::VerificationFailed)
    }

    /// Locator + version-probe report for `semrun doctor`.
    pub async fn engine_report(&self) -> EngineReport {
        match locate::locate(&self.snapshot()) {
            Some(loc) => {
                let version = probe_version(self.exec.as_ref(), &loc.path).await;
                EngineReport {
                    found: true,
                    path: Some(loc.path.to_string_lossy().to_string()),
                    strategy: Some(loc.strategy.as_str()),
                    version,
                }
            }
            None => EngineReport::default(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
/// Engine health summary for the doctor command.
pub struct EngineReport {
    pub found: bool,
    pub path: Option<String>,
    pub strategy: Option<&'static str>,
    pub version: Option<String>,
}

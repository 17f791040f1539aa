//! Engine installation with a process-wide gate and verified retries.
//!
//! The installer reporting success is not trusted on its own: a freshly
//! installed console script may not be resolvable immediately, so
//! verification re-runs the full locator with backoff before the install is
//! considered complete.

use crate::error::RunError;
use crate::invoke::ProcessRunner;
use crate::locate::{self, Environment};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Budget for `semgrep --version`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Budget for the pip install itself.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(60);
/// Locator+probe verification attempts after a reported-successful install.
pub const VERIFY_ATTEMPTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Lifecycle of the per-process installation attempt.
pub enum InstallState {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// Process-wide guard against concurrent installs.
///
/// Two scans detecting "not installed" at the same time must not both launch
/// pip against the same environment; the second caller waits on the flight
/// lock and then observes the first caller's outcome.
#[derive(Default)]
pub struct InstallGate {
    flight: tokio::sync::Mutex<()>,
    state: std::sync::Mutex<InstallState>,
}

impl InstallGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InstallState {
        *self.state.lock().unwrap()
    }

    fn set(&self, next: InstallState) {
        *self.state.lock().unwrap() = next;
    }

    /// Test-isolation hook; the gate is never reset implicitly.
    pub fn reset(&self) {
        self.set(InstallState::NotStarted);
    }
}

/// Post-install verification delay schedule: 1s, 2s, 4s between the
/// [`VERIFY_ATTEMPTS`] locator probes.
#[derive(Debug, Default)]
pub struct Backoff {
    attempt: usize,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= VERIFY_ATTEMPTS {
            None
        } else {
            Some(Duration::from_secs(1 << (self.attempt - 1)))
        }
    }
}

/// Factory producing a fresh environment snapshot per locator pass.
pub type SnapshotFn = Arc<dyn Fn() -> Environment + Send + Sync>;

/// Ensures a runnable engine, installing it via pip when necessary.
pub struct Installer {
    gate: Arc<InstallGate>,
    exec: Arc<dyn ProcessRunner>,
    snapshot: SnapshotFn,
}

impl Installer {
    pub fn new(gate: Arc<InstallGate>, exec: Arc<dyn ProcessRunner>, snapshot: SnapshotFn) -> Self {
        Installer {
            gate,
            exec,
            snapshot,
        }
    }

    /// True when the locator resolves an engine and a version probe exits
    /// zero within [`PROBE_TIMEOUT`]. Always works from a fresh snapshot.
    pub async fn check_installed(&self) -> bool {
        let env = (self.snapshot)();
        match locate::locate(&env) {
            Some(loc) => probe_version(self.exec.as_ref(), &loc.path).await.is_some(),
            None => false,
        }
    }

    /// Ensure the engine is installed and verified.
    ///
    /// Returns `Ok(())` on a verified engine; `InstallFailed` when pip
    /// itself fails; `VerificationFailed` when pip reports success but the
    /// engine never becomes resolvable within the retry budget.
    pub async fn ensure_installed(&self) -> Result<(), RunError> {
        if self.check_installed().await {
            self.gate.set(InstallState::Complete);
            return Ok(());
        }

        let _flight = self.gate.flight.lock().await;
        // A concurrent caller may have finished the install while we waited.
        if self.gate.state() == InstallState::Complete {
            return Ok(());
        }

        self.gate.set(InstallState::InProgress);
        info!("semgrep not found; installing via pip");
        if let Err(e) = self.run_pip_install().await {
            self.gate.reset();
            return Err(e);
        }

        let mut backoff = Backoff::new();
        loop {
            if self.check_installed().await {
                self.gate.set(InstallState::Complete);
                return Ok(());
            }
            match backoff.next_delay() {
                Some(delay) => {
                    debug!(?delay, "install verification failed; retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    self.gate.reset();
                    return Err(RunError::VerificationFailed);
                }
            }
        }
    }

    async fn run_pip_install(&self) -> Result<(), RunError> {
        let args: Vec<String> = ["-m", "pip", "install", "semgrep"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = self
            .exec
            .run(Path::new(locate::python_program()), &args, INSTALL_TIMEOUT)
            .await
            .map_err(|_| RunError::InstallFailed)?;
        if out.succeeded() {
            Ok(())
        } else {
            debug!(stderr = %out.stderr, "pip install failed");
            Err(RunError::InstallFailed)
        }
    }
}

/// Probe `<engine> --version`; `Some(version)` on a zero exit. The version
/// string is extracted best-effort for display, falling back to the trimmed
/// stdout.
pub async fn probe_version(exec: &dyn ProcessRunner, engine: &Path) -> Option<String> {
    let out = exec
        .run(engine, &["--version".to_string()], PROBE_TIMEOUT)
        .await
        .ok()?;
    if !out.succeeded() {
        return None;
    }
    let version = Regex::new(r"\d+\.\d+\.\d+")
        .ok()
        .and_then(|re| re.find(&out.stdout).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| out.stdout.trim().to_string());
    Some(version)
}

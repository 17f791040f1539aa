//! Failure taxonomy for engine orchestration.
//!
//! Every variant renders as one line in `ScanResult.errors`; none of them
//! crosses the runner facade as an `Err`, so callers never need a try/catch
//! shell around a scan.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Semgrep is not installed. Please install it using 'pip install semgrep'")]
    NotInstalled,

    #[error("Failed to install Semgrep via pip")]
    InstallFailed,

    #[error("Semgrep was installed but could not be verified; the executable is still not resolvable")]
    VerificationFailed,

    #[error("Target path not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    #[error("Rule config not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Semgrep execution timed out after {0} seconds")]
    Timeout(u64),

    #[error("Failed to parse Semgrep output: {0}")]
    MalformedOutput(String),

    #[error("{}", if .0.is_empty() { "Unknown error running Semgrep" } else { .0.as_str() })]
    EmptyOutput(String),

    #[error("Unexpected error running Semgrep: {0}")]
    Io(#[from] std::io::Error),
}

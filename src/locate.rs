//! Engine discovery across PATH, interpreter-adjacent, site-packages, and
//! user-local bin directories.
//!
//! `Environment::capture` is the only place that touches the system (env
//! vars plus a short python probe for site-packages dirs). `locate` is a
//! pure function of the snapshot, so callers re-capture after an install
//! instead of trusting a cached path.

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Canonical executable name of the engine.
pub fn engine_exe() -> &'static str {
    if cfg!(windows) {
        "semgrep.exe"
    } else {
        "semgrep"
    }
}

/// Console-script directory name used by python installs.
fn bin_subdir() -> &'static str {
    if cfg!(windows) {
        "Scripts"
    } else {
        "bin"
    }
}

/// Interpreter used for pip installs and site-packages resolution.
pub fn python_program() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which lookup produced an engine path.
pub enum Strategy {
    Explicit,
    PathLookup,
    InterpreterBin,
    SitePackages,
    UserBin,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Explicit => "explicit",
            Strategy::PathLookup => "path",
            Strategy::InterpreterBin => "interpreter-bin",
            Strategy::SitePackages => "site-packages",
            Strategy::UserBin => "user-bin",
        }
    }
}

#[derive(Debug, Clone)]
/// Resolved engine path plus the strategy that found it. Used once per run;
/// never cached across runs.
pub struct EngineLocation {
    pub path: PathBuf,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Default)]
/// Snapshot of the candidate directories for one `locate` call.
pub struct Environment {
    /// Configured engine path override, checked before everything else.
    pub explicit: Option<PathBuf>,
    /// Directories from the PATH variable.
    pub path_dirs: Vec<PathBuf>,
    /// bin/Scripts directories adjacent to a discovered python interpreter.
    pub interpreter_bins: Vec<PathBuf>,
    /// bin/Scripts directories under site-packages roots.
    pub site_bin_dirs: Vec<PathBuf>,
    /// Per-user local install root (~/.local/bin or %APPDATA%\Python\Scripts).
    pub user_bin: Option<PathBuf>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn capture(explicit: Option<PathBuf>) -> Self {
        let path_dirs: Vec<PathBuf> = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();

        let mut interpreter_bins = Vec::new();
        if let Some(py) = find_interpreter(&path_dirs) {
            if let Some(dir) = py.parent() {
                interpreter_bins.push(dir.to_path_buf());
            }
        }

        let site_bin_dirs = site_package_bins();

        let user_bin = if cfg!(windows) {
            env::var_os("APPDATA").map(|a| PathBuf::from(a).join("Python").join("Scripts"))
        } else {
            env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("bin"))
        };

        Environment {
            explicit,
            path_dirs,
            interpreter_bins,
            site_bin_dirs,
            user_bin,
        }
    }
}

fn find_interpreter(path_dirs: &[PathBuf]) -> Option<PathBuf> {
    let names: &[&str] = if cfg!(windows) {
        &["python.exe", "python3.exe"]
    } else {
        &["python3", "python"]
    };
    for name in names {
        for dir in path_dirs {
            let cand = dir.join(name);
            if is_executable(&cand) {
                return Some(cand);
            }
        }
    }
    None
}

/// Ask python for its site-packages roots and derive their script dirs.
/// Best-effort: an absent or broken interpreter yields an empty list.
fn site_package_bins() -> Vec<PathBuf> {
    let out = std::process::Command::new(python_program())
        .args([
            "-c",
            "import site\nfor p in site.getsitepackages() + [site.getusersitepackages()]:\n    print(p)",
        ])
        .output();
    let out = match out {
        Ok(o) if o.status.success() => o,
        _ => return Vec::new(),
    };
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| PathBuf::from(l.trim()).join(bin_subdir()))
        .collect()
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match path.metadata() {
            Ok(md) => md.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Find a usable engine executable, trying strategies in fixed priority
/// order. Absence is an expected, recoverable outcome, not an error.
pub fn locate(env: &Environment) -> Option<EngineLocation> {
    if let Some(p) = env.explicit.as_ref() {
        if is_executable(p) {
            return Some(EngineLocation {
                path: p.clone(),
                strategy: Strategy::Explicit,
            });
        }
        debug!(path = %p.display(), "configured engine path is not runnable");
    }

    let groups: [(&[PathBuf], Strategy); 3] = [
        (&env.path_dirs, Strategy::PathLookup),
        (&env.interpreter_bins, Strategy::InterpreterBin),
        (&env.site_bin_dirs, Strategy::SitePackages),
    ];
    for (dirs, strategy) in groups {
        for dir in dirs {
            let cand = dir.join(engine_exe());
            if is_executable(&cand) {
                debug!(path = %cand.display(), strategy = strategy.as_str(), "engine found");
                return Some(EngineLocation {
                    path: cand,
                    strategy,
                });
            }
        }
    }

    if let Some(dir) = env.user_bin.as_ref() {
        let cand = dir.join(engine_exe());
        if is_executable(&cand) {
            return Some(EngineLocation {
                path: cand,
                strategy: Strategy::UserBin,
            });
        }
    }
    None
}

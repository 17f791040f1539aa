//! Configuration discovery and effective settings resolution.
//!
//! semrun reads `semrun.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `rules_dir`: `rules`
//! - `output`: `human`
//! - `engine.timeout_secs`: 60
//! - `engine.autoInstall`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Deserialize, Clone)]
/// Engine-related configuration section under `[engine]`.
pub struct EngineCfg {
    /// Explicit engine executable path; checked before every locator
    /// strategy when set.
    pub path: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(rename = "autoInstall")]
    pub auto_install: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `semrun.toml|yaml`.
pub struct SemrunConfig {
    pub rules_dir: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub engine: Option<EngineCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub project_root: PathBuf,
    pub rules_dir: PathBuf,
    pub output: String,
    pub timeout: Duration,
    pub auto_install: bool,
    pub engine_path: Option<PathBuf>,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `semrun.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("semrun.toml").exists()
            || cur.join("semrun.yaml").exists()
            || cur.join("semrun.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `SemrunConfig` from `semrun.toml` or `semrun.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<SemrunConfig> {
    let toml_path = root.join("semrun.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: SemrunConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["semrun.yaml", "semrun.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: SemrunConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_root: Option<&str>,
    cli_rules_dir: Option<&str>,
    cli_output: Option<&str>,
    cli_timeout: Option<u64>,
    cli_install: Option<bool>,
) -> Effective {
    let start = PathBuf::from(cli_root.unwrap_or("."));
    let project_root = detect_project_root(&start);
    let cfg = load_config(&project_root).unwrap_or_default();

    let rules_dir = cli_rules_dir
        .map(|s| s.to_string())
        .or(cfg.rules_dir)
        .unwrap_or_else(|| "rules".to_string());
    let rules_dir = {
        let p = PathBuf::from(&rules_dir);
        if p.is_absolute() {
            p
        } else {
            project_root.join(p)
        }
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let timeout_secs = cli_timeout
        .or_else(|| cfg.engine.as_ref().and_then(|e| e.timeout_secs))
        .unwrap_or(60);

    let auto_install = cli_install
        .or_else(|| cfg.engine.as_ref().and_then(|e| e.auto_install))
        .unwrap_or(false);

    let engine_path = cfg
        .engine
        .as_ref()
        .and_then(|e| e.path.clone())
        .map(PathBuf::from);

    Effective {
        project_root,
        rules_dir,
        output,
        timeout: Duration::from_secs(timeout_secs),
        auto_install,
        engine_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("semrun.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
rules_dir = "semgrep-rules"
output = "json"
[engine]
timeout_secs = 30
autoInstall = true
    "#
        )
        .unwrap();

        // Resolve using explicit root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None, None, None);
        assert_eq!(eff.rules_dir, root.join("semgrep-rules"));
        assert_eq!(eff.output, "json");
        assert_eq!(eff.timeout, Duration::from_secs(30));
        assert!(eff.auto_install);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("semrun.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output: human
engine:
  path: /opt/semgrep/bin/semgrep
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None, None);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.rules_dir, root.join("rules"));
        // timeout defaults to 60s when unspecified
        assert_eq!(eff.timeout, Duration::from_secs(60));
        assert!(!eff.auto_install);
        assert_eq!(
            eff.engine_path,
            Some(PathBuf::from("/opt/semgrep/bin/semgrep"))
        );
    }

    #[test]
    fn test_cli_precedence_over_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("semrun.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
rules_dir = "semgrep-rules"
output = "json"
[engine]
timeout_secs = 30
autoInstall = true
            "#
        )
        .unwrap();

        let eff = resolve_effective(
            root.to_str(),
            Some("other-rules"),
            Some("human"),
            Some(10),
            Some(false),
        );
        assert_eq!(eff.rules_dir, root.join("other-rules"));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.timeout, Duration::from_secs(10));
        assert!(!eff.auto_install);
    }

    #[test]
    fn test_absolute_rules_dir_is_kept() {
        let dir = tempdir().unwrap();
        let rules = dir.path().join("abs-rules");
        let eff = resolve_effective(dir.path().to_str(), rules.to_str(), None, None, None);
        assert_eq!(eff.rules_dir, rules);
    }

    #[test]
    fn test_root_detection_walks_up_to_git() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_project_root(&nested), root);
    }
}

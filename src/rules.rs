//! Rule file enumeration for the `rules` subcommand.
//!
//! Rule definitions are opaque to the orchestration core: the engine is the
//! only thing that evaluates them. Listing just surfaces ids and severities
//! so humans can see what a rules directory contains.

use glob::glob;
use serde::Serialize;
use serde_yaml::Value as Yaml;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
/// One rule definition inside a rule file.
pub struct RuleInfo {
    pub id: String,
    pub severity: String,
}

#[derive(Debug, Serialize)]
/// A rule file and the rules it declares.
pub struct RuleFile {
    pub file: String,
    pub rules: Vec<RuleInfo>,
}

/// Enumerate `*.yml|*.yaml` files under `rules_dir` (recursively) and pull
/// out rule ids. Files that fail to parse as YAML are still listed, with an
/// empty rule set; the engine will report them properly at scan time.
pub fn list_rule_files(rules_dir: &Path) -> Vec<RuleFile> {
    let mut out: Vec<RuleFile> = Vec::new();
    for pat in ["**/*.yml", "**/*.yaml"] {
        let pattern = rules_dir.join(pat).to_string_lossy().to_string();
        for entry in glob(&pattern).expect("bad glob pattern").flatten() {
            let rel = entry
                .strip_prefix(rules_dir)
                .unwrap_or(entry.as_path())
                .to_string_lossy()
                .to_string();
            out.push(RuleFile {
                file: rel,
                rules: rules_in_file(&entry),
            });
        }
    }
    out.sort_by(|a, b| a.file.cmp(&b.file));
    out
}

fn rules_in_file(path: &Path) -> Vec<RuleInfo> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(doc) = serde_yaml::from_str::<Yaml>(&raw) else {
        return Vec::new();
    };
    let Some(rules) = doc.get("rules").and_then(Yaml::as_sequence) else {
        return Vec::new();
    };
    rules
        .iter()
        .map(|r| RuleInfo {
            id: r
                .get("id")
                .and_then(Yaml::as_str)
                .unwrap_or_default()
                .to_string(),
            severity: r
                .get("severity")
                .and_then(Yaml::as_str)
                .unwrap_or("WARNING")
                .to_string(),
        })
        .collect()
}

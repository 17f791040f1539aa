//! Output rendering for scan, rules, and doctor commands.
//!
//! Supports `human` (default) and `json` outputs. The scan JSON form is the
//! stable `{success, matches, errors, stats}` consumer contract; the human
//! form prints one line per finding plus a summary.

use crate::models::{ScanResult, Severity};
use crate::rules::RuleFile;
use crate::runner::EngineReport;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Display a match path relative to the current directory when possible.
fn display_path(path: &str) -> String {
    let p = Path::new(path);
    if !p.is_absolute() {
        return path.to_string();
    }
    match std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(p, cwd))
    {
        Some(rel) => rel.to_string_lossy().to_string(),
        None => path.to_string(),
    }
}

/// Print scan results in the requested format.
pub fn print_scan(res: &ScanResult, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_scan_json(res)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for err in &res.errors {
                if color {
                    println!("{} {}", "✖ ⟦error⟧".red().bold(), err);
                } else {
                    println!("✖ ⟦error⟧ {}", err);
                }
            }
            for m in &res.matches {
                let (icon, sev) = match m.severity {
                    Severity::Error => {
                        if color {
                            ("✖".red().to_string(), "⟦error⟧".red().bold().to_string())
                        } else {
                            ("✖".to_string(), "⟦error⟧".to_string())
                        }
                    }
                    Severity::Warning => {
                        if color {
                            ("▲".yellow().to_string(), "⟦warn⟧".yellow().bold().to_string())
                        } else {
                            ("▲".to_string(), "⟦warn⟧".to_string())
                        }
                    }
                    Severity::Info => {
                        if color {
                            ("◆".blue().to_string(), "⟦info⟧".blue().bold().to_string())
                        } else {
                            ("◆".to_string(), "⟦info⟧".to_string())
                        }
                    }
                };
                let loc = format!("{}:{}-{}", display_path(&m.path), m.start_line, m.end_line);
                let loc = if color { loc.bold().to_string() } else { loc };
                println!("{} {} {} ❲{}❳ — {}", icon, sev, loc, m.rule_id, m.message);
                if !m.code_snippet.is_empty() {
                    println!("    {}", m.code_snippet.trim_end());
                }
            }
            let summary = format!(
                "— Summary — matches={} errors={} warnings={} infos={} files={}",
                res.stats.total_matches,
                res.stats.error_count,
                res.stats.warning_count,
                res.stats.info_count,
                res.stats.files_scanned
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print rule file listings.
pub fn print_rules(files: &[RuleFile], output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_rules_json(files)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for rf in files {
                if color {
                    println!("{}", rf.file.bold());
                } else {
                    println!("{}", rf.file);
                }
                for r in &rf.rules {
                    println!("  {} [{}]", r.id, r.severity);
                }
            }
            let total: usize = files.iter().map(|f| f.rules.len()).sum();
            let summary = format!("— Summary — files={} rules={}", files.len(), total);
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print the doctor report.
pub fn print_doctor(report: &EngineReport, output: &str) {
    match output {
        "json" => println!("{}", serde_json::to_string_pretty(report).unwrap()),
        _ => {
            let color = use_colors(output);
            if report.found {
                let line = format!(
                    "engine: {} (strategy={}, version={})",
                    report.path.as_deref().unwrap_or("?"),
                    report.strategy.unwrap_or("?"),
                    report.version.as_deref().unwrap_or("unknown")
                );
                if color {
                    println!("{} {}", "✔".green().bold(), line);
                } else {
                    println!("✔ {}", line);
                }
            } else if color {
                println!(
                    "{} {}",
                    "✖".red().bold(),
                    "engine not found; run `semrun doctor --install` or `pip install semgrep`"
                );
            } else {
                println!(
                    "✖ engine not found; run `semrun doctor --install` or `pip install semgrep`"
                );
            }
        }
    }
}

/// Compose scan JSON object (pure) for testing/snapshot purposes.
pub fn compose_scan_json(res: &ScanResult) -> JsonVal {
    serde_json::to_value(res).unwrap()
}

/// Compose rules JSON object (pure) for testing/snapshot purposes.
pub fn compose_rules_json(files: &[RuleFile]) -> JsonVal {
    let total: usize = files.iter().map(|f| f.rules.len()).sum();
    json!({
        "files": serde_json::to_value(files).unwrap(),
        "summary": {"files": files.len(), "rules": total},
    })
}

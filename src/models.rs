//! Shared data models for scan output.
//!
//! The serialized shape `{success, matches, errors, stats}` is a stable
//! contract consumed by editor extensions and CI steps; field names must
//! not change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Engine severity levels.
pub enum Severity {
    #[serde(rename = "ERROR")]
    Error,
    #[default]
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "INFO")]
    Info,
}

impl Severity {
    /// Lenient parse of the engine's severity string; unknown values map to
    /// `Warning`, matching the default applied when the field is absent.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Severity::Error,
            "INFO" => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A single engine finding at a location in a target file.
pub struct Match {
    pub rule_id: String,
    pub path: String,
    pub start_line: u64,
    pub end_line: u64,
    pub start_column: u64,
    pub end_column: u64,
    pub message: String,
    pub severity: Severity,
    pub code_snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Per-run statistics, recomputed fresh on every parse.
pub struct Stats {
    pub total_matches: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub files_scanned: usize,
}

impl Stats {
    /// Tally statistics over a set of matches.
    ///
    /// `files_scanned` is the number of distinct paths among the matches,
    /// not the number of targets handed to the engine; with zero matches it
    /// is zero even when real files were scanned.
    pub fn tally(matches: &[Match]) -> Self {
        let files: BTreeSet<&str> = matches.iter().map(|m| m.path.as_str()).collect();
        Stats {
            total_matches: matches.len(),
            error_count: matches
                .iter()
                .filter(|m| m.severity == Severity::Error)
                .count(),
            warning_count: matches
                .iter()
                .filter(|m| m.severity == Severity::Warning)
                .count(),
            info_count: matches
                .iter()
                .filter(|m| m.severity == Severity::Info)
                .count(),
            files_scanned: if matches.is_empty() { 0 } else { files.len() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Aggregate scan outcome handed to callers.
///
/// Invariant: `success` is true iff `errors` is empty. Findings alone never
/// flip it to false.
pub struct ScanResult {
    pub success: bool,
    pub matches: Vec<Match>,
    pub errors: Vec<String>,
    pub stats: Stats,
}

impl ScanResult {
    /// A failed result carrying a single error message and empty stats.
    pub fn failure(message: impl Into<String>) -> Self {
        ScanResult {
            success: false,
            matches: Vec::new(),
            errors: vec![message.into()],
            stats: Stats::default(),
        }
    }
}

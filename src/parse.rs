//! Conversion of raw engine JSON into a typed `ScanResult`.
//!
//! Every engine field is treated as optional: a missing sub-field falls
//! back to a default instead of failing the whole parse. Only text that is
//! not JSON at all produces a failed result, and even that is reported as a
//! single error entry rather than a panic or `Err`.

use crate::error::RunError;
use crate::models::{Match, ScanResult, Severity, Stats};
use serde_json::Value;

/// Parse the engine's stdout. Never fails past this boundary.
pub fn parse_output(raw: &str) -> ScanResult {
    let data: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return ScanResult::failure(RunError::MalformedOutput(e.to_string()).to_string()),
    };
    from_value(&data)
}

fn from_value(data: &Value) -> ScanResult {
    let mut matches: Vec<Match> = Vec::new();
    if let Some(results) = data.get("results").and_then(Value::as_array) {
        for entry in results {
            matches.push(match_from(entry));
        }
    }

    let mut errors: Vec<String> = Vec::new();
    if let Some(list) = data.get("errors").and_then(Value::as_array) {
        for entry in list {
            let kind = str_at(entry, &["type"], "Error");
            let message = str_at(entry, &["message"], "Unknown error");
            errors.push(format!("{}: {}", kind, message));
        }
    }

    let stats = Stats::tally(&matches);
    ScanResult {
        success: errors.is_empty(),
        matches,
        errors,
        stats,
    }
}

fn match_from(entry: &Value) -> Match {
    let extra = entry.get("extra");
    Match {
        rule_id: str_at(entry, &["check_id"], ""),
        path: str_at(entry, &["path"], ""),
        start_line: num_at(entry, &["start", "line"]),
        end_line: num_at(entry, &["end", "line"]),
        start_column: num_at(entry, &["start", "col"]),
        end_column: num_at(entry, &["end", "col"]),
        message: str_at(entry, &["extra", "message"], ""),
        severity: extra
            .and_then(|e| e.get("severity"))
            .and_then(Value::as_str)
            .map(Severity::parse_lenient)
            .unwrap_or_default(),
        code_snippet: str_at(entry, &["extra", "lines"], ""),
        fix: extra
            .and_then(|e| e.get("fix"))
            .and_then(Value::as_str)
            .map(str::to_string),
        metadata: extra
            .and_then(|e| e.get("metadata"))
            .filter(|m| !m.is_null())
            .cloned(),
    }
}

fn str_at(v: &Value, keys: &[&str], default: &str) -> String {
    let mut cur = v;
    for k in keys {
        match cur.get(k) {
            Some(next) => cur = next,
            None => return default.to_string(),
        }
    }
    cur.as_str().unwrap_or(default).to_string()
}

fn num_at(v: &Value, keys: &[&str]) -> u64 {
    let mut cur = v;
    for k in keys {
        match cur.get(k) {
            Some(next) => cur = next,
            None => return 0,
        }
    }
    cur.as_u64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_results_and_errors_is_clean_success() {
        let res = parse_output(r#"{"results": [], "errors": []}"#);
        assert!(res.success);
        assert!(res.matches.is_empty());
        assert!(res.errors.is_empty());
        assert_eq!(res.stats, Stats::default());
    }

    #[test]
    fn test_malformed_text_yields_single_parse_error() {
        let res = parse_output("semgrep exploded: not json");
        assert!(!res.success);
        assert_eq!(res.errors.len(), 1);
        assert!(res.errors[0].contains("Failed to parse Semgrep output"));
        assert!(res.matches.is_empty());
    }

    #[test]
    fn test_full_match_mapping() {
        let raw = json!({
            "results": [{
                "check_id": "rules.no-eval",
                "path": "app.py",
                "start": {"line": 3, "col": 1},
                "end": {"line": 3, "col": 12},
                "extra": {
                    "message": "eval is dangerous",
                    "severity": "ERROR",
                    "lines": "eval(x)",
                    "fix": "ast.literal_eval(x)",
                    "metadata": {"category": "security"}
                }
            }],
            "errors": []
        })
        .to_string();
        let res = parse_output(&raw);
        assert!(res.success);
        let m = &res.matches[0];
        assert_eq!(m.rule_id, "rules.no-eval");
        assert_eq!(m.path, "app.py");
        assert_eq!((m.start_line, m.end_line), (3, 3));
        assert_eq!((m.start_column, m.end_column), (1, 12));
        assert_eq!(m.severity, Severity::Error);
        assert_eq!(m.code_snippet, "eval(x)");
        assert_eq!(m.fix.as_deref(), Some("ast.literal_eval(x)"));
        assert_eq!(m.metadata.as_ref().unwrap()["category"], "security");
        assert_eq!(res.stats.error_count, 1);
        assert_eq!(res.stats.total_matches, 1);
        assert_eq!(res.stats.files_scanned, 1);
    }

    #[test]
    fn test_missing_fields_default_instead_of_failing() {
        let res = parse_output(r#"{"results": [{}]}"#);
        assert!(res.success);
        let m = &res.matches[0];
        assert_eq!(m.rule_id, "");
        assert_eq!(m.path, "");
        assert_eq!(m.start_line, 0);
        assert_eq!(m.severity, Severity::Warning);
        assert!(m.fix.is_none());
        assert!(m.metadata.is_none());
    }

    #[test]
    fn test_engine_errors_formatted_with_kind_defaults() {
        let raw = json!({
            "results": [],
            "errors": [
                {"type": "SemgrepError", "message": "rule failed to parse x.py"},
                {}
            ]
        })
        .to_string();
        let res = parse_output(&raw);
        assert!(!res.success);
        assert_eq!(res.errors[0], "SemgrepError: rule failed to parse x.py");
        assert_eq!(res.errors[1], "Error: Unknown error");
    }

    #[test]
    fn test_success_independent_of_match_count() {
        let raw = json!({
            "results": [
                {"path": "a.py", "extra": {"severity": "WARNING"}},
                {"path": "a.py", "extra": {"severity": "INFO"}},
                {"path": "b.py", "extra": {"severity": "ERROR"}},
                {"path": "b.py"},
                {"path": "c.py"}
            ],
            "errors": []
        })
        .to_string();
        let res = parse_output(&raw);
        assert!(res.success, "findings alone are not a failure");
        assert_eq!(res.stats.total_matches, 5);
        assert_eq!(res.stats.error_count, 1);
        assert_eq!(res.stats.warning_count, 3);
        assert_eq!(res.stats.info_count, 1);
        assert_eq!(res.stats.files_scanned, 3);
    }
}

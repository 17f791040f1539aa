//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "semrun",
    version,
    about = "Run Semgrep with curated rules and stable JSON results",
    long_about = "semrun — a small CLI to run the Semgrep engine against files or directories with a curated rule set, and emit a stable {success, matches, errors, stats} result for tooling.\n\nConfiguration precedence: CLI > semrun.toml > defaults.",
    after_help = "Examples:\n  semrun scan src/ --rules-dir rules\n  semrun scan app.py --rule-file security.yml --output json\n  semrun rules --rules-dir rules\n  semrun doctor --install",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for scanning, rule listing, and engine health.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current semrun version."
    )]
    Version,
    /// Run the engine against targets
    #[command(
        about = "Run a scan",
        long_about = "Run Semgrep against the given files or directories using the configured rules. Findings never fail the parse; `success` reflects engine errors only, while the exit code is non-zero for findings or failures.",
        after_help = "Examples:\n  semrun scan src/\n  semrun scan app.py --rule-file security.yml\n  semrun scan src/ --output json --timeout 120"
    )]
    Scan {
        #[arg(required = true, help = "Files or directories to analyze")]
        targets: Vec<String>,
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Directory containing rule files (default: rules)")]
        rules_dir: Option<String>,
        #[arg(long, help = "Single rule file inside the rules directory")]
        rule_file: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Engine timeout in seconds (default: 60)")]
        timeout: Option<u64>,
        #[arg(
            long,
            action = clap::ArgAction::SetTrue,
            help = "Install the engine via pip when it is not found"
        )]
        install: bool,
    },
    /// List rule files and their rule ids
    #[command(
        about = "List rules",
        long_about = "Enumerate rule definition files under the rules directory and print the rule ids they declare. Rules are never evaluated here."
    )]
    Rules {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Directory containing rule files (default: rules)")]
        rules_dir: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Report engine health (path, strategy, version)
    #[command(
        about = "Check the engine",
        long_about = "Locate the Semgrep executable, probe its version, and report how it was found. With --install, attempt a pip install first when the engine is missing.",
        after_help = "Examples:\n  semrun doctor\n  semrun doctor --install --output json"
    )]
    Doctor {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(
            long,
            action = clap::ArgAction::SetTrue,
            help = "Install the engine via pip when it is not found"
        )]
        install: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

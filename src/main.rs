//! semrun CLI binary entry point.
//! Delegates to library modules for scanning, rule listing, and engine
//! health, and maps results to exit codes (0 clean, 1 findings/failure,
//! 2 usage/config errors).

use clap::Parser;
use semrun::cli::{Cli, Commands};
use semrun::runner::Runner;
use semrun::{config, output, rules, utils};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("semrun=warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Scan {
            targets,
            project_root,
            rules_dir,
            rule_file,
            output: out,
            timeout,
            install,
        } => {
            let eff = config::resolve_effective(
                project_root.as_deref(),
                rules_dir.as_deref(),
                out.as_deref(),
                timeout,
                if install { Some(true) } else { None },
            );
            // Friendly note if no semrun config was found
            if eff.output != "json" && config::load_config(&eff.project_root).is_none() {
                eprintln!(
                    "{} {}",
                    utils::note_prefix(),
                    "No semrun.toml found; using defaults."
                );
            }
            // The rules directory is required up front, as in the original
            // runner; a missing --rule-file inside it is reported in-result.
            if !eff.rules_dir.exists() {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!(
                        "Rules directory does not exist: {} (pass --rules-dir or configure semrun.toml)",
                        eff.rules_dir.to_string_lossy()
                    )
                );
                std::process::exit(2);
            }

            let runner = Runner::new(&eff.rules_dir)
                .with_timeout(eff.timeout)
                .with_auto_install(eff.auto_install)
                .with_engine_override(eff.engine_path.clone());
            let targets: Vec<PathBuf> = targets.iter().map(PathBuf::from).collect();
            let res = runner.run(&targets, rule_file.as_deref()).await;
            output::print_scan(&res, &eff.output);
            // Clean scan means success AND zero findings; anything else is
            // a non-zero exit for CI.
            if !res.success || res.stats.total_matches > 0 {
                std::process::exit(1);
            }
        }
        Commands::Rules {
            project_root,
            rules_dir,
            output: out,
        } => {
            let eff = config::resolve_effective(
                project_root.as_deref(),
                rules_dir.as_deref(),
                out.as_deref(),
                None,
                None,
            );
            if !eff.rules_dir.exists() {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!(
                        "Rules directory does not exist: {} (pass --rules-dir or configure semrun.toml)",
                        eff.rules_dir.to_string_lossy()
                    )
                );
                std::process::exit(2);
            }
            let files = rules::list_rule_files(&eff.rules_dir);
            output::print_rules(&files, &eff.output);
        }
        Commands::Doctor {
            project_root,
            install,
            output: out,
        } => {
            let eff = config::resolve_effective(project_root.as_deref(), None, out.as_deref(), None, None);
            let runner = Runner::new(&eff.rules_dir).with_engine_override(eff.engine_path.clone());
            if install {
                match runner.ensure_installed().await {
                    Ok(()) => {
                        eprintln!("{} {}", utils::info_prefix(), "Engine install verified.");
                    }
                    Err(e) => {
                        eprintln!("{} {}", utils::error_prefix(), e);
                        std::process::exit(1);
                    }
                }
            }
            let report = runner.engine_report().await;
            let found = report.found;
            output::print_doctor(&report, &eff.output);
            if !found {
                std::process::exit(1);
            }
        }
    }
}

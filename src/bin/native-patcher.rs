//! native-patcher -- apply the SDK integration to a generated project.
//!
//! Usage: native-patcher [--project <dir>] [--config <file.json>] [--dry-run] [--json]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use native_patcher::{DiskStore, PatcherConfig, RunOptions, RunReport};

const DEFAULT_CONFIG: &str = "native-patcher.json";

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let project = flag_value(&args, "--project").unwrap_or_else(|| ".".to_string());
    let project = Path::new(&project)
        .canonicalize()
        .with_context(|| format!("project directory {project} not found"))?;
    let config_path = flag_value(&args, "--config")
        .map_or_else(|| project.join(DEFAULT_CONFIG), PathBuf::from);
    let options = RunOptions {
        dry_run: args.iter().any(|a| a == "--dry-run"),
    };
    let json = args.iter().any(|a| a == "--json");

    let config = PatcherConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let store = DiskStore::new(&project);
    let report = native_patcher::run(&config, &store, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, options);
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().skip_while(|a| *a != flag).nth(1).cloned()
}

fn print_report(report: &RunReport, options: RunOptions) {
    for file in &report.files {
        let status = match (file.changed, options.dry_run) {
            (false, _) => "unchanged",
            (true, false) => "patched",
            (true, true) => "would patch",
        };
        println!("[{}] {status}: {}", file.platform, file.path.display());
        if let Some(diff) = &file.diff {
            print!("{diff}");
        }
    }
    for failure in &report.failures {
        println!("[{}] FAILED: {}", failure.platform, failure.error);
        if failure.missing_target {
            println!("    generate the native projects first, then run again");
        }
    }
    for diagnostic in &report.diagnostics {
        println!(
            "[{}] warning ({}): {}",
            diagnostic.platform, diagnostic.code, diagnostic.message
        );
    }
}

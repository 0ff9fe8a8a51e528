//! CLI entrypoint for the xrbind conformance harness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use xrbind_core::config::POPULATE_ENV;
use xrbind_core::{BindingConfig, Command as XrCommand, PopulationMode};
use xrbind_harness::structured_log::{ArtifactIndex, validate_log_file};
use xrbind_harness::{ConformanceRunner, LogEmitter};

/// Conformance tooling for xrbind.
#[derive(Debug, Parser)]
#[command(name = "xrbind-harness")]
#[command(about = "Conformance harness for the xrbind binding layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the command table as JSON.
    Commands {
        /// Output path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the build configuration as JSON.
    Config,
    /// Run the conformance scenario against the simulated runtime.
    Run {
        /// Dispatch population mode (`lazy` or `eager`); defaults to $XRBIND_POPULATE.
        #[arg(long)]
        populate: Option<String>,
        /// Structured JSONL log output path.
        #[arg(long, default_value = "target/conformance/xrbind.log.jsonl")]
        log: PathBuf,
        /// Artifact index output path.
        #[arg(long, default_value = "target/conformance/xrbind.index.json")]
        index: PathBuf,
        /// Run identifier used in trace ids.
        #[arg(long, default_value = "local")]
        run_id: String,
    },
    /// Validate a structured JSONL log.
    ValidateLog {
        #[arg(long)]
        log: PathBuf,
    },
}

#[derive(Serialize)]
struct CommandRow {
    name: &'static str,
    slot: usize,
    kind: String,
    handle: Option<&'static str>,
    object: Option<&'static str>,
    feature: &'static str,
    default_dispatch: bool,
}

fn command_table() -> Vec<CommandRow> {
    XrCommand::ALL
        .iter()
        .map(|&cmd| {
            let info = cmd.info();
            CommandRow {
                name: cmd.name(),
                slot: cmd.index(),
                kind: format!("{:?}", info.kind).to_ascii_lowercase(),
                handle: info.handle.map(|h| h.name()),
                object: info.object.map(|h| h.name()),
                feature: info.feature.name(),
                default_dispatch: info.offers_default_dispatch(),
            }
        })
        .collect()
}

fn write_or_print(output: Option<&Path>, body: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, body)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Commands { output } => {
            let body = serde_json::to_string_pretty(&command_table())?;
            write_or_print(output.as_deref(), &body)?;
        }
        Command::Config => {
            let config = BindingConfig::ACTIVE;
            let body = serde_json::to_string_pretty(&serde_json::json!({
                "error_mode": config.error_mode.as_str(),
                "typesafe_conversion": config.typesafe_conversion,
                "smart_handles": config.smart_handles,
                "static_loader": config.static_loader,
                "default_core_dispatch": config.default_core_dispatch,
                "population": PopulationMode::from_env().as_str(),
            }))?;
            println!("{body}");
        }
        Command::Run {
            populate,
            log,
            index,
            run_id,
        } => {
            let population = populate
                .as_deref()
                .map_or_else(PopulationMode::from_env, PopulationMode::from_str_loose);
            eprintln!(
                "Running conformance scenario (population={}, {POPULATE_ENV}={})",
                population.as_str(),
                std::env::var(POPULATE_ENV).unwrap_or_default()
            );
            if let Some(parent) = log.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut emitter = LogEmitter::to_file(&log, "xrbind", &run_id)?;
            let summary = ConformanceRunner::new("conformance", population).run(&mut emitter)?;
            drop(emitter);

            let mut artifacts = ArtifactIndex::new(&run_id);
            artifacts.add_file(&log, "log")?;
            write_or_print(Some(&index), &artifacts.to_json()?)?;
            if let Some(entry) = artifacts.artifacts.first() {
                eprintln!("Log sha256: {}", entry.sha256);
            }

            println!("{}", serde_json::to_string_pretty(&summary)?);
            eprintln!(
                "{} / {} checks passed ({} resolutions, {} table hits)",
                summary.passed, summary.total, summary.resolutions, summary.table_hits
            );
            if !summary.all_passed() {
                return Err(format!("failed checks: {}", summary.failures().join(", ")).into());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(format!("{} errors in {lines} lines", errors.len()).into());
            }
            eprintln!("{}: {lines} lines valid", log.display());
        }
    }

    Ok(())
}

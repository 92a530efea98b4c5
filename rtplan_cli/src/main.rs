//! # rtplan CLI
//!
//! Command-line front end for `rtplan_core`: loads a source plan exported as
//! JSON, translates it and writes the DICOM RT Plan.
//!
//! ```text
//! rtplan export plan.json --out ./export --settings site.json --json -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use rtplan_core::{
    build_plan, export_rtplan, load_settings, load_source_plan, save_document_json,
    ExportSettings, RtPlanError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rtplan",
    version,
    about = "Translate treatment plans into DICOM RT Plan files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a source plan (JSON) into an RP.<uid>.dcm file
    Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Source plan exported as JSON
    plan: PathBuf,

    /// Directory the RT Plan is written to
    #[arg(short, long)]
    out: PathBuf,

    /// Export settings file (JSON); defaults apply when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Also write the document as JSON next to the RT Plan
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: {:#}", e);
    }

    let outcome = match cli.command {
        Commands::Export(args) => export(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to set tracing subscriber: {}", e))
}

fn export(args: ExportArgs) -> Result<()> {
    let plan = load_source_plan(&args.plan)
        .with_context(|| format!("Failed to load plan {}", args.plan.display()))?;

    let settings = match &args.settings {
        Some(path) => load_settings(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => ExportSettings::default(),
    };

    let export = build_plan(&plan, &settings).context("Translation failed")?;
    for warning in &export.warnings {
        warn!("{}", warning);
    }

    let path = export_rtplan(&export.document, &args.out)?;

    if args.json {
        let json_path = args
            .out
            .join(format!("RP.{}.json", export.document.plan_instance_uid()));
        save_document_json(&export.document, &json_path)?;
        info!(path = %json_path.display(), "Document JSON written");
    }

    info!(
        beams = export.document.beams.len(),
        warnings = export.warnings.len(),
        "Export complete"
    );
    println!("{}", path.display());
    Ok(())
}

/// Print an error, with code and JSON form when it comes from the translator.
fn report(error: &anyhow::Error) {
    eprintln!("Error: {:#}", error);

    if let Some(e) = error.downcast_ref::<RtPlanError>() {
        eprintln!("Code: {}", e.error_code());
        if let Ok(json) = serde_json::to_string_pretty(e) {
            eprintln!();
            eprintln!("Error JSON:");
            eprintln!("{}", json);
        }
    }
}

//! envreq - check a process environment against a requirement manifest.
//!
//! Exit codes: 0 when every required variable is present and valid, 2 when
//! `check` finds failures, 1 for usage errors (unreadable manifest, unknown
//! or sensitive names passed to `get`).

#![forbid(unsafe_code)]

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use envreq::logging::{LogConfig, init_logging};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "envreq")]
#[command(author, version, about = "Validate environment variables against a manifest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// Manifest listing the requirements
    #[arg(short, long, env = envreq::keys::MANIFEST, default_value = "envreq.toml")]
    manifest: PathBuf,

    /// Include value previews (sensitive values stay masked)
    #[arg(long)]
    show_values: bool,

    /// Emit rows as a JSON array instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the environment, exit 2 if anything required is missing or invalid
    Check(ReportArgs),

    /// Print the report without failing
    Report(ReportArgs),

    /// Print the resolved value of a non-sensitive variable
    Get {
        /// Variable name
        name: String,

        /// Manifest listing the requirements
        #[arg(short, long, env = envreq::keys::MANIFEST, default_value = "envreq.toml")]
        manifest: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("warn");
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    init_logging(&log_config)?;

    let code = match cli.command {
        Commands::Check(args) => commands::check(&args.into(), true)?,
        Commands::Report(args) => commands::check(&args.into(), false)?,
        Commands::Get { name, manifest } => commands::get(&name, &manifest)?,
    };

    Ok(ExitCode::from(code))
}

impl From<ReportArgs> for commands::ReportRequest {
    fn from(args: ReportArgs) -> Self {
        Self {
            manifest: args.manifest,
            show_values: args.show_values,
            json: args.json,
        }
    }
}

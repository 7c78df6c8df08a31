//! # label-uploader CLI Interface
//!
//! Command parsing and the async entrypoint ([`run`]) used by `main` and by the
//! integration tests. Pipeline logic lives in `label-uploader-core`; this module
//! only resolves configuration, wires the provider registry, and prints the report.
//!
//! ## Extending
//! New subcommands go into [`Commands`]. New storage backends are registered in
//! [`crate::providers::register_default_providers`].

use crate::load_config::resolve_config;
use crate::providers::register_default_providers;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use label_uploader_core::registry::ProviderRegistry;
use label_uploader_core::report::RunReport;
use label_uploader_core::synchronise::run_with_registry;
use std::path::PathBuf;

/// CLI for label-uploader: upload a labelled directory tree to a cloud bucket.
#[derive(Parser)]
#[clap(
    name = "label-uploader",
    version,
    about = "Upload files to a cloud bucket (S3, GCS) from a local directory tree"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload files from --input to the bucket, skipping objects that already exist
    Upload(UploadArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct UploadArgs {
    /// YAML config file; flags given on the command line take precedence
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Image dir path, e.g. --input=/path/to/image_dir
    #[clap(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Comma separated file extensions, e.g. --type=jpg,jpeg,png,gif
    #[clap(short = 't', long = "type")]
    pub types: Option<String>,

    /// Upload every file regardless of extension
    #[clap(short = 'a', long = "all")]
    pub include_all_types: bool,

    /// Label file for training (e.g. an exported CSV), uploaded before the walk
    #[clap(short = 'l', long = "label")]
    pub label_file: Option<PathBuf>,

    /// Cloud provider name for the bucket [s3, gcs, local]
    #[clap(short = 'c', long)]
    pub provider: Option<String>,

    /// Bucket name (a directory path for the local provider)
    #[clap(short = 'b', long)]
    pub bucket: Option<String>,

    /// Destination prefix inside the bucket, e.g. --prefix=foo/bar
    #[clap(short = 'p', long)]
    pub prefix: Option<String>,

    /// Number of parallel uploads (default 2)
    #[clap(short = 'm', long)]
    pub parallel: Option<usize>,

    /// Exit with an error if any single file fails to upload
    #[clap(long)]
    pub fail_on_error: bool,

    /// Print the run report as JSON
    #[clap(long)]
    pub json: bool,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Upload(args) => {
            let config = resolve_config(&args)?;
            tracing::info!(command = "upload", "Starting upload run");

            let mut registry = ProviderRegistry::new();
            register_default_providers(&mut registry);

            match run_with_registry(&config, &registry).await {
                Ok(report) => {
                    tracing::info!(command = "upload", "Upload run complete");
                    print_report(&report, args.json)
                }
                Err(e) => {
                    tracing::error!(command = "upload", error = %e, "Upload run failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("Upload complete.\nReport:");
    println!("  bucket: {}", report.bucket);
    if let Some(label) = &report.label_file {
        println!("  label file: {} -> {:?}", label.destination, label.outcome);
    }
    println!("  dispatched: {}", report.dispatched());
    println!("  uploaded: {}", report.uploaded());
    println!("  skipped: {}", report.skipped());
    println!("  failed: {}", report.failed());
    Ok(())
}

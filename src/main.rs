//! CLI entry point for the transfer tool.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;
use transfer_core::{FileConfig, ProtocolPreference, TransferClient};

mod cli;
mod commands;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::load_default()?,
    };
    debug!(?file_config, "config loaded");

    let client = build_client(&args, &file_config)?;
    commands::run(&client, args.command).await
}

/// Command-line values win over the config file.
fn build_client(args: &Args, file_config: &FileConfig) -> Result<TransferClient> {
    let insecure = args.insecure || file_config.insecure_skip_verify.unwrap_or(false);
    let ca_bundle = args.ca_bundle.clone().or_else(|| file_config.ca_bundle.clone());
    let preference = if args.http3 {
        ProtocolPreference::Http3
    } else {
        file_config.protocol.unwrap_or_default()
    };

    let ca_bundle = match ca_bundle {
        Some(path) => path,
        None if insecure => PathBuf::new(),
        None => bail!(
            "certificate verification needs --ca-bundle (or ca_bundle in the config file), or pass --insecure"
        ),
    };

    TransferClient::with_options(
        insecure,
        &ca_bundle,
        preference,
        &file_config.client_options(),
    )
    .with_context(|| format!("failed to set up HTTP client (bundle: {})", ca_bundle.display()))
}

//! Main entry point for the loopback-oauth CLI

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use loopback_oauth_cli::{logging, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Disable location display (file paths and line numbers)
    color_eyre::config::HookBuilder::default()
        .display_location_section(false)
        .display_env_section(false)
        .install()?;

    // Logging stays off unless requested with -v or RUST_LOG
    let binary_name = env!("CARGO_BIN_NAME").replace('-', "_");
    let default_filter = format!("{}=info,{}_cli=info", binary_name, binary_name);
    logging::init_cli_logging(&args.verbosity, &default_filter)
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    Ok(args.run().await?)
}

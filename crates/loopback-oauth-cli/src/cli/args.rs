use crate::cli::{commands::Commands, handlers};
use crate::config::Config;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use std::path::PathBuf;

/// loopback-oauth - OAuth 2.0 sign-in for native apps
#[derive(Parser, Debug)]
#[command(
    name = "loopback-oauth",
    version,
    about = "OAuth 2.0 authorization code sign-in through the system browser",
    long_about = "Signs in with Microsoft, Google, Facebook or a custom provider using the
authorization code grant. The browser is redirected back to a listener on
http://localhost:<port>/ and the code is exchanged for tokens.

EXAMPLES:
  loopback-oauth authorize                    # Sign in with the configured scopes
  loopback-oauth authorize -s openid -s email # Request specific scopes
  loopback-oauth refresh <REFRESH_TOKEN>      # Renew tokens
  loopback-oauth --json authorize             # Print the full token set as JSON"
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config = Config::load(self.config)?;

        match self.command {
            Commands::Authorize { scopes, login_hint } => {
                handlers::auth::handle_authorize(&config, scopes, login_hint, self.json).await
            }
            Commands::Refresh { refresh_token } => {
                handlers::auth::handle_refresh(&config, &refresh_token, self.json).await
            }
        }
    }
}

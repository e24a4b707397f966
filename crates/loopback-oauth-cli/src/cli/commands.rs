use clap::Subcommand;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in through the browser and print the issued tokens
    Authorize {
        /// Scope to request (repeatable, defaults to the configured scopes)
        #[arg(short, long = "scope", value_name = "SCOPE")]
        scopes: Vec<String>,

        /// Account to pre-select on the sign-in page
        #[arg(long)]
        login_hint: Option<String>,
    },

    /// Exchange a refresh token for a new set of tokens
    Refresh {
        /// Refresh token from a previous authorization
        refresh_token: String,
    },
}

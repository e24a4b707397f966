//! Authorization command handlers

use crate::config::Config;
use crate::error::Result;
use crate::output::{json_output, print_info, print_link, print_success, print_token_summary};
use loopback_oauth::{AuthResult, TokenSet};
use tracing::debug;

/// Handle `authorize` - browser sign-in followed by a code exchange
pub async fn handle_authorize(
    config: &Config,
    scopes: Vec<String>,
    login_hint: Option<String>,
    json: bool,
) -> Result<()> {
    let mut session = config.build_session()?;
    if login_hint.is_some() {
        session.set_login_hint(login_hint);
    }

    let scopes = if scopes.is_empty() {
        config.scopes.clone()
    } else {
        scopes
    };
    debug!(provider = %config.provider, ?scopes, "Starting authorization");

    if !json {
        print_info(&format!(
            "Opening {} sign-in in your browser...",
            config.provider
        ));
        print_link(
            "Redirect URI",
            &format!("http://localhost:{}/", config.callback_port),
        );
    }

    let result = session.authorize_scopes(&scopes).await;
    report(result, json, "Authorization Succeeded.")
}

/// Handle `refresh` - refresh token grant
pub async fn handle_refresh(config: &Config, refresh_token: &str, json: bool) -> Result<()> {
    let mut session = config.build_session()?;
    debug!(provider = %config.provider, "Refreshing tokens");

    let result = session.refresh(refresh_token).await;
    report(result, json, "Tokens refreshed.")
}

fn report(result: AuthResult<TokenSet>, json: bool, success_message: &str) -> Result<()> {
    let tokens = result?;
    if json {
        json_output(&tokens)?;
    } else {
        print_success(success_message);
        print_token_summary(&tokens);
    }
    Ok(())
}

//! Opening the authorization URL in the user's browser

use super::types::{AuthError, AuthResult};
use tracing::debug;

/// Hands an authorization URL to whatever will show it to the user
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> AuthResult<()>;
}

/// Platform default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> AuthResult<()> {
        debug!("Opening authorization URL in default browser");
        webbrowser::open(url).map_err(|e| AuthError::BrowserLaunch(e.to_string()))
    }
}

impl<F> UrlOpener for F
where
    F: Fn(&str) -> AuthResult<()> + Send + Sync,
{
    fn open(&self, url: &str) -> AuthResult<()> {
        self(url)
    }
}

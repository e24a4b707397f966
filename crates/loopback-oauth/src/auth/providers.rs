//! Well-known identity provider endpoints
//!
//! These constants are compiled in so the named constructors need no
//! external configuration. Any other OAuth 2.0 provider can be used through
//! [`ProviderEndpoint::new`].

use super::types::ProviderEndpoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Microsoft identity platform v2.0 authorization endpoint
pub const MICROSOFT_AUTHORIZATION_ENDPOINT: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";

/// Microsoft identity platform v2.0 token endpoint
pub const MICROSOFT_TOKEN_ENDPOINT: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Google OAuth 2.0 authorization endpoint
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v4/token";

/// Facebook login dialog
pub const FACEBOOK_AUTHORIZATION_ENDPOINT: &str = "https://www.facebook.com/v10.0/dialog/oauth";

/// Facebook Graph token endpoint
pub const FACEBOOK_TOKEN_ENDPOINT: &str = "https://graph.facebook.com/oauth/access_token";

impl ProviderEndpoint {
    /// Microsoft identity platform (common tenant)
    pub fn microsoft() -> Self {
        Self::new(MICROSOFT_AUTHORIZATION_ENDPOINT, MICROSOFT_TOKEN_ENDPOINT)
    }

    /// Google accounts
    pub fn google() -> Self {
        Self::new(GOOGLE_AUTHORIZATION_ENDPOINT, GOOGLE_TOKEN_ENDPOINT)
    }

    /// Facebook login
    pub fn facebook() -> Self {
        Self::new(FACEBOOK_AUTHORIZATION_ENDPOINT, FACEBOOK_TOKEN_ENDPOINT)
    }
}

/// Identity provider selector, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Microsoft,
    Google,
    Facebook,
    /// Explicit endpoints supplied by the caller
    Custom,
}

impl Provider {
    /// Built-in endpoints, or `None` for [`Provider::Custom`]
    pub fn endpoint(self) -> Option<ProviderEndpoint> {
        match self {
            Self::Microsoft => Some(ProviderEndpoint::microsoft()),
            Self::Google => Some(ProviderEndpoint::google()),
            Self::Facebook => Some(ProviderEndpoint::facebook()),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Microsoft => "microsoft",
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Custom => "custom",
        })
    }
}

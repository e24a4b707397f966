//! Authentication-related types and data structures
//!
//! This module defines the types shared across the auth module:
//! provider endpoints, client credentials, token data, flow stages
//! and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authorization and token endpoints of one identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    /// OAuth authorization endpoint URL (opened in the browser)
    pub authorization_endpoint: String,
    /// OAuth token endpoint URL (code and refresh exchange)
    pub token_endpoint: String,
}

impl ProviderEndpoint {
    /// Create an endpoint pair for any OAuth 2.0 compliant provider
    pub fn new(authorization_endpoint: impl Into<String>, token_endpoint: impl Into<String>) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
        }
    }
}

/// OAuth client registration
#[derive(Clone, Default)]
pub struct ClientCredentials {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret, empty for public clients
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Whether a client secret should be sent with token requests
    pub fn has_secret(&self) -> bool {
        !self.client_secret.is_empty()
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &if self.has_secret() { "***" } else { "" })
            .finish()
    }
}

/// Tokens returned by a single exchange with the token endpoint
///
/// A token set always describes exactly one exchange. The session replaces it
/// wholesale at the start of every `authorize` or `refresh` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: Option<String>,
    /// OpenID Connect ID token, if the provider issued one
    pub id_token: Option<String>,
    /// Refresh token for non-interactive renewal
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, 0 when absent or unparseable
    pub expires_in: u64,
    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
}

impl TokenSet {
    /// Apply one `(name, value)` pair from a token response.
    ///
    /// Unknown names are ignored. Returns whether the field was recognized.
    pub fn apply_field(&mut self, name: &str, value: String) -> bool {
        match name {
            "access_token" => self.access_token = Some(value),
            "id_token" => self.id_token = Some(value),
            "refresh_token" => self.refresh_token = Some(value),
            "expires_in" => self.expires_in = value.trim().parse().unwrap_or(0),
            "token_type" => self.token_type = Some(value),
            _ => return false,
        }
        true
    }

    /// True when no field has been populated
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Authorization callback data received on the loopback listener
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackData {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Progress of a session call through the authorization state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowStage {
    #[default]
    Idle,
    ListenerStarted,
    BrowserLaunched,
    AwaitingCallback,
    CallbackReceived,
    ExchangeSucceeded,
    ExchangeFailed,
}

impl FlowStage {
    /// Whether the call that produced this stage has finished
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ExchangeSucceeded | Self::ExchangeFailed)
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ListenerStarted => "listener-started",
            Self::BrowserLaunched => "browser-launched",
            Self::AwaitingCallback => "awaiting-callback",
            Self::CallbackReceived => "callback-received",
            Self::ExchangeSucceeded => "exchange-succeeded",
            Self::ExchangeFailed => "exchange-failed",
        };
        f.write_str(name)
    }
}

/// Authentication errors
///
/// The `Display` text of each variant is what the session reports through
/// [`AuthorizationSession::error`](crate::auth::AuthorizationSession::error).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The loopback port could not be reserved
    #[error("Failed to bind callback listener on {addr}: {reason}")]
    CallbackBind { addr: SocketAddr, reason: String },

    /// The authorization URL could not be handed to a browser
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// The provider redirected back with an `error` parameter
    #[error("{0}")]
    AuthorizationDenied(String),

    /// The callback carried neither an error nor a code
    #[error("Malformed authorization response.")]
    MalformedCallback,

    /// No callback arrived before the configured deadline
    #[error("Timed out waiting for browser callback")]
    Timeout,

    /// Callback listener failure after binding
    #[error("Callback server error: {0}")]
    CallbackServer(String),

    /// Token endpoint answered with a non-success status
    #[error("Error converting OAuth Token: HTTP {status}: {body}")]
    TokenExchange { status: u16, body: String },

    /// Token request never produced a response
    #[error("Error converting OAuth Token: {0}")]
    Transport(String),

    /// Token endpoint answered 2xx with an unreadable body
    #[error("Invalid OAuth response: {0}")]
    InvalidResponse(String),

    /// Token response is not a well-formed JSON object
    #[error("Malformed JSON at byte {offset}: {reason}")]
    MalformedJson { offset: usize, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_field_maps_known_names() {
        let mut tokens = TokenSet::default();
        assert!(tokens.apply_field("access_token", "a".into()));
        assert!(tokens.apply_field("id_token", "i".into()));
        assert!(tokens.apply_field("refresh_token", "r".into()));
        assert!(tokens.apply_field("expires_in", "3600".into()));
        assert!(tokens.apply_field("token_type", "Bearer".into()));
        assert!(!tokens.apply_field("scope", "openid".into()));

        assert_eq!(tokens.access_token.as_deref(), Some("a"));
        assert_eq!(tokens.id_token.as_deref(), Some("i"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
        assert_eq!(tokens.expires_in, 3600);
        assert_eq!(tokens.token_type.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_unparseable_expires_in_defaults_to_zero() {
        let mut tokens = TokenSet::default();
        tokens.apply_field("expires_in", "3600".into());
        tokens.apply_field("expires_in", "soon".into());
        assert_eq!(tokens.expires_in, 0);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_error_display_matches_reported_text() {
        let err = AuthError::TokenExchange {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"Error converting OAuth Token: HTTP 400: {"error":"invalid_grant"}"#
        );
        assert_eq!(
            AuthError::AuthorizationDenied("access_denied".into()).to_string(),
            "access_denied"
        );
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = ClientCredentials::new("client", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("client"));
        assert!(!rendered.contains("hunter2"));
    }
}

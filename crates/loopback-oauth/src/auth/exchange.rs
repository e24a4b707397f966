//! Token endpoint exchange
//!
//! One POST per call, for both the authorization code grant and the refresh
//! token grant. There is no retry: any failure is final for the call.

use super::token_reader::TokenFieldReader;
use super::types::{AuthError, AuthResult, ClientCredentials, TokenSet};
use bytes::Buf;
use reqwest::header::ACCEPT;
use std::io::BufRead;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Default timeout for a single token request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Grant-specific token request
///
/// Field values are form-encoded by the HTTP client, one pair at a time.
#[derive(Debug, Clone, Copy)]
pub enum TokenRequest<'a> {
    AuthorizationCode {
        code: &'a str,
        redirect_uri: &'a str,
        scope: Option<&'a str>,
    },
    RefreshToken {
        refresh_token: &'a str,
    },
}

impl<'a> TokenRequest<'a> {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }

    /// Form fields for this grant. `client_secret` is left out for public
    /// clients and `scope` when none was requested.
    pub fn form_fields(&self, credentials: &'a ClientCredentials) -> Vec<(&'static str, &'a str)> {
        let mut fields = vec![("grant_type", self.grant_type())];

        match *self {
            Self::AuthorizationCode {
                code,
                redirect_uri,
                scope,
            } => {
                fields.push(("code", code));
                fields.push(("redirect_uri", redirect_uri));
                fields.push(("client_id", credentials.client_id.as_str()));
                if credentials.has_secret() {
                    fields.push(("client_secret", credentials.client_secret.as_str()));
                }
                if let Some(scope) = scope.filter(|s| !s.is_empty()) {
                    fields.push(("scope", scope));
                }
            }
            Self::RefreshToken { refresh_token } => {
                fields.push(("refresh_token", refresh_token));
                fields.push(("client_id", credentials.client_id.as_str()));
                if credentials.has_secret() {
                    fields.push(("client_secret", credentials.client_secret.as_str()));
                }
            }
        }

        fields
    }
}

/// Client for one provider's token endpoint
#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    http_client: reqwest::Client,
    token_endpoint: String,
    request_timeout: Duration,
}

impl TokenExchangeClient {
    pub fn new(http_client: reqwest::Client, token_endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            token_endpoint: token_endpoint.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// Send the request and read the token response.
    ///
    /// A non-success status yields [`AuthError::TokenExchange`] carrying the
    /// response body verbatim. Transport failures yield
    /// [`AuthError::Transport`].
    pub async fn exchange(
        &self,
        request: &TokenRequest<'_>,
        credentials: &ClientCredentials,
    ) -> AuthResult<TokenSet> {
        debug!(
            grant_type = request.grant_type(),
            endpoint = %self.token_endpoint,
            "Requesting tokens"
        );

        let response = self
            .http_client
            .post(&self.token_endpoint)
            .header(ACCEPT, "application/json")
            .timeout(self.request_timeout)
            .form(&request.form_fields(credentials))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected the request");
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let tokens = read_token_set(body.reader()).map_err(|e| match e {
            AuthError::MalformedJson { .. } => AuthError::InvalidResponse(e.to_string()),
            other => other,
        })?;

        info!(
            grant_type = request.grant_type(),
            "Token exchange completed successfully"
        );
        Ok(tokens)
    }
}

/// Populate a fresh [`TokenSet`] from a token response body
pub fn read_token_set<R: BufRead>(source: R) -> AuthResult<TokenSet> {
    let mut tokens = TokenSet::default();
    let mut reader = TokenFieldReader::new(source);
    while let Some(field) = reader.read_field()? {
        if !tokens.apply_field(&field.name, field.value) {
            trace!(name = %field.name, "Ignoring token response field");
        }
    }
    Ok(tokens)
}

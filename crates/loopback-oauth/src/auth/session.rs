//! Interactive authorization and token refresh for one OAuth client
//!
//! [`AuthorizationSession::authorize`] runs the full authorization code
//! flow: reserve the loopback listener, open the provider's consent page,
//! wait for the redirect, then exchange the code for tokens.
//! [`AuthorizationSession::refresh`] performs the non-interactive refresh
//! token exchange.
//!
//! Every call returns its own [`TokenSet`]. The session also keeps the result
//! of the latest call for the read accessors. Either all token fields come
//! from that exchange or all of them are cleared.

use super::browser::{SystemBrowser, UrlOpener};
use super::callback_server::{CallbackServer, DEFAULT_CALLBACK_PORT, DEFAULT_CALLBACK_TIMEOUT};
use super::exchange::{TokenExchangeClient, TokenRequest, DEFAULT_REQUEST_TIMEOUT};
use super::types::{AuthError, AuthResult, ClientCredentials, FlowStage, ProviderEndpoint, TokenSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Tunables for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Loopback port; must match the redirect URI registered with the provider
    pub callback_port: u16,
    /// How long `authorize` waits for the browser redirect
    pub callback_timeout: Duration,
    /// Timeout for each token endpoint request
    pub request_timeout: Duration,
    /// Pre-fills the account on the provider's sign-in page
    pub login_hint: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            callback_port: DEFAULT_CALLBACK_PORT,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            login_hint: None,
        }
    }
}

/// One client's credentials plus the result of its latest token exchange
pub struct AuthorizationSession {
    endpoint: ProviderEndpoint,
    credentials: ClientCredentials,
    options: SessionOptions,
    exchange: TokenExchangeClient,
    opener: Arc<dyn UrlOpener>,
    tokens: TokenSet,
    last_error: Option<String>,
    stage: FlowStage,
}

impl AuthorizationSession {
    /// Session for any OAuth 2.0 provider
    pub fn new(endpoint: ProviderEndpoint, credentials: ClientCredentials) -> Self {
        let options = SessionOptions::default();
        let exchange = TokenExchangeClient::new(reqwest::Client::new(), &endpoint.token_endpoint)
            .with_request_timeout(options.request_timeout);

        debug!(
            "Initializing OAuth session with client_id: {}",
            credentials.client_id
        );
        Self {
            endpoint,
            credentials,
            options,
            exchange,
            opener: Arc::new(SystemBrowser),
            tokens: TokenSet::default(),
            last_error: None,
            stage: FlowStage::Idle,
        }
    }

    pub fn microsoft(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::new(
            ProviderEndpoint::microsoft(),
            ClientCredentials::new(client_id, client_secret),
        )
    }

    pub fn google(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::new(
            ProviderEndpoint::google(),
            ClientCredentials::new(client_id, client_secret),
        )
    }

    pub fn facebook(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::new(
            ProviderEndpoint::facebook(),
            ClientCredentials::new(client_id, client_secret),
        )
    }

    /// Replace all tunables at once
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.exchange = self
            .exchange
            .with_request_timeout(options.request_timeout);
        self.options = options;
        self
    }

    pub fn with_login_hint(mut self, login_hint: impl Into<String>) -> Self {
        self.options.login_hint = Some(login_hint.into());
        self
    }

    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.options.callback_port = port;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.options.callback_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self.exchange = self.exchange.with_request_timeout(timeout);
        self
    }

    /// Use a preconfigured HTTP client for token requests
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.exchange = TokenExchangeClient::new(http_client, &self.endpoint.token_endpoint)
            .with_request_timeout(self.options.request_timeout);
        self
    }

    /// Replace the default browser launcher
    pub fn with_url_opener(mut self, opener: impl UrlOpener + 'static) -> Self {
        self.opener = Arc::new(opener);
        self
    }

    pub fn set_login_hint(&mut self, login_hint: Option<String>) {
        self.options.login_hint = login_hint;
    }

    pub fn login_hint(&self) -> Option<&str> {
        self.options.login_hint.as_deref()
    }

    pub fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Tokens from the latest call
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.access_token.as_deref()
    }

    pub fn id_token(&self) -> Option<&str> {
        self.tokens.id_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.refresh_token.as_deref()
    }

    pub fn expires_in(&self) -> u64 {
        self.tokens.expires_in
    }

    pub fn token_type(&self) -> Option<&str> {
        self.tokens.token_type.as_deref()
    }

    /// Failure text of the latest call, if it failed
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Stage reached by the latest call
    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    /// Build the provider URL the browser is sent to
    pub fn authorization_url(&self, redirect_uri: &str, scope: Option<&str>) -> AuthResult<Url> {
        let mut url = Url::parse(&self.endpoint.authorization_endpoint).map_err(|e| {
            AuthError::ConfigError(format!("Invalid authorization endpoint: {}", e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.credentials.client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_mode", "query");
            if let Some(scope) = scope.filter(|s| !s.is_empty()) {
                query.append_pair("scope", scope);
            }
            if let Some(hint) = self.login_hint().filter(|h| !h.is_empty()) {
                query.append_pair("login_hint", hint);
            }
        }

        Ok(url)
    }

    /// Run the interactive authorization code flow.
    ///
    /// Blocks until the browser redirects back, the callback timeout expires,
    /// or a step fails. Concurrent calls on one session are not supported.
    pub async fn authorize(&mut self, scope: Option<&str>) -> AuthResult<TokenSet> {
        self.begin();
        let result = self.run_authorization(scope).await;
        self.finish(result)
    }

    /// [`authorize`](Self::authorize) with scopes joined by single spaces
    pub async fn authorize_scopes<I, S>(&mut self, scopes: I) -> AuthResult<TokenSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope = scopes
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.authorize(Some(&scope)).await
    }

    /// Exchange a refresh token for new tokens.
    ///
    /// The given refresh token is kept unless the provider rotates it.
    pub async fn refresh(&mut self, refresh_token: &str) -> AuthResult<TokenSet> {
        self.begin();
        self.tokens.refresh_token = Some(refresh_token.to_string());

        let request = TokenRequest::RefreshToken { refresh_token };
        let result = self
            .exchange
            .exchange(&request, &self.credentials)
            .await
            .map(|mut tokens| {
                if tokens.refresh_token.is_none() {
                    tokens.refresh_token = Some(refresh_token.to_string());
                }
                tokens
            });
        self.finish(result)
    }

    async fn run_authorization(&mut self, scope: Option<&str>) -> AuthResult<TokenSet> {
        // Dropping the server on any early return releases the port
        let server = CallbackServer::bind(self.options.callback_port).await?;
        self.transition(FlowStage::ListenerStarted);

        let redirect_uri = server.redirect_uri();
        let url = self.authorization_url(&redirect_uri, scope)?;

        debug!("Authorization URL = {}", url);
        self.opener.open(url.as_str())?;
        self.transition(FlowStage::BrowserLaunched);

        self.transition(FlowStage::AwaitingCallback);
        let callback = server
            .wait_for_callback(self.options.callback_timeout)
            .await?;
        self.transition(FlowStage::CallbackReceived);

        if let Some(error) = callback.error {
            warn!(
                error = %error,
                description = callback.error_description.as_deref().unwrap_or(""),
                "Provider returned an authorization error"
            );
            return Err(AuthError::AuthorizationDenied(error));
        }

        let code = callback
            .code
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MalformedCallback)?;

        let request = TokenRequest::AuthorizationCode {
            code: &code,
            redirect_uri: &redirect_uri,
            scope,
        };
        self.exchange.exchange(&request, &self.credentials).await
    }

    /// Clear all per-call state
    fn begin(&mut self) {
        self.tokens = TokenSet::default();
        self.last_error = None;
        self.stage = FlowStage::Idle;
    }

    fn finish(&mut self, result: AuthResult<TokenSet>) -> AuthResult<TokenSet> {
        match &result {
            Ok(tokens) => {
                self.tokens = tokens.clone();
                self.transition(FlowStage::ExchangeSucceeded);
                info!("OAuth tokens obtained");
            }
            Err(e) => {
                warn!(stage = %self.stage, "OAuth call failed: {}", e);
                self.last_error = Some(e.to_string());
                self.transition(FlowStage::ExchangeFailed);
            }
        }
        result
    }

    fn transition(&mut self, next: FlowStage) {
        debug!(from = %self.stage, to = %next, "OAuth flow stage");
        self.stage = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::providers::{
        FACEBOOK_AUTHORIZATION_ENDPOINT, GOOGLE_AUTHORIZATION_ENDPOINT,
        MICROSOFT_AUTHORIZATION_ENDPOINT,
    };
    use std::collections::HashMap;

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_named_constructors_target_provider_hosts() {
        let cases = [
            (
                AuthorizationSession::microsoft("id", "secret"),
                MICROSOFT_AUTHORIZATION_ENDPOINT,
            ),
            (
                AuthorizationSession::google("id", "secret"),
                GOOGLE_AUTHORIZATION_ENDPOINT,
            ),
            (
                AuthorizationSession::facebook("id", "secret"),
                FACEBOOK_AUTHORIZATION_ENDPOINT,
            ),
        ];

        for (session, documented) in cases {
            let url = session
                .authorization_url("http://localhost:6502/", None)
                .unwrap();
            let expected = Url::parse(documented).unwrap();
            assert_eq!(url.host_str(), expected.host_str());
            assert_eq!(url.path(), expected.path());
        }
    }

    #[test]
    fn test_authorization_url_parameters() {
        let session = AuthorizationSession::google("my client", "secret")
            .with_login_hint("ada@example.com");
        let url = session
            .authorization_url("http://localhost:6502/", Some("openid email"))
            .unwrap();

        let query = query_map(&url);
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "my client");
        assert_eq!(query["redirect_uri"], "http://localhost:6502/");
        assert_eq!(query["response_mode"], "query");
        assert_eq!(query["scope"], "openid email");
        assert_eq!(query["login_hint"], "ada@example.com");

        let raw = url.query().unwrap();
        assert!(raw.contains("redirect_uri=http%3A%2F%2Flocalhost%3A6502%2F"));
        assert!(raw.contains("login_hint=ada%40example.com"));
        assert!(!raw.contains("client_secret"));
        assert!(!raw.contains(' '));
    }

    #[test]
    fn test_optional_parameters_are_omitted() {
        let mut session = AuthorizationSession::microsoft("id", "");
        session.set_login_hint(Some(String::new()));
        let url = session
            .authorization_url("http://localhost:6502/", Some(""))
            .unwrap();
        let query = query_map(&url);
        assert!(!query.contains_key("scope"));
        assert!(!query.contains_key("login_hint"));
    }

    #[test]
    fn test_invalid_endpoint_is_a_config_error() {
        let session = AuthorizationSession::new(
            ProviderEndpoint::new("not a url", "https://example.com/token"),
            ClientCredentials::new("id", ""),
        );
        assert!(matches!(
            session.authorization_url("http://localhost:6502/", None),
            Err(AuthError::ConfigError(_))
        ));
    }

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = AuthorizationSession::facebook("id", "secret");
        assert_eq!(session.stage(), FlowStage::Idle);
        assert!(session.tokens().is_empty());
        assert_eq!(session.error(), None);
        assert_eq!(session.options().callback_port, DEFAULT_CALLBACK_PORT);
    }
}

//! # loopback-oauth
//!
//! OAuth 2.0 authorization code grant for native applications. The user
//! signs in through their browser, the provider redirects to a listener on
//! the loopback interface, and the returned code is exchanged for tokens.
//!
//! ```rust,no_run
//! use loopback_oauth::AuthorizationSession;
//!
//! # async fn example() -> loopback_oauth::AuthResult<()> {
//! let mut session = AuthorizationSession::google("client-id", "client-secret")
//!     .with_login_hint("user@example.com");
//!
//! let tokens = session.authorize(Some("openid email")).await?;
//! println!("expires in {}s", tokens.expires_in);
//!
//! if let Some(refresh_token) = tokens.refresh_token.as_deref() {
//!     session.refresh(refresh_token).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;

pub use auth::{
    AuthError, AuthResult, AuthorizationSession, ClientCredentials, FlowStage, Provider,
    ProviderEndpoint, SessionOptions, TokenFieldReader, TokenSet, UrlOpener,
};

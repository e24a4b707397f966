//! OAuth 2.0 authorization code flow for native applications
//!
//! This module provides:
//! - A streaming reader for token endpoint responses
//! - Built-in Microsoft, Google and Facebook endpoints
//! - A local HTTP callback server for the authorization redirect
//! - Token exchange for authorization codes and refresh tokens
//! - [`AuthorizationSession`], which drives the whole flow

pub mod browser;
pub mod callback_server;
pub mod exchange;
pub mod providers;
pub mod session;
pub mod token_reader;
pub mod types;

// Re-export commonly used types and functions
pub use browser::{SystemBrowser, UrlOpener};
pub use callback_server::{CallbackServer, DEFAULT_CALLBACK_PORT, DEFAULT_CALLBACK_TIMEOUT};
pub use exchange::{TokenExchangeClient, TokenRequest, DEFAULT_REQUEST_TIMEOUT};
pub use providers::Provider;
pub use session::{AuthorizationSession, SessionOptions};
pub use token_reader::{TokenField, TokenFieldReader};
pub use types::{
    AuthError, AuthResult, CallbackData, ClientCredentials, FlowStage, ProviderEndpoint, TokenSet,
};

//! Client registration and flow settings for the CLI
//!
//! Layers, lowest priority first:
//! 1. Built-in defaults
//! 2. TOML config file (`--config`, or `<config dir>/loopback-oauth/config.toml`)
//! 3. `local-secrets.json` in the working directory
//! 4. `LOOPBACK_OAUTH_*` environment variables

use crate::error::{CliError, Result};
use etcetera::{choose_base_strategy, BaseStrategy};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use loopback_oauth::auth::{
    DEFAULT_CALLBACK_PORT, DEFAULT_CALLBACK_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
use loopback_oauth::{
    AuthorizationSession, ClientCredentials, Provider, ProviderEndpoint, SessionOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Secrets file read from the working directory
pub const SECRETS_FILE: &str = "local-secrets.json";

/// Prefix for environment overrides, e.g. `LOOPBACK_OAUTH_CLIENT_ID`
pub const ENV_PREFIX: &str = "LOOPBACK_OAUTH_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which provider to sign in with
    pub provider: Provider,

    pub client_id: String,

    /// Empty for public clients
    pub client_secret: String,

    /// Only read when `provider = "custom"`
    pub authorization_endpoint: Option<String>,

    /// Only read when `provider = "custom"`
    pub token_endpoint: Option<String>,

    pub login_hint: Option<String>,

    /// Must match the redirect URI registered with the provider
    pub callback_port: u16,

    pub callback_timeout_secs: u64,

    pub request_timeout_secs: u64,

    /// Scopes requested when `authorize` is given none
    pub scopes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            client_id: String::new(),
            client_secret: String::new(),
            authorization_endpoint: None,
            token_endpoint: None,
            login_hint: None,
            callback_port: DEFAULT_CALLBACK_PORT,
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT.as_secs(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            scopes: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the usual places and validate it
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => Some(path),
            None => Self::default_path().ok(),
        };
        let config = Self::figment(config_path.as_deref(), Path::new(SECRETS_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// File layers only, without environment overrides
    pub fn figment(config_path: Option<&Path>, secrets_path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        if secrets_path.exists() {
            debug!("Loading client secrets from {}", secrets_path.display());
            figment = figment.merge(Json::file(secrets_path));
        }

        figment
    }

    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let strategy = choose_base_strategy().map_err(|e| {
            CliError::Config(format!("Failed to determine base directories: {}", e))
        })?;
        Ok(strategy.config_dir().join("loopback-oauth").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(CliError::Config(format!(
                "client_id is required (set it in the config file, {} or {}CLIENT_ID)",
                SECRETS_FILE, ENV_PREFIX
            )));
        }
        self.endpoint()?;
        Ok(())
    }

    /// Endpoints for the configured provider
    pub fn endpoint(&self) -> Result<ProviderEndpoint> {
        if let Some(endpoint) = self.provider.endpoint() {
            return Ok(endpoint);
        }

        let authorization_endpoint = require_url(
            "authorization_endpoint",
            self.authorization_endpoint.as_deref(),
        )?;
        let token_endpoint = require_url("token_endpoint", self.token_endpoint.as_deref())?;
        Ok(ProviderEndpoint::new(authorization_endpoint, token_endpoint))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            callback_port: self.callback_port,
            callback_timeout: Duration::from_secs(self.callback_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            login_hint: self.login_hint.clone().filter(|hint| !hint.is_empty()),
        }
    }

    /// Session wired up with this configuration and the system browser
    pub fn build_session(&self) -> Result<AuthorizationSession> {
        let credentials = ClientCredentials::new(&self.client_id, &self.client_secret);
        Ok(AuthorizationSession::new(self.endpoint()?, credentials)
            .with_options(self.session_options()))
    }
}

fn require_url(field: &str, value: Option<&str>) -> Result<String> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CliError::Config(format!("{} is required for a custom provider", field)))?;
    url::Url::parse(value)
        .map_err(|e| CliError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn extract(config: Option<&Path>, secrets: &Path) -> Config {
        Config::figment(config, secrets).extract().unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = extract(None, &dir.path().join(SECRETS_FILE));

        assert_eq!(config.provider, Provider::Microsoft);
        assert_eq!(config.callback_port, 6502);
        assert_eq!(config.callback_timeout_secs, 300);
        assert!(config.scopes.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secrets_file_overrides_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        let secrets_path = dir.path().join(SECRETS_FILE);
        fs::write(
            &config_path,
            r#"
provider = "facebook"
client_id = "from-toml"
callback_port = 7000
scopes = ["email", "public_profile"]
"#,
        )
        .unwrap();
        fs::write(
            &secrets_path,
            r#"{"client_id": "from-secrets", "client_secret": "hunter2"}"#,
        )
        .unwrap();

        let config = extract(Some(&config_path), &secrets_path);
        assert_eq!(config.provider, Provider::Facebook);
        assert_eq!(config.client_id, "from-secrets");
        assert_eq!(config.client_secret, "hunter2");
        assert_eq!(config.callback_port, 7000);
        assert_eq!(config.scopes, vec!["email", "public_profile"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint().unwrap(), ProviderEndpoint::facebook());
    }

    #[test]
    fn test_missing_config_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let config = extract(
            Some(&dir.path().join("absent.toml")),
            &dir.path().join(SECRETS_FILE),
        );
        assert_eq!(config.client_id, "");
    }

    #[test]
    fn test_custom_provider_requires_endpoints() {
        let mut config = Config {
            provider: Provider::Custom,
            client_id: "id".into(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("authorization_endpoint"));

        config.authorization_endpoint = Some("https://idp.example.com/authorize".into());
        config.token_endpoint = Some("not a url".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("token_endpoint is not a valid URL"));

        config.token_endpoint = Some("https://idp.example.com/token".into());
        assert_eq!(
            config.endpoint().unwrap(),
            ProviderEndpoint::new(
                "https://idp.example.com/authorize",
                "https://idp.example.com/token"
            )
        );
    }

    #[test]
    fn test_session_options() {
        let config = Config {
            client_id: "id".into(),
            callback_port: 0,
            callback_timeout_secs: 5,
            login_hint: Some(String::new()),
            ..Config::default()
        };
        let options = config.session_options();
        assert_eq!(options.callback_port, 0);
        assert_eq!(options.callback_timeout, Duration::from_secs(5));
        assert_eq!(options.login_hint, None);

        let session = config.build_session().unwrap();
        assert_eq!(session.endpoint(), &ProviderEndpoint::microsoft());
    }
}

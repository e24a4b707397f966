//! # loopback-oauth CLI
//!
//! Command-line driver for the loopback OAuth 2.0 authorization code flow:
//! - `authorize` signs in through the browser and prints the issued tokens
//! - `refresh` exchanges a refresh token for new tokens
//!
//! Client registration comes from a TOML config file, an optional
//! `local-secrets.json` in the working directory, and `LOOPBACK_OAUTH_*`
//! environment variables, in increasing priority.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::*;
pub use error::*;

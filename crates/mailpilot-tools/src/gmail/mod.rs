//! Gmail integration: OAuth credentials for the installed-app flow and the send endpoint.

pub mod auth;
pub mod client;
pub mod mime;

use std::path::PathBuf;
use thiserror::Error;

pub use auth::{
    CredentialSource, GmailAuth, GmailAuthConfig, OAuthToken, DEFAULT_CREDENTIALS_PATH,
    DEFAULT_TOKEN_PATH, GMAIL_SEND_SCOPE,
};
pub use client::GmailClient;

#[derive(Debug, Error)]
pub enum GmailError {
    #[error(
        "Credentials not found at {}. Download OAuth client secrets (Desktop app) from Google Cloud Console, \
         save them to that path, then run again.",
        path.display()
    )]
    CredentialsMissing { path: PathBuf },

    #[error("Invalid client secrets file {}: {reason}", path.display())]
    InvalidClientSecrets { path: PathBuf, reason: String },

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Gmail API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for GmailError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for GmailError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for GmailError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<url::ParseError> for GmailError {
    fn from(error: url::ParseError) -> Self {
        Self::OAuth(format!("invalid URL: {}", error))
    }
}

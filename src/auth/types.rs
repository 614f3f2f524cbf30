//! Token types shared by both credential flows

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Read-only access is all the mirror needs
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token is already treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid credentials file {path}: {message}")]
    InvalidCredentials { path: PathBuf, message: String },

    #[error("Failed to load private key: {0}")]
    PrivateKey(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Token cache error: {0}")]
    TokenCache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces bearer tokens for API calls
#[async_trait]
pub trait TokenSource: Send {
    /// A token valid for at least the next minute, refreshing if needed.
    async fn access_token(&mut self) -> Result<String, AuthError>;

    /// Drop the current token so the next call fetches a fresh one.
    fn invalidate(&mut self);
}

/// An OAuth2 access token with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp seconds
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at - EXPIRY_MARGIN_SECS
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_access_token(self, issued_at: i64) -> AccessToken {
        AccessToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: issued_at + self.expires_in.unwrap_or(3600),
            scope: self.scope,
        }
    }
}

/// POST a form to a token endpoint and parse the token response
pub(crate) async fn request_token(
    http: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenExchange(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("Failed to parse token response: {}", e)))
}

//! Installed-app OAuth with a persisted token cache.
//!
//! Token lifecycle: `Init` → `Valid` → `Expired` → `Refreshed` or
//! `Reauthenticated`. The cache file is rewritten after every new token.

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use oauth2::RefreshToken;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::loopback::{self, AUTHORIZATION_TIMEOUT};
use super::oauth::{exchange_error, into_access_token, oauth_client, OAuthHttp};
use super::token_cache;
use super::types::{AccessToken, AuthError, TokenSource, DEFAULT_TOKEN_URI};

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub async fn from_file(path: &Path) -> Result<Self, AuthError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AuthError::CredentialsFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&raw).map_err(|message| AuthError::InvalidCredentials {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Accepts the `installed` or `web` client layout
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let file: ClientSecretsFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        file.installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" OAuth client".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStage {
    Init,
    Valid,
    Expired,
    Refreshed,
    Reauthenticated,
}

pub struct InstalledAppTokens {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    cache_path: PathBuf,
    http: Client,
    current: Option<AccessToken>,
    cache_loaded: bool,
    stage: TokenStage,
    interactive: bool,
    authorization_timeout: Duration,
}

impl InstalledAppTokens {
    pub fn new(
        secrets: ClientSecrets,
        scopes: Vec<String>,
        cache_path: impl Into<PathBuf>,
        http: Client,
    ) -> Self {
        Self {
            secrets,
            scopes,
            cache_path: cache_path.into(),
            http,
            current: None,
            cache_loaded: false,
            stage: TokenStage::Init,
            interactive: true,
            authorization_timeout: AUTHORIZATION_TIMEOUT,
        }
    }

    pub async fn from_file(
        secrets_path: &Path,
        scopes: Vec<String>,
        cache_path: impl Into<PathBuf>,
        http: Client,
    ) -> Result<Self, AuthError> {
        let secrets = ClientSecrets::from_file(secrets_path).await?;
        Ok(Self::new(secrets, scopes, cache_path, http))
    }

    /// When disabled, a missing or unrefreshable token is an error instead
    /// of a browser prompt.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn stage(&self) -> TokenStage {
        self.stage
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let now = Utc::now().timestamp();
        let response = oauth_client(&self.secrets)?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&OAuthHttp(self.http.clone()))
            .await
            .map_err(exchange_error)?;

        let mut token = into_access_token(&response, now);
        // Google only returns a refresh token on the first consent
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    async fn store(&mut self, token: AccessToken, stage: TokenStage) -> Result<String, AuthError> {
        token_cache::save(&self.cache_path, &token).await?;
        let access = token.access_token.clone();
        self.current = Some(token);
        self.stage = stage;
        Ok(access)
    }
}

#[async_trait]
impl TokenSource for InstalledAppTokens {
    async fn access_token(&mut self) -> Result<String, AuthError> {
        if !self.cache_loaded {
            self.current = token_cache::load(&self.cache_path).await?;
            self.cache_loaded = true;
        }

        if let Some(ref token) = self.current {
            if !token.is_expired() {
                self.stage = TokenStage::Valid;
                return Ok(token.access_token.clone());
            }
            self.stage = TokenStage::Expired;
        }

        let refresh_token = self.current.as_ref().and_then(|t| t.refresh_token.clone());
        if let Some(refresh_token) = refresh_token {
            match self.refresh(&refresh_token).await {
                Ok(token) => {
                    info!("oauth_token: refreshed");
                    return self.store(token, TokenStage::Refreshed).await;
                }
                Err(e) => warn!("oauth_token: refresh failed: {}", e),
            }
        }

        if !self.interactive {
            return Err(AuthError::Authorization(
                "no usable cached token and interactive authorization is disabled".to_string(),
            ));
        }

        let token = loopback::authorize(
            &self.http,
            &self.secrets,
            &self.scopes,
            self.authorization_timeout,
        )
        .await?;
        info!("oauth_token: authorized, cached at {}", self.cache_path.display());
        self.store(token, TokenStage::Reauthenticated).await
    }

    fn invalidate(&mut self) {
        if let Some(token) = self.current.as_mut() {
            token.expires_at = 0;
        }
    }
}

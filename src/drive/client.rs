//! Authenticated Drive v3 client

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tree_mirror::{ChunkedRead, DriveSession, ListError, RemoteEntry, TransferError};

use super::error::DriveApiError;
use super::{list, media};
use crate::auth::{AuthError, TokenSource};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Per-read idle timeout. No total timeout, large files take as long as they take.
    pub read_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(60),
        }
    }
}

pub fn build_http_client(options: &HttpOptions) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(options.connect_timeout)
        .read_timeout(options.read_timeout)
        .user_agent(concat!("drive-mirror/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[derive(Debug, Error)]
pub(crate) enum RequestError {
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Api(#[from] DriveApiError),
}

impl From<RequestError> for TransferError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Api(api) => TransferError::Status {
                status: api.code,
                message: api.message,
            },
            RequestError::Network(e) => TransferError::Network(e.to_string()),
            RequestError::Auth(e) => TransferError::Other(e.to_string()),
        }
    }
}

pub struct DriveClient<T: TokenSource> {
    http: Client,
    tokens: Mutex<T>,
    api_base: String,
    include_trashed: bool,
}

impl<T: TokenSource> DriveClient<T> {
    pub fn new(http: Client, tokens: T) -> Self {
        Self {
            http,
            tokens: Mutex::new(tokens),
            api_base: DEFAULT_API_BASE.to_string(),
            include_trashed: false,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_include_trashed(mut self, include_trashed: bool) -> Self {
        self.include_trashed = include_trashed;
        self
    }

    pub(crate) fn include_trashed(&self) -> bool {
        self.include_trashed
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send a GET with a bearer token. A 401 invalidates the token and the
    /// request is retried once with a fresh one.
    pub(crate) async fn authorized_get<F>(&self, build: F) -> Result<Response, RequestError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retried = false;
        loop {
            let token = self.tokens.lock().await.access_token().await?;
            let response = build(&self.http).bearer_auth(&token).send().await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !retried {
                warn!("drive_request: 401, refreshing token and retrying");
                self.tokens.lock().await.invalidate();
                retried = true;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DriveApiError::from_api_response(status.as_u16(), &body).into());
            }

            return Ok(response);
        }
    }
}

#[async_trait]
impl<T: TokenSource> DriveSession for DriveClient<T> {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>, ListError> {
        list::list_folder(self, folder_id).await
    }

    async fn open_chunked_read(&self, file_id: &str) -> Result<ChunkedRead, TransferError> {
        media::open_media(self, file_id).await
    }
}

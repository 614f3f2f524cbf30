//! `oauth2` client for installed-app credentials, sending its token
//! requests through the shared reqwest client

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AsyncHttpClient, AuthType, AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
    HttpRequest, HttpResponse, RequestTokenError, TokenResponse as _, TokenUrl,
};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use super::installed::ClientSecrets;
use super::types::{AccessToken, AuthError};

/// Client with both the consent and the token endpoint configured
pub(crate) type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

pub(crate) fn oauth_client(secrets: &ClientSecrets) -> Result<GoogleClient, AuthError> {
    let auth_url = AuthUrl::new(secrets.auth_uri.clone())
        .map_err(|e| AuthError::Authorization(format!("invalid auth_uri: {}", e)))?;
    let token_url = TokenUrl::new(secrets.token_uri.clone())
        .map_err(|e| AuthError::TokenExchange(format!("invalid token_uri: {}", e)))?;

    // Google expects client credentials in the form body for installed apps
    let mut client = BasicClient::new(ClientId::new(secrets.client_id.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_auth_type(AuthType::RequestBody);
    if let Some(secret) = secrets.client_secret.as_ref() {
        client = client.set_client_secret(ClientSecret::new(secret.clone()));
    }
    Ok(client)
}

#[derive(Debug, Error)]
pub(crate) enum OAuthHttpError {
    #[error("token request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid token response: {0}")]
    Response(String),

    #[error("token request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Adapter that lets `oauth2` send requests with our reqwest client
pub(crate) struct OAuthHttp(pub(crate) Client);

impl<'c> AsyncHttpClient<'c> for OAuthHttp {
    type Error = OAuthHttpError;
    type Future =
        Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + Send + Sync + 'c>>;

    fn call(&'c self, request: HttpRequest) -> Self::Future {
        let http = self.0.clone();
        // The returned future only holds the join handle, which is Sync
        let task = tokio::spawn(async move { send(&http, request).await });
        Box::pin(async move { task.await? })
    }
}

async fn send(http: &Client, request: HttpRequest) -> Result<HttpResponse, OAuthHttpError> {
    let request = reqwest::Request::try_from(request)?;
    let response = http.execute(request).await?;

    let mut builder = oauth2::http::Response::builder().status(response.status());
    for (name, value) in response.headers() {
        builder = builder.header(name, value);
    }
    let body = response.bytes().await?;
    builder
        .body(body.to_vec())
        .map_err(|e| OAuthHttpError::Response(e.to_string()))
}

pub(crate) fn into_access_token(response: &BasicTokenResponse, issued_at: i64) -> AccessToken {
    let expires_in = response
        .expires_in()
        .map(|lifetime| lifetime.as_secs() as i64)
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    AccessToken {
        access_token: response.access_token().secret().clone(),
        refresh_token: response.refresh_token().map(|t| t.secret().clone()),
        expires_at: issued_at + expires_in,
        scope: response.scopes().map(|scopes| {
            scopes
                .iter()
                .map(|scope| scope.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }),
    }
}

pub(crate) fn exchange_error(e: RequestTokenError<OAuthHttpError, BasicErrorResponse>) -> AuthError {
    let message = match e {
        RequestTokenError::ServerResponse(response) => response.to_string(),
        RequestTokenError::Request(inner) => inner.to_string(),
        RequestTokenError::Parse(inner, _) => format!("Failed to parse token response: {}", inner),
        RequestTokenError::Other(message) => message,
    };
    AuthError::TokenExchange(message)
}

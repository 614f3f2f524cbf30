//! Interactive authorization with a loopback redirect and PKCE

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use log::{debug, info};
use oauth2::url::Url;
use oauth2::{
    AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::installed::ClientSecrets;
use super::oauth::{exchange_error, into_access_token, oauth_client, GoogleClient, OAuthHttp};
use super::types::{AccessToken, AuthError};

/// How long to wait for the browser to come back
pub const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str =
    "<html><body><p>Authorization complete. You may close this window.</p></body></html>";

type RedirectParams = HashMap<String, String>;

/// Consent URL with a fresh CSRF state and PKCE pair
pub(crate) fn consent_url(
    client: &GoogleClient,
    scopes: &[String],
) -> (Url, CsrfToken, PkceCodeVerifier) {
    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (url, csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(scopes.iter().map(|scope| Scope::new(scope.clone())))
        // offline access is what makes Google hand out a refresh token
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();
    (url, csrf_token, pkce_verifier)
}

/// The authorization code, once the state matches and consent was given
pub(crate) fn authorization_code(
    params: &RedirectParams,
    csrf_token: &CsrfToken,
) -> Result<String, AuthError> {
    if let Some(error) = params.get("error") {
        return Err(AuthError::Authorization(format!("consent denied: {}", error)));
    }
    if params.get("state") != Some(csrf_token.secret()) {
        return Err(AuthError::Authorization(
            "state mismatch in authorization response".to_string(),
        ));
    }
    params
        .get("code")
        .cloned()
        .ok_or_else(|| AuthError::Authorization("no authorization code returned".to_string()))
}

async fn receive_redirect(
    State(tx): State<mpsc::Sender<RedirectParams>>,
    Query(params): Query<RedirectParams>,
) -> (StatusCode, Html<&'static str>) {
    if !params.contains_key("code") && !params.contains_key("error") {
        debug!("oauth_loopback: ignoring request without an authorization response");
        return (StatusCode::NOT_FOUND, Html(""));
    }
    let _ = tx.try_send(params);
    (StatusCode::OK, Html(SUCCESS_PAGE))
}

/// Serve the loopback listener until a request carries the authorization
/// response. Each connection is handled on its own task, so idle
/// preconnects from the browser do not hold up the redirect.
pub(crate) async fn wait_for_redirect(listener: TcpListener) -> std::io::Result<RedirectParams> {
    let (tx, mut rx) = mpsc::channel(1);
    let app = Router::new()
        .route("/", get(receive_redirect))
        .with_state(tx);

    tokio::select! {
        params = rx.recv() => {
            params.ok_or_else(|| std::io::Error::other("redirect listener stopped"))
        }
        served = async move { axum::serve(listener, app).await } => {
            served?;
            Err(std::io::Error::other("redirect listener stopped"))
        }
    }
}

/// Run the browser consent flow and exchange the code for tokens
pub(crate) async fn authorize(
    http: &Client,
    secrets: &ClientSecrets,
    scopes: &[String],
    timeout: Duration,
) -> Result<AccessToken, AuthError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());
    let client = oauth_client(secrets)?.set_redirect_uri(
        RedirectUrl::new(redirect_uri)
            .map_err(|e| AuthError::Authorization(format!("invalid redirect uri: {}", e)))?,
    );

    let (url, csrf_token, pkce_verifier) = consent_url(&client, scopes);
    info!("Open this URL in a browser to authorize access:\n{}", url);

    let params = tokio::time::timeout(timeout, wait_for_redirect(listener))
        .await
        .map_err(|_| AuthError::Authorization("Timed out waiting for authorization".to_string()))??;
    let code = authorization_code(&params, &csrf_token)?;

    let now = Utc::now().timestamp();
    let response = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request_async(&OAuthHttp(http.clone()))
        .await
        .map_err(exchange_error)?;
    Ok(into_access_token(&response, now))
}

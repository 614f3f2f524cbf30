use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::Path;
use tree_mirror::{LogObserver, MirrorSummary, MirrorWalker};

pub mod auth;
pub mod config;
pub mod drive;
mod error;

pub use error::AppError;

use auth::{InstalledAppTokens, ServiceAccountTokens, TokenSource, DRIVE_READONLY_SCOPE};
use config::{AuthMode, MirrorConfig};
use drive::{build_http_client, DriveClient};

/// Log to stdout at `info`, overridable with `RUST_LOG`
pub fn init_logging() -> Result<(), AppError> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .map_err(|e| AppError::Logger(e.to_string()))
}

/// Authenticate, then mirror the configured folder.
///
/// Credential and listing failures are returned as errors; individual file
/// failures only show up in the summary.
pub async fn run(config: MirrorConfig) -> Result<MirrorSummary, AppError> {
    let http = build_http_client(&config.http)?;
    let scopes = vec![DRIVE_READONLY_SCOPE.to_string()];

    match config.auth {
        AuthMode::ServiceAccount => {
            let tokens =
                ServiceAccountTokens::from_file(&config.credentials, scopes, http.clone()).await?;
            info!("auth: service account {}", tokens.client_email());
            mirror_with(tokens, http, &config).await
        }
        AuthMode::Oauth => {
            let tokens = InstalledAppTokens::from_file(
                &config.credentials,
                scopes,
                config.token_cache.clone(),
                http.clone(),
            )
            .await?;
            mirror_with(tokens, http, &config).await
        }
    }
}

/// Mirror with an already constructed token source
pub async fn mirror_with<T: TokenSource>(
    mut tokens: T,
    http: reqwest::Client,
    config: &MirrorConfig,
) -> Result<MirrorSummary, AppError> {
    // Fail on credentials before touching the tree
    tokens.access_token().await?;
    info!("Authentication successful. Starting download...");

    let client = DriveClient::new(http, tokens)
        .with_api_base(config.api_base.clone())
        .with_include_trashed(config.include_trashed);

    let summary = MirrorWalker::new(&client, &config.download_dir)
        .with_options(config.fetch.clone())
        .with_observer(&LogObserver)
        .walk(&config.folder_id)
        .await?;

    for failure in &summary.failures {
        warn!("Failed: {} ({})", failure.path.display(), failure.reason);
    }
    info!(
        "Download finished: {} succeeded, {} failed, {} bytes",
        summary.files_succeeded, summary.files_failed, summary.bytes_downloaded
    );

    // The mirror itself is done, a report that cannot be written only warns
    if let Some(path) = &config.summary_file {
        if let Err(e) = write_summary(path, &summary).await {
            warn!("Could not write summary to {}: {}", path.display(), e);
        }
    }

    Ok(summary)
}

async fn write_summary(path: &Path, summary: &MirrorSummary) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    tokio::fs::write(path, json).await
}

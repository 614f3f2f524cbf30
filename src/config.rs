//! Command-line and environment configuration
//!
//! Every option has an environment fallback, so the binary runs without
//! arguments once `FOLDER_ID` is set.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tree_mirror::FetchOptions;

use crate::drive::{HttpOptions, DEFAULT_API_BASE};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Service-account key file
    ServiceAccount,
    /// Interactive browser consent, token cached on disk
    Oauth,
}

#[derive(Debug, Parser)]
#[command(name = "drive-mirror", version, about = "Mirror a Google Drive folder tree onto local disk")]
pub struct Args {
    /// Id of the Drive folder to mirror
    #[arg(long, env = "FOLDER_ID")]
    pub folder_id: Option<String>,

    /// Local directory the tree is written under
    #[arg(long, env = "DOWNLOAD_DIR", default_value = "./downloads")]
    pub download_dir: PathBuf,

    #[arg(long, env = "DRIVE_AUTH", value_enum, default_value_t = AuthMode::ServiceAccount)]
    pub auth: AuthMode,

    /// Service-account key or OAuth client secrets, depending on --auth
    #[arg(long, env = "GOOGLE_CREDENTIALS", default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Where --auth oauth keeps its tokens
    #[arg(long, env = "DRIVE_TOKEN_CACHE", default_value = "token.json")]
    pub token_cache: PathBuf,

    #[arg(long, env = "DRIVE_CHUNK_SIZE_KIB", default_value_t = 2048)]
    pub chunk_size_kib: usize,

    #[arg(long, env = "DRIVE_CONNECT_TIMEOUT_SECS", default_value_t = 15)]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "DRIVE_READ_TIMEOUT_SECS", default_value_t = 60)]
    pub read_timeout_secs: u64,

    /// Also mirror files that are in the trash
    #[arg(long, env = "DRIVE_INCLUDE_TRASHED")]
    pub include_trashed: bool,

    /// Write the run summary as JSON to this file
    #[arg(long, env = "DRIVE_SUMMARY_FILE")]
    pub summary_file: Option<PathBuf>,

    #[arg(long, env = "DRIVE_API_BASE", default_value = DEFAULT_API_BASE, hide = true)]
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub folder_id: String,
    pub download_dir: PathBuf,
    pub auth: AuthMode,
    pub credentials: PathBuf,
    pub token_cache: PathBuf,
    pub fetch: FetchOptions,
    pub http: HttpOptions,
    pub include_trashed: bool,
    pub summary_file: Option<PathBuf>,
    pub api_base: String,
}

impl Args {
    pub fn into_config(self) -> Result<MirrorConfig, AppError> {
        let folder_id = self
            .folder_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Config("folder id is required (--folder-id or FOLDER_ID)".to_string())
            })?;

        if self.chunk_size_kib == 0 {
            return Err(AppError::Config("chunk size must be positive".to_string()));
        }
        let chunk_size = self
            .chunk_size_kib
            .checked_mul(1024)
            .ok_or_else(|| AppError::Config("chunk size is too large".to_string()))?;
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(AppError::Config("timeouts must be positive".to_string()));
        }

        Ok(MirrorConfig {
            folder_id,
            download_dir: self.download_dir,
            auth: self.auth,
            credentials: self.credentials,
            token_cache: self.token_cache,
            fetch: FetchOptions {
                chunk_size,
            },
            http: HttpOptions {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                read_timeout: Duration::from_secs(self.read_timeout_secs),
            },
            include_trashed: self.include_trashed,
            summary_file: self.summary_file,
            api_base: self.api_base,
        })
    }
}

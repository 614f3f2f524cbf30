use tree_mirror::ListError;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    List(#[from] ListError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Logger error: {0}")]
    Logger(String),
}

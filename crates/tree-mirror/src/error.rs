use thiserror::Error;

/// Enumerating a folder failed. Aborts the whole walk.
#[derive(Debug, Error)]
#[error("Failed to list folder {folder_id}: {message}")]
pub struct ListError {
    pub folder_id: String,
    pub message: String,
}

impl ListError {
    pub fn new(folder_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            message: message.into(),
        }
    }
}

/// A single file failed to download. Contained at the fetcher boundary.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Download failed: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Transfer ended early: received {received} of {expected} bytes")]
    Incomplete { expected: u64, received: u64 },

    #[error("{0}")]
    Other(String),
}

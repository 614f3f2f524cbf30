//! Progress and failure reporting hooks

use log::{info, warn};
use std::path::Path;

use crate::error::TransferError;
use crate::types::DownloadProgress;

/// Receives walk and transfer events. Every hook defaults to a no-op.
pub trait MirrorObserver: Send + Sync {
    fn folder_entered(&self, _relative_path: &Path) {}

    /// A folder id was already visited in this run and is not listed again.
    fn folder_skipped(&self, _relative_path: &Path, _folder_id: &str) {}

    fn file_found(&self, _relative_path: &Path) {}

    fn progress(&self, _file_name: &str, _progress: &DownloadProgress) {}

    fn file_completed(&self, _file_name: &str, _bytes: u64) {}

    fn file_failed(&self, _file_name: &str, _error: &TransferError) {}
}

pub struct NoopObserver;

impl MirrorObserver for NoopObserver {}

/// Writes human-readable lines through the `log` facade
pub struct LogObserver;

impl MirrorObserver for LogObserver {
    fn folder_entered(&self, relative_path: &Path) {
        info!("Processing folder: {}", relative_path.display());
    }

    fn folder_skipped(&self, relative_path: &Path, folder_id: &str) {
        warn!(
            "Skipping folder {} (id {} already visited)",
            relative_path.display(),
            folder_id
        );
    }

    fn file_found(&self, relative_path: &Path) {
        info!("Found file: {}", relative_path.display());
    }

    fn progress(&self, file_name: &str, progress: &DownloadProgress) {
        info!("Downloading {}: {}%", file_name, progress.percent());
    }

    fn file_failed(&self, file_name: &str, error: &TransferError) {
        warn!("Error downloading {}: {}", file_name, error);
    }
}

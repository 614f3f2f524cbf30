//! Entry, progress and result types

use serde::Serialize;
use std::path::PathBuf;

/// A child returned by one listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
}

impl RemoteEntry {
    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder: false,
            size: None,
            mime_type: None,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder: true,
            size: None,
            mime_type: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Progress of one file transfer, emitted after every written chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub bytes_so_far: u64,
    pub total_bytes: Option<u64>,
    pub fraction: f64,
}

impl DownloadProgress {
    /// Progress mid-transfer. Unknown or zero totals count as 0 until completion.
    pub fn partial(bytes_so_far: u64, total_bytes: Option<u64>) -> Self {
        let fraction = match total_bytes {
            Some(total) if total > 0 => (bytes_so_far as f64 / total as f64).min(1.0),
            _ => 0.0,
        };
        Self {
            bytes_so_far,
            total_bytes,
            fraction,
        }
    }

    pub fn complete(bytes_so_far: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_so_far,
            total_bytes,
            fraction: 1.0,
        }
    }

    /// Percentage rounded down
    pub fn percent(&self) -> u32 {
        std::cmp::min((self.fraction * 100.0).floor() as u32, 100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success { bytes: u64 },
    Failure(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Totals for one mirror run, serializable as a JSON report
#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorSummary {
    pub folders_visited: usize,
    pub folders_skipped: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub bytes_downloaded: u64,
    pub failures: Vec<FileFailure>,
}

#[cfg(test)]
mod tests {
    use super::DownloadProgress;

    #[test]
    fn percent_rounds_down() {
        let progress = DownloadProgress::partial(999, Some(1000));
        assert_eq!(progress.percent(), 99);

        let progress = DownloadProgress::partial(1, Some(3));
        assert_eq!(progress.percent(), 33);
    }

    #[test]
    fn unknown_total_reports_zero_until_complete() {
        assert_eq!(DownloadProgress::partial(4096, None).percent(), 0);
        assert_eq!(DownloadProgress::partial(4096, Some(0)).percent(), 0);
        assert_eq!(DownloadProgress::complete(4096, None).percent(), 100);
    }

    #[test]
    fn fraction_is_clamped_when_server_undercounts() {
        let progress = DownloadProgress::partial(150, Some(100));
        assert_eq!(progress.fraction, 1.0);
        assert_eq!(progress.percent(), 100);
    }
}

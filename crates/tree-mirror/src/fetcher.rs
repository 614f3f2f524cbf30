//! Single-file download with chunked writes and progress reporting

use futures_util::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::TransferError;
use crate::observer::MirrorObserver;
use crate::path::local_file_path;
use crate::session::DriveSession;
use crate::types::{DownloadProgress, FetchResult};

/// Write buffer size for downloads (2 MB) - one progress report per flush
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub chunk_size: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Download `file_id` to `target_dir/file_name`.
///
/// `size_hint` is the size the listing reported. It drives progress when the
/// transfer itself does not announce a length.
///
/// Never returns an error: any failure is reported to the observer, the
/// partial file is removed, and the reason comes back as
/// [`FetchResult::Failure`].
pub async fn fetch<S: DriveSession + ?Sized>(
    session: &S,
    file_id: &str,
    file_name: &str,
    size_hint: Option<u64>,
    target_dir: &Path,
    options: &FetchOptions,
    observer: &dyn MirrorObserver,
) -> FetchResult {
    let file_path = local_file_path(target_dir, file_name);
    let transfer = Transfer {
        file_id,
        file_name,
        size_hint,
        file_path: &file_path,
    };

    match download_to(session, &transfer, options, observer).await {
        Ok(bytes) => {
            observer.file_completed(file_name, bytes);
            FetchResult::Success { bytes }
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&file_path).await;
            observer.file_failed(file_name, &e);
            FetchResult::Failure(e.to_string())
        }
    }
}

struct Transfer<'a> {
    file_id: &'a str,
    file_name: &'a str,
    size_hint: Option<u64>,
    file_path: &'a Path,
}

async fn download_to<S: DriveSession + ?Sized>(
    session: &S,
    transfer: &Transfer<'_>,
    options: &FetchOptions,
    observer: &dyn MirrorObserver,
) -> Result<u64, TransferError> {
    let file_name = transfer.file_name;

    // Create parent directories if needed
    if let Some(parent) = transfer.file_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Existing files are truncated, there is no resume
    let mut file = File::create(transfer.file_path).await?;

    let read = session.open_chunked_read(transfer.file_id).await?;
    let announced = read.total_bytes;
    let total_bytes = announced.or(transfer.size_hint);
    let mut stream = read.chunks;

    let chunk_size = options.chunk_size.max(1);
    let mut write_buffer = Vec::with_capacity(chunk_size.min(DEFAULT_CHUNK_SIZE));
    let mut written: u64 = 0;
    let mut last_percent: Option<u32> = None;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        write_buffer.extend_from_slice(&chunk);

        if write_buffer.len() >= chunk_size {
            file.write_all(&write_buffer).await?;
            written += write_buffer.len() as u64;
            write_buffer.clear();

            let progress = DownloadProgress::partial(written, total_bytes);
            observer.progress(file_name, &progress);
            last_percent = Some(progress.percent());
        }
    }

    let tail = !write_buffer.is_empty();
    if tail {
        file.write_all(&write_buffer).await?;
        written += write_buffer.len() as u64;
    }
    file.flush().await?;

    // Only a length the transfer announced itself can prove it short
    if let Some(expected) = announced {
        if written < expected {
            return Err(TransferError::Incomplete {
                expected,
                received: written,
            });
        }
    }

    // A zero-byte file still gets its single 100% report
    if tail || last_percent != Some(100) {
        observer.progress(file_name, &DownloadProgress::complete(written, total_bytes));
    }

    Ok(written)
}

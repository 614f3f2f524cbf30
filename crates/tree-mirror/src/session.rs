//! Capability interface consumed by the walker and fetcher

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::error::{ListError, TransferError};
use crate::types::RemoteEntry;

/// An open download: the reported size plus the raw byte chunks
pub struct ChunkedRead {
    pub total_bytes: Option<u64>,
    pub chunks: BoxStream<'static, Result<Bytes, TransferError>>,
}

impl std::fmt::Debug for ChunkedRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedRead")
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

/// An authenticated handle on a remote storage service
#[async_trait]
pub trait DriveSession: Send + Sync {
    /// All immediate children of `folder_id`, across every result page.
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>, ListError>;

    async fn open_chunked_read(&self, file_id: &str) -> Result<ChunkedRead, TransferError>;
}

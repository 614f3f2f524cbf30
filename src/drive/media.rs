//! File content download (`files.get?alt=media`)

use futures_util::StreamExt;
use tree_mirror::{ChunkedRead, TransferError};

use super::client::DriveClient;
use crate::auth::TokenSource;

pub(crate) async fn open_media<T: TokenSource>(
    client: &DriveClient<T>,
    file_id: &str,
) -> Result<ChunkedRead, TransferError> {
    let url = client.url(&format!("/drive/v3/files/{}", urlencoding::encode(file_id)));

    let response = client
        .authorized_get(|http| {
            http.get(&url)
                .query(&[("alt", "media"), ("supportsAllDrives", "true")])
        })
        .await?;

    let total_bytes = response.content_length();
    let chunks = response
        .bytes_stream()
        .map(|chunk_result| {
            chunk_result.map_err(|e| TransferError::Network(format!("Failed to read chunk: {}", e)))
        })
        .boxed();

    Ok(ChunkedRead {
        total_bytes,
        chunks,
    })
}

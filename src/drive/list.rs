//! Folder listing (`files.list`)

use log::debug;
use std::collections::HashSet;
use tree_mirror::{ListError, RemoteEntry};

use super::client::DriveClient;
use super::types::{FileList, LIST_FIELDS, PAGE_SIZE};
use crate::auth::TokenSource;

/// `q` expression selecting the children of `folder_id`
pub(crate) fn parents_query(folder_id: &str, include_trashed: bool) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    let mut query = format!("'{}' in parents", escaped);
    if !include_trashed {
        query.push_str(" and trashed = false");
    }
    query
}

/// List all children of a folder, following `nextPageToken` until the last page
pub(crate) async fn list_folder<T: TokenSource>(
    client: &DriveClient<T>,
    folder_id: &str,
) -> Result<Vec<RemoteEntry>, ListError> {
    let url = client.url("/drive/v3/files");
    let query = parents_query(folder_id, client.include_trashed());
    let page_size = PAGE_SIZE.to_string();

    let mut entries: Vec<RemoteEntry> = Vec::new();
    let mut page_token: Option<String> = None;
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut page_count = 0;

    loop {
        let response = client
            .authorized_get(|http| {
                let mut request = http.get(&url).query(&[
                    ("q", query.as_str()),
                    ("fields", LIST_FIELDS),
                    ("pageSize", page_size.as_str()),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ]);
                if let Some(token) = &page_token {
                    request = request.query(&[("pageToken", token.as_str())]);
                }
                request
            })
            .await
            .map_err(|e| ListError::new(folder_id, e.to_string()))?;

        let page: FileList = response
            .json()
            .await
            .map_err(|e| ListError::new(folder_id, format!("Failed to parse listing: {}", e)))?;
        page_count += 1;

        entries.extend(page.files.into_iter().map(RemoteEntry::from));
        debug!(
            "drive_list: {} page={} items={}",
            folder_id,
            page_count,
            entries.len()
        );

        match page.next_page_token {
            Some(token) => {
                if !seen_tokens.insert(token.clone()) {
                    return Err(ListError::new(
                        folder_id,
                        format!("Listing repeated page token after {} pages", page_count),
                    ));
                }
                page_token = Some(token);
            }
            None => break,
        }
    }

    Ok(entries)
}

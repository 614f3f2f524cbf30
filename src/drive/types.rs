//! Drive v3 wire types

use serde::Deserialize;
use tree_mirror::RemoteEntry;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Fields requested from `files.list`
pub const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,size)";

pub const PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// int64 values arrive as JSON strings
    pub size: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

impl From<DriveFile> for RemoteEntry {
    fn from(file: DriveFile) -> Self {
        RemoteEntry {
            is_folder: file.mime_type == FOLDER_MIME_TYPE,
            size: file.size.as_deref().and_then(|s| s.parse().ok()),
            id: file.id,
            name: file.name,
            mime_type: Some(file.mime_type),
        }
    }
}

//! Google Drive v3 session provider
//!
//! This module is organized into submodules:
//! - `types`: wire types and listing constants
//! - `error`: API error body parsing
//! - `client`: authenticated HTTP client implementing `DriveSession`
//! - `list`: paginated folder listing
//! - `media`: streamed file content

mod client;
mod error;
mod list;
mod media;
mod types;

pub use client::{build_http_client, DriveClient, HttpOptions, DEFAULT_API_BASE};
pub use error::DriveApiError;
pub use types::{DriveFile, FileList, FOLDER_MIME_TYPE};

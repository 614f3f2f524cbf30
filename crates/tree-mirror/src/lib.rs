//! Remote tree mirroring engine
//!
//! Reconstructs a remote folder hierarchy on local disk:
//! - `session`: capability interface the engine consumes (list children, open a byte stream)
//! - `walker`: iterative depth-first traversal with a visited-folder guard
//! - `fetcher`: chunked download of one file with progress and failure isolation
//! - `path`: file name sanitization and local path construction
//! - `observer`: progress and failure reporting hooks

mod error;
mod fetcher;
mod observer;
mod path;
mod session;
mod types;
mod walker;

pub use error::{ListError, TransferError};
pub use fetcher::{fetch, FetchOptions, DEFAULT_CHUNK_SIZE};
pub use observer::{LogObserver, MirrorObserver, NoopObserver};
pub use path::{local_file_path, sanitize_component};
pub use session::{ChunkedRead, DriveSession};
pub use types::{DownloadProgress, FetchResult, FileFailure, MirrorSummary, RemoteEntry};
pub use walker::{walk, MirrorWalker};

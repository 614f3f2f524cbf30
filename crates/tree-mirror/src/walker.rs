//! Depth-first mirror of a remote folder tree

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ListError;
use crate::fetcher::{fetch, FetchOptions};
use crate::observer::{MirrorObserver, NoopObserver};
use crate::path::sanitize_component;
use crate::session::DriveSession;
use crate::types::{FetchResult, FileFailure, MirrorSummary, RemoteEntry};

/// Children of one listed folder that are still to be processed
struct Frame {
    children: std::vec::IntoIter<RemoteEntry>,
    relative_path: PathBuf,
}

pub struct MirrorWalker<'a, S: DriveSession + ?Sized> {
    session: &'a S,
    base_dir: PathBuf,
    options: FetchOptions,
    observer: &'a dyn MirrorObserver,
}

impl<'a, S: DriveSession + ?Sized> MirrorWalker<'a, S> {
    pub fn new(session: &'a S, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            base_dir: base_dir.into(),
            options: FetchOptions::default(),
            observer: &NoopObserver,
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn MirrorObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Mirror every descendant of `folder_id` under the base directory.
    ///
    /// Children are handled in listing order and a subfolder is finished
    /// before its next sibling. A failed listing aborts the walk; a failed
    /// file is recorded in the summary and the walk moves on. Directories
    /// are only created on the way to a file, so empty folders leave no
    /// trace locally.
    pub async fn walk(&self, folder_id: &str) -> Result<MirrorSummary, ListError> {
        let mut summary = MirrorSummary::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<Frame> = Vec::new();

        visited.insert(folder_id.to_string());
        let children = self.session.list_children(folder_id).await?;
        summary.folders_visited += 1;
        stack.push(Frame {
            children: children.into_iter(),
            relative_path: PathBuf::new(),
        });

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let relative_dir = frame.relative_path.clone();
            let child_path = relative_dir.join(sanitize_component(&child.name));

            if child.is_folder {
                if !visited.insert(child.id.clone()) {
                    self.observer.folder_skipped(&child_path, &child.id);
                    summary.folders_skipped += 1;
                    continue;
                }

                self.observer.folder_entered(&child_path);
                let children = self.session.list_children(&child.id).await?;
                summary.folders_visited += 1;
                stack.push(Frame {
                    children: children.into_iter(),
                    relative_path: child_path,
                });
            } else {
                self.observer.file_found(&child_path);
                let target_dir = self.base_dir.join(&relative_dir);

                let result = fetch(
                    self.session,
                    &child.id,
                    &child.name,
                    child.size,
                    &target_dir,
                    &self.options,
                    self.observer,
                )
                .await;

                match result {
                    FetchResult::Success { bytes } => {
                        summary.files_succeeded += 1;
                        summary.bytes_downloaded += bytes;
                    }
                    FetchResult::Failure(reason) => {
                        summary.files_failed += 1;
                        summary.failures.push(FileFailure {
                            path: child_path,
                            reason,
                        });
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Convenience wrapper around [`MirrorWalker`]
pub async fn walk<S: DriveSession + ?Sized>(
    session: &S,
    folder_id: &str,
    base_dir: &Path,
    options: FetchOptions,
    observer: &dyn MirrorObserver,
) -> Result<MirrorSummary, ListError> {
    MirrorWalker::new(session, base_dir)
        .with_options(options)
        .with_observer(observer)
        .walk(folder_id)
        .await
}

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use tree_mirror::{
    ChunkedRead, DownloadProgress, DriveSession, FetchOptions, ListError, MirrorObserver,
    MirrorWalker, NoopObserver, RemoteEntry, TransferError,
};

enum MockFile {
    Content { chunks: Vec<Vec<u8>>, total: Option<u64> },
    FailOnOpen(String),
    FailMidStream { first: Vec<u8>, message: String },
}

#[derive(Default)]
struct MockSession {
    folders: HashMap<String, Result<Vec<RemoteEntry>, String>>,
    files: HashMap<String, MockFile>,
    listed: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl MockSession {
    fn folder(mut self, id: &str, children: Vec<RemoteEntry>) -> Self {
        self.folders.insert(id.to_string(), Ok(children));
        self
    }

    fn broken_folder(mut self, id: &str, message: &str) -> Self {
        self.folders.insert(id.to_string(), Err(message.to_string()));
        self
    }

    fn file(mut self, id: &str, content: &[u8]) -> Self {
        self.files.insert(
            id.to_string(),
            MockFile::Content {
                chunks: vec![content.to_vec()],
                total: Some(content.len() as u64),
            },
        );
        self
    }

    fn chunked_file(mut self, id: &str, chunks: Vec<Vec<u8>>, total: Option<u64>) -> Self {
        self.files
            .insert(id.to_string(), MockFile::Content { chunks, total });
        self
    }

    fn failing_file(mut self, id: &str, file: MockFile) -> Self {
        self.files.insert(id.to_string(), file);
        self
    }

    fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl DriveSession for MockSession {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>, ListError> {
        self.listed.lock().unwrap().push(folder_id.to_string());
        match self.folders.get(folder_id) {
            Some(Ok(children)) => Ok(children.clone()),
            Some(Err(message)) => Err(ListError::new(folder_id, message.clone())),
            None => Err(ListError::new(folder_id, "File not found")),
        }
    }

    async fn open_chunked_read(&self, file_id: &str) -> Result<ChunkedRead, TransferError> {
        self.opened.lock().unwrap().push(file_id.to_string());
        match self.files.get(file_id) {
            Some(MockFile::Content { chunks, total }) => {
                let items: Vec<Result<Bytes, TransferError>> = chunks
                    .iter()
                    .map(|c| Ok(Bytes::from(c.clone())))
                    .collect();
                Ok(ChunkedRead {
                    total_bytes: *total,
                    chunks: stream::iter(items).boxed(),
                })
            }
            Some(MockFile::FailOnOpen(message)) => Err(TransferError::Status {
                status: 403,
                message: message.clone(),
            }),
            Some(MockFile::FailMidStream { first, message }) => {
                let items = vec![
                    Ok(Bytes::from(first.clone())),
                    Err(TransferError::Network(message.clone())),
                ];
                Ok(ChunkedRead {
                    total_bytes: Some(1024),
                    chunks: stream::iter(items).boxed(),
                })
            }
            None => Err(TransferError::Status {
                status: 404,
                message: "File not found".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct RecordingObserver {
    progress: Mutex<Vec<(String, u32)>>,
    failed: Mutex<Vec<String>>,
    skipped: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn progress_for(&self, name: &str) -> Vec<u32> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl MirrorObserver for RecordingObserver {
    fn folder_skipped(&self, _relative_path: &Path, folder_id: &str) {
        self.skipped.lock().unwrap().push(folder_id.to_string());
    }

    fn progress(&self, file_name: &str, progress: &DownloadProgress) {
        self.progress
            .lock()
            .unwrap()
            .push((file_name.to_string(), progress.percent()));
    }

    fn file_failed(&self, file_name: &str, _error: &TransferError) {
        self.failed.lock().unwrap().push(file_name.to_string());
    }
}

fn local_files(base: &Path) -> BTreeSet<PathBuf> {
    let mut found = BTreeSet::new();
    let mut pending = vec![base.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                found.insert(path.strip_prefix(base).unwrap().to_path_buf());
            }
        }
    }
    found
}

fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[tokio::test]
async fn mirrors_file_and_nested_zero_byte_file() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::file("a", "a.txt").with_size(10),
                RemoteEntry::folder("sub", "sub"),
            ],
        )
        .folder("sub", vec![RemoteEntry::file("b", "b.txt").with_size(0)])
        .file("a", b"0123456789")
        .file("b", b"");
    let observer = RecordingObserver::default();

    let summary = MirrorWalker::new(&session, &base)
        .with_observer(&observer)
        .walk("root")
        .await
        .unwrap();

    assert_eq!(std::fs::read(base.join("a.txt")).unwrap().len(), 10);
    assert_eq!(std::fs::read(base.join("sub/b.txt")).unwrap().len(), 0);
    assert_eq!(observer.progress_for("b.txt"), vec![100]);
    assert_eq!(observer.progress_for("a.txt"), vec![100]);
    assert_eq!(summary.files_succeeded, 2);
    assert_eq!(summary.files_failed, 0);
    assert_eq!(summary.folders_visited, 2);
    assert_eq!(summary.bytes_downloaded, 10);
}

#[tokio::test]
async fn local_files_match_remote_leaves() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::folder("docs", "docs"),
                RemoteEntry::file("r1", "readme.md"),
                RemoteEntry::folder("media", "media"),
            ],
        )
        .folder(
            "docs",
            vec![
                RemoteEntry::file("d1", "one.txt"),
                RemoteEntry::folder("drafts", "drafts"),
            ],
        )
        .folder("drafts", vec![RemoteEntry::file("d2", "two.txt")])
        .folder("media", vec![RemoteEntry::file("m1", "clip.mp4")])
        .file("r1", b"# readme")
        .file("d1", b"one")
        .file("d2", b"two")
        .file("m1", b"\x00\x01\x02");

    MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert_eq!(
        local_files(&base),
        paths(&[
            "readme.md",
            "docs/one.txt",
            "docs/drafts/two.txt",
            "media/clip.mp4"
        ])
    );
    // depth-first, listing order
    assert_eq!(session.opened(), vec!["d1", "d2", "r1", "m1"]);
}

#[tokio::test]
async fn duplicate_names_keep_last_in_listing_order() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::file("first", "dup.txt"),
                RemoteEntry::file("second", "dup.txt"),
            ],
        )
        .file("first", b"first version")
        .file("second", b"second");

    let summary = MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert_eq!(local_files(&base), paths(&["dup.txt"]));
    assert_eq!(std::fs::read(base.join("dup.txt")).unwrap(), b"second");
    assert_eq!(summary.files_succeeded, 2);
}

#[tokio::test]
async fn empty_folders_create_no_directories() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::folder("empty", "empty"),
                RemoteEntry::folder("outer", "outer"),
            ],
        )
        .folder("empty", vec![])
        .folder("outer", vec![RemoteEntry::folder("inner", "inner")])
        .folder("inner", vec![RemoteEntry::file("f", "deep.txt")])
        .file("f", b"deep");

    MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert!(!base.join("empty").exists());
    assert!(base.join("outer/inner/deep.txt").is_file());
}

#[tokio::test]
async fn root_with_only_empty_folders_leaves_base_untouched() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder("root", vec![RemoteEntry::folder("empty", "empty")])
        .folder("empty", vec![]);

    let summary = MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert!(!base.exists());
    assert_eq!(summary.folders_visited, 2);
    assert_eq!(summary.files_succeeded, 0);
}

#[tokio::test]
async fn transfer_failure_does_not_stop_siblings_or_descendants() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::file("bad", "bad.bin"),
                RemoteEntry::file("denied", "denied.gdoc"),
                RemoteEntry::file("good", "good.txt"),
                RemoteEntry::folder("sub", "sub"),
            ],
        )
        .folder("sub", vec![RemoteEntry::file("c", "c.txt")])
        .failing_file(
            "bad",
            MockFile::FailMidStream {
                first: vec![7; 16],
                message: "connection reset".to_string(),
            },
        )
        .failing_file(
            "denied",
            MockFile::FailOnOpen("Only files with binary content can be downloaded".to_string()),
        )
        .file("good", b"good")
        .file("c", b"c");
    let observer = RecordingObserver::default();

    let summary = MirrorWalker::new(&session, &base)
        .with_observer(&observer)
        .walk("root")
        .await
        .unwrap();

    assert_eq!(local_files(&base), paths(&["good.txt", "sub/c.txt"]));
    assert_eq!(summary.files_succeeded, 2);
    assert_eq!(summary.files_failed, 2);
    assert_eq!(
        *observer.failed.lock().unwrap(),
        vec!["bad.bin".to_string(), "denied.gdoc".to_string()]
    );
    assert_eq!(summary.failures[0].path, PathBuf::from("bad.bin"));
    assert!(summary.failures[0].reason.contains("connection reset"));
}

#[tokio::test]
async fn listing_failure_aborts_remaining_walk() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::file("first", "first.txt"),
                RemoteEntry::folder("broken", "broken"),
                RemoteEntry::file("after", "after.txt"),
                RemoteEntry::folder("later", "later"),
            ],
        )
        .broken_folder("broken", "The user does not have sufficient permissions")
        .folder("later", vec![RemoteEntry::file("l", "l.txt")])
        .file("first", b"1")
        .file("after", b"2")
        .file("l", b"3");

    let err = MirrorWalker::new(&session, &base)
        .walk("root")
        .await
        .unwrap_err();

    assert_eq!(err.folder_id, "broken");
    assert_eq!(local_files(&base), paths(&["first.txt"]));
    assert_eq!(session.opened(), vec!["first"]);
}

#[tokio::test]
async fn root_listing_failure_downloads_nothing() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default().broken_folder("root", "invalid credentials");

    let err = MirrorWalker::new(&session, &base)
        .walk("root")
        .await
        .unwrap_err();

    assert_eq!(err.folder_id, "root");
    assert!(!base.exists());
    assert!(session.opened().is_empty());
}

#[tokio::test]
async fn revisited_folder_ids_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::folder("a", "a"),
                RemoteEntry::file("top", "top.txt"),
            ],
        )
        .folder(
            "a",
            vec![
                RemoteEntry::folder("root", "back-to-root"),
                RemoteEntry::file("inner", "inner.txt"),
            ],
        )
        .file("top", b"top")
        .file("inner", b"inner");
    let observer = RecordingObserver::default();

    let summary = MirrorWalker::new(&session, &base)
        .with_observer(&observer)
        .walk("root")
        .await
        .unwrap();

    assert_eq!(local_files(&base), paths(&["top.txt", "a/inner.txt"]));
    assert_eq!(summary.folders_skipped, 1);
    assert_eq!(*observer.skipped.lock().unwrap(), vec!["root".to_string()]);
}

#[tokio::test]
async fn second_run_produces_same_files() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::file("x", "x.txt"),
                RemoteEntry::folder("s", "s"),
            ],
        )
        .folder("s", vec![RemoteEntry::file("y", "y.txt")])
        .file("x", b"x content")
        .file("y", b"y content");

    MirrorWalker::new(&session, &base).walk("root").await.unwrap();
    let first = local_files(&base);
    tree_mirror::walk(&session, "root", &base, FetchOptions::default(), &NoopObserver)
        .await
        .unwrap();

    assert_eq!(local_files(&base), first);
    assert_eq!(std::fs::read(base.join("x.txt")).unwrap(), b"x content");
    assert_eq!(std::fs::read(base.join("s/y.txt")).unwrap(), b"y content");
}

#[tokio::test]
async fn names_with_separators_stay_inside_base() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder(
            "root",
            vec![
                RemoteEntry::file("evil", "../evil.txt"),
                RemoteEntry::folder("dots", ".."),
            ],
        )
        .folder("dots", vec![RemoteEntry::file("n", "a/b.txt")])
        .file("evil", b"evil")
        .file("n", b"nested");

    MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert!(!tmp.path().join("evil.txt").exists());
    assert_eq!(local_files(&base), paths(&[".._evil.txt", "_/a_b.txt"]));
}

#[tokio::test]
async fn progress_is_reported_per_written_chunk() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder("root", vec![RemoteEntry::file("f", "ten.bin")])
        .chunked_file(
            "f",
            vec![vec![1; 3], vec![2; 3], vec![3; 3], vec![4; 1]],
            Some(10),
        );
    let observer = RecordingObserver::default();

    MirrorWalker::new(&session, &base)
        .with_options(FetchOptions { chunk_size: 4 })
        .with_observer(&observer)
        .walk("root")
        .await
        .unwrap();

    assert_eq!(observer.progress_for("ten.bin"), vec![60, 100]);
    let content = std::fs::read(base.join("ten.bin")).unwrap();
    assert_eq!(content.len(), 10);
    assert_eq!(&content[..3], &[1, 1, 1]);
}

#[tokio::test]
async fn unknown_size_still_ends_at_full_progress() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder("root", vec![RemoteEntry::file("f", "stream.bin")])
        .chunked_file("f", vec![vec![0; 4], vec![0; 4]], None);
    let observer = RecordingObserver::default();

    MirrorWalker::new(&session, &base)
        .with_options(FetchOptions { chunk_size: 4 })
        .with_observer(&observer)
        .walk("root")
        .await
        .unwrap();

    assert_eq!(observer.progress_for("stream.bin"), vec![0, 0, 100]);
}

#[tokio::test]
async fn listed_size_drives_progress_when_length_is_unknown() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder("root", vec![RemoteEntry::file("f", "sized.bin").with_size(8)])
        .chunked_file("f", vec![vec![0; 4], vec![0; 4]], None);
    let observer = RecordingObserver::default();

    MirrorWalker::new(&session, &base)
        .with_options(FetchOptions { chunk_size: 4 })
        .with_observer(&observer)
        .walk("root")
        .await
        .unwrap();

    assert_eq!(observer.progress_for("sized.bin"), vec![50, 100]);
}

#[tokio::test]
async fn fetch_reports_single_file_outcome() {
    let tmp = TempDir::new().unwrap();
    let session = MockSession::default().chunked_file("f", vec![b"abc".to_vec()], None);
    let observer = RecordingObserver::default();

    let result = tree_mirror::fetch(
        &session,
        "f",
        "one.txt",
        Some(3),
        tmp.path(),
        &FetchOptions::default(),
        &observer,
    )
    .await;

    assert_eq!(result, tree_mirror::FetchResult::Success { bytes: 3 });
    assert_eq!(observer.progress_for("one.txt"), vec![100]);
    assert_eq!(std::fs::read(tmp.path().join("one.txt")).unwrap(), b"abc");
}

#[tokio::test]
async fn short_transfer_fails_and_removes_partial_file() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    let session = MockSession::default()
        .folder("root", vec![RemoteEntry::file("f", "short.bin")])
        .chunked_file("f", vec![vec![9; 10]], Some(20));

    let summary = MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert!(summary.failures[0].reason.contains("received 10 of 20"));
    assert!(!base.join("short.bin").exists());
}

#[tokio::test]
async fn existing_file_is_truncated() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("downloads");
    std::fs::create_dir_all(&base).unwrap();
    std::fs::write(base.join("note.txt"), b"a much longer stale body").unwrap();
    let session = MockSession::default()
        .folder("root", vec![RemoteEntry::file("n", "note.txt")])
        .file("n", b"fresh");

    MirrorWalker::new(&session, &base).walk("root").await.unwrap();

    assert_eq!(std::fs::read(base.join("note.txt")).unwrap(), b"fresh");
}

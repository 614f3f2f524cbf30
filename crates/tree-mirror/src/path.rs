//! Local path construction

use std::path::{Path, PathBuf};

/// Turn a remote display name into a single, normal path component.
///
/// Separators and control characters become `_`, and names that would
/// resolve to the current or parent directory are replaced outright, so a
/// joined path can never leave the base directory.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// `target_dir/file_name`, with the file name sanitized
pub fn local_file_path(target_dir: &Path, file_name: &str) -> PathBuf {
    target_dir.join(sanitize_component(file_name))
}

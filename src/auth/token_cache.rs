//! On-disk cache for installed-app tokens

use log::warn;
use std::io::ErrorKind;
use std::path::Path;

use super::types::{AccessToken, AuthError};

/// Read the cached token. A missing or unreadable cache yields `None`.
pub async fn load(path: &Path) -> Result<Option<AccessToken>, AuthError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AuthError::TokenCache(format!("{}: {}", path.display(), e))),
    };

    match serde_json::from_str(&raw) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            warn!(
                "token_cache: ignoring malformed cache {}: {}",
                path.display(),
                e
            );
            Ok(None)
        }
    }
}

pub async fn save(path: &Path, token: &AccessToken) -> Result<(), AuthError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(token)
        .map_err(|e| AuthError::TokenCache(e.to_string()))?;
    tokio::fs::write(path, json).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    Ok(())
}

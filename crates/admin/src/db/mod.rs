//! File-backed persistence.
//!
//! # Layout (under `TRACKER_DATA_DIR`)
//!
//! - `deliveries.json` - every delivery record, rewritten wholesale on each mutation
//! - `users.json` - user accounts with argon2 password hashes
//! - `settings/<user>.json` - per-user client settings
//!
//! Files are created on first access. Writes go to a sibling temp file that
//! is then renamed over the target, so a crash mid-write leaves the previous
//! contents intact.

pub mod deliveries;
pub mod settings;
pub mod users;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use deliveries::DeliveryRepository;
pub use settings::{
    InMemorySettingsRepository, JsonFileSettingsRepository, SettingsError, SettingsRepository,
};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing file could not be read or written.
    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// Data in the file is corrupted or invalid.
    #[error("data corruption in {path}: {message}")]
    DataCorruption { path: PathBuf, message: String },

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read and decode a JSON file.
///
/// Returns `Ok(None)` when the file does not exist. An empty or
/// whitespace-only file decodes as `T::default()`.
pub(crate) async fn read_json<T>(path: &Path) -> Result<Option<T>, RepositoryError>
where
    T: DeserializeOwned + Default,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Some(T::default()));
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| RepositoryError::DataCorruption {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Encode `value` as pretty JSON and atomically replace `path`.
pub(crate) async fn write_json<T>(path: &Path, value: &T) -> Result<(), RepositoryError>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec_pretty(value).map_err(|e| RepositoryError::DataCorruption {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let value: Option<Vec<String>> = read_json(&dir.path().join("absent.json")).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/data.json");
        write_json(&path, &vec!["a".to_string()]).await.unwrap();
        let value: Option<Vec<String>> = read_json(&path).await.unwrap();
        assert_eq!(value, Some(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let result: Result<Option<Vec<String>>, _> = read_json(&path).await;
        assert!(matches!(result, Err(RepositoryError::DataCorruption { .. })));
    }

    #[tokio::test]
    async fn test_blank_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.json");
        tokio::fs::write(&path, b"\n  ").await.unwrap();
        let value: Option<Vec<String>> = read_json(&path).await.unwrap();
        assert_eq!(value, Some(vec![]));
    }
}

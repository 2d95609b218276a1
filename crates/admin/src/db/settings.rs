//! Per-user client settings storage.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use delivery_tracker_core::Email;

use super::{RepositoryError, read_json, write_json};
use crate::models::ClientSettings;

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Load and save one user's settings.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Settings for `user`, or defaults if none were saved.
    async fn load(&self, user: &Email) -> Result<ClientSettings, SettingsError>;

    /// Replace the settings for `user`.
    async fn save(&self, user: &Email, settings: &ClientSettings) -> Result<(), SettingsError>;
}

/// One JSON file per user under a settings directory.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsRepository {
    dir: PathBuf,
}

impl JsonFileSettingsRepository {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding `user`'s settings.
    #[must_use]
    pub fn path_for(&self, user: &Email) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(user)))
    }
}

#[async_trait]
impl SettingsRepository for JsonFileSettingsRepository {
    async fn load(&self, user: &Email) -> Result<ClientSettings, SettingsError> {
        Ok(read_json(&self.path_for(user)).await?.unwrap_or_default())
    }

    async fn save(&self, user: &Email, settings: &ClientSettings) -> Result<(), SettingsError> {
        write_json(&self.path_for(user), settings).await?;
        Ok(())
    }
}

/// Settings held in memory, for tests and throwaway instances.
#[derive(Debug, Default)]
pub struct InMemorySettingsRepository {
    entries: RwLock<HashMap<Email, ClientSettings>>,
}

impl InMemorySettingsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn load(&self, user: &Email) -> Result<ClientSettings, SettingsError> {
        Ok(self.entries.read().await.get(user).cloned().unwrap_or_default())
    }

    async fn save(&self, user: &Email, settings: &ClientSettings) -> Result<(), SettingsError> {
        self.entries
            .write()
            .await
            .insert(user.clone(), settings.clone());
        Ok(())
    }
}

/// Map an email to a file-name-safe stem.
///
/// ASCII alphanumerics, `.` and `-` pass through; every other byte becomes
/// `_xx` (lowercase hex), so distinct emails never share a file.
fn file_stem(email: &Email) -> String {
    let mut stem = String::with_capacity(email.as_str().len() + 8);
    for byte in email.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            let _ = write!(stem, "_{byte:02x}");
        }
    }
    stem
}

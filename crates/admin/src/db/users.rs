//! User accounts backed by a JSON file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::instrument;

use delivery_tracker_core::{Email, Role};

use super::{RepositoryError, read_json, write_json};
use crate::models::UserAccount;

/// Repository for user accounts.
#[derive(Debug)]
pub struct UserRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UserRepository {
    /// Create a repository for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all accounts. A missing file means no accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn list(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        match read_json(&self.path).await? {
            Some(users) => Ok(users),
            None => {
                tracing::warn!(path = %self.path.display(), "Users file not found, nobody can log in");
                Ok(Vec::new())
            }
        }
    }

    /// Find an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.list().await?.into_iter().find(|u| &u.email == email))
    }

    /// Insert an account or replace the one with the same email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a guest account, or an I/O
    /// error if the file cannot be written.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn upsert(&self, account: UserAccount) -> Result<(), RepositoryError> {
        if account.role == Role::Guest {
            return Err(RepositoryError::Conflict(
                "accounts must be admin or user".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut users: Vec<UserAccount> = read_json(&self.path).await?.unwrap_or_default();
        match users.iter_mut().find(|u| u.email == account.email) {
            Some(existing) => *existing = account,
            None => users.push(account),
        }
        write_json(&self.path, &users).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(email: &str, role: Role) -> UserAccount {
        UserAccount {
            email: Email::parse(email).unwrap(),
            name: "Test".to_string(),
            role,
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_has_no_users() {
        let dir = tempfile::tempdir().unwrap();
        let repo = UserRepository::new(dir.path().join("users.json"));
        assert!(repo.list().await.unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let repo = UserRepository::new(dir.path().join("users.json"));

        repo.upsert(account("ops@example.com", Role::User)).await.unwrap();
        repo.upsert(account("OPS@example.com", Role::Admin)).await.unwrap();

        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 1);

        let email = Email::parse("ops@example.com").unwrap();
        let found = repo.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_guest_accounts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = UserRepository::new(dir.path().join("users.json"));
        assert!(matches!(
            repo.upsert(account("g@example.com", Role::Guest)).await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}

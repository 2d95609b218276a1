//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! TRACKER_USER_PASSWORD=... dt-cli user create -e admin@example.com -n "Admin Name" -r admin
//!
//! # or pipe the password on stdin
//! echo "$PASSWORD" | dt-cli user create -e user@example.com -n "Driver" -r user
//! ```
//!
//! # Environment Variables
//!
//! - `TRACKER_USER_PASSWORD` - Password for the new account
//! - `TRACKER_USERS_FILE` - Users file (default `<data dir>/users.json`)

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use delivery_tracker_admin::config::AdminConfig;
use delivery_tracker_admin::db::UserRepository;
use delivery_tracker_admin::models::UserAccount;
use delivery_tracker_admin::services::AuthService;
use delivery_tracker_core::Role;

use super::CommandError;

const PASSWORD_ENV: &str = "TRACKER_USER_PASSWORD";

/// Read the new account's password from the environment, else from stdin.
///
/// # Errors
///
/// Returns `CommandError::MissingInput` if neither provides a password.
pub async fn read_password() -> Result<SecretString, CommandError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(password));
    }

    tracing::info!("{PASSWORD_ENV} not set, reading password from stdin");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CommandError::MissingInput(PASSWORD_ENV));
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Create or replace an account in the users file.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, the `guest`
/// role, or if the users file cannot be written.
pub async fn create(
    config: &AdminConfig,
    email: &str,
    name: &str,
    role: Role,
    password: &SecretString,
) -> Result<UserAccount, CommandError> {
    let users = UserRepository::new(config.users_file.clone());

    tracing::info!(path = %users.path().display(), "Saving account: {email} ({role})");
    let account = AuthService::new(&users)
        .create_user(email, name, role, password)
        .await?;

    tracing::info!("Account saved: {} ({})", account.email, account.role);
    Ok(account)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let config = AdminConfig::local(dir.path());
        let password = SecretString::from("correct-horse".to_owned());

        create(&config, "admin@example.com", "Admin", Role::Admin, &password)
            .await
            .unwrap();

        let users = UserRepository::new(config.users_file.clone());
        let account = AuthService::new(&users)
            .login("admin@example.com", &password)
            .await
            .unwrap();
        assert_eq!(account.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_guest_role_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AdminConfig::local(dir.path());
        let password = SecretString::from("correct-horse".to_owned());

        let result = create(&config, "guest@example.com", "Guest", Role::Guest, &password).await;
        assert!(matches!(result, Err(CommandError::Auth(_))));
    }
}

//! Authentication service.
//!
//! Email + password login against the users file. Passwords are stored as
//! Argon2id PHC strings.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use delivery_tracker_core::{Email, Role};

use crate::db::UserRepository;
use crate::models::UserAccount;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a UserRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a UserRepository) -> Self {
        Self { users }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong,
    /// including a malformed email.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserAccount, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let account = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.role.is_authenticated() {
            return Err(AuthError::InvalidCredentials);
        }

        verify_password(password.expose_secret(), &account.password_hash)?;

        Ok(account)
    }

    /// Create or replace an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidRole` for bad input.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: &SecretString,
    ) -> Result<UserAccount, AuthError> {
        let email = Email::parse(email)?;
        if !role.is_authenticated() {
            return Err(AuthError::InvalidRole(role.to_string()));
        }
        validate_password(password.expose_secret())?;

        let account = UserAccount {
            email,
            name: name.trim().to_string(),
            role,
            password_hash: hash_password(password.expose_secret())?,
        };
        self.users.upsert(account.clone()).await?;

        tracing::info!(email = %account.email, role = %account.role, "User account saved");
        Ok(account)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

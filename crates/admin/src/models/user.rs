//! User account records.

use serde::{Deserialize, Serialize};

use delivery_tracker_core::{Email, Role};

use super::session::CurrentUser;

/// A user account as stored in the users file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Login email, unique across the file.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Granted role (`admin` or `user`).
    pub role: Role,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl UserAccount {
    /// The identity stored in the session after login.
    #[must_use]
    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser {
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

//! Session-related types for authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use delivery_tracker_core::{Email, Role};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user. The
/// role is re-read from here on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's email address.
    pub email: Email,
    /// User's display name.
    pub name: String,
    /// User's role. Never `Guest` inside a session.
    pub role: Role,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

//! Authentication extractors and authorization checks.
//!
//! The role is read from the session on every request; handlers then call
//! [`require`] with the capability their action needs.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use delivery_tracker_core::{Capability, Role, is_allowed};

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`]: always a JSON 401.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await.ok_or(AuthRejection)?;
        set_sentry_user(user.email.as_str());
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; `None` means the caller is a guest.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .filter(|user| user.role.is_authenticated())
}

/// Role of the caller; guest when there is no session user.
#[must_use]
pub fn role_of(user: Option<&CurrentUser>) -> Role {
    user.map_or(Role::Guest, |u| u.role)
}

/// Reject with 403 unless `user` may perform `capability`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the role lacks the capability.
pub fn require(user: &CurrentUser, capability: Capability) -> Result<(), AppError> {
    if is_allowed(user.role, capability) {
        Ok(())
    } else {
        tracing::warn!(
            email = %user.email,
            role = %user.role,
            ?capability,
            "Permission denied"
        );
        Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delivery_tracker_core::Email;

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            email: Email::parse("ops@example.com").unwrap(),
            name: "Ops".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_of() {
        assert_eq!(role_of(None), Role::Guest);
        assert_eq!(role_of(Some(&user(Role::User))), Role::User);
    }

    #[test]
    fn test_require_follows_policy() {
        assert!(require(&user(Role::Admin), Capability::Backup).is_ok());
        assert!(require(&user(Role::User), Capability::ChangeStatus).is_ok());
        assert!(matches!(
            require(&user(Role::User), Capability::DeleteDelivery),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_rejection_is_401() {
        assert_eq!(AuthRejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}

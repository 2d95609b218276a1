//! Login, logout and session introspection.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use delivery_tracker_core::{Permissions, Role};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, role_of, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Who the caller is and what they may do.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<CurrentUser>,
    pub role: Role,
    pub permissions: Permissions,
}

impl MeResponse {
    fn new(user: Option<CurrentUser>) -> Self {
        let role = role_of(user.as_ref());
        Self {
            user,
            role,
            permissions: Permissions::for_role(role),
        }
    }
}

/// Verify credentials and start a session.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let password = SecretString::from(body.password);
    let account = match AuthService::new(state.users())
        .login(&body.email, &password)
        .await
    {
        Ok(account) => account,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Err(e.into());
        }
    };

    let user = account.to_current_user();
    set_current_user(&session, &user).await?;
    set_sentry_user(user.email.as_str());
    tracing::info!(email = %user.email, role = %user.role, "User logged in");

    Ok(Json(MeResponse::new(Some(user))))
}

/// End the session. Succeeds whether or not one existed.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Current user, or a guest record when there is no session.
#[instrument(skip(user))]
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse::new(user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{ADMIN_EMAIL, TestApp, USER_EMAIL};

    #[tokio::test]
    async fn test_me_without_session_is_guest() {
        let app = TestApp::new().await;
        let (status, body) = app.json("GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["user"].is_null());
        assert_eq!(body["role"], "guest");
        assert_eq!(body["permissions"]["canView"], false);
    }

    #[tokio::test]
    async fn test_login_sets_role() {
        let app = TestApp::new().await;
        let cookie = app.login(USER_EMAIL).await;
        let (_, body) = app.json("GET", "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(body["role"], "user");
        assert_eq!(body["user"]["email"], USER_EMAIL);
        assert_eq!(body["permissions"]["canChangeStatus"], true);
        assert_eq!(body["permissions"]["canEdit"], false);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let app = TestApp::new().await;
        for (email, password) in [
            (ADMIN_EMAIL, "wrong-password"),
            ("nobody@example.com", "correct-horse"),
            ("not-an-email", "correct-horse"),
        ] {
            let (status, body) = app
                .json(
                    "POST",
                    "/api/auth/login",
                    None,
                    Some(&json!({ "email": email, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let app = TestApp::new().await;
        let cookie = app.login(ADMIN_EMAIL).await;

        let (status, _) = app.json("POST", "/api/auth/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.json("GET", "/api/deliveries", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.json("POST", "/api/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}

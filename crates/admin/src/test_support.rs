//! Router harness for handler tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use delivery_tracker_core::{Delivery, DeliveryDate, DeliveryId, DeliveryStatus, Email, Role};

use crate::config::AdminConfig;
use crate::db::{InMemorySettingsRepository, JsonFileSettingsRepository};
use crate::models::UserAccount;
use crate::services::auth::hash_password;
use crate::state::AppState;

pub const PASSWORD: &str = "correct-horse";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";

pub struct TestApp {
    pub state: AppState,
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    /// App over a temp dir with one admin and one user account.
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let state = AppState::with_settings(
            AdminConfig::local(dir.path()),
            Arc::new(InMemorySettingsRepository::new()),
        );
        Self::build(state, dir).await
    }

    /// Like `new`, but settings are the per-user JSON files under the temp dir.
    pub async fn with_file_settings() -> Self {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(AdminConfig::local(dir.path()));
        Self::build(state, dir).await
    }

    async fn build(state: AppState, dir: TempDir) -> Self {
        let hash = hash_password(PASSWORD).unwrap();
        for (email, name, role) in [
            (ADMIN_EMAIL, "Admin", Role::Admin),
            (USER_EMAIL, "Driver", Role::User),
        ] {
            state
                .users()
                .upsert(UserAccount {
                    email: Email::parse(email).unwrap(),
                    name: name.to_string(),
                    role,
                    password_hash: hash.clone(),
                })
                .await
                .unwrap();
        }

        let router = crate::app(state.clone());
        Self {
            state,
            router,
            _dir: dir,
        }
    }

    /// Overwrite a user's settings file with invalid JSON.
    pub async fn corrupt_settings(&self, email: &str) {
        let dir = self.state.config().settings_dir();
        let path = JsonFileSettingsRepository::new(dir.clone())
            .path_for(&Email::parse(email).unwrap());
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(path, "{broken").await.unwrap();
    }

    /// Replace the store with the given records.
    pub async fn seed(&self, deliveries: &[Delivery]) {
        self.state.deliveries().replace_all(deliveries).await.unwrap();
    }

    /// Log in and return the session cookie.
    pub async fn login(&self, email: &str) -> String {
        let body = serde_json::json!({ "email": email, "password": PASSWORD });
        let response = self
            .send(json_request("POST", "/api/auth/login", None, &body))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and decode the JSON body (`Null` when empty).
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => json_request(method, uri, cookie, body),
            None => empty_request(method, uri, cookie),
        };
        let response = self.send(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delivery(id: &str, name: &str, status: DeliveryStatus, date: &str) -> Delivery {
    Delivery {
        id: DeliveryId::new(id),
        name: name.to_string(),
        address: "東京都千代田区1-1".to_string(),
        status,
        delivery_date: DeliveryDate::parse(date).unwrap(),
    }
}

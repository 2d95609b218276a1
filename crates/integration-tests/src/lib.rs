//! End-to-end tests for the delivery tracker.
//!
//! Each test starts the real router on an ephemeral port over a temporary data
//! directory and drives it with a cookie-carrying `reqwest` client, so the
//! session layer, request ids and JSON encoding are all exercised as deployed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p delivery-tracker-integration-tests
//! ```

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use delivery_tracker_admin::config::AdminConfig;
use delivery_tracker_admin::db::InMemorySettingsRepository;
use delivery_tracker_admin::models::UserAccount;
use delivery_tracker_admin::services::auth::hash_password;
use delivery_tracker_admin::state::AppState;
use delivery_tracker_core::{
    Delivery, DeliveryDate, DeliveryId, DeliveryStatus, Email, NewDelivery, Role,
};

pub const PASSWORD: &str = "correct-horse";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";

/// A running server over its own data directory.
pub struct TestServer {
    pub state: AppState,
    base_url: String,
    handle: JoinHandle<()>,
    _dir: TempDir,
}

impl TestServer {
    /// Start a server with one admin and one user account.
    pub async fn start() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let state = AppState::with_settings(
            AdminConfig::local(dir.path()),
            Arc::new(InMemorySettingsRepository::new()),
        );

        let hash = hash_password(PASSWORD).expect("hash");
        for (email, name, role) in [
            (ADMIN_EMAIL, "Admin", Role::Admin),
            (USER_EMAIL, "Driver", Role::User),
        ] {
            state
                .users()
                .upsert(UserAccount {
                    email: Email::parse(email).expect("email"),
                    name: name.to_owned(),
                    role,
                    password_hash: hash.clone(),
                })
                .await
                .expect("seed account");
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let app = delivery_tracker_admin::app(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
            handle,
            _dir: dir,
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client with its own cookie jar and no session.
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("client")
    }

    /// A client already logged in as `email`.
    pub async fn login(&self, email: &str) -> Client {
        let client = Self::client();
        let response = client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert_eq!(response.status(), StatusCode::OK);
        client
    }

    /// Create deliveries through the API as the admin. Returns the created records.
    pub async fn seed(&self, deliveries: &[NewDelivery]) -> Vec<Value> {
        let admin = self.login(ADMIN_EMAIL).await;
        let mut created = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let response = admin
                .post(self.url("/api/deliveries"))
                .json(delivery)
                .send()
                .await
                .expect("create request");
            assert_eq!(response.status(), StatusCode::CREATED);
            created.push(response.json().await.expect("created body"));
        }
        created
    }

    /// Replace the store directly with records whose ids are fixed.
    pub async fn store(&self, deliveries: &[Delivery]) {
        self.state
            .deliveries()
            .replace_all(deliveries)
            .await
            .expect("replace store");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Shorthand for a creation payload.
pub fn new_delivery(name: &str, status: &str, date: &str) -> NewDelivery {
    serde_json::from_value(json!({
        "name": name,
        "address": "東京都千代田区1-1",
        "status": status,
        "deliveryDate": date,
    }))
    .expect("valid delivery")
}

/// A stored record with a fixed id.
pub fn delivery(id: &str, name: &str, status: DeliveryStatus, date: &str) -> Delivery {
    Delivery {
        id: DeliveryId::new(id),
        name: name.to_owned(),
        address: "東京都千代田区1-1".to_owned(),
        status,
        delivery_date: DeliveryDate::parse(date).expect("valid date"),
    }
}

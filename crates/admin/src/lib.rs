//! Delivery Tracker dashboard library.
//!
//! The HTTP service lives here so the binary, the CLI and the integration
//! tests all drive the same router and stores.
//!
//! # Layout
//!
//! - [`config`] - Environment configuration
//! - [`db`] - JSON-file stores for deliveries, users and client settings
//! - [`services`] - Filtering, import/export, analytics, backup, notifications, auth
//! - [`components`] - Table and virtual-list view models
//! - [`routes`] - axum handlers
//! - [`middleware`] - Sessions, request IDs and auth extractors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::Router;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Build the application router with sessions and request IDs.
///
/// Tracing and Sentry layers are added by the binary around this.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

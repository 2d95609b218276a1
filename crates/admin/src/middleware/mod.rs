//! HTTP middleware for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (the `http_request` span)
//! 3. Request ID (recorded into that span)
//! 4. Session layer (tower-sessions, in-memory store)
//!
//! Authentication is not a layer: handlers take [`RequireAuth`] or
//! [`OptionalAuth`] and check capabilities with [`auth::require`].

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, require, role_of, set_current_user};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::create_session_layer;

//! Business logic services.
//!
//! # Services
//!
//! - `analytics` - Chart aggregates over a reporting period
//! - `auth` - Email + password login with Argon2
//! - `backup` - Backup documents and restore validation
//! - `export` - CSV / Excel / JSON encoding and CSV import
//! - `filter` - Quick and advanced filters
//! - `notifications` - Deadline alerts and status-change events

pub mod analytics;
pub mod auth;
pub mod backup;
pub mod export;
pub mod filter;
pub mod notifications;

pub use auth::{AuthError, AuthService};
pub use export::ExportError;

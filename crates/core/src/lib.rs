//! Delivery Tracker Core - Shared types library.
//!
//! This crate provides the types used across all Delivery Tracker components:
//! - `admin` - HTTP service for the delivery dashboard
//! - `cli` - Command-line tools for user management and data seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no file
//! access, no HTTP. This keeps it lightweight and lets the same authorization
//! policy gate both the UI permission table and the route handlers.
//!
//! # Modules
//!
//! - [`types`] - Deliveries, validated dates, statuses, roles and emails
//! - [`permissions`] - Role to capability policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod permissions;
pub mod types;

pub use permissions::{Capability, Permissions, can_update, is_allowed};
pub use types::*;

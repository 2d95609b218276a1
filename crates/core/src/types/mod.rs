//! Core types for Delivery Tracker.
//!
//! This module provides type-safe wrappers for the delivery domain.

pub mod date;
pub mod delivery;
pub mod email;
pub mod id;
pub mod status;

pub use date::{DateError, DeliveryDate};
pub use delivery::{Delivery, DeliveryError, DeliveryPatch, NewDelivery};
pub use email::{Email, EmailError};
pub use id::DeliveryId;
pub use status::{DeliveryStatus, Role, StatusError};

//! Domain models for the dashboard service.
//!
//! Values persisted to disk or stored in the session. Delivery records
//! themselves live in `delivery_tracker_core`.

pub mod filter;
pub mod session;
pub mod settings;
pub mod user;

pub use filter::{AdvancedFilters, DateRange, QuickFilter};
pub use session::{CurrentUser, keys as session_keys};
pub use settings::{ClientSettings, FilterPreset, NotificationSettings, Theme};
pub use user::UserAccount;

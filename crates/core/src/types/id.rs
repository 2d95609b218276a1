//! Delivery identifiers.
//!
//! Identifiers are opaque strings. Server-generated ones have the form
//! `DEL<unix-millis>`, but imported and restored records may carry any
//! non-blank value, so nothing beyond non-blankness is assumed when reading.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of server-generated delivery identifiers.
pub const DELIVERY_ID_PREFIX: &str = "DEL";

/// Opaque, unique identifier of a delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(String);

impl DeliveryId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the identifier for a record created at `unix_millis`.
    ///
    /// ```
    /// use delivery_tracker_core::DeliveryId;
    ///
    /// assert_eq!(DeliveryId::from_timestamp(1_708_387_200_000).as_str(), "DEL1708387200000");
    /// ```
    #[must_use]
    pub fn from_timestamp(unix_millis: i64) -> Self {
        Self(format!("{DELIVERY_ID_PREFIX}{unix_millis}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consumes the id and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeliveryId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for DeliveryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DeliveryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! The delivery record and its create/update payloads.

use serde::{Deserialize, Serialize};

use super::{DeliveryDate, DeliveryId, DeliveryStatus};

/// Errors raised when a payload breaks the delivery invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("name must not be blank")]
    BlankName,
    #[error("address must not be blank")]
    BlankAddress,
}

/// A tracked delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Unique identifier.
    pub id: DeliveryId,
    /// Recipient or destination name.
    pub name: String,
    /// Free-text address.
    pub address: String,
    /// Current status.
    pub status: DeliveryStatus,
    /// Scheduled date.
    pub delivery_date: DeliveryDate,
}

impl Delivery {
    /// Create a record from a validated payload.
    #[must_use]
    pub fn from_new(id: DeliveryId, new: NewDelivery) -> Self {
        Self {
            id,
            name: new.name,
            address: new.address,
            status: new.status,
            delivery_date: new.delivery_date,
        }
    }

    /// Apply every field present in `patch`. The id never changes.
    pub fn apply(&mut self, patch: DeliveryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = patch.delivery_date {
            self.delivery_date = date;
        }
    }

    /// Strip the id, e.g. for CSV export.
    #[must_use]
    pub fn to_new(&self) -> NewDelivery {
        NewDelivery {
            name: self.name.clone(),
            address: self.address.clone(),
            status: self.status,
            delivery_date: self.delivery_date.clone(),
        }
    }
}

/// Payload for creating a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub status: DeliveryStatus,
    pub delivery_date: DeliveryDate,
}

impl NewDelivery {
    /// Check the text fields. Status and date are valid by construction.
    ///
    /// # Errors
    ///
    /// Returns the first blank field found.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.name.trim().is_empty() {
            return Err(DeliveryError::BlankName);
        }
        if self.address.trim().is_empty() {
            return Err(DeliveryError::BlankAddress);
        }
        Ok(())
    }
}

/// Partial update payload. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeliveryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<DeliveryDate>,
}

impl DeliveryPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status_only(status: DeliveryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Check that present text fields are not blank.
    ///
    /// # Errors
    ///
    /// Returns the first blank field found.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DeliveryError::BlankName);
        }
        if self.address.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err(DeliveryError::BlankAddress);
        }
        Ok(())
    }
}

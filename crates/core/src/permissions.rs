//! Role-based authorization policy.
//!
//! [`is_allowed`] is the only place that decides what a role may do. The
//! permission record served to the UI ([`Permissions::for_role`]) and every
//! route handler both call it, so the two gates cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// An action a caller may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewDeliveries,
    CreateDelivery,
    EditDelivery,
    DeleteDelivery,
    ChangeStatus,
    ImportData,
    ExportData,
    Print,
    ViewAnalytics,
    Backup,
    BulkDelete,
    BulkStatusChange,
    DragDrop,
    SelectAll,
}

impl Capability {
    /// Every capability, in the order the permission record lists them.
    pub const ALL: [Self; 14] = [
        Self::ViewDeliveries,
        Self::CreateDelivery,
        Self::EditDelivery,
        Self::DeleteDelivery,
        Self::ChangeStatus,
        Self::ImportData,
        Self::ExportData,
        Self::Print,
        Self::ViewAnalytics,
        Self::Backup,
        Self::BulkDelete,
        Self::BulkStatusChange,
        Self::DragDrop,
        Self::SelectAll,
    ];
}

/// Whether `role` may perform `capability`.
#[must_use]
pub const fn is_allowed(role: Role, capability: Capability) -> bool {
    match role {
        Role::Admin => true,
        Role::User => matches!(
            capability,
            Capability::ViewDeliveries
                | Capability::ExportData
                | Capability::Print
                | Capability::ViewAnalytics
                | Capability::ChangeStatus
        ),
        Role::Guest => false,
    }
}

/// Whether `role` may submit an update to a single delivery.
///
/// A body whose only key is `status` needs [`Capability::ChangeStatus`];
/// any other field set needs [`Capability::EditDelivery`].
#[must_use]
pub const fn can_update(role: Role, status_only: bool) -> bool {
    if status_only {
        is_allowed(role, Capability::ChangeStatus)
    } else {
        is_allowed(role, Capability::EditDelivery)
    }
}

/// Permission record consumed by the UI to show or hide controls.
// Allow: one independent flag per UI affordance.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_change_status: bool,
    pub can_import: bool,
    pub can_export: bool,
    pub can_print: bool,
    pub can_view_analytics: bool,
    pub can_backup: bool,
    pub can_bulk_delete: bool,
    pub can_bulk_status_change: bool,
    pub can_drag_drop: bool,
    pub can_select_all: bool,
}

impl Permissions {
    /// Derive the record for a role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        Self {
            can_view: is_allowed(role, Capability::ViewDeliveries),
            can_create: is_allowed(role, Capability::CreateDelivery),
            can_edit: is_allowed(role, Capability::EditDelivery),
            can_delete: is_allowed(role, Capability::DeleteDelivery),
            can_change_status: is_allowed(role, Capability::ChangeStatus),
            can_import: is_allowed(role, Capability::ImportData),
            can_export: is_allowed(role, Capability::ExportData),
            can_print: is_allowed(role, Capability::Print),
            can_view_analytics: is_allowed(role, Capability::ViewAnalytics),
            can_backup: is_allowed(role, Capability::Backup),
            can_bulk_delete: is_allowed(role, Capability::BulkDelete),
            can_bulk_status_change: is_allowed(role, Capability::BulkStatusChange),
            can_drag_drop: is_allowed(role, Capability::DragDrop),
            can_select_all: is_allowed(role, Capability::SelectAll),
        }
    }

    /// Look up the flag for one capability.
    #[must_use]
    pub const fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewDeliveries => self.can_view,
            Capability::CreateDelivery => self.can_create,
            Capability::EditDelivery => self.can_edit,
            Capability::DeleteDelivery => self.can_delete,
            Capability::ChangeStatus => self.can_change_status,
            Capability::ImportData => self.can_import,
            Capability::ExportData => self.can_export,
            Capability::Print => self.can_print,
            Capability::ViewAnalytics => self.can_view_analytics,
            Capability::Backup => self.can_backup,
            Capability::BulkDelete => self.can_bulk_delete,
            Capability::BulkStatusChange => self.can_bulk_status_change,
            Capability::DragDrop => self.can_drag_drop,
            Capability::SelectAll => self.can_select_all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        let perms = Permissions::for_role(Role::Admin);
        assert!(Capability::ALL.iter().all(|c| perms.allows(*c)));
    }

    #[test]
    fn test_guest_has_nothing() {
        let perms = Permissions::for_role(Role::from_optional(None));
        assert!(Capability::ALL.iter().all(|c| !perms.allows(*c)));
    }

    #[test]
    fn test_user_capabilities() {
        let perms = Permissions::for_role(Role::User);

        for denied in [
            Capability::CreateDelivery,
            Capability::EditDelivery,
            Capability::DeleteDelivery,
            Capability::ImportData,
            Capability::Backup,
            Capability::BulkDelete,
            Capability::BulkStatusChange,
            Capability::DragDrop,
            Capability::SelectAll,
        ] {
            assert!(!perms.allows(denied), "{denied:?} should be denied");
        }

        for allowed in [
            Capability::ViewDeliveries,
            Capability::Print,
            Capability::ExportData,
            Capability::ViewAnalytics,
            Capability::ChangeStatus,
        ] {
            assert!(perms.allows(allowed), "{allowed:?} should be allowed");
        }
    }

    #[test]
    fn test_record_never_disagrees_with_policy() {
        for role in [Role::Admin, Role::User, Role::Guest] {
            let perms = Permissions::for_role(role);
            for capability in Capability::ALL {
                assert_eq!(perms.allows(capability), is_allowed(role, capability));
            }
        }
    }

    #[test]
    fn test_update_asymmetry() {
        assert!(can_update(Role::User, true));
        assert!(!can_update(Role::User, false));
        assert!(can_update(Role::Admin, false));
        assert!(!can_update(Role::Guest, true));
    }

    #[test]
    fn test_permissions_json_shape() {
        let json = serde_json::to_value(Permissions::for_role(Role::User)).unwrap_or_default();
        assert_eq!(json["canChangeStatus"], true);
        assert_eq!(json["canBulkDelete"], false);
    }
}

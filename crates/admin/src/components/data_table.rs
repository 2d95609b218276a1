//! Delivery table description served to the UI.
//!
//! The browser renders the table; this module decides which columns,
//! filters and bulk actions exist and which of them the caller may use.

use serde::Serialize;

use delivery_tracker_core::{Capability, DeliveryStatus, Permissions};

use super::virtual_list::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT};
use crate::models::QuickFilter;

/// Column definition for a data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// Field of the delivery record shown in this column.
    pub key: &'static str,
    /// Header label.
    pub label: &'static str,
    pub sortable: bool,
    pub default_visible: bool,
}

impl TableColumn {
    /// A sortable, visible column.
    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
            default_visible: true,
        }
    }

    /// A plain, visible column.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
            default_visible: true,
        }
    }

    /// Set whether the column is visible by default.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }
}

/// Kind of input a filter renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Text,
    MultiSelect,
    DateRange,
}

/// Option for multi-select filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Filter definition. `key` is the `AdvancedFilters` field it fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFilter {
    pub key: &'static str,
    pub label: &'static str,
    pub filter_type: FilterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    #[must_use]
    pub const fn text(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Text,
            placeholder: Some(placeholder),
            options: Vec::new(),
        }
    }

    #[must_use]
    pub const fn multi_select(
        key: &'static str,
        label: &'static str,
        options: Vec<FilterOption>,
    ) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::MultiSelect,
            placeholder: None,
            options,
        }
    }

    #[must_use]
    pub const fn date_range(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::DateRange,
            placeholder: None,
            options: Vec::new(),
        }
    }
}

/// Bulk action offered on selected rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAction {
    /// Value sent as `action` to `POST /api/deliveries/bulk`.
    pub key: &'static str,
    pub label: &'static str,
    /// Target status for status actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    pub destructive: bool,
    #[serde(skip)]
    pub requires: Capability,
}

impl BulkAction {
    /// Move selected rows to `status`.
    #[must_use]
    pub const fn set_status(status: DeliveryStatus) -> Self {
        Self {
            key: "status",
            label: status.label(),
            status: Some(status),
            destructive: false,
            requires: Capability::BulkStatusChange,
        }
    }

    /// Delete selected rows.
    #[must_use]
    pub const fn delete() -> Self {
        Self {
            key: "delete",
            label: "削除",
            status: None,
            destructive: true,
            requires: Capability::BulkDelete,
        }
    }
}

/// Quick filter button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickFilterButton {
    pub key: QuickFilter,
    pub label: &'static str,
}

/// Everything the UI needs to draw the delivery table for one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableConfig {
    pub table_id: &'static str,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub quick_filters: Vec<QuickFilterButton>,
    pub bulk_actions: Vec<BulkAction>,
    pub search_placeholder: &'static str,
    pub empty_title: &'static str,
    /// Rows may be selected one at a time.
    pub selectable: bool,
    /// The select-all checkbox is shown.
    pub select_all: bool,
    /// Rows may be dragged between status lanes.
    pub draggable: bool,
    /// Row height for the virtualized body, in pixels.
    pub row_height: u32,
    /// Extra rows rendered above and below the viewport.
    pub overscan: usize,
}

impl DataTableConfig {
    /// Keep only what `permissions` allows.
    #[must_use]
    pub fn restricted_to(mut self, permissions: &Permissions) -> Self {
        self.bulk_actions.retain(|a| permissions.allows(a.requires));
        self.selectable = !self.bulk_actions.is_empty();
        self.select_all = self.selectable && permissions.allows(Capability::SelectAll);
        self.draggable = permissions.allows(Capability::DragDrop);
        self
    }

    /// Keys of the columns shown by default.
    #[must_use]
    pub fn default_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.default_visible)
            .map(|c| c.key)
            .collect()
    }
}

const fn quick_filter_label(filter: QuickFilter) -> &'static str {
    match filter {
        QuickFilter::Today => "今日",
        QuickFilter::Tomorrow => "明日",
        QuickFilter::ThisWeek => "今週",
        QuickFilter::Overdue => "期限切れ",
        QuickFilter::InTransitOnly => "配送中のみ",
        QuickFilter::CompletedToday => "本日完了",
    }
}

/// The delivery table, before permissions are applied.
#[must_use]
pub fn deliveries_table_config() -> DataTableConfig {
    let status_options = DeliveryStatus::ALL
        .into_iter()
        .map(|s| FilterOption {
            value: s.as_str(),
            label: s.label(),
        })
        .collect();

    let mut bulk_actions: Vec<BulkAction> = DeliveryStatus::ALL
        .into_iter()
        .map(BulkAction::set_status)
        .collect();
    bulk_actions.push(BulkAction::delete());

    DataTableConfig {
        table_id: "deliveries",
        columns: vec![
            TableColumn::new("id", "ID").visible(false),
            TableColumn::sortable("name", "名前"),
            TableColumn::sortable("address", "住所"),
            TableColumn::sortable("status", "ステータス"),
            TableColumn::sortable("deliveryDate", "配送日"),
        ],
        filters: vec![
            TableFilter::multi_select("statuses", "ステータス", status_options),
            TableFilter::date_range("dateRange", "配送日"),
            TableFilter::text("addressKeyword", "住所", "住所で検索..."),
            TableFilter::text("nameKeyword", "名前", "名前で検索..."),
        ],
        quick_filters: QuickFilter::ALL
            .into_iter()
            .map(|key| QuickFilterButton {
                key,
                label: quick_filter_label(key),
            })
            .collect(),
        bulk_actions,
        search_placeholder: "名前・住所で検索...",
        empty_title: "配送データがありません",
        selectable: true,
        select_all: true,
        draggable: true,
        row_height: DEFAULT_ROW_HEIGHT,
        overscan: DEFAULT_OVERSCAN,
    }
}

/// The delivery table as `permissions` may use it.
#[must_use]
pub fn deliveries_table_for(permissions: &Permissions) -> DataTableConfig {
    deliveries_table_config().restricted_to(permissions)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delivery_tracker_core::Role;

    use super::*;

    #[test]
    fn test_admin_gets_every_action() {
        let config = deliveries_table_for(&Permissions::for_role(Role::Admin));
        assert_eq!(config.bulk_actions.len(), 4);
        assert!(config.select_all);
        assert!(config.draggable);
    }

    #[test]
    fn test_user_gets_no_bulk_actions() {
        let config = deliveries_table_for(&Permissions::for_role(Role::User));
        assert!(config.bulk_actions.is_empty());
        assert!(!config.selectable);
        assert!(!config.select_all);
        assert!(!config.draggable);
        assert_eq!(config.columns.len(), 5);
    }

    #[test]
    fn test_default_columns_hide_id() {
        let config = deliveries_table_config();
        assert_eq!(
            config.default_columns(),
            vec!["name", "address", "status", "deliveryDate"]
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(deliveries_table_config()).unwrap();
        assert_eq!(json["tableId"], "deliveries");
        assert_eq!(json["quickFilters"][3]["key"], "overdue");
        assert_eq!(json["bulkActions"][1]["status"], "in_transit");
        assert!(json["bulkActions"][0].get("requires").is_none());
        assert_eq!(json["rowHeight"], 56);
    }
}

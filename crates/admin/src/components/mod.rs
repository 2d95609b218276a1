//! View-model components consumed by the browser UI.

pub mod data_table;
pub mod virtual_list;

pub use data_table::{DataTableConfig, deliveries_table_config, deliveries_table_for};
pub use virtual_list::{VirtualList, VirtualListError, VisibleRange};

//! Fixed-height list windowing.
//!
//! Given the scroll position of a fixed-height viewport, work out which rows
//! must be rendered and where the first one sits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: u32 = 56;

/// Default rows rendered beyond each edge of the viewport.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Errors constructing a [`VirtualList`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VirtualListError {
    #[error("row height must be greater than zero")]
    ZeroRowHeight,
}

/// Rows to render for one scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRange {
    /// First row to render.
    pub start: usize,
    /// One past the last row to render.
    pub end: usize,
    /// Pixel offset of row `start` from the top of the list.
    pub offset_top: u64,
    /// Height of the whole list in pixels.
    pub total_height: u64,
}

impl VisibleRange {
    /// Number of rows in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A list of `item_count` rows, each `row_height` pixels tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualList {
    item_count: usize,
    row_height: u32,
    overscan: usize,
}

impl VirtualList {
    /// Create a list with the default overscan.
    ///
    /// # Errors
    ///
    /// Returns `VirtualListError::ZeroRowHeight` if `row_height` is zero.
    pub const fn new(item_count: usize, row_height: u32) -> Result<Self, VirtualListError> {
        if row_height == 0 {
            return Err(VirtualListError::ZeroRowHeight);
        }
        Ok(Self {
            item_count,
            row_height,
            overscan: DEFAULT_OVERSCAN,
        })
    }

    /// Set how many extra rows to render on each side.
    #[must_use]
    pub const fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    #[must_use]
    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    #[must_use]
    pub const fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Height of the whole list in pixels.
    #[must_use]
    pub fn total_height(&self) -> u64 {
        self.rows_to_px(self.item_count)
    }

    /// Rows to render when the viewport is scrolled to `scroll_offset`.
    ///
    /// The result always satisfies `start <= end <= item_count`. Offsets past
    /// the end yield the overscanned tail of the list.
    #[must_use]
    pub fn window(&self, scroll_offset: u64, viewport_height: u64) -> VisibleRange {
        let row_height = u64::from(self.row_height);
        let first_visible = self.clamp_rows(scroll_offset / row_height);
        let bottom = scroll_offset.saturating_add(viewport_height);
        let last_visible = self.clamp_rows(bottom.div_ceil(row_height));

        let start = first_visible
            .saturating_sub(self.overscan)
            .min(self.item_count);
        let end = last_visible
            .saturating_add(self.overscan)
            .min(self.item_count)
            .max(start);

        VisibleRange {
            start,
            end,
            offset_top: self.rows_to_px(start),
            total_height: self.total_height(),
        }
    }

    fn rows_to_px(&self, rows: usize) -> u64 {
        u64::try_from(rows)
            .unwrap_or(u64::MAX)
            .saturating_mul(u64::from(self.row_height))
    }

    fn clamp_rows(&self, rows: u64) -> usize {
        usize::try_from(rows).unwrap_or(usize::MAX).min(self.item_count)
    }
}

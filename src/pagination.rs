//! Page arithmetic for the route list
//!
//! Everything here is a pure function of the filtered length, the page size
//! and the requested page.

use std::ops::{Range, RangeInclusive};

/// Maximum number of page links shown at once
pub const MAX_VISIBLE_PAGES: usize = 5;

/// A resolved page of a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number, clamped into `1..=total_pages`
    pub current: usize,
    /// Never less than 1, even for an empty list
    pub total_pages: usize,
    pub page_size: usize,
    /// Length of the filtered list
    pub total_items: usize,
}

impl Page {
    /// Resolves `requested` against a list of `total_items`
    pub fn compute(total_items: usize, page_size: usize, requested: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_items, page_size);
        Self {
            current: requested.clamp(1, total_pages),
            total_pages,
            page_size,
            total_items,
        }
    }

    /// Index range of the items on this page
    pub fn range(&self) -> Range<usize> {
        let start = ((self.current - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    /// Whether `page` is a valid page number
    pub fn contains(&self, page: usize) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }

    /// Page numbers to show, at most [`MAX_VISIBLE_PAGES`], centred on the current page
    pub fn window(&self) -> RangeInclusive<usize> {
        let mut start = self
            .current
            .saturating_sub(MAX_VISIBLE_PAGES / 2)
            .max(1);
        let end = (start + MAX_VISIBLE_PAGES - 1).min(self.total_pages);
        if end + 1 - start < MAX_VISIBLE_PAGES {
            start = (end + 1).saturating_sub(MAX_VISIBLE_PAGES).max(1);
        }
        start..=end
    }
}

/// `ceil(total_items / page_size)`, with an empty list still having one page
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

//! Page windows for directory listings.

use serde::Serialize;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page of `page_size` rows.
///
/// Always holds clamped values: `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the totals needed to navigate the rest.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub items: Vec<T>,
    pub page: u64,
    pub total_items: u64,
    /// At least 1, even when there are no items.
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T: Serialize> PageResponse<T> {
    /// Wrap the rows of `request` out of `total_items` overall.
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.page_size).max(1);
        Self {
            items,
            page: request.page,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }
}

//! Page-number pagination.

use serde::{Deserialize, Serialize};

/// Errors from building a [`PageRequest`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Pages are numbered from 1.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// Page size outside `1..=MAX_PAGE_SIZE`.
    #[error("page_size must be between 1 and {max}")]
    PageSizeOutOfRange {
        /// Largest accepted page size.
        max: u32,
    },
}

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Largest page size a caller may ask for.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Build a request for 1-based `page`.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is 0 or `page_size` is outside `1..=100`.
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PageError> {
        if page == 0 {
            return Err(PageError::PageOutOfRange);
        }
        if page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(PageError::PageSizeOutOfRange {
                max: Self::MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Rows on this page.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Pagination metadata returned with every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PageInfo {
    /// Compute metadata for `request` over `total_count` rows.
    #[must_use]
    pub const fn new(request: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(request.page_size as u64);
        Self {
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages,
            has_more: (request.page as u64) < total_pages,
        }
    }
}

/// One page of items plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, info: PageInfo) -> Self {
        Self { items, info }
    }

    /// Transform the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_one_items_in_pages_of_nine() {
        let last = PageRequest::new(3, 9).unwrap();
        let info = PageInfo::new(last, 21);
        assert_eq!(info.total_pages, 3);
        assert!(!info.has_more);
        assert_eq!(last.offset(), 18);

        let first = PageInfo::new(PageRequest::new(1, 9).unwrap(), 21);
        assert!(first.has_more);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let info = PageInfo::new(PageRequest::new(1, 9).unwrap(), 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_more);
    }

    #[test]
    fn test_exact_multiple() {
        let info = PageInfo::new(PageRequest::new(2, 10).unwrap(), 20);
        assert_eq!(info.total_pages, 2);
        assert!(!info.has_more);
    }

    #[test]
    fn test_rejects_bad_requests() {
        assert_eq!(PageRequest::new(0, 9), Err(PageError::PageOutOfRange));
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(PageError::PageSizeOutOfRange { .. })
        ));
        assert!(PageRequest::new(1, 101).is_err());
        assert!(PageRequest::new(1, 100).is_ok());
    }
}

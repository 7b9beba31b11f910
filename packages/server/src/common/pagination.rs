//! Page/size offset pagination.
//!
//! List endpoints take `(page, size)` query parameters and return one page
//! plus a "more entries available" flag carried out-of-band in the
//! `X-Has-More-Entries` response header.
//!
//! # Usage
//!
//! ```rust,ignore
//! let page = PageQuery { page: Some(0), size: Some(20) }.validate();
//! let (items, has_more) = paginate(filtered_candidates, &page);
//! ```

use serde::Deserialize;

/// Default page size when the client does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw pagination query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Zero-based page index.
    pub page: Option<u32>,
    /// Page size (1-100, default 20).
    pub size: Option<u32>,
}

impl PageQuery {
    /// Apply defaults and bounds.
    pub fn validate(&self) -> ValidatedPage {
        ValidatedPage {
            page: self.page.unwrap_or(0),
            size: self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Validated and normalized pagination parameters.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPage {
    pub page: u32,
    pub size: u32,
}

impl ValidatedPage {
    pub fn new(page: u32, size: u32) -> Self {
        PageQuery {
            page: Some(page),
            size: Some(size),
        }
        .validate()
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> usize {
        (self.page as usize) * (self.size as usize)
    }
}

/// Slice one page out of an already-filtered, already-ordered candidate list.
///
/// Filtering must happen before this call so that the page boundaries and the
/// `has_more` flag are consistent with the filtered set. `has_more` is true
/// iff at least one candidate exists beyond the returned page.
pub fn paginate<T>(items: Vec<T>, page: &ValidatedPage) -> (Vec<T>, bool) {
    let offset = page.offset();
    let size = page.size as usize;
    let has_more = items.len() > offset + size;
    let page_items = items.into_iter().skip(offset).take(size).collect();
    (page_items, has_more)
}

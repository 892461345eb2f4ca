//! Pagination
//!
//! Page numbers are 1-based and rows-per-page is clamped to an enforced
//! range; the row offset is always computed here, never trusted from the
//! client. Pages past the end of the result set are valid and simply
//! come back empty.

use crate::core::error::Error;
use serde::Serialize;

/// Default rows per page when the caller does not specify one.
pub const DEFAULT_ROWS_PER_PAGE: u32 = 20;

/// Upper bound on rows per page.
pub const MAX_ROWS_PER_PAGE: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    rows_per_page: u32,
}

impl Page {
    /// Build a page request, enforcing `number >= 1` and
    /// `1 <= rows_per_page <= MAX_ROWS_PER_PAGE`.
    pub fn new(number: u32, rows_per_page: u32) -> Result<Self, Error> {
        if number < 1 {
            return Err(Error::failed_precondition(
                "page",
                "page number must be 1 or greater",
            ));
        }
        if rows_per_page < 1 || rows_per_page > MAX_ROWS_PER_PAGE {
            return Err(Error::failed_precondition(
                "rows",
                format!("rows per page must be between 1 and {MAX_ROWS_PER_PAGE}"),
            ));
        }
        Ok(Self {
            number,
            rows_per_page,
        })
    }

    /// Parse raw query-string style values, applying defaults for absent
    /// ones (page 1, [`DEFAULT_ROWS_PER_PAGE`] rows).
    pub fn parse(page: Option<&str>, rows: Option<&str>) -> Result<Self, Error> {
        let number = match page.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|err| Error::failed_precondition("page", err))?,
            None => 1,
        };
        let rows_per_page = match rows.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|err| Error::failed_precondition("rows", err))?,
            None => DEFAULT_ROWS_PER_PAGE,
        };
        Self::new(number, rows_per_page)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }

    /// Row offset: `(number - 1) * rows_per_page`.
    pub fn offset(&self) -> i64 {
        (self.number as i64 - 1) * self.rows_per_page as i64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

/// One page of results plus pagination metadata, as exposed to the
/// API layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub rows_per_page: u32,
}

impl<T> PageDocument<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.number(),
            rows_per_page: page.rows_per_page(),
        }
    }
}

//! Page request and page result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Filter key to value. An absent key means "no constraint".
pub type FilterMap = BTreeMap<String, String>;

/// Ordering direction for sorted list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Value sent as the `sortOrder` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// Snapshot of what a list view is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page_number: u32,
    pub page_size: u32,
    pub filters: FilterMap,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl PageRequest {
    pub fn new(page_size: u32, sort_field: impl Into<String>, sort_direction: SortDirection) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.max(1),
            filters: FilterMap::new(),
            sort_field: sort_field.into(),
            sort_direction,
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = page_number.max(1);
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Number of records skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// `ceil(total_items / page_size)`, zero when the page size is zero.
pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One settled page of a remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PageResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_pages: 0,
        }
    }

    /// Build a result that satisfies the page invariants regardless of what
    /// the server reported: items are capped at `page_size`, the total is
    /// never below the number of items seen, and the page count is derived
    /// from the total.
    pub fn normalize(mut items: Vec<T>, reported_total: Option<u64>, page_size: u32) -> Self {
        let cap = page_size as usize;
        if items.len() > cap {
            tracing::warn!(
                received = items.len(),
                page_size,
                "server returned more items than requested; truncating"
            );
            items.truncate(cap);
        }
        let total_items = reported_total.unwrap_or(0).max(items.len() as u64);
        Self {
            total_pages: total_pages(total_items, page_size),
            items,
            total_items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

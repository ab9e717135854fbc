//! Pagination arithmetic
//!
//! Pages are 1-based. A page size of zero is treated as one so the
//! arithmetic never divides by zero.

use glance_dom::Document;
use serde::{Deserialize, Serialize};

/// Offset-based pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Offset of the first item shown
    pub start: u64,
    pub per_page: u64,
    /// Total number of items
    pub count: u64,
}

impl Pagination {
    pub fn new(start: u64, per_page: u64, count: u64) -> Self {
        Self { start, per_page, count }
    }

    /// Effective page size
    pub fn page_size(&self) -> u64 {
        self.per_page.max(1)
    }

    pub fn current_page(&self) -> u64 {
        (self.start / self.page_size()).saturating_add(1)
    }

    pub fn total_pages(&self) -> u64 {
        self.count.div_ceil(self.page_size()).max(1)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    /// Offset of the first item on `page` (clamped to the valid range)
    pub fn start_of(&self, page: u64) -> u64 {
        (page.clamp(1, self.total_pages()) - 1) * self.page_size()
    }

    /// Same pagination moved to `page`
    pub fn go_to(&self, page: u64) -> Self {
        Self {
            start: self.start_of(page),
            ..*self
        }
    }

    pub fn next_page(&self) -> Self {
        self.go_to(self.current_page().saturating_add(1))
    }

    pub fn previous_page(&self) -> Self {
        self.go_to(self.current_page().saturating_sub(1))
    }

    /// 1-based range of items shown, `None` when there are none
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        if self.count == 0 || self.start >= self.count {
            return None;
        }
        let last = self.start.saturating_add(self.page_size()).min(self.count);
        Some((self.start + 1, last))
    }

    /// Read the three hidden inputs; `None` if any is missing or not a number
    pub fn from_document(doc: &Document, fields: &PaginationFields) -> Option<Self> {
        let read = |id: &str| -> Option<u64> {
            let node = doc.get_element_by_id(id)?;
            doc.tree().control_value(node)?.trim().parse().ok()
        };
        Some(Self::new(
            read(&fields.start_id)?,
            read(&fields.per_page_id)?,
            read(&fields.count_id)?,
        ))
    }
}

/// Ids of the hidden inputs carrying pagination state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationFields {
    pub start_id: String,
    pub per_page_id: String,
    pub count_id: String,
}

impl PaginationFields {
    pub fn new(start_id: &str, per_page_id: &str, count_id: &str) -> Self {
        Self {
            start_id: start_id.to_string(),
            per_page_id: per_page_id.to_string(),
            count_id: count_id.to_string(),
        }
    }
}

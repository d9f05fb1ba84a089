//! Canonical pagination and in-memory page reconciliation.
//!
//! Servers report paging under `Paginations` (with `CurrentPage`) or
//! `Pagination` (with `PageNumber`), or not at all. Whatever arrives is folded
//! into one [`PageInfo`], and later creates/updates/deletes are applied to the
//! current page locally instead of refetching it.

use crate::record::{Identified, RecordId};
use serde::Serialize;
use serde_json::Value;

/// Page/size pair sent with a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageInfo {
    /// Derive page count and navigation flags from the three inputs.
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_pages = u32::try_from(total_items.div_ceil(u64::from(page_size)))
            .unwrap_or(u32::MAX);

        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_previous_page: page > 1,
            has_next_page: page < total_pages,
        }
    }

    /// Read server metadata from a list response body, falling back to the
    /// request and the number of records actually returned.
    pub fn from_response(body: &Value, request: PageRequest, returned: usize) -> Self {
        let meta = field(body, "Paginations").or_else(|| field(body, "Pagination"));

        let Some(meta) = meta else {
            return Self::new(request.page, request.page_size, returned as u64);
        };

        let page = field(meta, "CurrentPage")
            .or_else(|| field(meta, "PageNumber"))
            .and_then(as_u64)
            .map(|p| p as u32)
            .unwrap_or(request.page);
        let page_size = field(meta, "PageSize")
            .and_then(as_u64)
            .map(|s| s as u32)
            .filter(|s| *s > 0)
            .unwrap_or(request.page_size);
        let total_items = field(meta, "TotalItems")
            .and_then(as_u64)
            .unwrap_or(returned as u64);

        Self::new(page, page_size, total_items)
    }

    fn with_total(self, total_items: u64) -> Self {
        Self::new(self.page, self.page_size, total_items)
    }
}

impl Default for PageInfo {
    fn default() -> Self {
        Self::new(1, 10, 0)
    }
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value
        .as_object()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The records of the current page plus its [`PageInfo`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedCollection<T> {
    pub items: Vec<T>,
    pub page: PageInfo,
}

impl<T> Default for PagedCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: PageInfo::default(),
        }
    }
}

impl<T: Identified> PagedCollection<T> {
    pub fn new(items: Vec<T>, page: PageInfo) -> Self {
        Self { items, page }
    }

    /// Prepend a freshly created record and count it.
    pub fn insert_created(&mut self, record: T) {
        self.items.insert(0, record);
        self.page = self.page.with_total(self.page.total_items.saturating_add(1));
    }

    /// Replace the record with the same id in place. Returns `false` when
    /// the record is not on the current page.
    pub fn replace_updated(&mut self, record: T) -> bool {
        let Some(id) = record.record_id() else {
            return false;
        };
        match self
            .items
            .iter()
            .position(|existing| existing.record_id() == Some(id))
        {
            Some(index) => {
                self.items[index] = record;
                true
            }
            None => false,
        }
    }

    /// Remove by id and uncount it. The total is decremented even when the
    /// record was not on the current page, since the server deleted it.
    pub fn remove(&mut self, id: &RecordId) -> Option<T> {
        let removed = self
            .items
            .iter()
            .position(|existing| existing.record_id() == Some(id))
            .map(|index| self.items.remove(index));
        self.page = self.page.with_total(self.page.total_items.saturating_sub(1));
        removed
    }

    pub fn find(&self, id: &RecordId) -> Option<&T> {
        self.items.iter().find(|r| r.record_id() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: RecordId,
        name: &'static str,
    }

    impl Row {
        fn new(id: i64, name: &'static str) -> Self {
            Self {
                id: RecordId::Int(id),
                name,
            }
        }
    }

    impl Identified for Row {
        fn record_id(&self) -> Option<&RecordId> {
            Some(&self.id)
        }
    }

    #[test]
    fn page_flags_for_47_items() {
        for page in 1..=5 {
            let info = PageInfo::new(page, 10, 47);
            assert_eq!(info.total_pages, 5);
            assert_eq!(info.has_next_page, page < 5, "page {}", page);
            assert_eq!(info.has_previous_page, page > 1, "page {}", page);
        }
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let info = PageInfo::new(1, 10, 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next_page);
        assert!(!info.has_previous_page);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let info = PageInfo::new(0, 0, 3);
        assert_eq!(info.page, 1);
        assert_eq!(info.page_size, 1);
        assert_eq!(info.total_pages, 3);
    }

    #[test]
    fn reads_paginations_envelope() {
        let body = json!({
            "Data": [],
            "Paginations": { "CurrentPage": 2, "TotalPages": 99, "TotalItems": 47, "PageSize": 10 }
        });
        let info = PageInfo::from_response(&body, PageRequest::new(1, 25), 10);
        // TotalPages is always recomputed from the item count.
        assert_eq!(info, PageInfo::new(2, 10, 47));
    }

    #[test]
    fn reads_pagination_envelope_case_insensitively() {
        let body = json!({
            "data": [],
            "pagination": { "pageNumber": "3", "totalItems": 61, "pageSize": 20 }
        });
        let info = PageInfo::from_response(&body, PageRequest::new(1, 10), 20);
        assert_eq!(info, PageInfo::new(3, 20, 61));
    }

    #[test]
    fn missing_metadata_uses_returned_count() {
        let body = json!([1, 2, 3]);
        let info = PageInfo::from_response(&body, PageRequest::new(1, 10), 3);
        assert_eq!(info, PageInfo::new(1, 10, 3));
    }

    #[test]
    fn create_prepends_and_counts() {
        let mut collection = PagedCollection::new(
            vec![Row::new(1, "A"), Row::new(2, "B")],
            PageInfo::new(1, 10, 2),
        );

        collection.insert_created(Row::new(3, "C"));

        let names: Vec<_> = collection.items.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(collection.page.total_items, 3);
    }

    #[test]
    fn create_can_open_a_new_page() {
        let items = (1..=10).map(|i| Row::new(i, "x")).collect();
        let mut collection = PagedCollection::new(items, PageInfo::new(1, 10, 10));
        assert!(!collection.page.has_next_page);

        collection.insert_created(Row::new(11, "y"));

        assert_eq!(collection.page.total_pages, 2);
        assert!(collection.page.has_next_page);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut collection = PagedCollection::new(
            vec![Row::new(1, "A"), Row::new(2, "B")],
            PageInfo::new(1, 10, 2),
        );

        assert!(collection.replace_updated(Row::new(2, "B2")));
        assert!(!collection.replace_updated(Row::new(9, "Z")));

        let names: Vec<_> = collection.items.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A", "B2"]);
        assert_eq!(collection.page.total_items, 2);
    }

    #[test]
    fn delete_removes_and_uncounts() {
        let mut collection = PagedCollection::new(
            vec![Row::new(1, "A"), Row::new(2, "B")],
            PageInfo::new(1, 10, 2),
        );

        let removed = collection.remove(&RecordId::from("1"));

        assert_eq!(removed.map(|r| r.name), Some("A"));
        assert_eq!(collection.items, vec![Row::new(2, "B")]);
        assert_eq!(collection.page.total_items, 1);
    }

    #[test]
    fn delete_never_goes_below_zero() {
        let mut collection: PagedCollection<Row> = PagedCollection::default();
        collection.remove(&RecordId::Int(1));
        assert_eq!(collection.page.total_items, 0);
    }

    #[test]
    fn serializes_canonical_field_names() {
        let value = serde_json::to_value(PageInfo::new(1, 10, 47)).unwrap();
        assert_eq!(
            value,
            json!({
                "page": 1,
                "pageSize": 10,
                "totalItems": 47,
                "totalPages": 5,
                "hasPreviousPage": false,
                "hasNextPage": true
            })
        );
    }
}

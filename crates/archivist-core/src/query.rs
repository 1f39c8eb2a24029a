//! Query engine
//!
//! Derives the visible page from a document list, a free-text search term
//! and a department facet. Derivation is pure; `ViewState` carries the user's
//! current term, facet and page between derivations.

use archivist_api::DocumentRecord;
use std::collections::HashSet;

pub const DEFAULT_PAGE_SIZE: usize = 15;

/// One derived page, borrowing from the documents it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView<'a> {
    pub items: Vec<&'a DocumentRecord>,
    /// 1-based, always within `1..=page_count`
    pub page_index: usize,
    /// At least 1, even when nothing matches
    pub page_count: usize,
    pub filtered_count: usize,
    pub total_count: usize,
}

impl PageView<'_> {
    pub fn to_page(&self) -> Page {
        Page {
            items: self.items.iter().map(|r| (*r).clone()).collect(),
            page_index: self.page_index,
            page_count: self.page_count,
            filtered_count: self.filtered_count,
            total_count: self.total_count,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.page_count
    }
}

/// Owned copy of a `PageView`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<DocumentRecord>,
    pub page_index: usize,
    pub page_count: usize,
    pub filtered_count: usize,
    pub total_count: usize,
}

impl Page {
    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.page_count
    }
}

/// Case-insensitive substring match on title, description or owner name.
/// A blank term matches everything.
pub fn matches_search(record: &DocumentRecord, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();

    [
        Some(record.title.as_str()),
        record.description.as_deref(),
        record.owner_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Case-insensitive equality on department, ignoring surrounding whitespace.
/// A blank filter matches everything;
/// a record without a department never matches a non-blank filter.
pub fn matches_department(record: &DocumentRecord, filter: &str) -> bool {
    let filter = filter.trim();
    if filter.is_empty() {
        return true;
    }
    let filter = filter.to_lowercase();
    record
        .department()
        .is_some_and(|department| department.trim().to_lowercase() == filter)
}

/// Distinct non-blank departments of all documents, in first-seen order
pub fn facets(records: &[DocumentRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|record| record.department())
        .filter(|department| seen.insert(*department))
        .collect()
}

/// Number of pages for `filtered_count` matches, never less than 1
pub fn page_count(filtered_count: usize, page_size: usize) -> usize {
    filtered_count.div_ceil(page_size.max(1)).max(1)
}

/// Derive one page. `page_index` is clamped into `1..=page_count`.
pub fn view<'a>(
    records: &'a [DocumentRecord],
    search_term: &str,
    department_filter: &str,
    page_index: usize,
    page_size: usize,
) -> PageView<'a> {
    let page_size = page_size.max(1);
    let filtered: Vec<&DocumentRecord> = records
        .iter()
        .filter(|record| matches_search(record, search_term))
        .filter(|record| matches_department(record, department_filter))
        .collect();

    let filtered_count = filtered.len();
    let page_count = page_count(filtered_count, page_size);
    let page_index = page_index.clamp(1, page_count);

    let items = filtered
        .into_iter()
        .skip((page_index - 1) * page_size)
        .take(page_size)
        .collect();

    PageView {
        items,
        page_index,
        page_count,
        filtered_count,
        total_count: records.len(),
    }
}

/// Search term, department facet and page position of one view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search_term: String,
    department_filter: String,
    page_index: usize,
    page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            department_filter: String::new(),
            page_index: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn department_filter(&self) -> &str {
        &self.department_filter
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changing the term starts over at the first page
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page_index = 1;
    }

    /// Changing the facet starts over at the first page
    pub fn set_department_filter(&mut self, department: impl Into<String>) {
        self.department_filter = department.into();
        self.page_index = 1;
    }

    pub fn clear_filters(&mut self) {
        self.search_term.clear();
        self.department_filter.clear();
        self.page_index = 1;
    }

    /// The page position is clamped on the next derivation
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// New collection contents start over at the first page
    pub fn collection_changed(&mut self) {
        self.page_index = 1;
    }

    /// Derive the current page and remember the clamped position
    pub fn derive<'a>(&mut self, records: &'a [DocumentRecord]) -> PageView<'a> {
        let page = view(
            records,
            &self.search_term,
            &self.department_filter,
            self.page_index,
            self.page_size,
        );
        self.page_index = page.page_index;
        page
    }

    /// Jump to `page`. Out-of-range pages are ignored; returns whether the position moved.
    pub fn go_to_page(&mut self, page: usize, records: &[DocumentRecord]) -> bool {
        let current = self.derive(records);
        if page < 1 || page > current.page_count || page == current.page_index {
            return false;
        }
        self.page_index = page;
        true
    }

    pub fn next_page(&mut self, records: &[DocumentRecord]) -> bool {
        self.go_to_page(self.page_index.saturating_add(1), records)
    }

    pub fn previous_page(&mut self, records: &[DocumentRecord]) -> bool {
        if self.page_index <= 1 {
            return false;
        }
        self.go_to_page(self.page_index - 1, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64, title: &str, department: Option<&str>) -> DocumentRecord {
        let mut record = DocumentRecord::new(id, title, Utc::now());
        record.department = department.map(str::to_string);
        record
    }

    fn numbered(count: i64) -> Vec<DocumentRecord> {
        (1..=count)
            .map(|i| record(i, &format!("Document {}", i), None))
            .collect()
    }

    #[test]
    fn test_end_to_end_invoice_finance() {
        let records = vec![
            record(1, "Invoice A", Some("Finance")),
            record(2, "Invoice B", Some("HR")),
        ];

        let page = view(&records, "invoice", "Finance", 1, 15);
        let ids: Vec<i64> = page.items.iter().map(|r| r.id).collect();

        assert_eq!(ids, vec![1]);
        assert_eq!(page.page_index, 1);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.filtered_count, 1);
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn test_empty_filters_return_everything() {
        let records = numbered(31);
        let page = view(&records, "", "", 1, 15);

        assert_eq!(page.items.len(), 15);
        assert_eq!(page.filtered_count, 31);
        assert_eq!(page.page_count, 3);

        let blank = view(&records, "   ", " ", 3, 15);
        assert_eq!(blank.items.len(), 1);
        assert_eq!(blank.page_index, 3);
    }

    #[test]
    fn test_search_fields_and_absence() {
        let mut described = record(1, "Lease", None);
        described.description = Some("ACME warehouse lease".to_string());
        let mut owned = record(2, "Contract", None);
        owned.owner_name = Some("Acme Corp".to_string());
        let titled = record(3, "acme invoice", None);
        let unrelated = record(4, "Payroll", None);
        let mut contact_only = record(5, "Memo", None);
        contact_only.owner_contact = Some("acme@example.com".to_string());

        let records = vec![described, owned, titled, unrelated, contact_only];
        let ids: Vec<i64> = view(&records, "AcMe", "", 1, 15)
            .items
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_department_filter_is_exact_and_case_insensitive() {
        let records = vec![
            record(1, "A", Some("Finance")),
            record(2, "B", Some("finance")),
            record(3, "C", Some("Finance Ops")),
            record(4, "D", None),
            record(5, "E", Some("")),
        ];

        let ids: Vec<i64> = view(&records, "", "FINANCE", 1, 15)
            .items
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_department_filter_ignores_surrounding_whitespace() {
        let records = vec![
            record(1, "A", Some("Finance")),
            record(2, "B", Some("HR")),
            record(3, "C", Some("Finance ")),
        ];

        let ids: Vec<i64> = view(&records, "", " Finance ", 1, 15)
            .items
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(!matches_department(&records[1], "\tfinance\n"));
        assert!(matches_department(&records[1], "  "));
    }

    #[test]
    fn test_facets_cover_whole_collection_in_first_seen_order() {
        let records = vec![
            record(1, "A", Some("HR")),
            record(2, "B", None),
            record(3, "C", Some("Finance")),
            record(4, "D", Some("HR")),
            record(5, "E", Some("  ")),
            record(6, "F", Some("Legal")),
        ];

        assert_eq!(facets(&records), vec!["HR", "Finance", "Legal"]);
    }

    #[test]
    fn test_page_count_minimum_is_one() {
        assert_eq!(page_count(0, 15), 1);
        assert_eq!(page_count(15, 15), 1);
        assert_eq!(page_count(16, 15), 2);

        let page = view(&[], "anything", "", 4, 15);
        assert_eq!(page.page_index, 1);
        assert_eq!(page.page_count, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_index_is_clamped_to_last_page() {
        let records = numbered(40);
        let page = view(&records, "Document 1", "", 3, 15);

        // "Document 1" and "Document 10".."Document 19"
        assert_eq!(page.filtered_count, 11);
        assert_eq!(page.page_index, 1);

        let page = view(&records, "", "", 99, 15);
        assert_eq!(page.page_index, 3);
        assert_eq!(page.items.len(), 10);
    }

    #[test]
    fn test_navigation_past_bounds_is_noop() {
        let records = numbered(20);
        let mut state = ViewState::default();

        assert!(!state.previous_page(&records));
        assert_eq!(state.page_index(), 1);

        assert!(state.next_page(&records));
        assert_eq!(state.page_index(), 2);

        assert!(!state.next_page(&records));
        assert_eq!(state.page_index(), 2);

        assert!(!state.go_to_page(0, &records));
        assert!(!state.go_to_page(7, &records));
        assert_eq!(state.page_index(), 2);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let records = numbered(40);
        let mut state = ViewState::default();
        assert!(state.go_to_page(3, &records));

        state.set_search_term("Document");
        assert_eq!(state.page_index(), 1);

        assert!(state.next_page(&records));
        state.set_department_filter("");
        assert_eq!(state.page_index(), 1);

        assert!(state.next_page(&records));
        state.collection_changed();
        assert_eq!(state.page_index(), 1);
    }

    #[test]
    fn test_navigation_is_preserved_across_derivations() {
        let records = numbered(40);
        let mut state = ViewState::default();
        assert!(state.next_page(&records));

        let page = state.derive(&records);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.items.first().map(|r| r.id), Some(16));
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn test_page_size_change_reclamps() {
        let records = numbered(40);
        let mut state = ViewState::default();
        assert!(state.go_to_page(3, &records));

        state.set_page_size(20);
        let page = state.derive(&records);
        assert_eq!(page.page_index, 2);
        assert_eq!(state.page_index(), 2);
    }
}

//! Row Query Engine - filter, sort, page
//!
//! Maps a slice of records (data space, index 0..N-1) to the ordered list of
//! row indices the user sees (view space), then cuts one page out of it.
//!
//! Key invariants:
//! - `apply` is a pure function of (rows, state); it never mutates or errors
//! - Sorting is stable: equal keys keep provider order, in both directions
//! - The effective page is always within `[1, total_pages]`
//! - `total_pages = max(1, ceil(filtered / page_size))`
//! - Changing query, sort, page size or facets resets the page to 1

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use tabula_config::TableSettings;
use tabula_core::{first_sortable, Column, Record, RowId, SortDirection, Value};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Per-field accepted values. A row passes when, for every non-empty set,
/// the string form of its field is in the set.
pub type Facets = BTreeMap<String, BTreeSet<String>>;

// =============================================================================
// QueryState
// =============================================================================

/// Search text, sort and pagination cursor for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryState {
    query: String,
    sort_key: Option<String>,
    sort_dir: SortDirection,
    page: usize,
    page_size: usize,
    facets: Facets,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_key: None,
            sort_dir: SortDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            facets: Facets::new(),
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state with the configured default page size.
    pub fn from_settings(settings: &TableSettings) -> Self {
        Self::new().with_page_size(settings.default_page_size)
    }

    /// Fresh state sorted by the first sortable column, ascending.
    pub fn for_columns<R>(columns: &[Column<R>]) -> Self {
        Self {
            sort_key: first_sortable(columns).map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, key: impl Into<String>, dir: SortDirection) -> Self {
        self.sort_key = Some(key.into());
        self.sort_dir = dir;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Trimmed, lowercased query used for matching
    pub fn needle(&self) -> String {
        self.query.trim().to_lowercase()
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub fn sort_dir(&self) -> SortDirection {
        self.sort_dir
    }

    /// Requested page (1-based). May exceed the page count until clamped.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Sort as a single `key:dir` token (sort drop-downs)
    pub fn sort_value(&self) -> Option<String> {
        self.sort_key
            .as_ref()
            .map(|key| format!("{}:{}", key, self.sort_dir.as_str()))
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    pub fn set_sort(&mut self, key: impl Into<String>, dir: SortDirection) {
        self.sort_key = Some(key.into());
        self.sort_dir = dir;
        self.page = 1;
    }

    pub fn set_sort_dir(&mut self, dir: SortDirection) {
        self.sort_dir = dir;
        self.page = 1;
    }

    /// Back to provider order
    pub fn clear_sort(&mut self) {
        self.sort_key = None;
        self.sort_dir = SortDirection::Asc;
        self.page = 1;
    }

    /// Header click: same key flips direction, a new key sorts ascending.
    pub fn toggle_sort(&mut self, key: &str) {
        if self.sort_key.as_deref() == Some(key) {
            self.sort_dir = self.sort_dir.flipped();
        } else {
            self.sort_key = Some(key.to_string());
            self.sort_dir = SortDirection::Asc;
        }
        self.page = 1;
    }

    /// Apply a `key:dir` token. Malformed tokens are ignored.
    pub fn set_sort_value(&mut self, value: &str) -> bool {
        let Some((key, dir)) = value.split_once(':') else {
            return false;
        };
        match SortDirection::parse(dir) {
            Some(dir) if !key.is_empty() => {
                self.set_sort(key, dir);
                true
            }
            _ => false,
        }
    }

    /// Zero is clamped to one; never fails.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Lower bound is enforced here; the upper bound once the page count is
    /// known (see [`QueryState::clamp_page`]).
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn clamp_page(&mut self, total_pages: usize) {
        self.page = self.page.clamp(1, total_pages.max(1));
    }

    /// Add or remove one accepted value for a facet field.
    pub fn toggle_facet(&mut self, field: &str, value: &str) {
        let values = self.facets.entry(field.to_string()).or_default();
        if !values.remove(value) {
            values.insert(value.to_string());
        }
        if values.is_empty() {
            self.facets.remove(field);
        }
        self.page = 1;
    }

    pub fn set_facet<I, S>(&mut self, field: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.facets.remove(field);
        } else {
            self.facets.insert(field.to_string(), values);
        }
        self.page = 1;
    }

    pub fn set_facets(&mut self, facets: Facets) {
        self.facets = facets;
        self.facets.retain(|_, values| !values.is_empty());
        self.page = 1;
    }

    pub fn clear_facets(&mut self) {
        self.facets.clear();
        self.page = 1;
    }

    /// Write the effective page of a computed view back into the state.
    pub fn sync(&mut self, view: &QueryView) {
        self.clamp_page(view.total_pages());
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Global search: any field's lowercased string form contains `needle`.
pub fn matches_query<R: Record>(row: &R, needle: &str) -> bool {
    needle.is_empty()
        || row
            .values()
            .iter()
            .any(|v| v.display_string().to_lowercase().contains(needle))
}

pub fn matches_facets<R: Record>(row: &R, facets: &Facets) -> bool {
    facets
        .iter()
        .filter(|(_, accepted)| !accepted.is_empty())
        .all(|(field, accepted)| accepted.contains(&row.field(field).display_string()))
}

/// Data indices of rows passing query and facets, in provider order.
pub fn filter_indices<R: Record>(rows: &[R], state: &QueryState) -> Vec<usize> {
    let needle = state.needle();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| matches_query(*row, &needle) && matches_facets(*row, &state.facets))
        .map(|(i, _)| i)
        .collect()
}

// =============================================================================
// Sort
// =============================================================================

/// Sort key for one field value.
///
/// Variant order is the type rank: Number < Text < Bool < Blank.
/// Text is compared lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Number(OrderedFloat<f64>),
    Text(String),
    Bool(bool),
    Blank,
}

impl SortValue {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => SortValue::Number(OrderedFloat(*n)),
            Value::Text(s) if s.is_empty() => SortValue::Blank,
            Value::Text(s) => SortValue::Text(s.to_lowercase()),
            Value::Bool(b) => SortValue::Bool(*b),
            Value::Empty => SortValue::Blank,
        }
    }
}

/// Stable sort of `indices` by `rows[i][key]`.
///
/// Descending inverts the comparator only, so ties keep their input order
/// in both directions.
pub fn sort_indices<R: Record>(
    rows: &[R],
    indices: &[usize],
    key: &str,
    direction: SortDirection,
) -> Vec<usize> {
    let mut keyed: Vec<(SortValue, usize)> = indices
        .iter()
        .map(|&i| (SortValue::from_value(&rows[i].field(key)), i))
        .collect();

    keyed.sort_by(|a, b| {
        let ord = a.0.cmp(&b.0);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    keyed.into_iter().map(|(_, i)| i).collect()
}

// =============================================================================
// QueryView: result of applying a QueryState
// =============================================================================

/// Filtered, sorted and paged view over a record slice.
///
/// Holds data indices only; borrow the rows back with [`QueryView::rows`]
/// and [`QueryView::all_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryView {
    /// Filtered + sorted data indices (view row -> data row)
    order: Arc<[usize]>,
    /// Effective page, clamped into [1, total_pages]
    page: usize,
    page_size: usize,
    total_pages: usize,
}

impl QueryView {
    fn paginate(order: Arc<[usize]>, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = order.len().div_ceil(page_size).max(1);
        Self {
            order,
            page: page.clamp(1, total_pages),
            page_size,
            total_pages,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Rows surviving the filter
    pub fn filtered_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// View-space range of the current page
    pub fn page_range(&self) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.order.len());
        let end = (start + self.page_size).min(self.order.len());
        start..end
    }

    /// Data indices of the current page
    pub fn page_indices(&self) -> &[usize] {
        &self.order[self.page_range()]
    }

    /// Data indices of all filtered rows, sorted
    pub fn indices(&self) -> &[usize] {
        &self.order
    }

    /// Shared handle to the sorted order (stable across cache hits)
    pub fn order(&self) -> &Arc<[usize]> {
        &self.order
    }

    /// Current page rows
    pub fn rows<'a, R>(&self, data: &'a [R]) -> Vec<&'a R> {
        self.page_indices().iter().map(|&i| &data[i]).collect()
    }

    /// Filtered + sorted rows, unpaged
    pub fn all_rows<'a, R>(&self, data: &'a [R]) -> Vec<&'a R> {
        self.order.iter().map(|&i| &data[i]).collect()
    }

    /// Candidate universe: ids of every filtered row, in view order
    pub fn ids<R: Record>(&self, data: &[R]) -> Vec<RowId> {
        self.order.iter().map(|&i| data[i].id()).collect()
    }

    /// Ids of the current page
    pub fn page_ids<R: Record>(&self, data: &[R]) -> Vec<RowId> {
        self.page_indices().iter().map(|&i| data[i].id()).collect()
    }
}

/// Apply `state` to `rows`: filter, then stable sort, then page.
pub fn apply<R: Record>(rows: &[R], state: &QueryState) -> QueryView {
    let matched = filter_indices(rows, state);
    let order = match state.sort_key() {
        Some(key) => sort_indices(rows, &matched, key, state.sort_dir()),
        None => matched,
    };
    QueryView::paginate(order.into(), state.page(), state.page_size())
}

// =============================================================================
// QueryCache: memoized apply
// =============================================================================

/// Memoizing wrapper around [`apply`].
///
/// Re-filters only when the query, facets or row slice change, re-sorts only
/// when additionally the sort changes; paging is always recomputed. Output is
/// identical to [`apply`]. The row slice is identified by address and length,
/// so call [`QueryCache::invalidate`] whenever the rows change in place.
/// Address and length of the row slice a cached result was computed from
type RowsId = (usize, usize);

#[derive(Debug, Default)]
pub struct QueryCache {
    filter_key: Option<(RowsId, String, Facets)>,
    matched: Vec<usize>,
    sort_key: Option<(Option<String>, SortDirection)>,
    sorted: Option<Arc<[usize]>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget cached results (rows changed)
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    pub fn apply<R: Record>(&mut self, rows: &[R], state: &QueryState) -> QueryView {
        let rows_id = (rows.as_ptr() as usize, rows.len());
        let filter_key = (rows_id, state.needle(), state.facets.clone());
        if self.filter_key.as_ref() != Some(&filter_key) {
            log::debug!("query cache: refilter {} rows", rows.len());
            self.matched = filter_indices(rows, state);
            self.filter_key = Some(filter_key);
            self.sorted = None;
        }

        let sort_key = (state.sort_key.clone(), state.sort_dir);
        let sorted = match &self.sorted {
            Some(sorted) if self.sort_key.as_ref() == Some(&sort_key) => sorted.clone(),
            _ => {
                log::debug!("query cache: resort {} rows", self.matched.len());
                let order: Arc<[usize]> = match state.sort_key() {
                    Some(key) => sort_indices(rows, &self.matched, key, state.sort_dir()).into(),
                    None => self.matched.clone().into(),
                };
                self.sort_key = Some(sort_key);
                self.sorted = Some(order.clone());
                order
            }
        };

        QueryView::paginate(sorted, state.page(), state.page_size())
    }
}

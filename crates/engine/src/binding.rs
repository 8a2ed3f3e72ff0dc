//! Table presentation binding.
//!
//! Turns engine state into the plain data a table view draws: header cells
//! with sort affordances, body rows of cell text, the pagination bar, the
//! empty-state message and the polite live-region announcement. Nothing here
//! knows about a particular UI toolkit.

use tabula_core::{Column, Record, RowId, SortDirection, Width};

use crate::columns::ColumnVisibility;
use crate::query::{QueryState, QueryView};
use crate::selection::Selection;

/// Shown in place of the body when no row survives filtering.
pub const NO_MATCHES: &str = "No matches";

/// `aria-sort` value of a header cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaSort {
    None,
    Ascending,
    Descending,
}

impl AriaSort {
    pub fn as_str(self) -> &'static str {
        match self {
            AriaSort::None => "none",
            AriaSort::Ascending => "ascending",
            AriaSort::Descending => "descending",
        }
    }

    /// Visual sort indicator; empty for non-sortable columns.
    fn indicator(self, sortable: bool) -> &'static str {
        match (sortable, self) {
            (false, _) => "",
            (true, AriaSort::Ascending) => "▲",
            (true, AriaSort::Descending) => "▼",
            (true, AriaSort::None) => "↕",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub width: Option<Width>,
    pub sortable: bool,
    pub aria_sort: AriaSort,
    pub indicator: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRow {
    /// Stable row key: the record id, or its view position when it has none
    pub key: String,
    pub cells: Vec<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
    /// "Page x of y"
    pub label: String,
    /// Target page of the Prev button, `None` when disabled
    pub prev: Option<usize>,
    /// Target page of the Next button, `None` when disabled
    pub next: Option<usize>,
}

fn shown<'a, R>(columns: &'a [Column<R>], visible: Option<&'a ColumnVisibility>) -> impl Iterator<Item = &'a Column<R>> {
    columns
        .iter()
        .filter(move |c| visible.map_or(true, |v| v.is_visible(&c.key)))
}

pub fn header_cells<R>(columns: &[Column<R>], visible: Option<&ColumnVisibility>, state: &QueryState) -> Vec<HeaderCell> {
    shown(columns, visible)
        .map(|col| {
            let aria_sort = match (col.sortable, state.sort_key()) {
                (true, Some(key)) if key == col.key => match state.sort_dir() {
                    SortDirection::Asc => AriaSort::Ascending,
                    SortDirection::Desc => AriaSort::Descending,
                },
                _ => AriaSort::None,
            };
            HeaderCell {
                key: col.key.clone(),
                label: col.label.clone(),
                width: col.width.clone(),
                sortable: col.sortable,
                aria_sort,
                indicator: aria_sort.indicator(col.sortable),
            }
        })
        .collect()
}

/// Header click. Sortable columns toggle the sort; others are inert.
/// Returns whether the state changed.
pub fn click_header<R>(columns: &[Column<R>], state: &mut QueryState, key: &str) -> bool {
    match columns.iter().find(|c| c.key == key) {
        Some(col) if col.sortable => {
            state.toggle_sort(key);
            true
        }
        _ => false,
    }
}

/// Body rows for `rows` (normally the current page, in view order).
pub fn body_rows<R: Record>(
    rows: &[&R],
    columns: &[Column<R>],
    visible: Option<&ColumnVisibility>,
    selection: Option<&Selection<RowId>>,
) -> Vec<BodyRow> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let id = row.id();
            let selected = selection.is_some_and(|s| s.is_selected(&id));
            BodyRow {
                key: if id.is_empty() { i.to_string() } else { id },
                cells: shown(columns, visible).map(|col| col.cell_text(*row)).collect(),
                selected,
            }
        })
        .collect()
}

pub fn pagination(view: &QueryView) -> Pagination {
    let page = view.page();
    let total_pages = view.total_pages();
    Pagination {
        page,
        total_pages,
        label: format!("Page {} of {}", page, total_pages),
        prev: (page > 1).then(|| page - 1),
        next: (page < total_pages).then(|| page + 1),
    }
}

pub fn empty_message(view: &QueryView) -> Option<&'static str> {
    view.is_empty().then_some(NO_MATCHES)
}

/// Text for the polite live region after a filter, sort or page size change.
pub fn announcement(state: &QueryState) -> String {
    let mut text = String::from("Filters updated. ");
    if !state.query().is_empty() {
        text.push_str(&format!("Query: {}. ", state.query()));
    }
    match state.sort_key() {
        Some(key) => text.push_str(&format!("Sort: {} {}. ", key, state.sort_dir().as_str())),
        None => text.push_str("Unsorted. "),
    }
    text.push_str(&format!("Page size: {}.", state.page_size()));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::apply;
    use std::collections::BTreeMap;
    use tabula_core::{record, Value};

    type Row = BTreeMap<String, Value>;

    fn schema() -> Vec<Column<Row>> {
        vec![
            Column::new("name", "Name").sortable().width(Width::Px(200)),
            Column::new("amount", "Amount").sortable(),
            Column::new("note", "Note"),
            Column::action("actions", "Actions", |r: &Row| format!("Open {}", r.id())),
        ]
    }

    fn rows() -> Vec<Row> {
        vec![
            record([("id", Value::from("r1")), ("name", "Acme".into()), ("amount", Value::Number(12.0))]),
            record([("id", Value::from("r2")), ("name", "Globex".into()), ("amount", Value::Number(7.0))]),
        ]
    }

    #[test]
    fn test_header_sort_affordances() {
        let state = QueryState::new().with_sort("amount", SortDirection::Desc);
        let cells = header_cells(&schema(), None, &state);

        assert_eq!(cells[0].aria_sort, AriaSort::None);
        assert_eq!(cells[0].indicator, "↕");
        assert_eq!(cells[0].width, Some(Width::Px(200)));
        assert_eq!(cells[1].aria_sort.as_str(), "descending");
        assert_eq!(cells[1].indicator, "▼");
        assert_eq!(cells[2].indicator, "");
        assert_eq!(cells[3].aria_sort, AriaSort::None);
    }

    #[test]
    fn test_click_header_toggles_sortable_only() {
        let cols = schema();
        let mut state = QueryState::new();
        assert!(click_header(&cols, &mut state, "name"));
        assert_eq!(state.sort_value().as_deref(), Some("name:asc"));
        assert!(click_header(&cols, &mut state, "name"));
        assert_eq!(state.sort_value().as_deref(), Some("name:desc"));
        assert!(!click_header(&cols, &mut state, "note"));
        assert!(!click_header(&cols, &mut state, "actions"));
        assert_eq!(state.sort_value().as_deref(), Some("name:desc"));
    }

    #[test]
    fn test_body_rows_respect_visibility_and_selection() {
        let data = rows();
        let cols = schema();
        let mut visible = ColumnVisibility::from_columns(&cols);
        visible.toggle("note");
        let mut selection: Selection = Selection::new();
        selection.toggle("r2".into());

        let view = apply(&data, &QueryState::new());
        let body = body_rows(&view.rows(&data), &cols, Some(&visible), Some(&selection));

        assert_eq!(body[0].key, "r1");
        assert_eq!(body[0].cells, vec!["Acme", "12", "Open r1"]);
        assert!(!body[0].selected);
        assert!(body[1].selected);
    }

    #[test]
    fn test_row_key_falls_back_to_position() {
        let data = vec![record([("name", "anon")])];
        let refs: Vec<&Row> = data.iter().collect();
        let body = body_rows(&refs, &schema(), None, None);
        assert_eq!(body[0].key, "0");
    }

    #[test]
    fn test_pagination_bar() {
        let data: Vec<Row> = (0..25).map(|i| record([("id", Value::from(i as i64))])).collect();
        let mut state = QueryState::new();
        state.set_page(2);
        let bar = pagination(&apply(&data, &state));
        assert_eq!(bar.label, "Page 2 of 3");
        assert_eq!(bar.prev, Some(1));
        assert_eq!(bar.next, Some(3));

        let first = pagination(&apply(&data, &QueryState::new()));
        assert_eq!(first.prev, None);
    }

    #[test]
    fn test_empty_message() {
        let data = rows();
        let mut state = QueryState::new();
        assert_eq!(empty_message(&apply(&data, &state)), None);
        state.set_query("zzz");
        let view = apply(&data, &state);
        assert_eq!(empty_message(&view), Some(NO_MATCHES));
        assert_eq!(pagination(&view).label, "Page 1 of 1");
    }

    #[test]
    fn test_announcement_text() {
        let mut state = QueryState::new().with_sort("dateSubmitted", SortDirection::Desc);
        assert_eq!(announcement(&state), "Filters updated. Sort: dateSubmitted desc. Page size: 10.");
        state.set_query("acme");
        state.set_page_size(20);
        assert_eq!(
            announcement(&state),
            "Filters updated. Query: acme. Sort: dateSubmitted desc. Page size: 20."
        );
    }
}

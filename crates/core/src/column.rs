//! Column schema for tables.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::Value;

/// Projection from a row to its displayed cell text.
pub type RenderFn<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;

/// Column size hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Width {
    Px(u32),
    /// Free-form size (`"12rem"`, `"20%"`), passed through to the renderer.
    Css(String),
}

/// Data columns show a record field; action columns host non-data affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Data,
    Action,
}

/// Column configuration.
///
/// ```ignore
/// let columns = vec![
///     Column::new("jobTitle", "Job Title").sortable(),
///     Column::new("bidAmount", "Bid (USD)").sortable().width(Width::Px(120)),
///     Column::action("actions", "Actions", |_row: &Proposal| "Withdraw".into()),
/// ];
/// ```
pub struct Column<R> {
    /// Field name for data columns; a stable identifier for action columns
    pub key: String,
    /// Header text
    pub label: String,
    /// Whether clicking the header sorts by this column
    pub sortable: bool,
    pub width: Option<Width>,
    render: Option<RenderFn<R>>,
    kind: ColumnKind,
}

impl<R> Column<R> {
    /// Create a data column bound to field `key`.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            width: None,
            render: None,
            kind: ColumnKind::Data,
        }
    }

    /// Create an action column. Action columns have no data field, are
    /// never sortable, and always render through `render`.
    pub fn action<F>(key: impl Into<String>, label: impl Into<String>, render: F) -> Self
    where
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            width: None,
            render: Some(Arc::new(render)),
            kind: ColumnKind::Action,
        }
    }

    /// Make the column sortable. No effect on action columns.
    pub fn sortable(mut self) -> Self {
        self.sortable = self.kind == ColumnKind::Data;
        self
    }

    pub fn width(mut self, width: Width) -> Self {
        self.width = Some(width);
        self
    }

    /// Override how cells of this column are displayed.
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_action(&self) -> bool {
        self.kind == ColumnKind::Action
    }
}

impl<R: Record> Column<R> {
    /// Displayed text for `row`: the render projection when present,
    /// otherwise the field's string form.
    pub fn cell_text(&self, row: &R) -> String {
        match &self.render {
            Some(render) => render(row),
            None => row.field(&self.key).display_string(),
        }
    }

    /// Typed cell for exports: rendered columns yield their text, plain
    /// columns the raw field value.
    pub fn cell_value(&self, row: &R) -> Value {
        match &self.render {
            Some(render) => Value::Text(render(row)),
            None => row.field(&self.key),
        }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            width: self.width.clone(),
            render: self.render.clone(),
            kind: self.kind,
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("width", &self.width)
            .field("render", &self.render.is_some())
            .field("kind", &self.kind)
            .finish()
    }
}

/// First sortable column's key, the default sort for a fresh table.
pub fn first_sortable<R>(columns: &[Column<R>]) -> Option<&str> {
    columns.iter().find(|c| c.sortable).map(|c| c.key.as_str())
}

// Table source: engine columns + records -> exportable headers and cells

use std::collections::BTreeMap;

use tabula_core::{Column, Record, Value};

use crate::export::{serialize, ExportError, ExportFile, ExportFormat, ExportOptions};

/// Headers and typed cells ready for the export pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    /// Column keys, parallel to `headers` (empty when read back from a file)
    pub keys: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            keys: Vec::new(),
            headers,
            rows,
        }
    }

    /// Column keys as `&str`, for `ColumnVisibility::visible_indices`.
    pub fn key_refs(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }

    pub fn serialize(&self, format: ExportFormat, stem: &str, options: &ExportOptions) -> Result<ExportFile, ExportError> {
        serialize(format, &self.headers, &self.rows, stem, options)
    }

    /// Rows as map records keyed by header. Later duplicate headers win.
    pub fn records(&self) -> Vec<BTreeMap<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().chain(std::iter::repeat(Value::Empty)))
                    .collect()
            })
            .collect()
    }
}

/// Build export input from table columns.
///
/// Headers are column labels; cells are the render projection when a column
/// has one, otherwise the typed field value. Action columns are skipped.
pub fn table_source<R: Record>(columns: &[Column<R>], rows: &[&R]) -> TableData {
    let exported: Vec<&Column<R>> = columns.iter().filter(|c| !c.is_action()).collect();
    TableData {
        keys: exported.iter().map(|c| c.key.clone()).collect(),
        headers: exported.iter().map(|c| c.label.clone()).collect(),
        rows: rows
            .iter()
            .map(|row| exported.iter().map(|c| c.cell_value(*row)).collect())
            .collect(),
    }
}

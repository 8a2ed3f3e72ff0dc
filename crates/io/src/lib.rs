// Table export: CSV, Excel, JSON

pub mod csv;
pub mod export;
pub mod json;
pub mod table;
pub mod xlsx;

pub use self::csv::read as read_csv;
pub use export::{serialize, ExportError, ExportFile, ExportFormat, ExportOptions, ExportWarning};
pub use table::{table_source, TableData};

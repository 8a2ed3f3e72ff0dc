// Export pipeline: headers + rows -> downloadable file bytes
//
// CSV, XLSX and JSON are produced exactly. PDF is not implemented and is
// refused with ExportError::UnsupportedFormat; callers that prefer a CSV
// substitute must opt in with `degrade_unsupported`, which attaches an
// ExportWarning to the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tabula_config::{LineEnding, TableSettings};
use tabula_core::Value;

/// Fallback file stem when the caller passes a blank one
const DEFAULT_STEM: &str = "export";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Json => "application/json",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Parse a format name or extension ("csv", ".XLSX", "excel", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            "json" => Some(ExportFormat::Json),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    /// Column projection: headers and every row are reduced to these
    /// positions, in this order. Out-of-range positions are skipped.
    pub visible_indices: Option<Vec<usize>>,
    /// Replaces the row source entirely ("export selected only")
    pub selected_rows: Option<Vec<Vec<Value>>>,
    pub line_ending: LineEnding,
    /// Produce CSV instead of refusing formats that are not implemented
    pub degrade_unsupported: bool,
    /// Worksheet name for XLSX (default "Sheet1")
    pub sheet_name: Option<String>,
}

impl ExportOptions {
    pub fn from_settings(settings: &TableSettings) -> Self {
        Self {
            line_ending: settings.export_line_ending,
            degrade_unsupported: settings.export_degrade_unsupported,
            ..Self::default()
        }
    }

    pub fn with_visible_indices(mut self, indices: Vec<usize>) -> Self {
        self.visible_indices = Some(indices);
        self
    }

    pub fn with_selected_rows(mut self, rows: Vec<Vec<Value>>) -> Self {
        self.selected_rows = Some(rows);
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn degrade_unsupported(mut self) -> Self {
        self.degrade_unsupported = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// The requested format was substituted with another one
    Degraded { requested: ExportFormat, produced: ExportFormat },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded { requested, produced } => {
                write!(f, "{requested} export is not supported; produced {produced} instead")
            }
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    /// Format is not implemented and degradation was not requested.
    UnsupportedFormat(ExportFormat),
    /// CSV writer failure.
    Csv(String),
    /// XLSX writer failure (including sheet size limits).
    Xlsx(String),
    /// JSON encoding failure.
    Json(String),
    /// Writing the file to disk failed.
    Io(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => write!(f, "unsupported export format: {format}"),
            Self::Csv(msg) => write!(f, "CSV export error: {msg}"),
            Self::Xlsx(msg) => write!(f, "XLSX export error: {msg}"),
            Self::Json(msg) => write!(f, "JSON export error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// A serialized export, ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    /// `{stem}.{ext}` of the format actually produced
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// Format actually produced
    pub format: ExportFormat,
    pub warnings: Vec<ExportWarning>,
}

impl ExportFile {
    fn new(stem: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: format!("{}.{}", file_stem(stem), format.extension()),
            mime: format.mime(),
            bytes,
            format,
            warnings: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Write into `dir` under [`ExportFile::filename`]. Returns the full path.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.filename);
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ExportError> {
        fs::write(path, &self.bytes).map_err(|e| ExportError::Io(format!("{}: {}", path.display(), e)))
    }
}

/// File stem safe to join onto a directory
fn file_stem(stem: &str) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        DEFAULT_STEM.to_string()
    } else {
        cleaned
    }
}

/// Apply the column projection. `None` leaves the table untouched.
fn project(headers: &[String], rows: &[Vec<Value>], indices: Option<&[usize]>) -> (Vec<String>, Vec<Vec<Value>>) {
    let Some(indices) = indices else {
        return (headers.to_vec(), rows.to_vec());
    };
    let kept: Vec<usize> = indices.iter().copied().filter(|&i| i < headers.len()).collect();
    let headers = kept.iter().map(|&i| headers[i].clone()).collect();
    let rows = rows
        .iter()
        .map(|row| kept.iter().map(|&i| row.get(i).cloned().unwrap_or_default()).collect())
        .collect();
    (headers, rows)
}

/// Serialize a table into an export file.
///
/// `rows` is ignored when `options.selected_rows` is set. Zero rows produce a
/// header-only file.
pub fn serialize(
    format: ExportFormat,
    headers: &[String],
    rows: &[Vec<Value>],
    stem: &str,
    options: &ExportOptions,
) -> Result<ExportFile, ExportError> {
    let source = options.selected_rows.as_deref().unwrap_or(rows);
    let (headers, rows) = project(headers, source, options.visible_indices.as_deref());

    let file = match format {
        ExportFormat::Csv => {
            let bytes = crate::csv::write(&headers, &rows, options.line_ending).map_err(ExportError::Csv)?;
            ExportFile::new(stem, format, bytes)
        }
        ExportFormat::Xlsx => {
            let bytes = crate::xlsx::write(&headers, &rows, options.sheet_name.as_deref()).map_err(ExportError::Xlsx)?;
            ExportFile::new(stem, format, bytes)
        }
        ExportFormat::Json => {
            let bytes = crate::json::write(&headers, &rows).map_err(ExportError::Json)?;
            ExportFile::new(stem, format, bytes)
        }
        ExportFormat::Pdf => {
            if !options.degrade_unsupported {
                return Err(ExportError::UnsupportedFormat(format));
            }
            let warning = ExportWarning::Degraded {
                requested: format,
                produced: ExportFormat::Csv,
            };
            log::warn!("{}", warning);
            let bytes = crate::csv::write(&headers, &rows, options.line_ending).map_err(ExportError::Csv)?;
            let mut file = ExportFile::new(stem, ExportFormat::Csv, bytes);
            file.warnings.push(warning);
            file
        }
    };

    log::debug!("export {}: {} row(s), {} byte(s)", file.filename, rows.len(), file.bytes.len());
    Ok(file)
}

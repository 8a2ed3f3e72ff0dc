// Table settings
// Loaded from ~/.config/tabula/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tabula_core::Density;

/// Line terminator used between exported CSV records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    // Paging
    #[serde(rename = "table.defaultPageSize")]
    pub default_page_size: usize,

    #[serde(rename = "table.pageSizeOptions")]
    pub page_size_options: Vec<usize>,

    // Rendering
    #[serde(rename = "table.rowHeightCompact")]
    pub row_height_compact: u32,

    #[serde(rename = "table.rowHeightComfortable")]
    pub row_height_comfortable: u32,

    #[serde(rename = "table.overscan")]
    pub overscan: usize,

    #[serde(rename = "table.defaultDensity")]
    pub default_density: Density,

    // Export
    #[serde(rename = "export.lineEnding")]
    pub export_line_ending: LineEnding,

    /// Allow unimplemented export formats to fall back to CSV (with a warning)
    #[serde(rename = "export.degradeUnsupported")]
    pub export_degrade_unsupported: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            // Paging
            default_page_size: 10,
            page_size_options: vec![10, 20, 50],
            // Rendering
            row_height_compact: 40,
            row_height_comfortable: 48,
            overscan: 6,
            default_density: Density::Comfortable,
            // Export
            export_line_ending: LineEnding::Lf,
            export_degrade_unsupported: false,
        }
    }
}

impl TableSettings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabula")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`, falling back to defaults.
    ///
    /// Lines starting with `//` are treated as comments.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                return Self::default();
            }
        };

        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        match serde_json::from_str::<Self>(&cleaned) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Row height in pixels for a density
    pub fn row_height(&self, density: Density) -> u32 {
        match density {
            Density::Compact => self.row_height_compact,
            Density::Comfortable => self.row_height_comfortable,
        }
    }

    // Zero page sizes would make every page empty; clamp instead of rejecting
    fn sanitized(mut self) -> Self {
        self.default_page_size = self.default_page_size.max(1);
        self.page_size_options.retain(|&n| n > 0);
        if self.page_size_options.is_empty() {
            self.page_size_options = vec![self.default_page_size];
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let settings = TableSettings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, TableSettings::default());
    }

    #[test]
    fn test_partial_file_with_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
    // Paging
    "table.defaultPageSize": 20,
    "export.lineEnding": "crlf"
}"#,
        )
        .unwrap();

        let settings = TableSettings::load_from(&path);
        assert_eq!(settings.default_page_size, 20);
        assert_eq!(settings.export_line_ending, LineEnding::Crlf);
        assert_eq!(settings.row_height(Density::Compact), 40);
        assert_eq!(settings.row_height(Density::Comfortable), 48);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"table.defaultPageSize": 0, "table.pageSizeOptions": [0]}"#).unwrap();

        let settings = TableSettings::load_from(&path);
        assert_eq!(settings.default_page_size, 1);
        assert_eq!(settings.page_size_options, vec![1]);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let settings = TableSettings { overscan: 3, ..TableSettings::default() };
        settings.save_to(&path).unwrap();
        assert_eq!(TableSettings::load_from(&path), settings);
    }
}

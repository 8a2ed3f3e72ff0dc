//! Column visibility and row density.

use tabula_config::{Namespace, PersistedValue, SharedStore, TableSettings};
use tabula_core::{Column, Density};

/// Which columns render, and how tightly rows are spaced.
///
/// The visible set is an ordered subset of the schema keys (always in schema
/// order). Empty is legal. `hide_all` hides action columns too; callers that
/// want an always-on action column simply render it regardless.
#[derive(Debug)]
pub struct ColumnVisibility {
    all: Vec<String>,
    visible: Vec<String>,
    density: Density,
    persisted_visible: Option<PersistedValue<Vec<String>>>,
    persisted_density: Option<PersistedValue<Density>>,
}

impl ColumnVisibility {
    /// All columns visible, comfortable density.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let all: Vec<String> = keys.into_iter().map(Into::into).collect();
        Self {
            visible: all.clone(),
            all,
            density: Density::default(),
            persisted_visible: None,
            persisted_density: None,
        }
    }

    pub fn from_columns<R>(columns: &[Column<R>]) -> Self {
        Self::new(columns.iter().map(|c| c.key.clone()))
    }

    /// Visibility and density mirrored under `<ns>:columns` and `<ns>:density`.
    ///
    /// Stored keys that are no longer in the schema are dropped.
    pub fn persisted<R>(store: SharedStore, ns: &Namespace, columns: &[Column<R>]) -> Self {
        let mut this = Self::from_columns(columns);
        let visible = PersistedValue::new(store.clone(), ns.key("columns"), this.all.clone());
        let density = PersistedValue::new(store, ns.key("density"), Density::default());

        this.visible = this.in_schema_order(visible.get().iter().map(String::as_str));
        this.density = *density.get();
        this.persisted_visible = Some(visible);
        this.persisted_density = Some(density);
        this
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn is_visible(&self, key: &str) -> bool {
        self.visible.iter().any(|k| k == key)
    }

    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn row_height(&self, settings: &TableSettings) -> u32 {
        settings.row_height(self.density)
    }

    /// The visible subset of `columns`, in schema order.
    pub fn visible_columns<'a, R>(&self, columns: &'a [Column<R>]) -> Vec<&'a Column<R>> {
        columns.iter().filter(|c| self.is_visible(&c.key)).collect()
    }

    /// Positions within `keys` that are visible.
    ///
    /// `keys` is the column order of an export; the result feeds the export
    /// pipeline's `visible_indices` option.
    pub fn visible_indices(&self, keys: &[&str]) -> Vec<usize> {
        keys.iter()
            .enumerate()
            .filter(|(_, key)| self.is_visible(key))
            .map(|(i, _)| i)
            .collect()
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Show or hide one column. Unknown keys are ignored.
    pub fn toggle(&mut self, key: &str) {
        if !self.all.iter().any(|k| k == key) {
            return;
        }
        let next: Vec<String> = if self.is_visible(key) {
            self.visible.iter().filter(|k| *k != key).cloned().collect()
        } else {
            let keys = self.visible.iter().map(String::as_str).chain(std::iter::once(key));
            self.in_schema_order(keys)
        };
        self.store_visible(next);
    }

    pub fn show_all(&mut self) {
        self.store_visible(self.all.clone());
    }

    pub fn hide_all(&mut self) {
        self.store_visible(Vec::new());
    }

    /// Replace the visible set (saved views). Unknown keys are dropped.
    pub fn set_visible<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let next = self.in_schema_order(keys);
        self.store_visible(next);
    }

    pub fn set_density(&mut self, density: Density) {
        self.density = density;
        if let Some(persisted) = &mut self.persisted_density {
            persisted.set(density);
        }
    }

    fn in_schema_order<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let wanted: Vec<&str> = keys.into_iter().collect();
        self.all
            .iter()
            .filter(|k| wanted.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    fn store_visible(&mut self, visible: Vec<String>) {
        if let Some(persisted) = &mut self.persisted_visible {
            persisted.set(visible.clone());
        }
        self.visible = visible;
    }
}

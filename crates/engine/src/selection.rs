//! Selection Manager - multi-select over row ids.
//!
//! The selected set is always a subset of the candidate universe (the ids
//! reachable under the current filter). Whenever the universe changes the set
//! is re-intersected; ids that fell out are dropped without any error.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use tabula_config::{PersistedValue, SharedStore, StoreKey};
use tabula_core::{Record, RowId};

/// Tri-state for a "select page" header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    /// Some, but not all, page rows are selected (`aria-checked="mixed"`)
    Indeterminate,
    Checked,
}

pub struct Selection<Id = RowId> {
    selected: BTreeSet<Id>,
    /// None until the caller supplies one; then every id must belong to it
    universe: Option<BTreeSet<Id>>,
    persisted: Option<PersistedValue<Vec<Id>>>,
}

impl<Id> Default for Selection<Id> {
    fn default() -> Self {
        Self {
            selected: BTreeSet::new(),
            universe: None,
            persisted: None,
        }
    }
}

impl<Id: fmt::Debug> fmt::Debug for Selection<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("selected", &self.selected)
            .field("universe", &self.universe.as_ref().map(BTreeSet::len))
            .field("persisted", &self.persisted.as_ref().map(|p| p.key().as_str().to_string()))
            .finish()
    }
}

impl<Id> Selection<Id>
where
    Id: Ord + Clone + Serialize + DeserializeOwned,
{
    /// In-memory selection with no universe yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection mirrored into `store`.
    ///
    /// Previously stored ids are rehydrated, keeping only those present in
    /// `universe`.
    pub fn persisted(store: SharedStore, key: StoreKey<Vec<Id>>, universe: impl IntoIterator<Item = Id>) -> Self {
        let persisted = PersistedValue::new(store, key, Vec::new());
        let universe: BTreeSet<Id> = universe.into_iter().collect();
        let stored = persisted.get().len();
        let selected: BTreeSet<Id> = persisted
            .get()
            .iter()
            .filter(|id| universe.contains(*id))
            .cloned()
            .collect();
        // Only rewrite when rehydration dropped something
        let pruned = selected.len() != stored;

        let mut selection = Self {
            selected,
            universe: Some(universe),
            persisted: Some(persisted),
        };
        if pruned {
            selection.persist();
        }
        selection
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn is_selected(&self, id: &Id) -> bool {
        self.selected.contains(id)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// True only when the universe is non-empty and entirely selected.
    pub fn all_selected(&self) -> bool {
        match &self.universe {
            Some(universe) => !universe.is_empty() && universe.iter().all(|id| self.selected.contains(id)),
            None => false,
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = &Id> + '_ {
        self.selected.iter()
    }

    pub fn selected_ids(&self) -> Vec<Id> {
        self.selected.iter().cloned().collect()
    }

    pub fn universe(&self) -> Option<&BTreeSet<Id>> {
        self.universe.as_ref()
    }

    /// Header checkbox state for the rows on the current page.
    pub fn page_check_state(&self, page_ids: &[Id]) -> CheckState {
        let hits = page_ids.iter().filter(|id| self.selected.contains(*id)).count();
        if !page_ids.is_empty() && hits == page_ids.len() {
            CheckState::Checked
        } else if hits > 0 {
            CheckState::Indeterminate
        } else {
            CheckState::Unchecked
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Replace the candidate universe and prune the selection to it.
    pub fn set_universe(&mut self, ids: impl IntoIterator<Item = Id>) {
        let universe: BTreeSet<Id> = ids.into_iter().collect();
        let before = self.selected.len();
        self.selected.retain(|id| universe.contains(id));
        self.universe = Some(universe);
        if self.selected.len() != before {
            log::debug!("selection pruned {} stale id(s)", before - self.selected.len());
            self.persist();
        }
    }

    pub fn toggle(&mut self, id: Id) {
        if !self.selected.remove(&id) {
            if !self.in_universe(&id) {
                return;
            }
            self.selected.insert(id);
        }
        self.persist();
    }

    pub fn select_many(&mut self, ids: impl IntoIterator<Item = Id>) {
        let mut changed = false;
        for id in ids {
            if self.in_universe(&id) {
                changed |= self.selected.insert(id);
            }
        }
        if changed {
            self.persist();
        }
    }

    pub fn deselect_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a Id>)
    where
        Id: 'a,
    {
        let mut changed = false;
        for id in ids {
            changed |= self.selected.remove(id);
        }
        if changed {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.persist();
    }

    /// Header checkbox click: deselect the page if it is fully selected,
    /// otherwise select every page row.
    pub fn toggle_page(&mut self, page_ids: &[Id]) {
        if self.page_check_state(page_ids) == CheckState::Checked {
            self.deselect_many(page_ids);
        } else {
            self.select_many(page_ids.iter().cloned());
        }
    }

    fn in_universe(&self, id: &Id) -> bool {
        self.universe.as_ref().map_or(true, |u| u.contains(id))
    }

    fn persist(&mut self) {
        if let Some(persisted) = &mut self.persisted {
            persisted.set(self.selected.iter().cloned().collect());
        }
    }
}

impl Selection<RowId> {
    /// Selected records, in `rows` order ("export selected only").
    pub fn selected_rows<'a, R: Record>(&self, rows: &[&'a R]) -> Vec<&'a R> {
        rows.iter()
            .copied()
            .filter(|row| self.selected.contains(&row.id()))
            .collect()
    }
}

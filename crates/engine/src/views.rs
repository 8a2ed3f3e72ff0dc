//! Saved View Registry
//!
//! Named, persisted snapshots of a table's configuration. The registry
//! treats payloads as opaque JSON; [`TableSnapshot`] is the standard payload
//! shape with an explicit version tag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use tabula_config::{Namespace, PersistedValue, SharedStore};
use tabula_core::{Density, SortDirection};

use crate::columns::ColumnVisibility;
use crate::query::{Facets, QueryState};

// =============================================================================
// Registry
// =============================================================================

/// name -> payload, stored as one unit under `<namespace>:savedViews`.
#[derive(Debug)]
pub struct SavedViews {
    views: PersistedValue<BTreeMap<String, Json>>,
}

impl SavedViews {
    pub fn new(store: SharedStore, ns: &Namespace) -> Self {
        Self {
            views: PersistedValue::new(store, ns.key("savedViews"), BTreeMap::new()),
        }
    }

    /// View names, sorted
    pub fn list(&self) -> Vec<&str> {
        self.views.get().keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.views.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.get().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.views.get().contains_key(name.trim())
    }

    /// Store `payload` under `name`, overwriting any existing view.
    ///
    /// Names are trimmed; a blank name is rejected (returns false).
    pub fn save(&mut self, name: &str, payload: Json) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let name = name.to_string();
        self.views.update(|views| {
            views.insert(name, payload);
        });
        true
    }

    /// Payload of a saved view, `None` when no view has that name.
    ///
    /// Does not touch any other controller; feed the payload back yourself
    /// (see [`TableSnapshot::restore_into`]).
    pub fn apply(&self, name: &str) -> Option<&Json> {
        self.views.get().get(name.trim())
    }

    /// Delete a view. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        if !self.views.get().contains_key(name) {
            return false;
        }
        self.views.update(|views| {
            views.remove(name);
        });
        true
    }
}

// =============================================================================
// TableSnapshot
// =============================================================================

pub const SNAPSHOT_VERSION: u32 = 1;

/// Standard saved-view payload.
///
/// Every field is optional so partially written or older payloads still
/// restore whatever they carry. Payloads without a version tag are read as
/// version 0; payloads from a newer version are refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<SortDirection>,
    /// The view was saved without a sort; restoring it clears any active sort
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unsorted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<Density>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Facets>,
}

impl TableSnapshot {
    /// Capture the current query and column configuration.
    pub fn capture(query: &QueryState, columns: &ColumnVisibility) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            query: Some(query.query().to_string()),
            sort_key: query.sort_key().map(str::to_string),
            sort_dir: query.sort_key().map(|_| query.sort_dir()),
            unsorted: query.sort_key().is_none(),
            page_size: Some(query.page_size()),
            density: Some(columns.density()),
            visible: Some(columns.visible().to_vec()),
            facets: Some(query.facets().clone()),
        }
    }

    pub fn to_payload(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }

    /// Decode leniently: each field is read on its own and dropped when it
    /// has the wrong type. `None` for non-objects and newer versions.
    pub fn from_payload(payload: &Json) -> Option<Self> {
        let obj = payload.as_object()?;

        // Versions beyond u32 are newer than anything supported
        let version = match obj.get("version").and_then(Json::as_u64) {
            Some(raw) => u32::try_from(raw).ok(),
            None => Some(0),
        };
        let Some(version) = version.filter(|v| *v <= SNAPSHOT_VERSION) else {
            log::warn!(
                "Saved view version {} is newer than supported {}",
                obj.get("version").unwrap_or(&Json::Null),
                SNAPSHOT_VERSION
            );
            return None;
        };

        fn field<T: serde::de::DeserializeOwned>(obj: &serde_json::Map<String, Json>, names: &[&str]) -> Option<T> {
            names
                .iter()
                .find_map(|name| obj.get(*name))
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }

        Some(Self {
            version,
            query: field(obj, &["query", "q"]),
            sort_key: field(obj, &["sortKey"]),
            sort_dir: field(obj, &["sortDir"]),
            unsorted: field(obj, &["unsorted"]).unwrap_or(false) || obj.get("sortKey") == Some(&Json::Null),
            page_size: field(obj, &["pageSize"]),
            density: field(obj, &["density"]),
            visible: field(obj, &["visible"]),
            facets: field(obj, &["facets"]).or_else(|| {
                // Version 0 payloads stored a bare status filter list
                let statuses: Vec<String> = field(obj, &["statusFilters"])?;
                let mut facets = Facets::new();
                if !statuses.is_empty() {
                    facets.insert("status".to_string(), statuses.into_iter().collect());
                }
                Some(facets)
            }),
        })
    }

    /// Feed the snapshot back into the controllers. Missing fields leave the
    /// corresponding setting alone, except the query which is cleared. An
    /// unsorted snapshot clears the sort. The page always returns to 1.
    pub fn restore_into(&self, query: &mut QueryState, columns: &mut ColumnVisibility) {
        query.set_query(self.query.clone().unwrap_or_default());
        if self.unsorted {
            query.clear_sort();
        } else if let (Some(key), Some(dir)) = (&self.sort_key, self.sort_dir) {
            query.set_sort(key.clone(), dir);
        }
        if let Some(page_size) = self.page_size {
            query.set_page_size(page_size);
        }
        if let Some(facets) = &self.facets {
            query.set_facets(facets.clone());
        }
        if let Some(density) = self.density {
            columns.set_density(density);
        }
        if let Some(visible) = &self.visible {
            columns.set_visible(visible.iter().map(String::as_str));
        }
        query.set_page(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_config::{MemoryStore, Store};

    fn registry() -> (SharedStore, SavedViews) {
        let store = MemoryStore::shared();
        let views = SavedViews::new(store.clone(), &Namespace::new("admin:users"));
        (store, views)
    }

    #[test]
    fn test_save_list_apply_remove() {
        let (_, mut views) = registry();
        assert!(views.save("Open only", json!({"query": "open"})));
        assert!(views.save("All", json!({})));
        assert_eq!(views.list(), vec!["All", "Open only"]);
        assert_eq!(views.apply("Open only"), Some(&json!({"query": "open"})));

        assert!(views.remove("All"));
        assert!(!views.remove("All"));
        assert_eq!(views.list(), vec!["Open only"]);
    }

    #[test]
    fn test_missing_view_is_not_found() {
        let (_, views) = registry();
        assert_eq!(views.apply("ghost"), None);
    }

    #[test]
    fn test_save_overwrites_on_collision() {
        let (_, mut views) = registry();
        views.save("Mine", json!({"pageSize": 10}));
        views.save("Mine", json!({"pageSize": 50}));
        assert_eq!(views.len(), 1);
        assert_eq!(views.apply("Mine"), Some(&json!({"pageSize": 50})));
    }

    #[test]
    fn test_blank_name_rejected() {
        let (_, mut views) = registry();
        assert!(!views.save("   ", json!({})));
        assert!(views.is_empty());
    }

    #[test]
    fn test_registries_coexist_in_one_store() {
        let (store, mut users) = registry();
        let mut invoices = SavedViews::new(store.clone(), &Namespace::new("client:invoices"));
        users.save("a", json!(1));
        invoices.save("b", json!(2));

        assert_eq!(store.get("admin:users:savedViews"), Some(json!({"a": 1})));
        assert_eq!(store.get("client:invoices:savedViews"), Some(json!({"b": 2})));

        let reopened = SavedViews::new(store, &Namespace::new("admin:users"));
        assert_eq!(reopened.list(), vec!["a"]);
    }

    #[test]
    fn test_snapshot_capture_and_restore() {
        let mut query = QueryState::new().with_sort("bidAmount", SortDirection::Desc);
        query.set_query("acme");
        query.set_page_size(20);
        query.toggle_facet("status", "Draft");
        let mut columns = ColumnVisibility::new(["jobTitle", "status", "bidAmount"]);
        columns.toggle("status");
        columns.set_density(Density::Compact);

        let payload = TableSnapshot::capture(&query, &columns).to_payload();
        assert_eq!(payload["version"], json!(SNAPSHOT_VERSION));

        let mut fresh_query = QueryState::new();
        fresh_query.set_page(5);
        let mut fresh_columns = ColumnVisibility::new(["jobTitle", "status", "bidAmount"]);
        TableSnapshot::from_payload(&payload)
            .unwrap()
            .restore_into(&mut fresh_query, &mut fresh_columns);

        assert_eq!(fresh_query.query(), "acme");
        assert_eq!(fresh_query.sort_value().as_deref(), Some("bidAmount:desc"));
        assert_eq!(fresh_query.page_size(), 20);
        assert_eq!(fresh_query.page(), 1);
        assert_eq!(fresh_query.facets(), query.facets());
        assert_eq!(fresh_columns.visible(), columns.visible());
        assert_eq!(fresh_columns.density(), Density::Compact);
    }

    #[test]
    fn test_unversioned_payload_is_read_leniently() {
        let payload = json!({
            "q": "design",
            "sortKey": "status",
            "sortDir": "sideways",
            "pageSize": "twenty",
            "statusFilters": ["Draft", "Submitted"]
        });
        let snap = TableSnapshot::from_payload(&payload).unwrap();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.query.as_deref(), Some("design"));
        assert_eq!(snap.sort_dir, None);
        assert_eq!(snap.page_size, None);
        assert_eq!(snap.facets.unwrap()["status"].len(), 2);
    }

    #[test]
    fn test_newer_version_refused() {
        assert_eq!(TableSnapshot::from_payload(&json!({"version": 99})), None);
        assert_eq!(TableSnapshot::from_payload(&json!("not an object")), None);
        // Would wrap to 1 if truncated to u32
        assert_eq!(TableSnapshot::from_payload(&json!({"version": 4_294_967_297u64})), None);
        assert_eq!(TableSnapshot::from_payload(&json!({"version": 1})).unwrap().version, 1);
    }

    #[test]
    fn test_unsorted_view_clears_active_sort() {
        let columns = ColumnVisibility::new(["a", "b"]);
        let payload = TableSnapshot::capture(&QueryState::new(), &columns).to_payload();
        assert_eq!(payload["unsorted"], json!(true));

        let mut query = QueryState::new().with_sort("a", SortDirection::Desc);
        let mut target = ColumnVisibility::new(["a", "b"]);
        TableSnapshot::from_payload(&payload)
            .unwrap()
            .restore_into(&mut query, &mut target);
        assert_eq!(query.sort_value(), None);

        // An explicit null sort key means the same
        let mut query = QueryState::new().with_sort("b", SortDirection::Asc);
        TableSnapshot::from_payload(&json!({"sortKey": null}))
            .unwrap()
            .restore_into(&mut query, &mut target);
        assert_eq!(query.sort_value(), None);

        // A snapshot that simply omits the sort leaves it alone
        let mut query = QueryState::new().with_sort("b", SortDirection::Asc);
        TableSnapshot::from_payload(&json!({"query": "x"}))
            .unwrap()
            .restore_into(&mut query, &mut target);
        assert_eq!(query.sort_value().as_deref(), Some("b:asc"));
    }
}

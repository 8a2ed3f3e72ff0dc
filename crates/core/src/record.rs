//! Record abstraction: the row shape the engine is generic over.

use std::collections::{BTreeMap, HashMap};

use crate::value::Value;

/// Application-supplied row identifier (selection and render keys).
pub type RowId = String;

/// Field name of the identifier used by the default [`Record::id`].
pub const ID_FIELD: &str = "id";

/// One opaque data record displayed in a table.
///
/// The engine never inspects a record beyond these three accessors. Typed
/// application rows implement it by hand; dynamic rows (maps) get it for free.
pub trait Record {
    /// Value of a named field. Unknown fields are [`Value::Empty`].
    fn field(&self, key: &str) -> Value;

    /// Every field value, in any order. Used by global text search.
    fn values(&self) -> Vec<Value>;

    /// Row identity. Defaults to the string form of the `id` field.
    fn id(&self) -> RowId {
        self.field(ID_FIELD).display_string()
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or_default()
    }

    fn values(&self) -> Vec<Value> {
        BTreeMap::values(self).cloned().collect()
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or_default()
    }

    fn values(&self) -> Vec<Value> {
        HashMap::values(self).cloned().collect()
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, key: &str) -> Value {
        self.get(key).map(Value::from_json).unwrap_or_default()
    }

    fn values(&self) -> Vec<Value> {
        serde_json::Map::values(self).map(Value::from_json).collect()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, key: &str) -> Value {
        (**self).field(key)
    }

    fn values(&self) -> Vec<Value> {
        (**self).values()
    }

    fn id(&self) -> RowId {
        (**self).id()
    }
}

/// Build a map-backed record from `(field, value)` pairs.
pub fn record<K, V, I>(fields: I) -> BTreeMap<String, Value>
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

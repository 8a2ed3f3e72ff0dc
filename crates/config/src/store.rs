//! Persisted value store.
//!
//! Every table controller remembers user preferences (query, sort, page size,
//! selection, visible columns, saved views) through one key-value store. Keys
//! are built from a [`Namespace`] so two tables never collide, and carry the
//! stored type so a key can only be read back as what was written.
//!
//! Values are kept as `serde_json::Value`. Writes are last-write-wins.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum StoreError {
    /// File read/write failure.
    Io(String),
    /// Value could not be converted to or from JSON.
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "store IO error: {msg}"),
            Self::Serialize(msg) => write!(f, "store serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

// =============================================================================
// Store trait and implementations
// =============================================================================

/// Key-value storage surviving reloads.
pub trait Store: Send + Sync {
    /// Stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> Option<Json>;

    fn set(&self, key: &str, value: Json) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Handle shared by every controller of a page.
pub type SharedStore = Arc<dyn Store>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Json>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<Json> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Json) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk.
///
/// The document is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Json>>,
}

impl FileStore {
    /// Default location: `<config_dir>/tabula/state.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabula")
            .join("state.json")
    }

    /// Open the store at the default location.
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// also opened empty, with a warning; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, Json>>(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Ignoring corrupt state file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("Cannot read state file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self { path, entries: Mutex::new(entries) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, Json>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<Json> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Json) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}

// =============================================================================
// Typed, namespaced keys
// =============================================================================

/// Key prefix owned by one table (e.g. `freelancer:proposals`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nested namespace: `a:b` + `c` -> `a:b:c`
    pub fn child(&self, name: &str) -> Namespace {
        Namespace(format!("{}:{}", self.0, name))
    }

    /// Typed key inside this namespace.
    pub fn key<T>(&self, name: &str) -> StoreKey<T> {
        StoreKey::new(format!("{}:{}", self.0, name))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store key that remembers the type stored under it.
pub struct StoreKey<T> {
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StoreKey<T> {
    fn new(key: String) -> Self {
        Self { key, _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl<T> Clone for StoreKey<T> {
    fn clone(&self) -> Self {
        Self::new(self.key.clone())
    }
}

impl<T> fmt::Debug for StoreKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreKey({})", self.key)
    }
}

impl<T: Serialize + DeserializeOwned> StoreKey<T> {
    /// Read and decode. Absent keys and undecodable values both yield `None`;
    /// the latter is logged.
    pub fn load(&self, store: &dyn Store) -> Option<T> {
        let raw = store.get(&self.key)?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Discarding undecodable value for '{}': {}", self.key, e);
                None
            }
        }
    }

    pub fn save(&self, store: &dyn Store, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_value(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
        store.set(&self.key, json)
    }

    pub fn clear(&self, store: &dyn Store) -> Result<(), StoreError> {
        store.remove(&self.key)
    }
}

// =============================================================================
// PersistedValue
// =============================================================================

/// A value mirrored into a store under a typed key.
///
/// Starts from the stored value when one exists, else from the default.
/// Every `set` writes through; write failures are logged, never returned,
/// so in-memory state always reflects the latest user action.
pub struct PersistedValue<T> {
    store: SharedStore,
    key: StoreKey<T>,
    value: T,
}

impl<T> PersistedValue<T> {
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn key(&self) -> &StoreKey<T> {
        &self.key
    }
}

impl<T: Serialize + DeserializeOwned> PersistedValue<T> {
    pub fn new(store: SharedStore, key: StoreKey<T>, default: T) -> Self {
        let value = key.load(store.as_ref()).unwrap_or(default);
        Self { store, key, value }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.write();
    }

    /// Mutate in place, then write through.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.write();
    }

    fn write(&self) {
        if let Err(e) = self.key.save(self.store.as_ref(), &self.value) {
            log::warn!("Failed to persist '{}': {}", self.key.as_str(), e);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedValue")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

// Configuration and persisted user preferences

pub mod settings;
pub mod store;

pub use settings::{LineEnding, TableSettings};
pub use store::{
    FileStore, MemoryStore, Namespace, PersistedValue, SharedStore, Store, StoreError, StoreKey,
};

//! Store bootstrap configuration.
//!
//! # Invariants
//! - `storage_key` is never blank.
//! - `db_path = None` means an in-memory database for this process only.

use crate::storage::{
    JsonKvAdapter, SqliteKeyValueStore, StorageError, StorageResult, DEFAULT_STORAGE_KEY,
};
use crate::store::todo_store::TodoStore;
use std::path::PathBuf;

/// Store backed by the SQLite key-value backend.
pub type SqliteTodoStore = TodoStore<JsonKvAdapter<SqliteKeyValueStore>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
    pub db_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            db_path: None,
        }
    }
}

impl StoreConfig {
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(db_path.into()),
            ..Self::default()
        }
    }

    /// Opens the backend and loads the saved collection.
    ///
    /// # Errors
    /// - Returns an error when `storage_key` is blank.
    /// - Returns an error when the database cannot be opened or migrated.
    ///   A corrupt stored document is not an error; the store starts empty.
    pub fn open_store(&self) -> StorageResult<SqliteTodoStore> {
        let key = self.storage_key.trim();
        if key.is_empty() {
            return Err(StorageError::InvalidKey(self.storage_key.clone()));
        }

        let backend = match &self.db_path {
            Some(path) => SqliteKeyValueStore::open(path)?,
            None => SqliteKeyValueStore::open_in_memory()?,
        };
        Ok(TodoStore::open(JsonKvAdapter::with_key(backend, key)))
    }
}

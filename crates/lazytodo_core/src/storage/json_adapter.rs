//! JSON document adapter over a key-value backend.
//!
//! # Responsibility
//! - Serialize the ordered collection as one JSON array under one key.
//! - Translate absent keys into "nothing saved".
//! - Drop individual invalid records on load instead of the whole document.
//!
//! # Invariants
//! - Record order in the document equals collection order.
//! - `save(&[])` removes the key instead of writing `[]`.

use super::{KeyValueStore, PersistenceAdapter, StorageError, StorageResult};
use crate::model::todo::TodoRecord;
use log::{debug, warn};

/// Key the collection is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "todos";

pub struct JsonKvAdapter<K: KeyValueStore> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> JsonKvAdapter<K> {
    /// Creates an adapter using [`DEFAULT_STORAGE_KEY`].
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }
}

impl<K: KeyValueStore> PersistenceAdapter for JsonKvAdapter<K> {
    fn load(&self) -> StorageResult<Option<Vec<TodoRecord>>> {
        let Some(raw) = self.backend.get(&self.key)? else {
            return Ok(None);
        };
        let entries = serde_json::from_str::<Vec<serde_json::Value>>(&raw).map_err(|source| {
            StorageError::Decode {
                key: self.key.clone(),
                source,
            }
        })?;

        let total = entries.len();
        let todos = entries
            .into_iter()
            .enumerate()
            .filter_map(|(position, entry)| match serde_json::from_value::<TodoRecord>(entry) {
                Ok(todo) => Some(todo),
                Err(err) => {
                    warn!(
                        "event=storage_load module=storage status=skipped key={} position={} error={}",
                        self.key, position, err
                    );
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(
            "event=storage_load module=storage status=ok key={} count={} skipped={}",
            self.key,
            todos.len(),
            total - todos.len()
        );
        Ok(Some(todos))
    }

    fn save(&self, todos: &[TodoRecord]) -> StorageResult<()> {
        if todos.is_empty() {
            return self.clear();
        }
        let document = serde_json::to_string(todos).map_err(StorageError::Encode)?;
        self.backend.set(&self.key, &document)?;
        debug!(
            "event=storage_save module=storage status=ok key={} count={} bytes={}",
            self.key,
            todos.len(),
            document.len()
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.backend.remove(&self.key)?;
        debug!("event=storage_clear module=storage status=ok key={}", self.key);
        Ok(())
    }
}

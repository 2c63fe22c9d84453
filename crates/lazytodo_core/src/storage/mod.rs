//! Persistence boundary for the todo collection.
//!
//! # Responsibility
//! - Define the adapter contract the store synchronizes with.
//! - Define the durable key-value capability adapters are written against.
//!
//! # Invariants
//! - The whole collection is one document under one key.
//! - An empty collection is never written; its key is removed instead.

use crate::db::DbError;
use crate::model::todo::TodoRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod json_adapter;
pub mod kv_memory;
pub mod kv_sqlite;

pub use json_adapter::{JsonKvAdapter, DEFAULT_STORAGE_KEY};
pub use kv_memory::MemoryKeyValueStore;
pub use kv_sqlite::SqliteKeyValueStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure while reading or writing the persisted collection.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Encode(serde_json::Error),
    /// Stored value exists but is not a valid todo document.
    Decode {
        key: String,
        source: serde_json::Error,
    },
    /// Storage key is blank after trimming.
    InvalidKey(String),
    /// Backend cannot be reached (poisoned lock, closed handle).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode todo list: {err}"),
            Self::Decode { key, source } => {
                write!(f, "stored value under `{key}` is not a todo list: {source}")
            }
            Self::InvalidKey(key) => {
                write!(f, "invalid storage key `{key}`: key cannot be blank")
            }
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
            Self::InvalidKey(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Load/save/clear contract the todo store depends on.
pub trait PersistenceAdapter {
    /// Returns the saved collection, or `None` when nothing is stored.
    fn load(&self) -> StorageResult<Option<Vec<TodoRecord>>>;
    /// Overwrites the stored collection. Empty input behaves like `clear`.
    fn save(&self, todos: &[TodoRecord]) -> StorageResult<()>;
    /// Removes the stored collection entirely.
    fn clear(&self) -> StorageResult<()>;
}

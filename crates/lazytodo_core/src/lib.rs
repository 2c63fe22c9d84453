//! Core state management for LazyTodo.
//! This crate is the single source of truth for todo-list invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;

pub use config::{SqliteTodoStore, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{TodoId, TodoRecord, TodoValidationError, CREATED_AT_FORMAT};
pub use storage::{
    JsonKvAdapter, KeyValueStore, MemoryKeyValueStore, PersistenceAdapter, SqliteKeyValueStore,
    StorageError, StorageResult, DEFAULT_STORAGE_KEY,
};
pub use store::todo_store::{
    EditSession, MutationOutcome, StoreError, StoreResult, SyncStatus, TodoCounts, TodoStore,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

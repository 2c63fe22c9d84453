use lazytodo_core::{
    JsonKvAdapter, KeyValueStore, MemoryKeyValueStore, PersistenceAdapter, SqliteKeyValueStore,
    StorageError, StorageResult, StoreConfig, SyncStatus, TodoStore, DEFAULT_STORAGE_KEY,
};
use std::cell::Cell;

/// Backend whose writes fail until `healthy` is set.
#[derive(Default)]
struct FlakyBackend {
    inner: MemoryKeyValueStore,
    healthy: Cell<bool>,
}

impl KeyValueStore for FlakyBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if !self.healthy.get() {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }
}

/// Adapter counting `load` calls.
struct CountingAdapter {
    loads: Cell<usize>,
}

impl PersistenceAdapter for CountingAdapter {
    fn load(&self) -> StorageResult<Option<Vec<lazytodo_core::TodoRecord>>> {
        self.loads.set(self.loads.get() + 1);
        Ok(None)
    }

    fn save(&self, _todos: &[lazytodo_core::TodoRecord]) -> StorageResult<()> {
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[test]
fn open_loads_exactly_once() {
    let mut store = TodoStore::open(CountingAdapter {
        loads: Cell::new(0),
    });
    store.add("a", "").unwrap();
    store.remove_all().unwrap();
    assert_eq!(store.adapter().loads.get(), 1);
}

#[test]
fn saved_collection_reloads_equal_on_fresh_store() {
    let backend = MemoryKeyValueStore::new();
    let mut store = TodoStore::open(JsonKvAdapter::new(backend.clone()));
    store.add("a", "first").unwrap();
    store.add("b", "").unwrap();
    store.add("c", "third").unwrap();
    store.toggle_completed(1);
    store.begin_edit(2);
    store.update_pending("c edited", "third edited").unwrap();
    store.commit_edit().unwrap();

    let reopened = TodoStore::open(JsonKvAdapter::new(backend));

    assert_eq!(reopened.todos(), store.todos());
}

#[test]
fn remove_all_clears_persisted_value() {
    let backend = MemoryKeyValueStore::new();
    let mut store = TodoStore::open(JsonKvAdapter::new(backend.clone()));
    store.add("a", "").unwrap();
    assert!(backend.get(DEFAULT_STORAGE_KEY).unwrap().is_some());

    store.remove_all().unwrap();

    assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    let reopened = TodoStore::open(JsonKvAdapter::new(backend));
    assert!(reopened.is_empty());
}

#[test]
fn buy_milk_scenario_ends_with_cleared_storage() {
    let backend = MemoryKeyValueStore::new();
    let mut store = TodoStore::open(JsonKvAdapter::new(backend.clone()));
    assert!(store.is_empty());

    store.add("Buy milk", "2% milk").unwrap();
    assert_eq!(store.len(), 1);
    let todo = &store.todos()[0];
    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.body, "2% milk");
    assert!(!todo.completed);

    let stored = backend.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let document: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(document[0]["title"], "Buy milk");

    store.toggle_completed(0);
    assert!(store.todos()[0].completed);

    let outcome = store.remove_completed().unwrap();
    assert!(store.is_empty());
    assert_eq!(outcome.sync, SyncStatus::Cleared);
    assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    assert!(backend.is_empty());
}

#[test]
fn corrupt_document_opens_as_empty_store() {
    let backend = MemoryKeyValueStore::new();
    backend.set(DEFAULT_STORAGE_KEY, "[{\"title\": 42}").unwrap();

    let mut store = TodoStore::open(JsonKvAdapter::new(backend.clone()));
    assert!(store.is_empty());

    store.add("fresh", "").unwrap();
    let reopened = TodoStore::open(JsonKvAdapter::new(backend));
    assert_eq!(reopened.len(), 1);
}

#[test]
fn blank_title_record_does_not_discard_the_rest_of_the_list() {
    let backend = MemoryKeyValueStore::new();
    let document = serde_json::json!([
        {"title": "Pay rent", "body": "", "completed": false, "date": "1/2/2024, 3:04:05 PM"},
        {"title": "   ", "body": "blank", "completed": true, "date": "1/2/2024, 3:04:06 PM"},
        {"title": "Call mom", "body": "Sunday", "completed": false, "date": "1/2/2024, 3:04:07 PM"}
    ]);
    backend.set(DEFAULT_STORAGE_KEY, &document.to_string()).unwrap();

    let mut store = TodoStore::open(JsonKvAdapter::new(backend.clone()));
    let titles = store
        .todos()
        .iter()
        .map(|todo| todo.title.clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Pay rent", "Call mom"]);

    store.add("new", "").unwrap();
    let reopened = TodoStore::open(JsonKvAdapter::new(backend));
    let titles = reopened
        .todos()
        .iter()
        .map(|todo| todo.title.clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Pay rent", "Call mom", "new"]);
}

#[test]
fn remove_all_on_empty_store_clears_stale_value() {
    let backend = MemoryKeyValueStore::new();
    backend.set(DEFAULT_STORAGE_KEY, "{\"stale\": true}").unwrap();

    let mut store = TodoStore::open(JsonKvAdapter::new(backend.clone()));
    assert!(store.is_empty());

    let outcome = store.remove_all().unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.sync, SyncStatus::Cleared);
    assert_eq!(backend.get(DEFAULT_STORAGE_KEY).unwrap(), None);
}

#[test]
fn failed_save_keeps_in_memory_mutation() {
    let mut store = TodoStore::open(JsonKvAdapter::new(FlakyBackend::default()));

    let outcome = store.add("a", "").unwrap();

    assert!(outcome.changed);
    assert!(outcome.sync_failed());
    assert_eq!(store.len(), 1);
    assert!(matches!(
        store.last_sync(),
        Some(SyncStatus::Failed(message)) if message.contains("quota")
    ));

    store.adapter().backend().healthy.set(true);
    let outcome = store.add("b", "").unwrap();
    assert_eq!(outcome.sync, SyncStatus::Saved);

    let healthy_backend = store.adapter().backend().inner.clone();
    let reopened = TodoStore::open(JsonKvAdapter::new(healthy_backend));
    assert_eq!(reopened.todos(), store.todos());
}

#[test]
fn custom_storage_key_is_respected() {
    let backend = MemoryKeyValueStore::new();
    let mut store = TodoStore::open(JsonKvAdapter::with_key(backend.clone(), "work"));
    store.add("a", "").unwrap();

    assert!(backend.get("work").unwrap().is_some());
    assert!(backend.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    assert!(TodoStore::open(JsonKvAdapter::new(backend)).is_empty());
}

#[test]
fn sqlite_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::with_db_path(dir.path().join("todos.sqlite3"));

    let saved = {
        let mut store = config.open_store().unwrap();
        store.add("persisted", "on disk").unwrap();
        store.add("second", "").unwrap();
        store.toggle_completed(0);
        store.snapshot()
    };

    let mut reopened = config.open_store().unwrap();
    assert_eq!(reopened.todos(), &*saved);

    reopened.remove_all().unwrap();
    drop(reopened);
    assert!(config.open_store().unwrap().is_empty());
}

#[test]
fn sqlite_row_is_deleted_when_list_empties() {
    let backend = SqliteKeyValueStore::open_in_memory().unwrap();
    let mut store = TodoStore::open(JsonKvAdapter::new(backend));
    store.add("only", "").unwrap();
    store.remove(0).unwrap();

    let rows: i64 = store
        .adapter()
        .backend()
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn blank_storage_key_is_rejected() {
    let config = StoreConfig {
        storage_key: "  ".to_string(),
        ..StoreConfig::default()
    };
    assert!(matches!(
        config.open_store(),
        Err(StorageError::InvalidKey(key)) if key == "  "
    ));
}

//! FFI todo API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the store's snapshot, edit session and operations to Dart via FRB.
//! - Own the single process-wide store instance.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call observes and mutates the store under one lock.
//! - The database path is fixed once the store has been opened.

use lazytodo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, MutationOutcome,
    SqliteTodoStore, StoreConfig, StoreError, SyncStatus, TodoId, TodoRecord,
};
use log::warn;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Mutex;

const TODO_DB_FILE_NAME: &str = "lazytodo.sqlite3";
const TODO_DB_PATH_ENV: &str = "LAZYTODO_DB_PATH";

static TODO_DB_PATH: OnceCell<PathBuf> = OnceCell::new();
static TODO_STORE: OnceCell<Mutex<SqliteTodoStore>> = OnceCell::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
/// Safe to repeat with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the SQLite file used by the todo store.
///
/// Must run before the first `todo_*` call. Returns an empty string on
/// success, an error message when a different path is already in use.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = TODO_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "todo database already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// One todo row as rendered by the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItemView {
    pub id: String,
    pub index: u32,
    pub title: String,
    pub body: String,
    pub completed: bool,
    /// Display timestamp of creation.
    pub created_at: String,
}

/// Edit form state while a todo is being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEditView {
    pub target_id: String,
    pub target_index: u32,
    pub pending_title: String,
    pub pending_body: String,
}

/// Full UI state envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub items: Vec<TodoItemView>,
    /// `Some` while structure-mutating controls must stay disabled.
    pub editing: Option<TodoEditView>,
    pub completed_count: u32,
    /// Empty on success; otherwise why the state could not be read.
    pub message: String,
}

/// Result envelope for every todo action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    /// Whether the action was accepted.
    pub ok: bool,
    /// Whether the collection changed.
    pub changed: bool,
    pub todo_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TodoActionResponse {
    fn from_outcome(action: &str, outcome: MutationOutcome) -> Self {
        let message = match (&outcome.sync, outcome.changed) {
            (SyncStatus::Failed(err), _) => {
                format!("{action} applied, but saving failed: {err}")
            }
            (_, false) => format!("{action}: nothing to change."),
            (_, true) => format!("{action} done."),
        };
        Self {
            ok: true,
            changed: outcome.changed,
            todo_id: outcome.id.map(|id| id.to_string()),
            message,
        }
    }

    fn accepted(message: impl Into<String>, changed: bool) -> Self {
        Self {
            ok: true,
            changed,
            todo_id: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            todo_id: None,
            message: message.into(),
        }
    }
}

/// Returns the current collection and edit session.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> TodoListResponse {
    let result = with_store(|store| {
        let items = store
            .todos()
            .iter()
            .enumerate()
            .map(|(index, todo)| to_item_view(index, todo))
            .collect();
        let editing = store.edit_session().map(|session| TodoEditView {
            target_id: session.target.to_string(),
            target_index: to_u32(session.target_index),
            pending_title: session.pending_title.clone(),
            pending_body: session.pending_body.clone(),
        });
        TodoListResponse {
            items,
            editing,
            completed_count: to_u32(store.counts().completed),
            message: String::new(),
        }
    });

    result.unwrap_or_else(|err| TodoListResponse {
        items: Vec::new(),
        editing: None,
        completed_count: 0,
        message: format!("todo_list failed: {err}"),
    })
}

/// Adds a todo. The title is trimmed; a blank title is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(title: String, body: String) -> TodoActionResponse {
    mutate("Add todo", |store| store.add(title.trim(), body))
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_remove(index: u32) -> TodoActionResponse {
    mutate("Remove todo", |store| store.remove(index as usize))
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_remove_by_id(todo_id: String) -> TodoActionResponse {
    match parse_todo_id(&todo_id) {
        Ok(id) => mutate("Remove todo", |store| store.remove_by_id(id)),
        Err(message) => TodoActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle_completed(index: u32) -> TodoActionResponse {
    mutate("Toggle todo", |store| Ok(store.toggle_completed(index as usize)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle_completed_by_id(todo_id: String) -> TodoActionResponse {
    match parse_todo_id(&todo_id) {
        Ok(id) => mutate("Toggle todo", |store| Ok(store.toggle_completed_by_id(id))),
        Err(message) => TodoActionResponse::failure(message),
    }
}

/// Starts editing the todo at `index`, loading its title/body into the form.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_begin_edit(index: u32) -> TodoActionResponse {
    match with_store(|store| store.begin_edit(index as usize)) {
        Ok(true) => TodoActionResponse::accepted("Editing todo.", false),
        Ok(false) => TodoActionResponse::failure(format!("no todo at index {index}")),
        Err(err) => TodoActionResponse::failure(format!("todo_begin_edit failed: {err}")),
    }
}

/// Mirrors the edit form fields into the pending-edit buffer.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_update_pending(title: String, body: String) -> TodoActionResponse {
    match with_store(|store| store.update_pending(title, body)) {
        Ok(Ok(())) => TodoActionResponse::accepted("Draft updated.", false),
        Ok(Err(err)) => TodoActionResponse::failure(err.to_string()),
        Err(err) => TodoActionResponse::failure(format!("todo_update_pending failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_commit_edit() -> TodoActionResponse {
    mutate("Save edit", |store| store.commit_edit())
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_cancel_edit() -> TodoActionResponse {
    match with_store(|store| store.cancel_edit()) {
        Ok(true) => TodoActionResponse::accepted("Edit cancelled.", false),
        Ok(false) => TodoActionResponse::accepted("No edit in progress.", false),
        Err(err) => TodoActionResponse::failure(format!("todo_cancel_edit failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_remove_completed() -> TodoActionResponse {
    mutate("Remove completed", |store| store.remove_completed())
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_mark_all_completed() -> TodoActionResponse {
    mutate("Mark all complete", |store| store.mark_all_completed())
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_mark_all_incomplete() -> TodoActionResponse {
    mutate("Mark all incomplete", |store| store.mark_all_incomplete())
}

/// Removes every todo. The UI confirms before calling this.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_remove_all() -> TodoActionResponse {
    mutate("Remove all", |store| store.remove_all())
}

fn mutate(
    action: &str,
    f: impl FnOnce(&mut SqliteTodoStore) -> Result<MutationOutcome, StoreError>,
) -> TodoActionResponse {
    match with_store(f) {
        Ok(Ok(outcome)) => TodoActionResponse::from_outcome(action, outcome),
        Ok(Err(err)) => TodoActionResponse::failure(format!("{action} rejected: {err}")),
        Err(err) => TodoActionResponse::failure(format!("{action} failed: {err}")),
    }
}

fn with_store<T>(f: impl FnOnce(&mut SqliteTodoStore) -> T) -> Result<T, String> {
    let store = TODO_STORE.get_or_try_init(|| {
        StoreConfig::with_db_path(resolve_todo_db_path())
            .open_store()
            .map(Mutex::new)
            .map_err(|err| format!("todo store open failed: {err}"))
    })?;
    let mut guard = store.lock().map_err(|_| {
        warn!("event=ffi_store_lock module=ffi status=error error_code=poisoned");
        "todo store lock poisoned".to_string()
    })?;
    Ok(f(&mut *guard))
}

fn resolve_todo_db_path() -> PathBuf {
    TODO_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(TODO_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TODO_DB_FILE_NAME)
        })
        .clone()
}

fn parse_todo_id(raw: &str) -> Result<TodoId, String> {
    TodoId::parse_str(raw.trim()).map_err(|_| format!("invalid todo id `{raw}`"))
}

fn to_item_view(index: usize, todo: &TodoRecord) -> TodoItemView {
    TodoItemView {
        id: todo.id.to_string(),
        index: to_u32(index),
        title: todo.title.clone(),
        body: todo.body.clone(),
        completed: todo.completed,
        created_at: todo.created_at.clone(),
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, todo_add, todo_begin_edit, todo_commit_edit,
        todo_configure_db_path, todo_list, todo_mark_all_completed, todo_remove,
        todo_remove_all, todo_remove_by_id, todo_remove_completed, todo_toggle_completed,
        todo_update_pending,
    };

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn remove_by_id_rejects_malformed_ids() {
        let response = todo_remove_by_id("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid todo id"));
    }

    // Single test: the store is process-wide, so the flow runs in order.
    #[test]
    fn todo_flow_round_trips_through_process_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ffi.sqlite3");
        assert_eq!(
            todo_configure_db_path(db_path.to_string_lossy().into_owned()),
            ""
        );
        assert!(!todo_configure_db_path("/elsewhere.sqlite3".to_string()).is_empty());

        let cleared = todo_remove_all();
        assert!(cleared.ok, "{}", cleared.message);

        let blank = todo_add("   ".to_string(), "body".to_string());
        assert!(!blank.ok);

        let added = todo_add("  Buy milk ".to_string(), "2% milk".to_string());
        assert!(added.ok, "{}", added.message);
        assert!(todo_add("Walk dog".to_string(), String::new()).ok);

        let listed = todo_list();
        assert_eq!(listed.message, "");
        assert_eq!(listed.items.len(), 2);
        assert_eq!(listed.items[0].title, "Buy milk");
        assert_eq!(listed.items[0].id, added.todo_id.clone().unwrap());

        assert!(todo_begin_edit(1).ok);
        assert!(todo_update_pending("Walk the dog".to_string(), "twice".to_string()).ok);
        let locked = todo_remove(0);
        assert!(!locked.ok);
        assert!(locked.message.contains("being edited"));
        assert!(todo_list().editing.is_some());

        let committed = todo_commit_edit();
        assert!(committed.ok, "{}", committed.message);
        let listed = todo_list();
        assert!(listed.editing.is_none());
        assert_eq!(listed.items[1].title, "Walk the dog");
        assert_eq!(listed.items[1].body, "twice");

        assert!(todo_toggle_completed(0).changed);
        assert_eq!(todo_list().completed_count, 1);
        assert!(todo_remove_completed().changed);
        assert_eq!(todo_list().items.len(), 1);

        assert!(todo_mark_all_completed().changed);
        assert!(!todo_remove(9).changed);
        assert!(todo_remove_all().changed);
        assert!(todo_list().items.is_empty());
    }
}

//! Todo store: the collection, the edit session, and persistence sync.
//!
//! # Responsibility
//! - Apply list mutations and replace the published snapshot atomically.
//! - Mirror every change into the persistence adapter.
//! - Guard structural mutations while an edit session is active.
//!
//! # Invariants
//! - Every record in the snapshot passes `TodoRecord::validate()`.
//! - Out-of-range indices and unknown ids never change the collection.
//! - A failed sync never reverts the in-memory mutation.
//! - A non-empty collection is saved; an empty one clears the stored value.

use crate::model::todo::{validate_title, TodoId, TodoRecord, TodoValidationError};
use crate::storage::PersistenceAdapter;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Store operation errors. Out-of-range targets are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Title (or pending title) is blank.
    Validation(TodoValidationError),
    /// Operation is locked while an edit session is active.
    EditInProgress { operation: &'static str },
    /// Edit operation issued without an active session.
    NoActiveEdit,
    /// The record under edit no longer exists.
    EditTargetMissing(TodoId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EditInProgress { operation } => {
                write!(f, "`{operation}` is not allowed while a todo is being edited")
            }
            Self::NoActiveEdit => write!(f, "no todo is being edited"),
            Self::EditTargetMissing(id) => write!(f, "todo under edit no longer exists: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for StoreError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of mirroring a collection change into storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Collection did not change; storage was not touched.
    Skipped,
    Saved,
    Cleared,
    /// Storage write failed; memory still holds the new state.
    Failed(String),
}

/// Report returned by every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub changed: bool,
    /// Record touched by single-record operations.
    pub id: Option<TodoId>,
    pub sync: SyncStatus,
}

impl MutationOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            id: None,
            sync: SyncStatus::Skipped,
        }
    }

    pub fn sync_failed(&self) -> bool {
        matches!(self.sync, SyncStatus::Failed(_))
    }
}

/// Active edit session with its pending-edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub target: TodoId,
    /// Position of `target` in the current snapshot.
    pub target_index: usize,
    pub pending_title: String,
    pub pending_body: String,
}

/// Aggregate counters for list headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

pub struct TodoStore<P: PersistenceAdapter> {
    adapter: P,
    todos: Arc<[TodoRecord]>,
    edit: Option<EditSession>,
    last_sync: Option<SyncStatus>,
}

impl<P: PersistenceAdapter> TodoStore<P> {
    /// Creates a store and adopts the adapter's saved collection, if any.
    ///
    /// Calls `load` exactly once. A load failure is logged and the store
    /// starts empty; it is never fatal.
    pub fn open(adapter: P) -> Self {
        let todos = match adapter.load() {
            Ok(Some(todos)) => {
                info!(
                    "event=store_open module=store status=ok source=storage count={}",
                    todos.len()
                );
                todos
            }
            Ok(None) => {
                info!("event=store_open module=store status=ok source=empty count=0");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=store_open module=store status=degraded source=empty error={}",
                    err
                );
                Vec::new()
            }
        };

        Self {
            adapter,
            todos: todos.into(),
            edit: None,
            last_sync: None,
        }
    }

    /// Shared immutable view of the current collection.
    pub fn snapshot(&self) -> Arc<[TodoRecord]> {
        Arc::clone(&self.todos)
    }

    pub fn todos(&self) -> &[TodoRecord] {
        &self.todos
    }

    pub fn get(&self, index: usize) -> Option<&TodoRecord> {
        self.todos.get(index)
    }

    pub fn position(&self, id: TodoId) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn counts(&self) -> TodoCounts {
        let completed = self.todos.iter().filter(|todo| todo.completed).count();
        TodoCounts {
            total: self.todos.len(),
            completed,
            pending: self.todos.len() - completed,
        }
    }

    /// Whether structure-mutating operations are currently locked.
    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Status of the most recent storage sync, `None` before the first one.
    pub fn last_sync(&self) -> Option<&SyncStatus> {
        self.last_sync.as_ref()
    }

    pub fn adapter(&self) -> &P {
        &self.adapter
    }

    /// Appends a new incomplete record stamped with the current time.
    pub fn add(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("add")?;
        let record = TodoRecord::new(title, body)?;
        let id = record.id;

        let mut next = self.todos.to_vec();
        next.push(record);
        Ok(self.publish("add", next, Some(id)))
    }

    /// Removes the record at `index`; later records shift left.
    pub fn remove(&mut self, index: usize) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("remove")?;
        let Some(id) = self.todos.get(index).map(|todo| todo.id) else {
            return Ok(MutationOutcome::unchanged());
        };

        let next = self
            .todos
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, todo)| todo.clone())
            .collect();
        Ok(self.publish("remove", next, Some(id)))
    }

    pub fn remove_by_id(&mut self, id: TodoId) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("remove")?;
        match self.position(id) {
            Some(index) => self.remove(index),
            None => Ok(MutationOutcome::unchanged()),
        }
    }

    /// Flips `completed` on the record at `index`.
    ///
    /// Allowed during an edit session; title and body of the edited record
    /// are only written on commit.
    pub fn toggle_completed(&mut self, index: usize) -> MutationOutcome {
        let Some(id) = self.todos.get(index).map(|todo| todo.id) else {
            return MutationOutcome::unchanged();
        };

        let mut next = self.todos.to_vec();
        next[index].completed = !next[index].completed;
        self.publish("toggle_completed", next, Some(id))
    }

    pub fn toggle_completed_by_id(&mut self, id: TodoId) -> MutationOutcome {
        match self.position(id) {
            Some(index) => self.toggle_completed(index),
            None => MutationOutcome::unchanged(),
        }
    }

    /// Starts (or retargets) an edit session on the record at `index`.
    ///
    /// Returns `false` and leaves any current session untouched when `index`
    /// is out of range.
    pub fn begin_edit(&mut self, index: usize) -> bool {
        let Some(todo) = self.todos.get(index) else {
            return false;
        };
        self.edit = Some(EditSession {
            target: todo.id,
            target_index: index,
            pending_title: todo.title.clone(),
            pending_body: todo.body.clone(),
        });
        info!("event=edit_begin module=store status=ok index={index}");
        true
    }

    pub fn begin_edit_by_id(&mut self, id: TodoId) -> bool {
        match self.position(id) {
            Some(index) => self.begin_edit(index),
            None => false,
        }
    }

    /// Replaces the pending-edit buffer.
    pub fn update_pending(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> StoreResult<()> {
        let session = self.edit.as_mut().ok_or(StoreError::NoActiveEdit)?;
        session.pending_title = title.into();
        session.pending_body = body.into();
        Ok(())
    }

    /// Drops the active session without writing anything.
    pub fn cancel_edit(&mut self) -> bool {
        let cancelled = self.edit.take().is_some();
        if cancelled {
            info!("event=edit_cancel module=store status=ok");
        }
        cancelled
    }

    /// Writes the pending title/body into the edited record.
    ///
    /// `completed`, `created_at` and `id` are preserved. A blank pending
    /// title is rejected and the session stays active.
    pub fn commit_edit(&mut self) -> StoreResult<MutationOutcome> {
        let session = self.edit.as_ref().ok_or(StoreError::NoActiveEdit)?;
        validate_title(&session.pending_title)?;

        let Some(index) = self.position(session.target) else {
            let target = session.target;
            self.edit = None;
            return Err(StoreError::EditTargetMissing(target));
        };
        let Some(session) = self.edit.take() else {
            return Err(StoreError::NoActiveEdit);
        };

        let mut next = self.todos.to_vec();
        next[index].title = session.pending_title;
        next[index].body = session.pending_body;
        Ok(self.publish("commit_edit", next, Some(session.target)))
    }

    /// Drops every completed record, keeping relative order.
    pub fn remove_completed(&mut self) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("remove_completed")?;
        if !self.todos.iter().any(|todo| todo.completed) {
            return Ok(MutationOutcome::unchanged());
        }

        let next = self
            .todos
            .iter()
            .filter(|todo| !todo.completed)
            .cloned()
            .collect();
        Ok(self.publish("remove_completed", next, None))
    }

    pub fn mark_all_completed(&mut self) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("mark_all_completed")?;
        Ok(self.mark_all("mark_all_completed", true))
    }

    pub fn mark_all_incomplete(&mut self) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("mark_all_incomplete")?;
        Ok(self.mark_all("mark_all_incomplete", false))
    }

    /// Empties the collection and clears the stored value.
    ///
    /// Always syncs, so a value left behind by an earlier failed write is
    /// removed as well.
    pub fn remove_all(&mut self) -> StoreResult<MutationOutcome> {
        self.ensure_not_editing("remove_all")?;
        let changed = !self.todos.is_empty();
        let mut outcome = self.publish("remove_all", Vec::new(), None);
        outcome.changed = changed;
        Ok(outcome)
    }

    fn mark_all(&mut self, operation: &'static str, completed: bool) -> MutationOutcome {
        if self.todos.iter().all(|todo| todo.completed == completed) {
            return MutationOutcome::unchanged();
        }

        let next = self
            .todos
            .iter()
            .map(|todo| TodoRecord {
                completed,
                ..todo.clone()
            })
            .collect();
        self.publish(operation, next, None)
    }

    fn ensure_not_editing(&self, operation: &'static str) -> StoreResult<()> {
        if self.edit.is_some() {
            warn!("event=store_rejected module=store status=locked op={operation}");
            return Err(StoreError::EditInProgress { operation });
        }
        Ok(())
    }

    /// Replaces the snapshot with `next` and mirrors it into storage.
    fn publish(
        &mut self,
        operation: &'static str,
        next: Vec<TodoRecord>,
        id: Option<TodoId>,
    ) -> MutationOutcome {
        self.todos = next.into();
        if let Some(session) = self.edit.as_mut() {
            if let Some(index) = self.todos.iter().position(|todo| todo.id == session.target) {
                session.target_index = index;
            }
        }

        let sync = self.sync();
        info!(
            "event=store_mutation module=store status=ok op={operation} count={}",
            self.todos.len()
        );
        self.last_sync = Some(sync.clone());
        MutationOutcome {
            changed: true,
            id,
            sync,
        }
    }

    fn sync(&self) -> SyncStatus {
        let (op, result) = if self.todos.is_empty() {
            ("clear", self.adapter.clear())
        } else {
            ("save", self.adapter.save(&self.todos))
        };

        match result {
            Ok(()) if self.todos.is_empty() => SyncStatus::Cleared,
            Ok(()) => SyncStatus::Saved,
            Err(err) => {
                warn!("event=storage_sync module=store status=error op={op} error={err}");
                SyncStatus::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreError, SyncStatus, TodoStore};
    use crate::storage::{JsonKvAdapter, MemoryKeyValueStore};

    fn store() -> TodoStore<JsonKvAdapter<MemoryKeyValueStore>> {
        TodoStore::open(JsonKvAdapter::new(MemoryKeyValueStore::new()))
    }

    #[test]
    fn add_rejects_blank_title_without_mutation() {
        let mut store = store();
        let err = store.add("  ", "body").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.is_empty());
        assert!(store.last_sync().is_none());
    }

    #[test]
    fn snapshot_is_not_aliased_by_later_mutations() {
        let mut store = store();
        store.add("first", "").unwrap();
        let before = store.snapshot();

        store.toggle_completed(0);
        assert!(!before[0].completed);
        assert!(store.todos()[0].completed);
    }

    #[test]
    fn begin_edit_out_of_range_keeps_current_session() {
        let mut store = store();
        store.add("a", "").unwrap();
        assert!(store.begin_edit(0));
        assert!(!store.begin_edit(5));
        assert_eq!(store.edit_session().unwrap().target_index, 0);
    }

    #[test]
    fn counts_track_completion() {
        let mut store = store();
        store.add("a", "").unwrap();
        store.add("b", "").unwrap();
        store.toggle_completed(1);

        let counts = store.counts();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.pending, 1);
        assert_eq!(store.last_sync(), Some(&SyncStatus::Saved));
    }
}

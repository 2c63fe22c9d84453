//! Todo record domain model.
//!
//! # Responsibility
//! - Define the canonical record tracked by the todo store.
//! - Validate the record invariants shared by write and read paths.
//!
//! # Invariants
//! - `title` is never blank for a record that exists in a collection.
//! - `created_at` is captured once at creation and never rewritten.
//! - `id` is stable for the record lifetime and never reused.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a todo record.
///
/// Kept as a type alias so signatures read as domain identity, not raw UUIDs.
pub type TodoId = Uuid;

/// Display format for `created_at`, e.g. `3/14/2026, 9:05:00 AM`.
pub const CREATED_AT_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// One task entry in the todo collection.
///
/// Serialized with `date` as the wire name of `created_at` so documents saved
/// by earlier browser builds stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TodoRecordWire")]
pub struct TodoRecord {
    /// Stable identity. Older documents without an id get one on load.
    pub id: TodoId,
    /// Required, never blank.
    pub title: String,
    /// Free text, may be empty.
    pub body: String,
    pub completed: bool,
    /// Local display timestamp, see [`CREATED_AT_FORMAT`].
    #[serde(rename = "date")]
    pub created_at: String,
}

#[derive(Deserialize)]
struct TodoRecordWire {
    #[serde(default = "Uuid::new_v4")]
    id: TodoId,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    completed: bool,
    #[serde(rename = "date", alias = "createdAt", alias = "created_at")]
    created_at: String,
}

impl TryFrom<TodoRecordWire> for TodoRecord {
    type Error = TodoValidationError;

    fn try_from(value: TodoRecordWire) -> Result<Self, Self::Error> {
        let record = Self {
            id: value.id,
            title: value.title,
            body: value.body,
            completed: value.completed,
            created_at: value.created_at,
        };
        record.validate()?;
        Ok(record)
    }
}

impl TodoRecord {
    /// Creates an incomplete record stamped with the current local time.
    ///
    /// # Errors
    /// - [`TodoValidationError::EmptyTitle`] when `title` is blank.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, TodoValidationError> {
        let created_at = Local::now().format(CREATED_AT_FORMAT).to_string();
        Self::with_created_at(title, body, created_at)
    }

    /// Creates an incomplete record with a caller-provided timestamp.
    ///
    /// Used by import paths and tests where creation time is already known.
    pub fn with_created_at(
        title: impl Into<String>,
        body: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Result<Self, TodoValidationError> {
        let record = Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            completed: false,
            created_at: created_at.into(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Validates record invariants.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        validate_title(&self.title)?;
        if self.id.is_nil() {
            return Err(TodoValidationError::NilId);
        }
        Ok(())
    }

    /// Parses `created_at` back into a local naive timestamp.
    ///
    /// Returns `None` for timestamps not written in [`CREATED_AT_FORMAT`].
    pub fn created_at_local(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT).ok()
    }
}

/// Checks the non-blank title rule used by create and edit-commit paths.
pub fn validate_title(title: &str) -> Result<(), TodoValidationError> {
    if title.trim().is_empty() {
        return Err(TodoValidationError::EmptyTitle);
    }
    Ok(())
}

/// Record invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoValidationError {
    EmptyTitle,
    NilId,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "todo title must not be empty"),
            Self::NilId => write!(f, "todo id must not be nil"),
        }
    }
}

impl Error for TodoValidationError {}

//! Use-case layer over the todo collection.
//!
//! # Responsibility
//! - Own the in-memory collection and the single edit session.
//! - Keep UI/FFI callers decoupled from storage details.

pub mod todo_store;

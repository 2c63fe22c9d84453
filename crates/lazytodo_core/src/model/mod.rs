//! Todo domain model.
//!
//! # Responsibility
//! - Define the record shape shared by the store and persistence adapters.
//!
//! # Invariants
//! - Every record carries a stable `TodoId` in addition to its position.

pub mod todo;

//! Flutter-facing bindings for the LazyTodo core.

pub mod api;

//! Tickmark Common Library
//!
//! The todo-list domain model: tasks, filtered views and edit sessions.
//! The harness in `tickmark-e2e` uses [`TodoList`] as the oracle it compares
//! a live instance against.

pub mod error;
pub mod todo;
pub mod types;

pub use error::{Error, Result};
pub use todo::{EditOutcome, EditSession, TodoList};
pub use types::*;

//! Error types for the todo domain model

use thiserror::Error;

/// Result type alias using the domain Error
pub type Result<T> = std::result::Result<T, Error>;

/// Domain model errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Task not found: {key}")]
    NotFound { key: String },

    #[error("Edit conflict: task {open} already has an open edit session")]
    Conflict { open: String },
}

impl Error {
    pub fn task_not_found(id: impl std::fmt::Display) -> Self {
        Error::NotFound {
            key: format!("id {}", id),
        }
    }

    pub fn title_not_found(title: &str) -> Self {
        Error::NotFound {
            key: format!("title '{}'", title),
        }
    }
}

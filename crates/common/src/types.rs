//! Core types for the todo domain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Opaque task identifier, stable for the task's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Monotonic insertion index, never reused within a list
    pub order: u64,
    pub created_at: i64,
}

impl Task {
    pub(crate) fn new(title: String, order: u64) -> Self {
        Self {
            id: TaskId::new(),
            title,
            completed: false,
            order,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Snapshot of what a page renders for this task
    pub fn observed(&self) -> ObservedTask {
        ObservedTask {
            title: self.title.clone(),
            completed: self.completed,
        }
    }
}

/// The three views a todo list can be filtered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [FilterKind::All, FilterKind::Active, FilterKind::Completed];

    /// Whether a task belongs to this view
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            FilterKind::All => true,
            FilterKind::Active => !task.completed,
            FilterKind::Completed => task.completed,
        }
    }

    /// Link text used by the filter bar
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::All => "All",
            FilterKind::Active => "Active",
            FilterKind::Completed => "Completed",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterKind::All),
            "active" => Ok(FilterKind::Active),
            "completed" => Ok(FilterKind::Completed),
            other => Err(Error::InvalidInput(format!("unknown filter '{}'", other))),
        }
    }
}

/// A task as read back from a rendered page: no id, no order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservedTask {
    pub title: String,
    pub completed: bool,
}

impl ObservedTask {
    pub fn new(title: impl Into<String>, completed: bool) -> Self {
        Self {
            title: title.into(),
            completed,
        }
    }
}

/// Active/completed tallies for a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counts {
    pub active: usize,
    pub completed: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.active + self.completed
    }

    pub fn in_view(&self, filter: FilterKind) -> usize {
        match filter {
            FilterKind::All => self.total(),
            FilterKind::Active => self.active,
            FilterKind::Completed => self.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        assert_eq!("Active".parse::<FilterKind>().unwrap(), FilterKind::Active);
        assert_eq!(" completed ".parse::<FilterKind>().unwrap(), FilterKind::Completed);
        assert!(matches!(
            "done".parse::<FilterKind>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_filter_matches() {
        let mut task = Task::new("x".to_string(), 0);
        assert!(FilterKind::Active.matches(&task));
        assert!(!FilterKind::Completed.matches(&task));
        task.completed = true;
        assert!(FilterKind::Completed.matches(&task));
        assert!(FilterKind::All.matches(&task));
    }

    #[test]
    fn test_filter_serde_names() {
        let json = serde_json::to_string(&FilterKind::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_task_ids_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}

//! In-memory todo list with filtered views and edit sessions.
//!
//! This is the reference semantics the harness predicts against: every
//! command a live instance receives is applied here first, and the resulting
//! view is what the page must eventually show.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Counts, FilterKind, ObservedTask, Task, TaskId};

/// Ordered list of tasks, insertion order significant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoList {
    tasks: Vec<Task>,
    next_order: u64,
    open_edit: Option<TaskId>,
}

/// Draft state for a task being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    task_id: TaskId,
    original: String,
    draft: String,
}

impl EditSession {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Title the task had when the session opened
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }
}

/// What committing an edit did to the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Renamed { previous: String, title: String },
    /// An empty draft removes the task
    Deleted(Task),
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// First task whose title equals `title` exactly
    pub fn find_by_title(&self, title: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.title == title)
    }

    pub fn open_edit(&self) -> Option<TaskId> {
        self.open_edit
    }

    /// Append a task; the stored title is trimmed
    pub fn create(&mut self, title: &str) -> Result<Task> {
        let title = normalize_title(title)
            .ok_or_else(|| Error::InvalidInput("task title is empty".to_string()))?;

        let task = Task::new(title, self.next_order);
        self.next_order += 1;
        self.tasks.push(task.clone());

        debug!("Created task: {} ({})", task.title, task.id);
        Ok(task)
    }

    /// Flip the completion flag, returning the new value
    pub fn toggle(&mut self, id: TaskId) -> Result<bool> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    /// Remove a task. Deleting twice is an error.
    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::task_not_found(id))?;

        if self.open_edit == Some(id) {
            self.open_edit = None;
        }

        let task = self.tasks.remove(index);
        debug!("Deleted task: {} ({})", task.title, task.id);
        Ok(task)
    }

    pub fn begin_edit(&mut self, id: TaskId) -> Result<EditSession> {
        if let Some(open) = self.open_edit {
            return Err(Error::Conflict {
                open: open.to_string(),
            });
        }

        let title = self.get_mut(id)?.title.clone();
        self.open_edit = Some(id);

        Ok(EditSession {
            task_id: id,
            original: title.clone(),
            draft: title,
        })
    }

    /// Commit `new_title`. An empty (after trimming) title deletes the task.
    pub fn commit_edit(&mut self, session: EditSession, new_title: &str) -> Result<EditOutcome> {
        self.close_session(&session)?;

        match normalize_title(new_title) {
            Some(title) => {
                let task = self.get_mut(session.task_id)?;
                let previous = std::mem::replace(&mut task.title, title.clone());
                Ok(EditOutcome::Renamed { previous, title })
            }
            None => Ok(EditOutcome::Deleted(self.delete(session.task_id)?)),
        }
    }

    /// Discard the draft; the committed title is left untouched
    pub fn cancel_edit(&mut self, session: EditSession) -> Result<()> {
        self.close_session(&session)
    }

    /// Tasks visible through `filter`, in insertion order
    pub fn view(&self, filter: FilterKind) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Titles visible through `filter`, in insertion order
    pub fn titles(&self, filter: FilterKind) -> Vec<String> {
        self.view(filter).into_iter().map(|t| t.title.clone()).collect()
    }

    /// Observed-form snapshot of a view
    pub fn snapshot(&self, filter: FilterKind) -> Vec<ObservedTask> {
        self.view(filter).into_iter().map(Task::observed).collect()
    }

    /// Index of a task within a filtered view
    pub fn position_in_view(&self, filter: FilterKind, id: TaskId) -> Option<usize> {
        self.view(filter).iter().position(|t| t.id == id)
    }

    pub fn counts(&self) -> Counts {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Counts {
            active: self.tasks.len() - completed,
            completed,
        }
    }

    /// Rebuild the list from an observed snapshot, e.g. tasks an instance
    /// restored from storage before the harness attached. Orders keep
    /// increasing from where they were.
    pub fn adopt(&mut self, observed: &[ObservedTask]) -> Result<()> {
        let mut tasks = Vec::with_capacity(observed.len());
        for item in observed {
            let title = normalize_title(&item.title).ok_or_else(|| {
                Error::InvalidInput("observed task with an empty title".to_string())
            })?;
            let mut task = Task::new(title, self.next_order);
            self.next_order += 1;
            task.completed = item.completed;
            tasks.push(task);
        }

        self.tasks = tasks;
        self.open_edit = None;
        Ok(())
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::task_not_found(id))
    }

    fn close_session(&mut self, session: &EditSession) -> Result<()> {
        match self.open_edit {
            Some(open) if open == session.task_id => {
                self.open_edit = None;
                Ok(())
            }
            Some(open) => Err(Error::Conflict {
                open: open.to_string(),
            }),
            None => Err(Error::task_not_found(session.task_id)),
        }
    }
}

fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with(titles: &[&str]) -> TodoList {
        let mut list = TodoList::new();
        for t in titles {
            list.create(t).unwrap();
        }
        list
    }

    #[test]
    fn test_create_trims_and_orders() {
        let mut list = TodoList::new();
        let a = list.create("  apple ").unwrap();
        let b = list.create("banana").unwrap();
        assert_eq!(a.title, "apple");
        assert!(!a.completed);
        assert!(b.order > a.order);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_create_rejects_blank() {
        let mut list = TodoList::new();
        assert!(matches!(list.create("   "), Err(Error::InvalidInput(_))));
        assert!(list.is_empty());
    }

    #[test]
    fn test_order_not_reused_after_delete() {
        let mut list = list_with(&["a", "b"]);
        let b = list.find_by_title("b").unwrap().clone();
        list.delete(b.id).unwrap();
        let c = list.create("c").unwrap();
        assert!(c.order > b.order);
        assert_eq!(list.find_by_title("a").unwrap().order, 0);
    }

    #[test]
    fn test_double_delete_fails() {
        let mut list = list_with(&["a"]);
        let id = list.find_by_title("a").unwrap().id;
        list.delete(id).unwrap();
        assert!(matches!(list.delete(id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_toggle_self_inverse() {
        let mut list = list_with(&["a"]);
        let id = list.find_by_title("a").unwrap().id;
        assert!(list.toggle(id).unwrap());
        assert!(!list.toggle(id).unwrap());
        assert!(!list.get(id).unwrap().completed);
    }

    #[test]
    fn test_toggle_missing() {
        let mut list = TodoList::new();
        assert!(matches!(list.toggle(TaskId::new()), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_views() {
        let mut list = list_with(&["apple", "banana and strawberry"]);
        let apple = list.find_by_title("apple").unwrap().id;
        list.toggle(apple).unwrap();

        assert_eq!(list.titles(FilterKind::Completed), vec!["apple"]);
        assert_eq!(list.titles(FilterKind::Active), vec!["banana and strawberry"]);
        assert_eq!(list.titles(FilterKind::All).len(), 2);
        assert_eq!(list.counts(), Counts { active: 1, completed: 1 });
    }

    #[test]
    fn test_edit_commit_renames() {
        let mut list = list_with(&["Task to Edit"]);
        let id = list.find_by_title("Task to Edit").unwrap().id;
        let mut session = list.begin_edit(id).unwrap();
        assert_eq!(session.draft(), "Task to Edit");
        session.set_draft("Edited Task");
        let draft = session.draft().to_string();

        let outcome = list.commit_edit(session, &draft).unwrap();
        assert_eq!(
            outcome,
            EditOutcome::Renamed {
                previous: "Task to Edit".to_string(),
                title: "Edited Task".to_string()
            }
        );
        assert!(list.find_by_title("Task to Edit").is_none());
        assert!(list.open_edit().is_none());
    }

    #[test]
    fn test_edit_commit_empty_deletes() {
        let mut list = list_with(&["a", "b"]);
        let id = list.find_by_title("a").unwrap().id;
        let session = list.begin_edit(id).unwrap();
        let outcome = list.commit_edit(session, "  ").unwrap();
        assert!(matches!(outcome, EditOutcome::Deleted(t) if t.title == "a"));
        assert_eq!(list.titles(FilterKind::All), vec!["b"]);
    }

    #[test]
    fn test_edit_cancel_keeps_title() {
        let mut list = list_with(&["keep"]);
        let id = list.find_by_title("keep").unwrap().id;
        let mut session = list.begin_edit(id).unwrap();
        session.set_draft("changed");
        list.cancel_edit(session).unwrap();
        assert_eq!(list.get(id).unwrap().title, "keep");
        assert!(list.open_edit().is_none());
    }

    #[test]
    fn test_second_edit_conflicts() {
        let mut list = list_with(&["a", "b"]);
        let a = list.find_by_title("a").unwrap().id;
        let b = list.find_by_title("b").unwrap().id;
        let _session = list.begin_edit(a).unwrap();
        assert!(matches!(list.begin_edit(b), Err(Error::Conflict { .. })));
    }

    #[test]
    fn test_delete_during_edit_closes_session() {
        let mut list = list_with(&["a"]);
        let id = list.find_by_title("a").unwrap().id;
        let session = list.begin_edit(id).unwrap();
        list.delete(id).unwrap();
        assert!(list.open_edit().is_none());
        assert!(list.cancel_edit(session).is_err());
    }

    #[test]
    fn test_adopt_snapshot() {
        let mut list = list_with(&["old"]);
        list.adopt(&[
            ObservedTask::new("x", false),
            ObservedTask::new("y", true),
        ])
        .unwrap();
        assert_eq!(list.titles(FilterKind::All), vec!["x", "y"]);
        assert_eq!(list.titles(FilterKind::Completed), vec!["y"]);
        assert!(list.find_by_title("x").unwrap().order >= 1);
    }

    #[test]
    fn test_position_in_view() {
        let mut list = list_with(&["a", "b", "c"]);
        let b = list.find_by_title("b").unwrap().id;
        let c = list.find_by_title("c").unwrap().id;
        list.toggle(b).unwrap();
        assert_eq!(list.position_in_view(FilterKind::Active, c), Some(1));
        assert_eq!(list.position_in_view(FilterKind::Active, b), None);
        assert_eq!(list.position_in_view(FilterKind::Completed, b), Some(0));
    }
}

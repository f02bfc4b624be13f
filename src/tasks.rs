//! Task registry: the ordered task list and the current selection.
//!
//! Every mutation is persisted right away under the `tasks` key. A failed
//! write leaves the in-memory list as the source of truth until the next
//! successful one.
//!
//! Another process may write the same key while this one is running (a
//! one-shot `tomato task add` next to an open shell). Before each mutation
//! the registry folds in what is stored: tasks added elsewhere are
//! appended, tasks removed elsewhere are dropped, and local edits win for
//! tasks both sides know.

use crate::clock::Clock;
use crate::models::{PomodoroEntry, Task};
use crate::persistence::{Repository, KEY_TASKS};
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a task title")]
    EmptyTitle,
}

/// Result of crediting a completed work session to the selected task.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub task_id: String,
    pub title: String,
    pub completed_pomos: u32,
    /// The task reached its target with this session.
    pub finished: bool,
}

pub struct TaskRegistry {
    tasks: Vec<Task>,
    selected: Option<String>,
    /// Ids present in the store as of the last successful read or write.
    synced: HashSet<String>,
    /// Ids deleted here but possibly still in the store.
    removed: HashSet<String>,
    repo: Rc<Repository>,
    clock: Rc<dyn Clock>,
}

impl TaskRegistry {
    /// Loads the stored task list; an unreadable list starts empty.
    pub fn load(repo: Rc<Repository>, clock: Rc<dyn Clock>) -> Self {
        let tasks: Vec<Task> = repo.get(KEY_TASKS);
        tracing::debug!(count = tasks.len(), "loaded tasks");
        Self {
            synced: tasks.iter().map(|t| t.id.clone()).collect(),
            tasks,
            selected: None,
            removed: HashSet::new(),
            repo,
            clock,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Task> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Resolves a user-supplied reference: an exact id, or a 1-based
    /// position in the list.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim().trim_start_matches('#');
        if let Some(task) = self.get(reference) {
            return Some(task.id.clone());
        }
        reference
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.tasks.get(i))
            .map(|t| t.id.clone())
    }

    /// Appends a new task. Rejects titles that are empty after trimming.
    /// A target of zero is stored as one.
    pub fn add_task(&mut self, title: &str, target_pomos: u32) -> Result<&Task, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        self.sync();

        let task = Task::new(
            self.next_id(),
            title.to_string(),
            target_pomos.max(1),
            self.clock.local_now(),
        );
        tracing::debug!(id = %task.id, title = %task.title, "task added");

        let idx = self.tasks.len();
        self.tasks.push(task);
        self.persist();
        Ok(&self.tasks[idx])
    }

    /// Selects a task for attribution. Unknown ids leave the selection as is.
    pub fn select_task(&mut self, id: &str) -> Option<&Task> {
        let idx = self.position(id)?;
        self.selected = Some(self.tasks[idx].id.clone());
        Some(&self.tasks[idx])
    }

    /// Flips the completion flag.
    pub fn toggle_complete(&mut self, id: &str) -> Option<&Task> {
        self.sync();
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.is_completed = !task.is_completed;
        self.persist();
        Some(&self.tasks[idx])
    }

    /// Removes a task, clearing the selection if it pointed at it.
    pub fn delete_task(&mut self, id: &str) -> Option<Task> {
        self.sync();
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        if self.selected.as_deref() == Some(removed.id.as_str()) {
            self.selected = None;
        }
        self.removed.insert(removed.id.clone());
        self.persist();
        Some(removed)
    }

    /// Credits one completed work session of `duration_mins` to the
    /// selected task. Does nothing without a selection or when the
    /// selected task is already complete.
    pub fn attribute_completed_session(&mut self, duration_mins: u32) -> Option<Attribution> {
        self.selected.as_ref()?;
        self.sync();
        let idx = self.position(self.selected.as_deref()?)?;
        let now = self.clock.local_now();

        let task = &mut self.tasks[idx];
        if task.is_completed {
            return None;
        }

        task.completed_pomos += 1;
        task.pomodoros.push(PomodoroEntry {
            start_time: now,
            duration_minutes: duration_mins,
        });

        let finished = task.completed_pomos >= task.target_pomos;
        if finished {
            task.is_completed = true;
        }

        let attribution = Attribution {
            task_id: task.id.clone(),
            title: task.title.clone(),
            completed_pomos: task.completed_pomos,
            finished,
        };
        self.persist();
        Some(attribution)
    }

    /// Forgets every task and the selection (full data reset).
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.selected = None;
        self.synced.clear();
        self.removed.clear();
    }

    /// Folds in tasks written to the store by another process. An
    /// unreadable store leaves the in-memory list untouched.
    pub fn sync(&mut self) {
        let stored: Vec<Task> = match self.repo.try_get(KEY_TASKS) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not re-read tasks");
                return;
            }
        };

        let stored_ids: HashSet<String> = stored.iter().map(|t| t.id.clone()).collect();
        let synced = &self.synced;
        self.tasks
            .retain(|t| !synced.contains(&t.id) || stored_ids.contains(&t.id));

        for task in stored {
            if self.removed.contains(&task.id) || self.get(&task.id).is_some() {
                continue;
            }
            tracing::debug!(id = %task.id, title = %task.title, "task picked up from store");
            self.tasks.push(task);
        }

        if self
            .selected
            .as_deref()
            .is_some_and(|id| self.get(id).is_none())
        {
            self.selected = None;
        }
        self.synced = stored_ids;
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Millisecond timestamp, bumped until unique.
    fn next_id(&self) -> String {
        let mut millis = self.clock.local_now().timestamp_millis();
        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }
        millis.to_string()
    }

    fn persist(&mut self) {
        if self.repo.set(KEY_TASKS, &self.tasks) {
            self.synced = self.tasks.iter().map(|t| t.id.clone()).collect();
            self.removed.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::MemoryStore;

    fn registry() -> (MemoryStore, TaskRegistry) {
        let store = MemoryStore::new();
        let repo = Rc::new(Repository::new(store.clone()));
        let clock = Rc::new(ManualClock::at(2026, 10, 18));
        (store, TaskRegistry::load(repo, clock))
    }

    fn stored_tasks(store: &MemoryStore) -> Vec<Task> {
        serde_json::from_str(&store.raw(KEY_TASKS).unwrap()).unwrap()
    }

    #[test]
    fn test_add_task() {
        let (store, mut registry) = registry();
        let task = registry.add_task("  Write report ", 3).unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.target_pomos, 3);
        assert_eq!(task.completed_pomos, 0);
        assert!(!task.is_completed);

        assert_eq!(stored_tasks(&store).len(), 1);
    }

    #[test]
    fn test_add_task_rejects_empty_title() {
        let (store, mut registry) = registry();
        assert_eq!(registry.add_task("", 1), Err(ValidationError::EmptyTitle));
        assert_eq!(registry.add_task("   ", 1), Err(ValidationError::EmptyTitle));
        assert!(registry.tasks().is_empty());
        assert_eq!(store.raw(KEY_TASKS), None);
    }

    #[test]
    fn test_add_task_zero_target_becomes_one() {
        let (_, mut registry) = registry();
        assert_eq!(registry.add_task("Tiny", 0).unwrap().target_pomos, 1);
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let (_, mut registry) = registry();
        let a = registry.add_task("A", 1).unwrap().id.clone();
        let b = registry.add_task("B", 1).unwrap().id.clone();
        assert_ne!(a, b);
        let titles: Vec<_> = registry.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[test]
    fn test_select_unknown_is_noop() {
        let (_, mut registry) = registry();
        let id = registry.add_task("A", 1).unwrap().id.clone();
        registry.select_task(&id);
        assert!(registry.select_task("nope").is_none());
        assert_eq!(registry.selected_id(), Some(id.as_str()));
    }

    #[test]
    fn test_toggle_complete() {
        let (store, mut registry) = registry();
        let id = registry.add_task("A", 1).unwrap().id.clone();
        assert!(registry.toggle_complete(&id).unwrap().is_completed);
        assert!(stored_tasks(&store)[0].is_completed);
        assert!(!registry.toggle_complete(&id).unwrap().is_completed);
        assert!(registry.toggle_complete("nope").is_none());
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let (store, mut registry) = registry();
        let id = registry.add_task("A", 1).unwrap().id.clone();
        registry.select_task(&id);

        let removed = registry.delete_task(&id).unwrap();
        assert_eq!(removed.title, "A");
        assert!(registry.selected_id().is_none());
        assert!(registry.attribute_completed_session(25).is_none());
        assert!(stored_tasks(&store).is_empty());
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let (_, mut registry) = registry();
        let a = registry.add_task("A", 1).unwrap().id.clone();
        let b = registry.add_task("B", 1).unwrap().id.clone();
        registry.select_task(&a);
        registry.delete_task(&b);
        assert_eq!(registry.selected_id(), Some(a.as_str()));
    }

    #[test]
    fn test_attribute_without_selection() {
        let (_, mut registry) = registry();
        registry.add_task("A", 1).unwrap();
        assert!(registry.attribute_completed_session(25).is_none());
        assert_eq!(registry.tasks()[0].completed_pomos, 0);
    }

    #[test]
    fn test_attribute_until_finished() {
        let (store, mut registry) = registry();
        let id = registry.add_task("A", 2).unwrap().id.clone();
        registry.select_task(&id);

        let first = registry.attribute_completed_session(25).unwrap();
        assert_eq!(first.completed_pomos, 1);
        assert!(!first.finished);

        let second = registry.attribute_completed_session(25).unwrap();
        assert!(second.finished);

        let task = registry.get(&id).unwrap();
        assert!(task.is_completed);
        assert_eq!(task.completed_pomos, 2);
        assert_eq!(task.pomodoros.len(), 2);
        assert_eq!(task.pomodoros[0].duration_minutes, 25);

        // Completed tasks take no more sessions.
        assert!(registry.attribute_completed_session(25).is_none());
        assert_eq!(stored_tasks(&store)[0].completed_pomos, 2);
    }

    #[test]
    fn test_resolve_by_id_or_position() {
        let (_, mut registry) = registry();
        let a = registry.add_task("A", 1).unwrap().id.clone();
        let b = registry.add_task("B", 1).unwrap().id.clone();
        assert_eq!(registry.resolve(&a), Some(a.clone()));
        assert_eq!(registry.resolve("2"), Some(b));
        assert_eq!(registry.resolve("#1"), Some(a));
        assert_eq!(registry.resolve("0"), None);
        assert_eq!(registry.resolve("3"), None);
    }

    #[test]
    fn test_reload_from_store() {
        let (store, mut registry) = registry();
        registry.add_task("Persisted", 4).unwrap();

        let repo = Rc::new(Repository::new(store));
        let reloaded = TaskRegistry::load(repo, Rc::new(ManualClock::at(2026, 10, 18)));
        assert_eq!(reloaded.tasks().len(), 1);
        assert_eq!(reloaded.tasks()[0].target_pomos, 4);
        assert!(reloaded.selected_id().is_none());
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let (store, mut registry) = registry();
        store.set_failing(true);
        registry.add_task("A", 1).unwrap();
        assert_eq!(registry.tasks().len(), 1);

        store.set_failing(false);
        registry.add_task("B", 1).unwrap();
        assert_eq!(stored_tasks(&store).len(), 2);
    }

    fn second_registry(store: &MemoryStore, day: u32) -> TaskRegistry {
        let repo = Rc::new(Repository::new(store.clone()));
        TaskRegistry::load(repo, Rc::new(ManualClock::at(2026, 10, day)))
    }

    #[test]
    fn test_keeps_tasks_added_by_another_writer() {
        let (store, mut shell) = registry();
        shell.add_task("Existing", 1).unwrap();

        let mut other = second_registry(&store, 19);
        other.add_task("From elsewhere", 1).unwrap();

        shell.add_task("Local", 1).unwrap();
        let titles: Vec<_> = stored_tasks(&store).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["Existing", "From elsewhere", "Local"]);
        assert_eq!(shell.tasks().len(), 3);
    }

    #[test]
    fn test_drops_tasks_deleted_by_another_writer() {
        let (store, mut shell) = registry();
        let a = shell.add_task("A", 1).unwrap().id.clone();
        shell.select_task(&a);

        let mut other = second_registry(&store, 19);
        other.delete_task(&a).unwrap();

        assert!(shell.toggle_complete(&a).is_none());
        assert!(shell.tasks().is_empty());
        assert!(shell.selected_id().is_none());
        assert!(stored_tasks(&store).is_empty());
    }

    #[test]
    fn test_local_delete_is_not_restored_from_store() {
        let (store, mut registry) = registry();
        let a = registry.add_task("A", 1).unwrap().id.clone();
        store.set_failing(true);
        registry.delete_task(&a).unwrap();

        store.set_failing(false);
        registry.add_task("B", 1).unwrap();
        let titles: Vec<_> = stored_tasks(&store).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["B"]);
    }
}

//! Editing session
//!
//! A [`Session`] owns the live [`TaskStore`], its [`UndoHistory`] and the
//! listing most recently shown to the user. Every mutation goes through the
//! session so the pre-mutation state is recorded exactly once, and only when
//! the mutation actually changed something.
//!
//! Numeric identifiers resolve against the last listing shown (the view).
//! Operations that remove or reorder tasks drop the view, after which
//! numbers refer to stored order again.

use log::debug;

use super::error::TaskError;
use super::history::UndoHistory;
use super::id::TaskId;
use super::sort::SortKey;
use super::store::{resolve, NewTask, TaskStore};
use super::task::{Priority, Task};

#[derive(Debug, Clone, Default)]
pub struct Session {
    store: TaskStore,
    history: UndoHistory,
    view: Option<Vec<TaskId>>,
    dirty: bool,
}

impl Session {
    pub fn new(tasks: Vec<Task>, history: UndoHistory) -> Self {
        Self {
            store: TaskStore::from_tasks(tasks),
            history,
            view: None,
            dirty: false,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// True when there are changes not yet saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Records the listing just shown to the user
    pub fn present<'a>(&mut self, shown: impl IntoIterator<Item = &'a Task>) {
        self.view = Some(shown.into_iter().map(|t| t.id.clone()).collect());
    }

    /// Tasks in the order numeric identifiers refer to
    pub fn view(&self) -> Vec<&Task> {
        match &self.view {
            Some(ids) => ids.iter().filter_map(|id| self.store.get(id)).collect(),
            None => self.store.tasks().iter().collect(),
        }
    }

    /// Resolves a user identifier to exactly one task
    pub fn resolve(&self, identifier: &str) -> Result<&Task, TaskError> {
        let view = self.view();
        resolve(&view, identifier).into_result(identifier)
    }

    /// Resolves a user identifier to a task ID
    pub fn resolve_id(&self, identifier: &str) -> Result<TaskId, TaskError> {
        self.resolve(identifier).map(|t| t.id.clone())
    }

    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut TaskStore) -> Result<T, TaskError>,
    ) -> Result<T, TaskError> {
        let snapshot = self.store.tasks().to_vec();
        let out = op(&mut self.store)?;
        self.history.push(snapshot);
        self.dirty = true;
        Ok(out)
    }

    pub fn add(&mut self, new: NewTask) -> Result<Task, TaskError> {
        self.mutate(|store| store.add(new).cloned())
    }

    /// Removes a task; `None` (and no history entry) if it was absent
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        self.store.get(id)?;
        let removed = self.mutate(|store| Ok(store.remove(id))).ok().flatten();
        self.view = None;
        removed
    }

    pub fn rename(&mut self, id: &TaskId, new_item: &str) -> Result<(), TaskError> {
        self.mutate(|store| store.rename(id, new_item))
    }

    pub fn set_priority(&mut self, id: &TaskId, priority: Priority) -> Result<(), TaskError> {
        self.mutate(|store| store.set_priority(id, priority))
    }

    pub fn set_date(&mut self, id: &TaskId, date_text: &str) -> Result<(), TaskError> {
        self.mutate(|store| store.set_date(id, date_text))
    }

    pub fn set_repeat(&mut self, id: &TaskId, rule: &str) -> Result<(), TaskError> {
        self.mutate(|store| store.set_repeat(id, rule))
    }

    pub fn set_notes(&mut self, id: &TaskId, notes: &str) -> Result<(), TaskError> {
        self.mutate(|store| store.set_notes(id, notes))
    }

    /// Flips completion, returning the next occurrence if one was created
    pub fn toggle_completed(&mut self, id: &TaskId) -> Result<Option<Task>, TaskError> {
        self.mutate(|store| store.toggle_completed(id))
    }

    /// Removes completed tasks; nothing is recorded when there are none
    pub fn clear_completed(&mut self) -> usize {
        if !self.store.tasks().iter().any(|t| t.completed) {
            return 0;
        }
        let removed = self
            .mutate(|store| Ok(store.clear_completed()))
            .unwrap_or_default();
        self.view = None;
        removed
    }

    /// Restores the state before the most recent mutation
    pub fn undo(&mut self) -> Result<(), TaskError> {
        let snapshot = self.history.pop()?;
        debug!("Restoring snapshot with {} tasks", snapshot.len());
        self.store.replace(snapshot);
        self.view = None;
        self.dirty = true;
        Ok(())
    }

    /// Reorders stored tasks. Sorting is not recorded in the history.
    pub fn sort(&mut self, key: Option<SortKey>, reverse: bool) {
        if key.is_none() {
            return;
        }
        self.store.sort(key, reverse);
        self.view = None;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session() -> Session {
        Session::new(Vec::new(), UndoHistory::new(10))
    }

    fn items(session: &Session) -> Vec<&str> {
        session.tasks().iter().map(|t| t.item.as_str()).collect()
    }

    #[test]
    fn undo_reverses_one_mutation() {
        let mut s = session();
        s.add(NewTask::new("A")).unwrap();
        s.add(NewTask::new("B")).unwrap();

        s.undo().unwrap();
        assert_eq!(items(&s), vec!["A"]);

        s.undo().unwrap();
        assert!(s.tasks().is_empty());

        assert_eq!(s.undo(), Err(TaskError::HistoryEmpty));
    }

    #[test]
    fn failed_mutation_records_nothing() {
        let mut s = session();
        s.add(NewTask::new("A")).unwrap();
        assert_eq!(s.history().len(), 1);

        assert!(s.add(NewTask::new("a")).is_err());
        let id = s.resolve_id("1").unwrap();
        assert!(s.set_date(&id, "whenever").is_err());
        assert!(s.rename(&id, "").is_err());

        assert_eq!(s.history().len(), 1);
        assert_eq!(items(&s), vec!["A"]);
    }

    #[test]
    fn undo_toggle_removes_spawned_occurrence() {
        let mut s = session();
        s.add(NewTask::new("Water plants").date("2024-06-01").repeat("every 3 days"))
            .unwrap();
        let id = s.resolve_id("water").unwrap();

        let next = s.toggle_completed(&id).unwrap().unwrap();
        assert_eq!(next.date, NaiveDate::from_ymd_opt(2024, 6, 4));
        assert_eq!(s.tasks().len(), 2);

        s.undo().unwrap();
        assert_eq!(s.tasks().len(), 1);
        assert!(!s.tasks()[0].completed);
    }

    #[test]
    fn undo_restores_every_mutation_kind() {
        let mut s = session();
        s.add(NewTask::new("Task")).unwrap();
        let id = s.resolve_id("1").unwrap();
        let baseline: Vec<Task> = s.tasks().to_vec();

        s.rename(&id, "Renamed").unwrap();
        s.undo().unwrap();
        assert_eq!(s.tasks(), baseline.as_slice());

        s.set_priority(&id, Priority::High).unwrap();
        s.undo().unwrap();
        assert_eq!(s.tasks(), baseline.as_slice());

        s.set_notes(&id, "note").unwrap();
        s.undo().unwrap();
        assert_eq!(s.tasks(), baseline.as_slice());

        s.set_repeat(&id, "daily").unwrap();
        s.undo().unwrap();
        assert_eq!(s.tasks(), baseline.as_slice());

        s.remove(&id).unwrap();
        s.undo().unwrap();
        assert_eq!(s.tasks(), baseline.as_slice());
    }

    #[test]
    fn clear_completed_with_nothing_done_records_nothing() {
        let mut s = session();
        s.add(NewTask::new("A")).unwrap();
        assert_eq!(s.clear_completed(), 0);
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn clear_completed_is_undoable() {
        let mut s = session();
        for item in ["a", "b", "c", "d", "e"] {
            s.add(NewTask::new(item)).unwrap();
        }
        for name in ["b", "d"] {
            let id = s.resolve_id(name).unwrap();
            s.toggle_completed(&id).unwrap();
        }

        assert_eq!(s.clear_completed(), 2);
        assert_eq!(items(&s), vec!["a", "c", "e"]);

        s.undo().unwrap();
        assert_eq!(s.tasks().len(), 5);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut s = session();
        s.add(NewTask::new("A")).unwrap();
        let ghost: TaskId = "t-nothere".parse().unwrap();

        assert!(s.remove(&ghost).is_none());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn numbers_follow_presented_view() {
        let mut s = session();
        s.add(NewTask::new("alpha")).unwrap();
        s.add(NewTask::new("beta")).unwrap();
        s.add(NewTask::new("gamma")).unwrap();

        let shown: Vec<Task> = s.tasks().iter().rev().cloned().collect();
        s.present(&shown);
        assert_eq!(s.resolve("1").unwrap().item, "gamma");

        s.sort(SortKey::parse("name"), false);
        assert_eq!(s.resolve("1").unwrap().item, "alpha");
    }

    #[test]
    fn history_depth_is_respected() {
        let mut s = Session::new(Vec::new(), UndoHistory::new(2));
        for item in ["a", "b", "c"] {
            s.add(NewTask::new(item)).unwrap();
        }

        s.undo().unwrap();
        s.undo().unwrap();
        assert_eq!(items(&s), vec!["a"]);
        assert_eq!(s.undo(), Err(TaskError::HistoryEmpty));
    }

    #[test]
    fn unknown_sort_key_changes_nothing() {
        let mut s = session();
        s.add(NewTask::new("b")).unwrap();
        s.add(NewTask::new("a")).unwrap();
        s.mark_saved();

        s.sort(SortKey::parse("colour"), false);
        assert_eq!(items(&s), vec!["b", "a"]);
        assert!(!s.is_dirty());
    }
}

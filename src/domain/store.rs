//! In-memory task collection
//!
//! [`TaskStore`] owns the ordered list of tasks and every mutation on it.
//! Order is insertion order unless the list is explicitly sorted.
//!
//! ## Identifier resolution
//!
//! A user-supplied identifier is resolved in this order:
//!
//! 1. A positive integer is a 1-based position in the ordered view
//! 2. An exact task ID
//! 3. A case-insensitive substring of the item text, which must be unique

use chrono::Utc;
use log::debug;

use super::date::parse_date;
use super::error::TaskError;
use super::id::TaskId;
use super::recurrence::next_occurrence;
use super::sort::{sort_tasks, SortKey};
use super::task::{Priority, Task};

/// Input for [`TaskStore::add`]
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub item: String,
    /// Date text; blank means no due date
    pub date: String,
    /// Priority text; `None` means the default (low)
    pub priority: Option<String>,
    pub repeat: Option<String>,
    pub notes: String,
}

impl NewTask {
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            ..Self::default()
        }
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn repeat(mut self, repeat: impl Into<String>) -> Self {
        self.repeat = Some(repeat.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Outcome of resolving a user-supplied identifier
#[derive(Debug, PartialEq)]
pub enum Resolution<'a> {
    Found(&'a Task),
    Ambiguous(Vec<&'a Task>),
    NotFound,
}

impl<'a> Resolution<'a> {
    /// Converts into a result, keeping the candidate list on ambiguity
    pub fn into_result(self, query: &str) -> Result<&'a Task, TaskError> {
        match self {
            Resolution::Found(task) => Ok(task),
            Resolution::Ambiguous(candidates) => Err(TaskError::AmbiguousMatch {
                query: query.trim().to_string(),
                candidates: candidates
                    .into_iter()
                    .map(|t| (t.id.clone(), t.item.clone()))
                    .collect(),
            }),
            Resolution::NotFound => Err(TaskError::NotFound(query.trim().to_string())),
        }
    }
}

/// Resolves `identifier` against an ordered view of tasks
pub fn resolve<'a>(view: &[&'a Task], identifier: &str) -> Resolution<'a> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Resolution::NotFound;
    }

    if identifier.chars().all(|c| c.is_ascii_digit()) {
        match identifier.parse::<usize>() {
            Ok(position) if position > 0 => {
                return match view.get(position - 1) {
                    Some(task) => Resolution::Found(*task),
                    None => Resolution::NotFound,
                };
            }
            Ok(_) => {}
            Err(_) => return Resolution::NotFound,
        }
    }

    if let Some(task) = view.iter().copied().find(|t| t.id.as_str() == identifier) {
        return Resolution::Found(task);
    }

    let mut matches: Vec<&'a Task> = view
        .iter()
        .copied()
        .filter(|t| t.item_contains(identifier))
        .collect();

    match matches.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Found(matches.remove(0)),
        _ => Resolution::Ambiguous(matches),
    }
}

/// Ordered, in-memory collection of tasks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// 1-based position of a task in stored order
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id).map(|i| i + 1)
    }

    fn get_mut(&mut self, id: &TaskId) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    /// Replaces the whole collection (used when restoring a snapshot)
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Resolves an identifier against stored order
    pub fn resolve(&self, identifier: &str) -> Resolution<'_> {
        let view: Vec<&Task> = self.tasks.iter().collect();
        resolve(&view, identifier)
    }

    /// Generates an ID not used by any task in the store
    fn fresh_id(&self, item: &str) -> TaskId {
        let now = Utc::now();
        let mut salt = 0;
        loop {
            let id = TaskId::generate(item, now, salt);
            if self.get(&id).is_none() {
                return id;
            }
            salt += 1;
        }
    }

    /// Adds a new task after validating every field.
    ///
    /// The store is unchanged when any field is rejected.
    pub fn add(&mut self, new: NewTask) -> Result<&Task, TaskError> {
        let item = new.item.trim();
        if item.is_empty() {
            return Err(TaskError::EmptyName);
        }

        let lowered = item.to_lowercase();
        if self.tasks.iter().any(|t| t.item.to_lowercase() == lowered) {
            return Err(TaskError::DuplicateItem(item.to_string()));
        }

        let date = parse_date(&new.date)?;
        let priority = match new.priority.as_deref() {
            Some(text) => text.parse::<Priority>()?,
            None => Priority::default(),
        };

        let mut task = Task::new(self.fresh_id(item), item);
        task.date = date;
        task.priority = priority;
        task.repeat = new
            .repeat
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        task.notes = new.notes;

        debug!("Adding task {} ({})", task.id, task.item);
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Removes a task by ID, returning it if it was present
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn rename(&mut self, id: &TaskId, new_item: &str) -> Result<(), TaskError> {
        let new_item = new_item.trim();
        if new_item.is_empty() {
            return Err(TaskError::EmptyName);
        }
        self.get_mut(id)?.item = new_item.to_string();
        Ok(())
    }

    pub fn set_priority(&mut self, id: &TaskId, priority: Priority) -> Result<(), TaskError> {
        self.get_mut(id)?.priority = priority;
        Ok(())
    }

    /// Sets or clears (blank text) the due date
    pub fn set_date(&mut self, id: &TaskId, date_text: &str) -> Result<(), TaskError> {
        let date = parse_date(date_text)?;
        self.get_mut(id)?.date = date;
        Ok(())
    }

    pub fn set_repeat(&mut self, id: &TaskId, rule: &str) -> Result<(), TaskError> {
        let rule = rule.trim();
        self.get_mut(id)?.repeat = (!rule.is_empty()).then(|| rule.to_string());
        Ok(())
    }

    pub fn set_notes(&mut self, id: &TaskId, notes: &str) -> Result<(), TaskError> {
        self.get_mut(id)?.notes = notes.to_string();
        Ok(())
    }

    /// Flips the completed flag.
    ///
    /// Completing a repeating task that has a date appends its next
    /// occurrence, which is returned. Reopening never creates anything.
    pub fn toggle_completed(&mut self, id: &TaskId) -> Result<Option<Task>, TaskError> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        if !task.completed {
            return Ok(None);
        }

        let next_date = match task.date {
            Some(base) => next_occurrence(base, task.repeat_rule()),
            None => None,
        };
        let Some(next_date) = next_date else {
            return Ok(None);
        };

        let template = task.clone();
        let next = template.next_instance(self.fresh_id(&template.item), next_date);
        debug!(
            "Recurring task {} spawned {} for {}",
            template.id, next.id, next_date
        );
        self.tasks.push(next.clone());
        Ok(Some(next))
    }

    /// Removes every completed task, returning how many were removed
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        before - self.tasks.len()
    }

    /// Reorders the stored list; an unknown key leaves it untouched
    pub fn sort(&mut self, key: Option<SortKey>, reverse: bool) {
        if let Some(key) = key {
            sort_tasks(&mut self.tasks, key, reverse);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_with(items: &[&str]) -> TaskStore {
        let mut store = TaskStore::new();
        for item in items {
            store.add(NewTask::new(*item)).unwrap();
        }
        store
    }

    #[test]
    fn add_assigns_unique_ids() {
        let store = store_with(&["a", "b", "c", "d"]);
        let mut ids: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn add_with_all_fields() {
        let mut store = TaskStore::new();
        let task = store
            .add(
                NewTask::new("  Pay rent ")
                    .date("01/07/2024")
                    .priority("HIGH")
                    .repeat(" monthly ")
                    .notes("transfer"),
            )
            .unwrap();

        assert_eq!(task.item, "Pay rent");
        assert_eq!(task.date, Some(ymd(2024, 7, 1)));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.repeat.as_deref(), Some("monthly"));
        assert_eq!(task.notes, "transfer");
        assert!(!task.completed);
    }

    #[test]
    fn add_rejects_duplicate_case_insensitive() {
        let mut store = store_with(&["Buy Milk"]);
        let before = store.clone();

        let err = store.add(NewTask::new("buy milk")).unwrap_err();
        assert_eq!(err, TaskError::DuplicateItem("buy milk".to_string()));
        assert_eq!(store, before);
    }

    #[test]
    fn add_rejects_invalid_input() {
        let mut store = TaskStore::new();

        assert!(matches!(
            store.add(NewTask::new("x").date("next week")),
            Err(TaskError::InvalidDate(_))
        ));
        assert!(matches!(
            store.add(NewTask::new("x").priority("urgent")),
            Err(TaskError::InvalidPriority(_))
        ));
        assert_eq!(store.add(NewTask::new("   ")).unwrap_err(), TaskError::EmptyName);
        assert!(store.is_empty());
    }

    #[test]
    fn resolve_by_position() {
        let store = store_with(&["alpha", "beta", "gamma"]);
        match store.resolve("2") {
            Resolution::Found(task) => assert_eq!(task.item, "beta"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.resolve("4"), Resolution::NotFound);
    }

    #[test]
    fn resolve_by_id() {
        let store = store_with(&["alpha", "beta"]);
        let id = store.tasks()[1].id.to_string();
        match store.resolve(&id) {
            Resolution::Found(task) => assert_eq!(task.item, "beta"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resolve_by_unique_substring() {
        let store = store_with(&["Call mom", "Buy xyz cable"]);
        match store.resolve("CABLE") {
            Resolution::Found(task) => assert_eq!(task.item, "Buy xyz cable"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resolve_ambiguous_substring() {
        let store = store_with(&["xyz one", "two xyz", "three"]);
        match store.resolve("xyz") {
            Resolution::Ambiguous(candidates) => {
                let items: Vec<_> = candidates.iter().map(|t| t.item.as_str()).collect();
                assert_eq!(items, vec!["xyz one", "two xyz"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = store.resolve("xyz").into_result("xyz").unwrap_err();
        assert!(matches!(err, TaskError::AmbiguousMatch { ref candidates, .. } if candidates.len() == 2));
    }

    #[test]
    fn resolve_not_found() {
        let store = store_with(&["alpha"]);
        assert_eq!(store.resolve("zzz"), Resolution::NotFound);
        assert_eq!(store.resolve(""), Resolution::NotFound);
        assert_eq!(store.resolve("99999999999999999999999"), Resolution::NotFound);
    }

    #[test]
    fn resolve_zero_falls_through_to_name() {
        let store = store_with(&["Route 0"]);
        match store.resolve("0") {
            Resolution::Found(task) => assert_eq!(task.item, "Route 0"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resolve_uses_given_view_order() {
        let store = store_with(&["alpha", "beta"]);
        let view: Vec<&Task> = store.tasks().iter().rev().collect();
        match resolve(&view, "1") {
            Resolution::Found(task) => assert_eq!(task.item, "beta"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rename_rejects_empty() {
        let mut store = store_with(&["alpha"]);
        let id = store.tasks()[0].id.clone();

        assert_eq!(store.rename(&id, "  "), Err(TaskError::EmptyName));
        store.rename(&id, " omega ").unwrap();
        assert_eq!(store.tasks()[0].item, "omega");
    }

    #[test]
    fn set_date_parses_or_clears() {
        let mut store = store_with(&["alpha"]);
        let id = store.tasks()[0].id.clone();

        store.set_date(&id, "2024-05-01").unwrap();
        assert_eq!(store.tasks()[0].date, Some(ymd(2024, 5, 1)));

        assert!(matches!(store.set_date(&id, "soon"), Err(TaskError::InvalidDate(_))));
        assert_eq!(store.tasks()[0].date, Some(ymd(2024, 5, 1)));

        store.set_date(&id, "").unwrap();
        assert_eq!(store.tasks()[0].date, None);
    }

    #[test]
    fn mutations_on_missing_id_fail() {
        let mut store = store_with(&["alpha"]);
        let ghost: TaskId = "t-ghost00".parse().unwrap();

        assert!(matches!(store.set_notes(&ghost, "x"), Err(TaskError::NotFound(_))));
        assert!(matches!(store.toggle_completed(&ghost), Err(TaskError::NotFound(_))));
        assert!(store.remove(&ghost).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn toggle_weekly_spawns_next() {
        let mut store = TaskStore::new();
        store
            .add(NewTask::new("Review").date("2024-06-01").repeat("weekly"))
            .unwrap();
        let id = store.tasks()[0].id.clone();

        let next = store.toggle_completed(&id).unwrap().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(next.date, Some(ymd(2024, 6, 8)));
        assert!(!next.completed);
        assert_ne!(next.id, id);

        let original = store.get(&id).unwrap();
        assert!(original.completed);
        assert_eq!(original.date, Some(ymd(2024, 6, 1)));
    }

    #[test]
    fn toggle_back_does_not_spawn() {
        let mut store = TaskStore::new();
        store
            .add(NewTask::new("Review").date("2024-06-01").repeat("daily"))
            .unwrap();
        let id = store.tasks()[0].id.clone();

        store.toggle_completed(&id).unwrap();
        assert_eq!(store.toggle_completed(&id).unwrap(), None);
        assert!(!store.get(&id).unwrap().completed);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn toggle_without_date_or_rule_does_not_spawn() {
        let mut store = TaskStore::new();
        store.add(NewTask::new("No date").repeat("daily")).unwrap();
        store.add(NewTask::new("No rule").date("2024-06-01")).unwrap();
        store
            .add(NewTask::new("Bad rule").date("2024-06-01").repeat("whenever"))
            .unwrap();

        let ids: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            assert_eq!(store.toggle_completed(id).unwrap(), None);
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn clear_completed_counts() {
        let mut store = store_with(&["a", "b", "c", "d", "e"]);
        let ids: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
        store.toggle_completed(&ids[1]).unwrap();
        store.toggle_completed(&ids[3]).unwrap();

        assert_eq!(store.clear_completed(), 2);
        let items: Vec<_> = store.tasks().iter().map(|t| t.item.as_str()).collect();
        assert_eq!(items, vec!["a", "c", "e"]);
    }
}

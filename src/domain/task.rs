//! Task domain model
//!
//! A task is a single to-do item with an optional due date, a priority and
//! an optional recurrence rule. The serialized shape is the on-disk record
//! format (`id, item, date, priority, completed, repeat, notes, created`).

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::date;
use super::error::TaskError;
use super::id::TaskId;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Sort rank: most urgent first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(TaskError::InvalidPriority(s.trim().to_string())),
        }
    }
}

/// Current local time, the resolution used for `created`
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable
    pub id: TaskId,

    /// Display text, never empty
    pub item: String,

    /// Optional due date
    #[serde(with = "date::serde_text", default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub completed: bool,

    /// Recurrence rule text (see [`super::recurrence`])
    #[serde(default)]
    pub repeat: Option<String>,

    #[serde(default)]
    pub notes: String,

    /// Creation time, immutable
    pub created: NaiveDateTime,
}

impl Task {
    /// Creates an open task. Validation of `item` is the store's job.
    pub fn new(id: TaskId, item: impl Into<String>) -> Self {
        Self {
            id,
            item: item.into(),
            date: None,
            priority: Priority::default(),
            completed: false,
            repeat: None,
            notes: String::new(),
            created: now(),
        }
    }

    /// Returns the recurrence rule if it is set and non-blank
    pub fn repeat_rule(&self) -> Option<&str> {
        self.repeat.as_deref().filter(|rule| !rule.trim().is_empty())
    }

    /// Days from `today` until the due date (negative when overdue)
    pub fn days_until(&self, today: NaiveDate) -> Option<i64> {
        self.date.map(|d| (d - today).num_days())
    }

    /// Case-insensitive match of `query` in the item text
    pub fn item_contains(&self, query: &str) -> bool {
        self.item.to_lowercase().contains(&query.to_lowercase())
    }

    /// Synthesizes the next instance of a repeating task
    pub fn next_instance(&self, id: TaskId, date: NaiveDate) -> Task {
        Task {
            id,
            item: self.item.clone(),
            date: Some(date),
            priority: self.priority,
            completed: false,
            repeat: self.repeat.clone(),
            notes: self.notes.clone(),
            created: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(item: &str) -> Task {
        Task::new(format!("t-{:0>7}", item.len()).parse().unwrap(), item)
    }

    #[test]
    fn new_task_defaults() {
        let task = make_task("Water plants");
        assert_eq!(task.priority, Priority::Low);
        assert!(!task.completed);
        assert!(task.date.is_none());
        assert!(task.repeat.is_none());
        assert!(task.notes.is_empty());
    }

    #[test]
    fn priority_parsing() {
        assert_eq!(" HIGH ".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(
            "urgent".parse::<Priority>(),
            Err(TaskError::InvalidPriority("urgent".to_string()))
        );
    }

    #[test]
    fn blank_repeat_is_no_rule() {
        let mut task = make_task("Stretch");
        task.repeat = Some("  ".to_string());
        assert_eq!(task.repeat_rule(), None);

        task.repeat = Some("daily".to_string());
        assert_eq!(task.repeat_rule(), Some("daily"));
    }

    #[test]
    fn days_until_due() {
        let mut task = make_task("Pay rent");
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(task.days_until(today), None);

        task.date = NaiveDate::from_ymd_opt(2024, 6, 8);
        assert_eq!(task.days_until(today), Some(-2));
    }

    #[test]
    fn next_instance_carries_fields() {
        let mut task = make_task("Standup");
        task.priority = Priority::High;
        task.repeat = Some("weekly".to_string());
        task.notes = "room 4".to_string();
        task.completed = true;

        let next_date = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let next = task.next_instance("t-0000001".parse().unwrap(), next_date);

        assert_eq!(next.item, "Standup");
        assert_eq!(next.priority, Priority::High);
        assert_eq!(next.repeat.as_deref(), Some("weekly"));
        assert_eq!(next.notes, "room 4");
        assert_eq!(next.date, Some(next_date));
        assert!(!next.completed);
    }

    #[test]
    fn serde_record_shape() {
        let json = r#"{
            "id": "3f2b7c1e-8a4d-4e0f-9c1b-2d3e4f5a6b7c",
            "item": "Dentist",
            "date": "05/07/2024",
            "priority": "medium",
            "completed": false,
            "repeat": null,
            "notes": "",
            "created": "2024-06-01T09:30:00.123456"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2024, 7, 5));
        assert_eq!(task.priority, Priority::Medium);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["date"], "2024-07-05");
        assert_eq!(value["priority"], "medium");
        assert!(value["repeat"].is_null());
    }

    #[test]
    fn serde_empty_date_is_none() {
        let json = r#"{"id":"t-1","item":"x","date":"","priority":"low",
            "completed":true,"repeat":"daily","notes":"n","created":"2024-06-01T09:30:00"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.date, None);
        assert!(task.completed);
    }

    #[test]
    fn serde_rejects_bad_date() {
        let json = r#"{"id":"t-1","item":"x","date":"someday","priority":"low",
            "completed":false,"repeat":null,"notes":"","created":"2024-06-01T09:30:00"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }
}

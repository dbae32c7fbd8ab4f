//! Upgrade of the legacy record format
//!
//! The first version of the task file stored each task as a JSON array
//! `[item, date, priority]` with no ID or flags. [`upgrade`] turns those rows
//! into full task records. It is pure; the caller decides when to persist.

use chrono::Utc;
use log::warn;
use serde_json::Value;

use crate::domain::date::parse_date;
use crate::domain::{Priority, Task, TaskId};

/// Returns true if the parsed file uses the legacy list-of-rows shape
pub fn is_legacy(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|rows| rows.first())
        .is_some_and(Value::is_array)
}

fn text_at(row: &[Value], index: usize) -> &str {
    row.get(index).and_then(Value::as_str).unwrap_or("")
}

/// Converts legacy rows into tasks.
///
/// Rows with an empty item are dropped. An unparsable date becomes no date
/// and an unknown priority becomes low.
pub fn upgrade(rows: &[Vec<Value>]) -> Vec<Task> {
    let now = Utc::now();
    let mut tasks: Vec<Task> = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let item = text_at(row, 0).trim();
        if item.is_empty() {
            warn!("Dropping legacy row {} with an empty item", index + 1);
            continue;
        }

        let mut salt = index as u32;
        let id = loop {
            let id = TaskId::generate(item, now, salt);
            if tasks.iter().all(|t| t.id != id) {
                break id;
            }
            salt += rows.len() as u32;
        };

        let mut task = Task::new(id, item);
        task.date = parse_date(text_at(row, 1)).unwrap_or_else(|e| {
            warn!("Legacy row {}: {}; dropping the date", index + 1, e);
            None
        });
        task.priority = text_at(row, 2).parse().unwrap_or(Priority::Low);
        tasks.push(task);
    }

    tasks
}

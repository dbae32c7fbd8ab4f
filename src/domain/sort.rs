//! Deterministic task ordering
//!
//! All sorts are stable. Reversing keeps equal tasks in their original
//! relative order.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::task::Task;

/// Key to sort tasks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Item text, case-insensitive
    Name,
    /// Due date; undated tasks last
    Date,
    /// High, medium, low
    Priority,
    /// Open before completed
    Completed,
    /// Creation time
    Created,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Date => "date",
            SortKey::Priority => "priority",
            SortKey::Completed => "completed",
            SortKey::Created => "created",
        }
    }

    /// Parses a key name, `None` for anything unrecognized
    pub fn parse(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Name => a.item.to_lowercase().cmp(&b.item.to_lowercase()),
            SortKey::Date => match (a.date, b.date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::Completed => a.completed.cmp(&b.completed),
            SortKey::Created => a.created.cmp(&b.created),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "date" => Ok(SortKey::Date),
            "priority" => Ok(SortKey::Priority),
            "completed" | "done" => Ok(SortKey::Completed),
            "created" => Ok(SortKey::Created),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

/// Stable sort of owned or borrowed tasks by `key`
pub fn sort_tasks<T: Borrow<Task>>(tasks: &mut [T], key: SortKey, reverse: bool) {
    if reverse {
        tasks.sort_by(|a, b| key.compare(b.borrow(), a.borrow()));
    } else {
        tasks.sort_by(|a, b| key.compare(a.borrow(), b.borrow()));
    }
}

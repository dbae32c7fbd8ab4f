//! Due-date classification
//!
//! Open tasks with a due date fall into one of three buckets relative to a
//! reference day. Buckets are returned complete; truncating them for
//! display is up to the caller.

use chrono::NaiveDate;

use super::task::Task;

/// Tasks grouped by how soon they are due
#[derive(Debug, Default, PartialEq)]
pub struct DueReport<'a> {
    pub overdue: Vec<&'a Task>,
    pub due_today: Vec<&'a Task>,
    /// Tasks due within the lookahead window, with their day offset
    pub upcoming: Vec<(&'a Task, i64)>,
}

impl DueReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_today.is_empty() && self.upcoming.is_empty()
    }
}

/// Classifies open, dated tasks against `today` and a `lookahead_days` window
pub fn scan(tasks: &[Task], today: NaiveDate, lookahead_days: u32) -> DueReport<'_> {
    let mut report = DueReport::default();

    for task in tasks.iter().filter(|t| !t.completed) {
        let Some(days) = task.days_until(today) else {
            continue;
        };

        if days < 0 {
            report.overdue.push(task);
        } else if days == 0 {
            report.due_today.push(task);
        } else if days <= i64::from(lookahead_days) {
            report.upcoming.push((task, days));
        }
    }

    report
}

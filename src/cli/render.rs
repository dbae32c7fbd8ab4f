//! Table and reminder rendering
//!
//! Rendering never touches tasks; it only formats them. Padding is applied
//! before coloring so ANSI codes do not break column alignment.

use chrono::NaiveDate;
use crossterm::style::Stylize;

use crate::domain::date::format_date;
use crate::domain::{DueReport, Priority, Task, TaskId};

const HEADERS: [&str; 6] = ["Item", "Date", "Priority", "Done", "Repeat", "Notes"];
const SEPARATOR: &str = " | ";

/// Reminder sections show at most this many tasks each
pub const REMINDER_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Tone {
    Red,
    Yellow,
    Green,
    Cyan,
    Magenta,
}

fn paint(text: String, color: bool, tone: Tone) -> String {
    if !color {
        return text;
    }
    let styled = match tone {
        Tone::Red => text.red(),
        Tone::Yellow => text.yellow(),
        Tone::Green => text.green(),
        Tone::Cyan => text.cyan(),
        Tone::Magenta => text.magenta(),
    };
    styled.to_string()
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn cells(task: &Task) -> [String; 6] {
    [
        task.item.clone(),
        format_date(task.date),
        task.priority.to_string(),
        if task.completed { "✔" } else { "" }.to_string(),
        task.repeat.clone().unwrap_or_default(),
        task.notes.clone(),
    ]
}

/// Renders numbered rows as a table.
///
/// With color on, priorities are colored and overdue or due-today items are
/// highlighted relative to `today`.
pub fn table(rows: &[(usize, &Task)], today: NaiveDate, color: bool) -> String {
    if rows.is_empty() {
        return "Nothing to display.\n".to_string();
    }

    let all_cells: Vec<[String; 6]> = rows.iter().map(|(_, t)| cells(t)).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &all_cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let number_width = rows
        .iter()
        .map(|(n, _)| n.to_string().len())
        .max()
        .unwrap_or(1)
        .max(2);

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| pad(h, *w))
        .collect();
    out.push_str(&format!(
        "{}  {}\n",
        " ".repeat(number_width),
        header.join(SEPARATOR).trim_end()
    ));
    let rule_width = number_width + 2 + widths.iter().sum::<usize>() + SEPARATOR.len() * 5;
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');

    for ((number, task), row) in rows.iter().zip(all_cells.iter()) {
        let mut padded: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| pad(cell, *w))
            .collect();

        match task.days_until(today) {
            Some(days) if days < 0 && !task.completed => {
                padded[0] = paint(padded[0].clone(), color, Tone::Red);
            }
            Some(0) if !task.completed => {
                padded[0] = paint(padded[0].clone(), color, Tone::Cyan);
            }
            _ => {}
        }
        let tone = match task.priority {
            Priority::High => Tone::Red,
            Priority::Medium => Tone::Yellow,
            Priority::Low => Tone::Green,
        };
        padded[2] = paint(padded[2].clone(), color, tone);

        out.push_str(&format!(
            "{:>width$}. {}\n",
            number,
            padded.join(SEPARATOR).trim_end(),
            width = number_width
        ));
    }

    out
}

/// Renders tasks numbered 1..n
pub fn numbered_table(tasks: &[&Task], today: NaiveDate, color: bool) -> String {
    let rows: Vec<(usize, &Task)> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (i + 1, *t))
        .collect();
    table(&rows, today, color)
}

/// Lists the tasks an ambiguous identifier matched
pub fn candidates(candidates: &[(TaskId, String)]) -> String {
    let mut out = String::from("Multiple matches found:\n");
    for (i, (id, item)) in candidates.iter().enumerate() {
        out.push_str(&format!("  {}. {} (id: {})\n", i + 1, item, id));
    }
    out.push_str("Be more specific or use the numeric index.\n");
    out
}

/// Tasks the due report shows, in the order it shows them
pub fn due_rows<'a>(report: &DueReport<'a>) -> Vec<&'a Task> {
    let overdue = report.overdue.iter().copied().take(REMINDER_LIMIT);
    let today = report.due_today.iter().copied().take(REMINDER_LIMIT);
    let upcoming = report.upcoming.iter().map(|(t, _)| *t).take(REMINDER_LIMIT);
    overdue.chain(today).chain(upcoming).collect()
}

/// Renders the reminder sections; empty when nothing is due.
///
/// `number` gives the identifier printed for each row, so the numbers shown
/// resolve to the same tasks in whatever lookup order the caller uses.
pub fn due_report(
    report: &DueReport<'_>,
    today: NaiveDate,
    reminder_days: u32,
    color: bool,
    number: impl Fn(&Task) -> usize,
) -> String {
    let mut out = String::new();

    let mut section = |title: String, tone: Tone, tasks: Vec<&Task>| {
        if tasks.is_empty() {
            return;
        }
        let rows: Vec<(usize, &Task)> = tasks
            .into_iter()
            .take(REMINDER_LIMIT)
            .map(|t| (number(t), t))
            .collect();
        out.push_str(&paint(title, color, tone));
        out.push('\n');
        out.push_str(&table(&rows, today, color));
        out.push('\n');
    };

    section("OVERDUE tasks:".to_string(), Tone::Red, report.overdue.clone());
    section("Due TODAY:".to_string(), Tone::Cyan, report.due_today.clone());
    section(
        format!("Due in next {} days:", reminder_days),
        Tone::Magenta,
        report.upcoming.iter().map(|(t, _)| *t).collect(),
    );

    out
}

//! One-shot task commands
//!
//! Each command loads the workspace, applies a single operation and saves
//! when something changed. Numeric identifiers refer to stored order, which
//! is the numbering `todo list` prints.

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;

use super::output::Output;
use super::render;
use crate::domain::date::format_date;
use crate::domain::query::{search as search_tasks, Filter};
use crate::domain::sort::sort_tasks;
use crate::domain::{scan, NewTask, Priority, Session, SortKey, Task, TaskError, TaskId};
use crate::storage::export::export_csv;
use crate::storage::Workspace;

/// A listed task with its stored position
#[derive(Serialize)]
struct Row<'a> {
    number: usize,
    #[serde(flatten)]
    task: &'a Task,
}

fn numbered<'a>(session: &Session, shown: Vec<&'a Task>) -> Vec<(usize, &'a Task)> {
    shown
        .into_iter()
        .map(|t| (session.store().position(&t.id).unwrap_or_default(), t))
        .collect()
}

fn positioned<'a>(tasks: &[&'a Task], position: impl Fn(&Task) -> usize) -> Vec<Row<'a>> {
    tasks
        .iter()
        .map(|task| Row {
            number: position(task),
            task: *task,
        })
        .collect()
}

fn print_rows(output: &Output, rows: &[(usize, &Task)], today: NaiveDate) {
    if output.is_json() {
        let data: Vec<Row<'_>> = rows
            .iter()
            .map(|(number, task)| Row {
                number: *number,
                task: *task,
            })
            .collect();
        output.data(&data);
    } else {
        output.text(&render::table(rows, today, output.color()));
    }
}

/// Resolves an identifier, listing the candidates when it is ambiguous
fn resolve(session: &Session, output: &Output, identifier: &str) -> Result<TaskId> {
    match session.resolve_id(identifier) {
        Ok(id) => Ok(id),
        Err(e) => {
            if let TaskError::AmbiguousMatch { candidates, .. } = &e {
                if !output.is_json() {
                    eprint!("{}", render::candidates(candidates));
                }
            }
            Err(e.into())
        }
    }
}

/// Loads the session, applies `op` and saves if anything changed
fn edit<T>(workspace: &Workspace, op: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
    let mut session = workspace.load_session()?;
    let out = op(&mut session)?;
    if session.is_dirty() {
        workspace.save_session(&mut session)?;
    }
    Ok(out)
}

pub fn add(
    workspace: &Workspace,
    output: &Output,
    item: String,
    date: Option<String>,
    priority: Option<String>,
    repeat: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let mut new = NewTask::new(item);
    if let Some(date) = date {
        new = new.date(date);
    }
    if let Some(priority) = priority {
        new = new.priority(priority);
    }
    if let Some(repeat) = repeat {
        new = new.repeat(repeat);
    }
    if let Some(notes) = notes {
        new = new.notes(notes);
    }

    let task = edit(workspace, |session| Ok(session.add(new)?))?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Added: {} ({})", task.item, task.id));
    }
    Ok(())
}

pub fn list(
    workspace: &Workspace,
    output: &Output,
    today: NaiveDate,
    active: bool,
    completed: bool,
    sort: Option<&str>,
    reverse: bool,
) -> Result<()> {
    let session = workspace.load_session()?;

    let filter = if active {
        Filter::Active
    } else if completed {
        Filter::Completed
    } else {
        Filter::All
    };
    let mut shown = filter.apply(session.tasks());

    if let Some(key) = sort {
        let key = SortKey::parse(key).ok_or_else(|| anyhow!("Unknown sort key: {}", key))?;
        sort_tasks(&mut shown, key, reverse);
    }

    let rows = numbered(&session, shown);
    print_rows(output, &rows, today);
    Ok(())
}

pub fn remove(workspace: &Workspace, output: &Output, identifier: &str) -> Result<()> {
    let removed = edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        session
            .remove(&id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()).into())
    })?;

    output.success(&format!("Deleted: {}", removed.item));
    Ok(())
}

pub fn rename(workspace: &Workspace, output: &Output, identifier: &str, name: &str) -> Result<()> {
    edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        Ok(session.rename(&id, name)?)
    })?;

    output.success(&format!("Renamed to: {}", name.trim()));
    Ok(())
}

pub fn toggle(workspace: &Workspace, output: &Output, identifier: &str) -> Result<()> {
    let (task, next) = edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        let next = session.toggle_completed(&id)?;
        let task = session
            .store()
            .get(&id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        Ok((task, next))
    })?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "next": next,
        }));
        return Ok(());
    }

    let state = if task.completed { "done" } else { "not done" };
    output.success(&format!("Marked {}: {}", state, task.item));
    if let Some(next) = next {
        output.success(&format!(
            "Next occurrence created for {}",
            format_date(next.date)
        ));
    }
    Ok(())
}

pub fn set_priority(workspace: &Workspace, output: &Output, identifier: &str, value: &str) -> Result<()> {
    let priority: Priority = value.parse()?;
    edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        Ok(session.set_priority(&id, priority)?)
    })?;

    output.success(&format!("Priority set to {}", priority));
    Ok(())
}

pub fn set_date(workspace: &Workspace, output: &Output, identifier: &str, date: &str) -> Result<()> {
    edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        Ok(session.set_date(&id, date)?)
    })?;

    if date.trim().is_empty() {
        output.success("Date cleared");
    } else {
        output.success("Date updated");
    }
    Ok(())
}

pub fn set_repeat(workspace: &Workspace, output: &Output, identifier: &str, rule: &str) -> Result<()> {
    edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        Ok(session.set_repeat(&id, rule)?)
    })?;

    if rule.trim().is_empty() {
        output.success("Repeat rule cleared");
    } else {
        output.success(&format!("Repeat rule set to {}", rule.trim()));
    }
    Ok(())
}

pub fn set_notes(workspace: &Workspace, output: &Output, identifier: &str, text: &str) -> Result<()> {
    edit(workspace, |session| {
        let id = resolve(session, output, identifier)?;
        Ok(session.set_notes(&id, text)?)
    })?;

    output.success("Notes updated");
    Ok(())
}

pub fn search(workspace: &Workspace, output: &Output, today: NaiveDate, query: &str) -> Result<()> {
    let session = workspace.load_session()?;
    let found = search_tasks(session.tasks(), query);

    if found.is_empty() && !output.is_json() {
        println!("No matches for '{}'", query);
        return Ok(());
    }

    let rows = numbered(&session, found);
    print_rows(output, &rows, today);
    Ok(())
}

pub fn sort(workspace: &Workspace, output: &Output, key: &str, reverse: bool) -> Result<()> {
    let key: SortKey = key.parse().map_err(|e: String| anyhow!(e))?;
    edit(workspace, |session| {
        session.sort(Some(key), reverse);
        Ok(())
    })?;

    output.success(&format!("Sorted by {}", key));
    Ok(())
}

pub fn export(workspace: &Workspace, output: &Output, file: &Path) -> Result<()> {
    let session = workspace.load_session()?;
    export_csv(session.tasks(), file)?;

    output.success(&format!(
        "Exported {} tasks to {}",
        session.tasks().len(),
        file.display()
    ));
    Ok(())
}

pub fn clear_completed(workspace: &Workspace, output: &Output) -> Result<()> {
    let removed = edit(workspace, |session| Ok(session.clear_completed()))?;

    if removed == 0 {
        output.success("No completed tasks");
    } else {
        output.success(&format!("Cleared {} completed tasks", removed));
    }
    Ok(())
}

pub fn undo(workspace: &Workspace, output: &Output) -> Result<()> {
    edit(workspace, |session| Ok(session.undo()?))?;

    output.success("Undo successful");
    Ok(())
}

pub fn due(workspace: &Workspace, output: &Output, today: NaiveDate) -> Result<()> {
    let session = workspace.load_session()?;
    let reminder_days = workspace.config().reminder_days;
    let report = scan(session.tasks(), today, reminder_days);
    let position = |task: &Task| session.store().position(&task.id).unwrap_or_default();

    if output.is_json() {
        output.data(&serde_json::json!({
            "overdue": positioned(&report.overdue, &position),
            "due_today": positioned(&report.due_today, &position),
            "upcoming": report
                .upcoming
                .iter()
                .map(|(task, days)| {
                    serde_json::json!({ "days": days, "number": position(*task), "task": task })
                })
                .collect::<Vec<_>>(),
        }));
    } else if report.is_empty() {
        println!("Nothing due");
    } else {
        output.text(&render::due_report(
            &report,
            today,
            reminder_days,
            output.color(),
            &position,
        ));
    }
    Ok(())
}

pub fn backup(workspace: &Workspace, output: &Output) -> Result<()> {
    let session = workspace.load_session()?;
    let path = workspace.backup_now(&session)?;

    output.success(&format!("Backup written to {}", path.display()));
    Ok(())
}

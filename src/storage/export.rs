//! CSV export

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::date::format_date;
use crate::domain::Task;

pub const DEFAULT_EXPORT_FILE: &str = "tasks_export.csv";

const COLUMNS: [&str; 8] = [
    "id", "item", "date", "priority", "completed", "repeat", "notes", "created",
];

/// Writes one CSV record per task, in the given order
pub fn write_csv<W: Write>(tasks: &[Task], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(COLUMNS).context("Failed to write CSV header")?;

    for task in tasks {
        let completed = task.completed.to_string();
        let created = task.created.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
        out.write_record([
            task.id.as_str(),
            task.item.as_str(),
            format_date(task.date).as_str(),
            task.priority.as_str(),
            completed.as_str(),
            task.repeat.as_deref().unwrap_or(""),
            task.notes.as_str(),
            created.as_str(),
        ])
        .with_context(|| format!("Failed to write CSV record for {}", task.id))?;
    }

    out.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Exports tasks to a CSV file at `path`
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(tasks, file)
}

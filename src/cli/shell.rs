//! Interactive menu
//!
//! The shell keeps one [`Session`] alive for the whole run. Every listing it
//! prints is presented to the session, so a number typed afterwards refers
//! to the row just shown.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use log::{debug, warn};

use super::render;
use crate::domain::date::{format_date, parse_date};
use crate::domain::query::{search, Filter};
use crate::domain::{scan, NewTask, Priority, Recurrence, Session, SortKey, Task, TaskError, TaskId};
use crate::storage::export::{export_csv, DEFAULT_EXPORT_FILE};
use crate::storage::Workspace;

const MENU: &str = "
 1. Add item
 2. Remove item
 3. List all
 4. List active
 5. List completed
 6. Rename item
 7. Toggle done
 8. Change priority
 9. Change date
10. Change repeat rule
11. Edit notes
12. Search
13. Sort
14. Export CSV
15. Clear completed
16. Undo
17. Toggle autosave
18. Show config
19. Save now
20. Backup now
 0. Exit
";

enum Flow {
    Continue,
    Exit,
}

/// Menu-driven session over any line input and text output
pub struct Shell<'w, R, W> {
    workspace: &'w mut Workspace,
    session: Session,
    input: R,
    out: W,
    color: bool,
    today: NaiveDate,
}

impl<'w, R: BufRead, W: Write> Shell<'w, R, W> {
    pub fn new(
        workspace: &'w mut Workspace,
        session: Session,
        input: R,
        out: W,
        color: bool,
        today: NaiveDate,
    ) -> Self {
        Self {
            workspace,
            session,
            input,
            out,
            color,
            today,
        }
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Runs until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        let sort = self.workspace.config().default_sort.clone();
        self.session.sort(sort.sort_key(), sort.reverse);
        // The startup sort alone is not an unsaved change
        self.session.mark_saved();

        // Reminders count as a listing: their numbers select the rows shown
        let days = self.workspace.config().reminder_days;
        let report = scan(self.session.tasks(), self.today, days);
        if !report.is_empty() {
            let shown: Vec<Task> = render::due_rows(&report).into_iter().cloned().collect();
            let number = |task: &Task| {
                shown
                    .iter()
                    .position(|s| s.id == task.id)
                    .map_or(0, |i| i + 1)
            };
            let text = render::due_report(&report, self.today, days, self.color, number);
            write!(self.out, "{}", text)?;
            self.session.present(&shown);
        }

        loop {
            write!(self.out, "{}", MENU)?;
            let Some(choice) = self.prompt("Choose an option: ")? else {
                break;
            };
            if let Flow::Exit = self.dispatch(&choice)? {
                break;
            }
        }

        self.finish()
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        debug!("Menu choice '{}'", choice);
        match choice.to_lowercase().as_str() {
            "1" => self.add()?,
            "2" => self.remove()?,
            "3" => self.list(Filter::All)?,
            "4" => self.list(Filter::Active)?,
            "5" => self.list(Filter::Completed)?,
            "6" => self.rename()?,
            "7" => self.toggle()?,
            "8" => self.change_priority()?,
            "9" => self.change_date()?,
            "10" => self.change_repeat()?,
            "11" => self.edit_notes()?,
            "12" => self.search()?,
            "13" => self.sort()?,
            "14" => self.export()?,
            "15" => self.clear_completed()?,
            "16" => self.undo()?,
            "17" => self.toggle_autosave()?,
            "18" => self.show_config()?,
            "19" => self.save_now()?,
            "20" => self.backup_now()?,
            "0" | "q" | "quit" | "exit" => return Ok(Flow::Exit),
            "" => {}
            _ => self.say("Invalid choice.")?,
        }
        Ok(Flow::Continue)
    }

    fn finish(&mut self) -> Result<()> {
        if self.session.is_dirty() {
            if self.workspace.config().autosave {
                self.save()?;
            } else if self.confirm("Save changes before exit? (y/n): ")? {
                self.save()?;
            } else {
                warn!("Exiting with unsaved changes");
            }
        }
        self.say("Goodbye!")
    }

    // Input and output helpers

    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.prompt(label)?.unwrap_or_default().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{}", message)?;
        Ok(())
    }

    fn report(&mut self, error: &TaskError) -> Result<()> {
        match error {
            TaskError::AmbiguousMatch { candidates, .. } => {
                write!(self.out, "{}", render::candidates(candidates))?;
                Ok(())
            }
            other => self.say(&other.to_string()),
        }
    }

    /// Asks for a task identifier and resolves it against the last listing
    fn pick(&mut self) -> Result<Option<TaskId>> {
        if self.session.tasks().is_empty() {
            self.say("No tasks yet.")?;
            return Ok(None);
        }

        let Some(identifier) = self.prompt("Task (number, ID or part of the name): ")? else {
            return Ok(None);
        };
        if identifier.is_empty() {
            return Ok(None);
        }

        match self.session.resolve_id(&identifier) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                self.report(&e)?;
                Ok(None)
            }
        }
    }

    fn show(&mut self, shown: Vec<Task>) -> Result<()> {
        let rows: Vec<&Task> = shown.iter().collect();
        write!(
            self.out,
            "{}",
            render::numbered_table(&rows, self.today, self.color)
        )?;
        self.session.present(&shown);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        match self.workspace.save_session(&mut self.session) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Save failed: {:#}", e);
                self.say(&format!("Error saving data: {:#}", e))
            }
        }
    }

    /// Saves after a successful change when autosave is on
    fn changed(&mut self, message: &str) -> Result<()> {
        self.say(message)?;
        if self.workspace.config().autosave {
            self.save()?;
        }
        Ok(())
    }

    // Menu actions

    fn add(&mut self) -> Result<()> {
        let Some(item) = self.prompt("Item: ")? else {
            return Ok(());
        };
        if item.is_empty() {
            return self.report(&TaskError::EmptyName);
        }
        let lowered = item.to_lowercase();
        if self.session.tasks().iter().any(|t| t.item.to_lowercase() == lowered) {
            return self.report(&TaskError::DuplicateItem(item));
        }

        let Some(date) = self.prompt("Due date (YYYY-MM-DD or DD/MM/YYYY, blank for none): ")? else {
            return Ok(());
        };
        if let Err(e) = parse_date(&date) {
            return self.say(&e.to_string());
        }

        let Some(priority) = self.prompt("Priority (high/medium/low) [low]: ")? else {
            return Ok(());
        };
        let priority = if priority.is_empty() {
            Priority::default()
        } else {
            match priority.parse::<Priority>() {
                Ok(p) => p,
                Err(_) => {
                    self.say("Invalid priority; using low.")?;
                    Priority::Low
                }
            }
        };

        let Some(repeat) = self.prompt("Repeat (daily, weekly, monthly, every N days, mon,wed; blank for none): ")? else {
            return Ok(());
        };
        if !repeat.is_empty() && Recurrence::parse(&repeat).is_none() {
            self.say("Repeat rule not recognized; no new occurrences will be created.")?;
        }

        let Some(notes) = self.prompt("Notes: ")? else {
            return Ok(());
        };

        let new = NewTask::new(item)
            .date(date)
            .priority(priority.as_str())
            .repeat(repeat)
            .notes(notes);
        match self.session.add(new) {
            Ok(_) => self.changed("Item added."),
            Err(e) => self.report(&e),
        }
    }

    fn remove(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        let item = self
            .session
            .store()
            .get(&id)
            .map(|t| t.item.clone())
            .unwrap_or_default();

        if !self.confirm(&format!("Delete '{}'? (y/n): ", item))? {
            return self.say("Cancelled.");
        }
        match self.session.remove(&id) {
            Some(_) => self.changed("Deleted."),
            None => self.say("Task not found."),
        }
    }

    fn list(&mut self, filter: Filter) -> Result<()> {
        let shown: Vec<Task> = filter
            .apply(self.session.tasks())
            .into_iter()
            .cloned()
            .collect();
        self.show(shown)
    }

    fn rename(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        let Some(name) = self.prompt("New name: ")? else {
            return Ok(());
        };
        match self.session.rename(&id, &name) {
            Ok(()) => self.changed("Renamed."),
            Err(e) => self.report(&e),
        }
    }

    fn toggle(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        match self.session.toggle_completed(&id) {
            Ok(next) => {
                let done = self.session.store().get(&id).is_some_and(|t| t.completed);
                if let Some(next) = next {
                    self.say(&format!(
                        "Next occurrence created, due {}.",
                        format_date(next.date)
                    ))?;
                }
                self.changed(if done { "Marked done." } else { "Marked not done." })
            }
            Err(e) => self.report(&e),
        }
    }

    fn change_priority(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        let Some(text) = self.prompt("New priority (high/medium/low): ")? else {
            return Ok(());
        };
        let priority = match text.parse::<Priority>() {
            Ok(p) => p,
            Err(e) => return self.report(&e),
        };
        match self.session.set_priority(&id, priority) {
            Ok(()) => self.changed("Priority updated."),
            Err(e) => self.report(&e),
        }
    }

    fn change_date(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        let Some(text) = self.prompt("New date (blank to clear): ")? else {
            return Ok(());
        };
        match self.session.set_date(&id, &text) {
            Ok(()) => self.changed("Date updated."),
            Err(e) => self.report(&e),
        }
    }

    fn change_repeat(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        let Some(rule) = self.prompt("New repeat rule (blank to clear): ")? else {
            return Ok(());
        };
        match self.session.set_repeat(&id, &rule) {
            Ok(()) => self.changed("Repeat rule updated."),
            Err(e) => self.report(&e),
        }
    }

    fn edit_notes(&mut self) -> Result<()> {
        let Some(id) = self.pick()? else {
            return Ok(());
        };
        let Some(notes) = self.prompt("Notes (blank to clear): ")? else {
            return Ok(());
        };
        match self.session.set_notes(&id, &notes) {
            Ok(()) => self.changed("Notes updated."),
            Err(e) => self.report(&e),
        }
    }

    fn search(&mut self) -> Result<()> {
        let Some(query) = self.prompt("Search for: ")? else {
            return Ok(());
        };
        let found: Vec<Task> = search(self.session.tasks(), &query)
            .into_iter()
            .cloned()
            .collect();
        if found.is_empty() {
            return self.say("No matches.");
        }
        self.show(found)
    }

    fn sort(&mut self) -> Result<()> {
        let Some(text) = self.prompt("Sort by (name/date/priority/completed/created): ")? else {
            return Ok(());
        };
        let key = match text.parse::<SortKey>() {
            Ok(key) => key,
            Err(e) => return self.say(&e),
        };
        let reverse = self.confirm("Reverse order? (y/n): ")?;

        self.session.sort(Some(key), reverse);
        self.changed(&format!("Sorted by {}.", key))
    }

    fn export(&mut self) -> Result<()> {
        let Some(file) = self.prompt(&format!("File name [{}]: ", DEFAULT_EXPORT_FILE))? else {
            return Ok(());
        };
        let path = if file.is_empty() {
            PathBuf::from(DEFAULT_EXPORT_FILE)
        } else {
            PathBuf::from(file)
        };

        match export_csv(self.session.tasks(), &path) {
            Ok(()) => self.say(&format!("Exported to {}.", path.display())),
            Err(e) => self.say(&format!("Export failed: {:#}", e)),
        }
    }

    fn clear_completed(&mut self) -> Result<()> {
        if !self.session.tasks().iter().any(|t| t.completed) {
            return self.say("No completed tasks.");
        }
        if !self.confirm("Remove all completed tasks? (y/n): ")? {
            return self.say("Cancelled.");
        }
        let removed = self.session.clear_completed();
        self.changed(&format!("Cleared {} completed tasks.", removed))
    }

    fn undo(&mut self) -> Result<()> {
        match self.session.undo() {
            Ok(()) => self.changed("Undo successful."),
            Err(e) => self.report(&e),
        }
    }

    fn toggle_autosave(&mut self) -> Result<()> {
        let config = self.workspace.config_mut();
        config.autosave = !config.autosave;
        let on = config.autosave;

        if let Err(e) = self.workspace.save_config() {
            self.say(&format!("Error saving config: {:#}", e))?;
        }
        self.say(if on { "Autosave is now ON." } else { "Autosave is now OFF." })
    }

    fn show_config(&mut self) -> Result<()> {
        let text = self.workspace.config().to_toml()?;
        write!(self.out, "{}", text)?;
        Ok(())
    }

    fn save_now(&mut self) -> Result<()> {
        self.save()?;
        if !self.session.is_dirty() {
            self.say("Saved.")?;
        }
        Ok(())
    }

    fn backup_now(&mut self) -> Result<()> {
        match self.workspace.backup_now(&self.session) {
            Ok(path) => self.say(&format!("Backup written to {}.", path.display())),
            Err(e) => self.say(&format!("Backup failed: {:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn run_script(dir: &Path, script: &str) -> (String, Session) {
        let mut workspace = Workspace::open(dir).unwrap();
        let session = workspace.load_session().unwrap();
        let mut out = Vec::new();

        let mut shell = Shell::new(
            &mut workspace,
            session,
            Cursor::new(script.as_bytes().to_vec()),
            &mut out,
            false,
            today(),
        );
        shell.run().unwrap();
        let session = shell.into_session();

        (String::from_utf8(out).unwrap(), session)
    }

    fn reload(dir: &Path) -> Session {
        Workspace::open(dir).unwrap().load_session().unwrap()
    }

    #[test]
    fn add_list_and_autosave() {
        let dir = TempDir::new().unwrap();
        let (out, session) = run_script(
            dir.path(),
            "1\nBuy milk\n2024-06-12\nhigh\n\nfrom the shop\n3\n0\n",
        );

        assert!(out.contains("Item added."));
        assert!(out.contains("Buy milk"));
        assert!(out.contains("2024-06-12"));
        assert!(out.contains("Goodbye!"));

        let task = &session.tasks()[0];
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.notes, "from the shop");
        assert_eq!(reload(dir.path()).tasks().len(), 1);
    }

    #[test]
    fn invalid_date_cancels_add() {
        let dir = TempDir::new().unwrap();
        let (out, session) = run_script(dir.path(), "1\nTask\n31/02/2024\n0\n");

        assert!(out.contains("Unrecognized date"));
        assert!(session.tasks().is_empty());
    }

    #[test]
    fn invalid_priority_defaults_to_low() {
        let dir = TempDir::new().unwrap();
        let (out, session) = run_script(dir.path(), "1\nTask\n\nurgent\n\n\n0\n");

        assert!(out.contains("Invalid priority; using low."));
        assert_eq!(session.tasks()[0].priority, Priority::Low);
    }

    #[test]
    fn duplicate_is_rejected_before_other_prompts() {
        let dir = TempDir::new().unwrap();
        let (out, session) = run_script(dir.path(), "1\nA\n\n\n\n\n1\na\n0\n");

        assert!(out.contains("Item already exists"));
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn numbers_refer_to_last_listing() {
        let dir = TempDir::new().unwrap();
        let script = "1\nalpha\n\n\n\n\n\
                      1\nbeta\n\n\n\n\n\
                      7\n1\n\
                      4\n\
                      7\n1\n\
                      0\n";
        let (_, session) = run_script(dir.path(), script);

        assert!(session.tasks().iter().all(|t| t.completed));
    }

    #[test]
    fn ambiguous_name_lists_candidates() {
        let dir = TempDir::new().unwrap();
        let script = "1\nBuy milk\n\n\n\n\n\
                      1\nBuy bread\n\n\n\n\n\
                      2\nbuy\n\
                      0\n";
        let (out, session) = run_script(dir.path(), script);

        assert!(out.contains("Multiple matches found:"));
        assert!(out.contains("Buy milk"));
        assert!(out.contains("Buy bread"));
        assert_eq!(session.tasks().len(), 2);
    }

    #[test]
    fn remove_confirms_and_undo_restores() {
        let dir = TempDir::new().unwrap();
        let script = "1\nOnly task\n\n\n\n\n\
                      2\nonly\nn\n\
                      2\nonly\ny\n\
                      16\n\
                      0\n";
        let (out, session) = run_script(dir.path(), script);

        assert!(out.contains("Cancelled."));
        assert!(out.contains("Deleted."));
        assert!(out.contains("Undo successful."));
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn completing_recurring_task_spawns_next() {
        let dir = TempDir::new().unwrap();
        let script = "1\nPay rent\n2024-06-01\n\nmonthly\n\n\
                      7\nrent\n\
                      0\n";
        let (out, session) = run_script(dir.path(), script);

        assert!(out.contains("Next occurrence created, due 2024-07-01."));
        assert_eq!(session.tasks().len(), 2);
        assert!(session.tasks()[0].completed);
        assert!(!session.tasks()[1].completed);
    }

    #[test]
    fn startup_shows_overdue_tasks() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::open(dir.path()).unwrap();
        let mut session = workspace.load_session().unwrap();
        session
            .add(NewTask::new("File taxes").date("2024-06-01"))
            .unwrap();
        workspace.save_session(&mut session).unwrap();

        let (out, _) = run_script(dir.path(), "0\n");
        assert!(out.contains("OVERDUE tasks:"));
        assert!(out.contains("File taxes"));
    }

    #[test]
    fn reminder_numbers_select_the_rows_shown() {
        let dir = TempDir::new().unwrap();
        let mut workspace = Workspace::open(dir.path()).unwrap();
        workspace.config_mut().default_sort.key = "name".to_string();
        workspace.save_config().unwrap();

        let mut session = workspace.load_session().unwrap();
        session.add(NewTask::new("a soon").date("2024-06-12")).unwrap();
        session.add(NewTask::new("b late").date("2024-06-01")).unwrap();
        session.add(NewTask::new("c today").date("2024-06-10")).unwrap();
        workspace.save_session(&mut session).unwrap();

        let (out, session) = run_script(dir.path(), "7\n3\n0\n");

        assert!(out.contains(" 1. b late"));
        assert!(out.contains(" 2. c today"));
        assert!(out.contains(" 3. a soon"));
        let done: Vec<&str> = session
            .tasks()
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.item.as_str())
            .collect();
        assert_eq!(done, vec!["a soon"]);
    }

    #[test]
    fn exit_without_autosave_asks_before_saving() {
        let dir = TempDir::new().unwrap();
        let mut workspace = Workspace::open(dir.path()).unwrap();
        workspace.config_mut().autosave = false;
        workspace.save_config().unwrap();

        let (out, _) = run_script(dir.path(), "1\nDraft\n\n\n\n\n0\nn\n");
        assert!(out.contains("Save changes before exit?"));
        assert!(reload(dir.path()).tasks().is_empty());

        run_script(dir.path(), "1\nKeep\n\n\n\n\n0\ny\n");
        assert_eq!(reload(dir.path()).tasks()[0].item, "Keep");
    }

    #[test]
    fn end_of_input_exits() {
        let dir = TempDir::new().unwrap();
        let (out, _) = run_script(dir.path(), "3\n");

        assert!(out.contains("Nothing to display."));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn export_writes_csv() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");
        let script = format!("1\nTask\n\n\n\n\n14\n{}\n0\n", target.display());

        let (out, _) = run_script(dir.path(), &script);
        assert!(out.contains("Exported to"));
        assert!(std::fs::read_to_string(&target).unwrap().contains("Task"));
    }
}

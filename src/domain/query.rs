//! Search and list filters

use super::task::Task;

/// Tasks whose item or notes contain `query`, case-insensitive
pub fn search<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    tasks
        .iter()
        .filter(|t| t.item.to_lowercase().contains(&query) || t.notes.to_lowercase().contains(&query))
        .collect()
}

/// Which tasks a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

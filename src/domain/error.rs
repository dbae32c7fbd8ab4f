//! Errors raised by task operations

use thiserror::Error;

use super::date::DateError;
use super::id::TaskId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Item already exists: {0}")]
    DuplicateItem(String),

    #[error(transparent)]
    InvalidDate(#[from] DateError),

    #[error("Invalid priority '{0}': expected high, medium or low")]
    InvalidPriority(String),

    #[error("Item name must not be empty")]
    EmptyName,

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("'{query}' matches {} tasks; be more specific or use the numeric index", candidates.len())]
    AmbiguousMatch {
        query: String,
        candidates: Vec<(TaskId, String)>,
    },

    #[error("Nothing to undo")]
    HistoryEmpty,
}

//! Domain models for the task manager
//!
//! Contains the core business logic without any I/O concerns.

pub mod date;
mod error;
mod history;
mod id;
pub mod notify;
pub mod query;
pub mod recurrence;
mod session;
pub mod sort;
mod store;
mod task;

pub use error::TaskError;
pub use history::UndoHistory;
pub use id::{IdError, TaskId};
pub use notify::{scan, DueReport};
pub use recurrence::{next_occurrence, Recurrence};
pub use session::Session;
pub use sort::SortKey;
pub use store::{resolve, NewTask, Resolution, TaskStore};
pub use task::{Priority, Task};

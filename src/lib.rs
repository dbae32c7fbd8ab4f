//! Todo CLI - A local task manager with recurring tasks and undo
//!
//! Tasks live in a JSON file inside a workspace directory. They carry an
//! optional due date, a priority, an optional repeat rule and free-form
//! notes. Completing a repeating task schedules its next occurrence, and
//! every change can be undone.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{Priority, Session, Task, TaskError, TaskId};
pub use storage::Workspace;

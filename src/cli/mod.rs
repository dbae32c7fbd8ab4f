//! # Command-Line Interface
//!
//! User-facing commands, the interactive menu and output formatting.
//!
//! ## Modes
//!
//! | Mode | Invocation | Numbering |
//! |------|------------|-----------|
//! | Interactive | `todo` or `todo shell` | Rows of the last listing shown |
//! | One-shot | `todo add`, `todo done 2`, ... | Stored order, as printed by `todo list` |
//!
//! ## Output Formats
//!
//! One-shot commands support the `--format` flag:
//! - `text` (default) - Human-readable tables
//! - `json` - Machine-parseable JSON
//!
//! ## Workspace
//!
//! `--dir` (or `TODO_DIR`) selects the directory holding tasks, config and
//! backups. Without it the platform data directory is used.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod config_cmd;
mod output;
pub mod render;
mod shell;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
pub use shell::Shell;

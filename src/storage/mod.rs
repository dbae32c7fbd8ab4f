//! # Storage Layer
//!
//! Persistence for the task manager. Everything lives in one workspace
//! directory.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSON array of records | `to_do.json` |
//! | Undo history | JSON | `undo.json` |
//! | Config | TOML | `config.toml` |
//! | Backups | JSON, timestamped | `backups/to_do_backup_*.json` |
//! | Export | CSV | user-chosen, default `tasks_export.csv` |
//!
//! ## Safety
//!
//! - All writes are atomic (temp file + rename)
//! - A corrupt task file is copied to `to_do.json.corrupt` before anything
//!   else is written
//! - Files in the legacy `[item, date, priority]` row format are upgraded on
//!   first load
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point; loads and saves a whole session
//! - [`TaskFile`] - Read/write the task list, backups
//! - [`Config`] - Workspace configuration

mod config;
pub mod export;
mod json;
pub mod legacy;
mod workspace;

pub use config::{Config, ConfigError, DefaultSort};
pub use json::{HistoryFile, LoadStatus, Loaded, StorageError, TaskFile};
pub use workspace::Workspace;

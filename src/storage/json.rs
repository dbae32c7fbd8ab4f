//! JSON storage for tasks and undo history
//!
//! Tasks are stored as a pretty-printed JSON array in `to_do.json`. Writes
//! go to a temp file first and are renamed into place. Before each save a
//! timestamped copy can be written to the backup directory, which is pruned
//! to a fixed number of files.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::legacy;
use crate::domain::{Task, TaskId, UndoHistory};

const BACKUP_PREFIX: &str = "to_do_backup_";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Task file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How the task list was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// No file yet; the list is empty
    Missing,
    Loaded,
    /// Legacy rows were upgraded and written back
    Upgraded(usize),
}

#[derive(Debug)]
pub struct Loaded {
    pub tasks: Vec<Task>,
    pub status: LoadStatus,
}

/// Writes `value` as pretty JSON via a temp file and rename
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })
}

/// Drops records with an empty item and gives duplicated IDs a fresh one.
///
/// The first record carrying an ID keeps it.
fn repair(tasks: Vec<Task>, path: &Path) -> Vec<Task> {
    let taken: HashSet<TaskId> = tasks.iter().map(|t| t.id.clone()).collect();
    let mut seen: HashSet<TaskId> = HashSet::with_capacity(tasks.len());
    let mut kept = Vec::with_capacity(tasks.len());
    let now = Utc::now();

    for (index, mut task) in tasks.into_iter().enumerate() {
        if task.item.trim().is_empty() {
            warn!(
                "Dropping record {} in {} with an empty item",
                index + 1,
                path.display()
            );
            continue;
        }

        if seen.contains(&task.id) {
            let mut salt = index as u32;
            let fresh = loop {
                let id = TaskId::generate(&task.item, now, salt);
                if !taken.contains(&id) && !seen.contains(&id) {
                    break id;
                }
                salt += 1;
            };
            warn!(
                "Record {} in {} reuses ID {}; assigned {}",
                index + 1,
                path.display(),
                task.id,
                fresh
            );
            task.id = fresh;
        }

        seen.insert(task.id.clone());
        kept.push(task);
    }

    kept
}

/// Store for the task list
pub struct TaskFile {
    path: PathBuf,
    backup_dir: PathBuf,
}

impl TaskFile {
    pub fn new(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Reads the task list.
    ///
    /// A missing file is an empty list. A legacy file is upgraded and written
    /// back in the current format. Unparsable content is reported as
    /// [`StorageError::Corrupt`].
    pub fn load(&self) -> Result<Loaded, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No task file at {}", self.path.display());
                return Ok(Loaded {
                    tasks: Vec::new(),
                    status: LoadStatus::Missing,
                });
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let corrupt = |reason: String| StorageError::Corrupt {
            path: self.path.clone(),
            reason,
        };

        if content.trim().is_empty() {
            return Ok(Loaded {
                tasks: Vec::new(),
                status: LoadStatus::Loaded,
            });
        }

        let value: Value = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

        if legacy::is_legacy(&value) {
            let rows: Vec<Vec<Value>> =
                serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
            let tasks = legacy::upgrade(&rows);
            info!(
                "Upgraded {} legacy records in {}",
                tasks.len(),
                self.path.display()
            );
            if let Err(e) = write_json_atomic(&self.path, &tasks) {
                warn!("Could not persist upgraded task file: {:#}", e);
            }
            let count = tasks.len();
            return Ok(Loaded {
                tasks,
                status: LoadStatus::Upgraded(count),
            });
        }

        let tasks: Vec<Task> = serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        let tasks = repair(tasks, &self.path);
        debug!("Loaded {} tasks from {}", tasks.len(), self.path.display());
        Ok(Loaded {
            tasks,
            status: LoadStatus::Loaded,
        })
    }

    /// Writes the task list, taking a backup first when `backup_keep` is set
    pub fn save(&self, tasks: &[Task], backup_keep: Option<usize>) -> Result<()> {
        if let Some(keep) = backup_keep {
            self.backup(tasks, keep)?;
        }
        write_json_atomic(&self.path, tasks)?;
        debug!("Saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }

    /// Writes a timestamped backup of `tasks` and prunes old backups
    pub fn backup(&self, tasks: &[Task], keep: usize) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let path = self
            .backup_dir
            .join(format!("{}{}.json", BACKUP_PREFIX, stamp));
        write_json_atomic(&path, tasks)?;
        self.prune_backups(keep)?;
        Ok(path)
    }

    /// Backup files, oldest first
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)
            .with_context(|| format!("Failed to read {}", self.backup_dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    fn prune_backups(&self, keep: usize) -> Result<()> {
        let backups = self.backups()?;
        if backups.len() <= keep {
            return Ok(());
        }

        for old in &backups[..backups.len() - keep] {
            if let Err(e) = fs::remove_file(old) {
                warn!("Failed to remove old backup {}: {}", old.display(), e);
            }
        }
        Ok(())
    }

    /// Copies an unreadable task file aside so a later save cannot clobber it
    pub fn quarantine(&self) -> Result<PathBuf> {
        let target = self.path.with_extension("json.corrupt");
        fs::copy(&self.path, &target).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                self.path.display(),
                target.display()
            )
        })?;
        Ok(target)
    }
}

/// Store for the persisted undo history
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the history; a missing or unreadable file is an empty history
    pub fn load(&self, depth: usize) -> UndoHistory {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {}", self.path.display(), e);
                }
                return UndoHistory::new(depth);
            }
        };

        match serde_json::from_str::<UndoHistory>(&content) {
            Ok(mut history) => {
                history.set_depth(depth);
                history
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable undo history {}: {}",
                    self.path.display(),
                    e
                );
                UndoHistory::new(depth)
            }
        }
    }

    pub fn save(&self, history: &UndoHistory) -> Result<()> {
        write_json_atomic(&self.path, history)
    }
}

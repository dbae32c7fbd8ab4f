//! Workspace management
//!
//! A workspace is the directory holding the task file, its config, the undo
//! history and the backups. It provides access to the stores and loads or
//! saves a whole [`Session`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::{info, warn};

use super::json::{HistoryFile, LoadStatus, StorageError, TaskFile};
use super::Config;
use crate::domain::Session;

const TASKS_FILE: &str = "to_do.json";
const CONFIG_FILE: &str = "config.toml";
const HISTORY_FILE: &str = "undo.json";
const BACKUP_DIR: &str = "backups";

/// A task manager workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Picks the workspace directory: explicit path, then the platform data
    /// directory, then the current directory
    pub fn locate(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(Self::default_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the platform data directory for the task manager
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "todo", "todo-cli").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Opens (creating if needed) the workspace at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create workspace: {}", root.display()))?;

        let config = Config::load(&root.join(CONFIG_FILE))?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.config_path())
    }

    pub fn task_file(&self) -> TaskFile {
        TaskFile::new(self.root.join(TASKS_FILE), self.root.join(BACKUP_DIR))
    }

    pub fn history_file(&self) -> HistoryFile {
        HistoryFile::new(self.root.join(HISTORY_FILE))
    }

    /// Loads tasks and undo history into a new session.
    ///
    /// A corrupt task file is copied aside and the session starts empty.
    pub fn load_session(&self) -> Result<Session> {
        let file = self.task_file();
        let tasks = match file.load() {
            Ok(loaded) => {
                if let LoadStatus::Upgraded(count) = loaded.status {
                    info!("Upgraded {} tasks from the legacy format", count);
                }
                loaded.tasks
            }
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!("{}", e);
                match file.quarantine() {
                    Ok(copy) => warn!("Kept a copy at {}; starting empty", copy.display()),
                    Err(copy_err) => warn!("{:#}; starting empty", copy_err),
                }
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let history = self.history_file().load(self.config.undo_depth);
        Ok(Session::new(tasks, history))
    }

    /// Saves tasks (with backup, if configured) and undo history
    pub fn save_session(&self, session: &mut Session) -> Result<()> {
        let keep = self
            .config
            .backup_on_save
            .then_some(self.config.backup_keep);
        self.task_file().save(session.tasks(), keep)?;
        self.history_file().save(session.history())?;
        session.mark_saved();
        Ok(())
    }

    /// Writes a backup of the current tasks right away
    pub fn backup_now(&self, session: &Session) -> Result<PathBuf> {
        self.task_file()
            .backup(session.tasks(), self.config.backup_keep)
    }
}

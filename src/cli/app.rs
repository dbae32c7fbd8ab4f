//! Main CLI application structure

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use log::debug;

use super::output::{Output, OutputFormat};
use super::shell::Shell;
use super::{config_cmd, task};
use crate::storage::export::DEFAULT_EXPORT_FILE;
use crate::storage::Workspace;

#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about = "Local task manager with recurring tasks and undo")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace directory holding tasks, config and backups
    #[arg(long, global = true, env = "TODO_DIR")]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Increase log verbosity (repeatable)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Command to run; without one the interactive shell starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive menu
    Shell,

    /// Add a task
    ///
    /// Examples:
    ///   todo add "Buy milk"
    ///   todo add "Pay rent" --date 01/07/2024 --priority high --repeat monthly
    ///   todo add "Gym" --date 2024-06-03 --repeat mon,wed,fri
    Add {
        /// Task text
        item: String,

        /// Due date (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long, short)]
        date: Option<String>,

        /// Priority: high, medium or low
        #[arg(long, short)]
        priority: Option<String>,

        /// Repeat rule: daily, weekly, monthly, "every N days" or weekdays like mon,wed
        #[arg(long, short)]
        repeat: Option<String>,

        /// Free-form notes
        #[arg(long, short)]
        notes: Option<String>,
    },

    /// List tasks
    List {
        /// Only open tasks
        #[arg(long, conflicts_with = "completed")]
        active: bool,

        /// Only completed tasks
        #[arg(long)]
        completed: bool,

        /// Order the listing (name, date, priority, completed, created)
        #[arg(long, short)]
        sort: Option<String>,

        /// Reverse the order
        #[arg(long)]
        reverse: bool,
    },

    /// Remove a task
    Remove {
        /// Position, ID or part of the name
        id: String,
    },

    /// Rename a task
    Rename {
        /// Position, ID or part of the name
        id: String,

        /// New task text
        name: String,
    },

    /// Toggle a task between done and not done
    Done {
        /// Position, ID or part of the name
        id: String,
    },

    /// Change a task's priority
    Priority {
        /// Position, ID or part of the name
        id: String,

        /// high, medium or low
        value: String,
    },

    /// Change or clear a task's due date
    Date {
        /// Position, ID or part of the name
        id: String,

        /// New date; omit to clear
        #[arg(default_value = "")]
        date: String,
    },

    /// Change or clear a task's repeat rule
    Repeat {
        /// Position, ID or part of the name
        id: String,

        /// New rule; omit to clear
        #[arg(default_value = "")]
        rule: String,
    },

    /// Change or clear a task's notes
    Notes {
        /// Position, ID or part of the name
        id: String,

        /// New notes; omit to clear
        #[arg(default_value = "")]
        text: String,
    },

    /// Search task names and notes
    Search {
        /// Search query
        query: String,
    },

    /// Reorder stored tasks
    Sort {
        /// name, date, priority, completed or created
        key: String,

        /// Reverse the order
        #[arg(long)]
        reverse: bool,
    },

    /// Export tasks to CSV
    Export {
        /// Destination file
        #[arg(default_value = DEFAULT_EXPORT_FILE)]
        file: PathBuf,
    },

    /// Remove all completed tasks
    ClearCompleted,

    /// Undo the most recent change
    Undo,

    /// Show overdue, due-today and upcoming tasks
    Due,

    /// Write a backup of the task file now
    Backup,

    /// Show or change configuration
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

fn init_logging(verbose: u8) -> Result<()> {
    stderrlog::new()
        .module("todo_cli")
        .show_module_names(false)
        .color(stderrlog::ColorChoice::Auto)
        .verbosity(1 + usize::from(verbose))
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .context("Failed to initialize logging")
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let root = Workspace::locate(cli.dir);
    debug!("Using workspace {}", root.display());
    let mut workspace = Workspace::open(&root)?;

    let color = workspace.config().color && !cli.no_color;
    let output = Output::new(cli.format, color);
    let today = Local::now().date_naive();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let session = workspace.load_session()?;
            let stdin = io::stdin();
            let mut shell = Shell::new(&mut workspace, session, stdin.lock(), io::stdout(), color, today);
            shell.run()?
        }

        Commands::Add { item, date, priority, repeat, notes } => {
            task::add(&workspace, &output, item, date, priority, repeat, notes)?
        }
        Commands::List { active, completed, sort, reverse } => {
            task::list(&workspace, &output, today, active, completed, sort.as_deref(), reverse)?
        }
        Commands::Remove { id } => task::remove(&workspace, &output, &id)?,
        Commands::Rename { id, name } => task::rename(&workspace, &output, &id, &name)?,
        Commands::Done { id } => task::toggle(&workspace, &output, &id)?,
        Commands::Priority { id, value } => task::set_priority(&workspace, &output, &id, &value)?,
        Commands::Date { id, date } => task::set_date(&workspace, &output, &id, &date)?,
        Commands::Repeat { id, rule } => task::set_repeat(&workspace, &output, &id, &rule)?,
        Commands::Notes { id, text } => task::set_notes(&workspace, &output, &id, &text)?,
        Commands::Search { query } => task::search(&workspace, &output, today, &query)?,
        Commands::Sort { key, reverse } => task::sort(&workspace, &output, &key, reverse)?,
        Commands::Export { file } => task::export(&workspace, &output, &file)?,
        Commands::ClearCompleted => task::clear_completed(&workspace, &output)?,
        Commands::Undo => task::undo(&workspace, &output)?,
        Commands::Due => task::due(&workspace, &output, today)?,
        Commands::Backup => task::backup(&workspace, &output)?,
        Commands::Config(cmd) => config_cmd::run(cmd, &mut workspace, &output)?,
    }

    debug!("Command completed successfully");
    Ok(())
}

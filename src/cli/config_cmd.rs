//! Config CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::storage::Workspace;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the active configuration
    Show,

    /// Print the config file location
    Path,

    /// Turn autosave on or off; toggles when no value is given
    Autosave {
        /// true or false
        enabled: Option<bool>,
    },
}

pub fn run(cmd: ConfigCommands, workspace: &mut Workspace, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(workspace, output),
        ConfigCommands::Path => path(workspace, output),
        ConfigCommands::Autosave { enabled } => autosave(workspace, output, enabled),
    }
}

fn show(workspace: &Workspace, output: &Output) -> Result<()> {
    if output.is_json() {
        output.data(workspace.config());
    } else {
        output.text(&workspace.config().to_toml()?);
    }
    Ok(())
}

fn path(workspace: &Workspace, output: &Output) -> Result<()> {
    let path = workspace.config_path();
    if output.is_json() {
        output.data(&serde_json::json!({ "path": path }));
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn autosave(workspace: &mut Workspace, output: &Output, enabled: Option<bool>) -> Result<()> {
    let config = workspace.config_mut();
    config.autosave = enabled.unwrap_or(!config.autosave);
    let now = config.autosave;
    workspace.save_config()?;

    output.success(&format!("Autosave {}", if now { "on" } else { "off" }));
    Ok(())
}

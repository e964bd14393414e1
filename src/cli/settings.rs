//! Code related to the CLI commands for managing the settings file.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;

/// The available subcommands for managing the settings file.
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show the path to the settings file.
    ShowPath,
    /// Show the contents of the settings file, if it exists.
    Show,
    /// Show the default settings file contents.
    ShowDefault,
    /// Write a settings file with the default contents, if none exists.
    Create,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::ShowPath => println!("{}", get_settings_file_path().display()),
            Self::Show => handle_show_command()?,
            Self::ShowDefault => print!("{}", Settings::default_file_contents()?),
            Self::Create => handle_create_command()?,
        }

        Ok(())
    }
}

/// Handle the `settings show` command.
fn handle_show_command() -> Result<()> {
    let file_path = get_settings_file_path();
    if file_path.is_file() {
        let contents = fs::read_to_string(&file_path)
            .with_context(|| format!("Could not read {}", file_path.display()))?;
        print!("{contents}");
    } else {
        eprintln!("No settings file at {}", file_path.display());
    }

    Ok(())
}

/// Handle the `settings create` command.
fn handle_create_command() -> Result<()> {
    let file_path = get_settings_file_path();
    if file_path.exists() {
        eprintln!("Settings file already exists at {}", file_path.display());
        return Ok(());
    }

    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir).context("Could not create config directory")?;
    }
    fs::write(&file_path, Settings::default_file_contents()?)
        .with_context(|| format!("Could not write {}", file_path.display()))?;
    println!("Settings file written to {}", file_path.display());

    Ok(())
}

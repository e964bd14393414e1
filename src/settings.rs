//! Code for loading program settings.
use crate::get_gridpath_config_dir;
use crate::input::read_toml;
use crate::log::{DEFAULT_LOG_LEVEL, parse_log_level};
use anyhow::{Context, Result, ensure};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Start of a new settings file; every option follows, commented out
const DEFAULT_SETTINGS_FILE_HEADER: &str = concat!(
    "# This file contains the program settings for GridPath.
#
# The default options for GridPath v",
    env!("CARGO_PKG_VERSION"),
    " are shown below, commented out. To change an option, uncomment it and set the value
# appropriately.
#
# To show the default options for the current version of GridPath, run:
# \tgridpath settings show-default
"
);

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_gridpath_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// The default program log level
    pub log_level: String,
    /// Whether to overwrite output files by default
    pub overwrite: bool,
    /// Whether to write every variable value and constraint dual to CSV files
    pub debug_model: bool,
    /// Whether to suppress the solver's own console output
    pub quiet_solver: bool,
    /// Results root path to save GridPath results. Defaults to `gridpath_results`.
    pub results_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            overwrite: false,
            debug_model: false,
            quiet_solver: true,
            results_root: PathBuf::from("gridpath_results"),
        }
    }
}

impl Settings {
    /// Read the program settings file.
    ///
    /// If the file is not present, or the `GRIDPATH_USE_DEFAULT_SETTINGS` environment variable is
    /// set, default settings will be used.
    pub fn load() -> Result<Settings> {
        // Lets tests and CI runs ignore whatever is in the user's config directory
        if env::var_os("GRIDPATH_USE_DEFAULT_SETTINGS").is_some() {
            return Ok(Settings::default());
        }

        Self::load_from_path(&get_settings_file_path())
    }

    /// Read settings from the specified path
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        // Missing fields take their defaults (see `#[serde(default)]`)
        let settings: Settings = read_toml(file_path)?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", file_path.display()))?;

        Ok(settings)
    }

    /// Check values which deserialise but cannot be used
    fn validate(&self) -> Result<()> {
        // The environment variable can still override this when logging starts
        parse_log_level(&self.log_level)?;
        ensure!(
            !self.results_root.as_os_str().is_empty(),
            "results_root cannot be empty"
        );

        Ok(())
    }

    /// The contents of the default settings file.
    ///
    /// Every option is commented out and preceded by its doc comment.
    pub fn default_file_contents() -> Result<String> {
        let settings_raw =
            toml::to_string(&Settings::default()).context("Could not convert settings to TOML")?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.lines() {
            // Only `key = value` lines; there are no tables in the settings file
            let Some((field, _)) = line.split_once('=') else {
                continue;
            };
            let field = field.trim();
            let docs = Settings::get_field_docs(field)
                .with_context(|| format!("Missing doc comment for setting {field}"))?;

            // Doc lines get a double "#" so they stay comments when the option is uncommented
            for doc_line in docs.lines() {
                write!(&mut out, "\n# # {}\n", doc_line.trim())?;
            }
            writeln!(&mut out, "# {}", line.trim())?;
        }

        Ok(out)
    }
}

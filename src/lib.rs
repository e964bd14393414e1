//! GridPath is a power-system production-cost and capacity-expansion model.
//!
//! A scenario is described by a set of tab-separated input files. For each temporal instance of
//! the scenario (weather, hydro and availability iterations, subproblems and stages), an ordered
//! list of model modules contributes variables, expressions and constraints to a linear programme,
//! which is solved with HiGHS. The results are then written to CSV files.
use std::path::PathBuf;

pub mod cli;
pub mod dynamic_components;
pub mod example;
pub mod fuel;
pub mod geography;
pub mod id;
pub mod input;
pub mod log;
pub mod modules;
pub mod optimisation;
pub mod output;
pub mod patch;
pub mod project;
pub mod reserves;
pub mod run;
pub mod scenario;
pub mod settings;
pub mod temporal;
pub mod transmission;

#[cfg(test)]
mod fixture;

/// Where to report bugs
pub const ISSUES_URL: &str = "https://github.com/blue-marble/gridpath/issues";

/// Get the directory in which program configuration files are stored.
///
/// This can be overridden with the `GRIDPATH_CONFIG_DIR` environment variable.
pub fn get_gridpath_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("GRIDPATH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("gridpath");
    path
}

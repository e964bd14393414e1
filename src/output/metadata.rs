//! Write run, build and platform metadata to a TOML file.
//!
//! This records the scenario which was run and when, build information provided by the `built`
//! script, and basic platform details. The metadata is written as `metadata.toml` in the output
//! directory.
use anyhow::{Context, Result};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output filename used for metadata.
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Build-time information included by the build script (via the `built` crate).
#[allow(clippy::doc_markdown)]
#[allow(clippy::needless_raw_strings)]
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the scenario run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the scenario which was run
    scenario_path: &'a Path,
    /// Optional features enabled for the scenario
    features: Vec<String>,
    /// The date and time on which the run started
    datetime: String,
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
    /// The version of rustc used to compile GridPath
    rustc_version: &'a str,
    /// When GridPath was built
    build_time_utc: &'a str,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
        }
    }
}

/// Information about the platform on which GridPath is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info = PlatformInfo::new()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .context("Unable to determine platform info")?;

        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata to `metadata.toml` in the given output directory.
///
/// # Arguments
///
/// * `output_path` - Directory where `metadata.toml` will be written.
/// * `scenario_path` - Path to the scenario being run.
/// * `features` - The scenario's enabled features.
pub fn write_metadata<T: ToString>(
    output_path: &Path,
    scenario_path: &Path,
    features: &[T],
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata {
            scenario_path,
            features: features.iter().map(ToString::to_string).collect(),
            datetime: Local::now().to_rfc2822(),
        },
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

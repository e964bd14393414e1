//! The `example` command: listing, describing, extracting and running the bundled scenarios.
//!
//! Besides the scenarios bundled under `scenarios/`, there are hidden "patched" examples, which
//! are a bundled scenario with some of its input files modified. They are used by the regression
//! tests and are selected with `--patch`.
use super::{RunOpts, handle_run_command};
use crate::example::patches::{get_base_example, get_patch_names, get_patches};
use crate::example::{Example, get_example_names};
use crate::patch::{FilePatch, ScenarioPatch};
use crate::settings::Settings;
use anyhow::{Context, Result, ensure};
use clap::Subcommand;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Subcommands of `gridpath example`.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List the names of the example scenarios.
    List {
        /// List the patched examples instead.
        #[arg(long, hide = true)]
        patch: bool,
    },
    /// Print the description of an example.
    Info {
        /// Name of the example.
        name: String,
        /// Describe a patched example.
        #[arg(long, hide = true)]
        patch: bool,
    },
    /// Copy an example scenario into a new directory so it can be modified.
    Extract {
        /// Name of the example.
        name: String,
        /// Directory to create (defaults to the example's name).
        new_path: Option<PathBuf>,
        /// Extract a patched example.
        #[arg(long, hide = true)]
        patch: bool,
    },
    /// Run an example from a temporary copy.
    Run {
        /// Name of the example.
        name: String,
        /// Run a patched example.
        #[arg(long, hide = true)]
        patch: bool,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List { patch } => {
                let names = if patch {
                    get_patch_names().collect_vec()
                } else {
                    get_example_names().collect_vec()
                };
                for name in names {
                    println!("{name}");
                }
            }
            Self::Info { name, patch } => {
                print!("{}", ExampleSource::find(&name, patch)?.describe()?);
            }
            Self::Extract {
                name,
                new_path,
                patch,
            } => {
                let dest = new_path.unwrap_or_else(|| PathBuf::from(&name));
                ExampleSource::find(&name, patch)?.write_to(&dest)?;
            }
            Self::Run { name, patch, opts } => {
                handle_example_run_command(&name, patch, &opts, None)?;
            }
        }

        Ok(())
    }
}

/// Where the files of a named example come from
enum ExampleSource<'a> {
    /// A scenario bundled with the program
    Bundled(Example),
    /// A bundled scenario with some of its files patched
    Patched {
        base: &'a str,
        patches: &'a [FilePatch],
    },
}

impl<'a> ExampleSource<'a> {
    /// Look up an example by name
    fn find(name: &'a str, patch: bool) -> Result<Self> {
        if patch {
            Ok(Self::Patched {
                base: get_base_example(name),
                patches: get_patches(name)?,
            })
        } else {
            Ok(Self::Bundled(Example::from_name(name)?))
        }
    }

    /// The example's README, prefixed by the patched files for patched examples
    fn describe(&self) -> Result<String> {
        match self {
            Self::Bundled(example) => Ok(example.get_readme()?.to_string()),
            Self::Patched { base, patches } => {
                let readme = Example::from_name(base)?
                    .get_readme()
                    .with_context(|| format!("Could not load README.txt for '{base}' example"))?;
                let files = patches
                    .iter()
                    .map(|patch| patch.file_path().display())
                    .join(", ");
                Ok(format!("The '{base}' example with changes to: {files}\n\n{readme}"))
            }
        }
    }

    /// Write the example's files to `dest`, which must not already exist
    fn write_to(&self, dest: &Path) -> Result<()> {
        ensure!(
            !dest.exists(),
            "Cannot extract example: {} already exists",
            dest.display()
        );

        match self {
            Self::Bundled(example) => example.extract(dest),
            Self::Patched { base, patches } => {
                fs::create_dir(dest).context("Could not create output directory")?;
                ScenarioPatch::from_example(base)?
                    .with_file_patches(patches.iter().cloned())
                    .build(dest)
                    .context("Failed to patch example")
            }
        }
    }
}

/// Run an example after copying it to a temporary directory.
///
/// The copy is removed once the run finishes; results go wherever `opts` says.
pub fn handle_example_run_command(
    name: &str,
    patch: bool,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let source = ExampleSource::find(name, patch)?;
    let temp_dir = TempDir::new().context("Failed to create temporary directory")?;

    // The scenario name used for the output directory is taken from this path
    let scenario_dir = temp_dir.path().join(name);
    source.write_to(&scenario_dir)?;
    handle_run_command(&scenario_dir, opts, settings)
}

//! Code for working with bundled example scenarios
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use include_dir::{Dir, DirEntry, include_dir};

pub mod patches;

/// The directory containing the example scenarios.
const EXAMPLES_DIR: Dir = include_dir!("scenarios");

/// Get the names of all examples
pub fn get_example_names() -> impl Iterator<Item = &'static str> {
    EXAMPLES_DIR
        .dirs()
        .filter_map(|dir| dir.path().as_os_str().to_str())
}

/// A bundled example scenario
pub struct Example(Dir<'static>);

impl Example {
    /// Get the example with the specified name
    pub fn from_name(name: &str) -> Result<Self> {
        let dir = EXAMPLES_DIR
            .get_dir(name)
            .with_context(|| format!("Example '{name}' not found"))?;

        Ok(Self(dir.clone()))
    }

    /// Get the contents of the readme file for this example
    pub fn get_readme(&self) -> Result<&'static str> {
        self.0
            .get_file(self.0.path().join("README.txt"))
            .context("Missing file")?
            .contents_utf8()
            .context("File not UTF-8 encoded")
    }

    /// Extract this example to a specified destination, which must not already exist
    pub fn extract(&self, new_path: &Path) -> Result<()> {
        fs::create_dir(new_path)?;
        extract_entries(&self.0, self.0.path(), new_path)
    }
}

/// Write the contents of `dir` under `new_path`, keeping paths relative to `root`
fn extract_entries(dir: &Dir<'static>, root: &Path, new_path: &Path) -> Result<()> {
    for entry in dir.entries() {
        let relative = entry.path().strip_prefix(root)?;
        let dest = new_path.join(relative);
        match entry {
            DirEntry::Dir(subdir) => {
                fs::create_dir_all(&dest)?;
                extract_entries(subdir, root, new_path)?;
            }
            DirEntry::File(f) => {
                fs::write(&dest, f.contents())
                    .with_context(|| format!("Could not write {}", dest.display()))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{INPUTS_DIR_NAME, SCENARIO_FILE_NAME};
    use tempfile::tempdir;

    #[test]
    fn all_examples_have_readme() {
        for example in get_example_names() {
            let readme = Example::from_name(example)
                .unwrap()
                .get_readme()
                .with_context(|| format!("Could not load readme for {example}"))
                .unwrap();

            assert!(!readme.trim().is_empty());
        }
    }

    #[test]
    fn extract_keeps_inputs_dir() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("simple");
        Example::from_name("simple").unwrap().extract(&dest).unwrap();

        assert!(dest.join(SCENARIO_FILE_NAME).is_file());
        assert!(dest.join(INPUTS_DIR_NAME).join("projects.tab").is_file());
    }

    #[test]
    fn unknown_example() {
        assert!(Example::from_name("no_such_example").is_err());
    }
}

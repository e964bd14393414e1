//! Code for applying patches to scenario input files.
use crate::example::Example;
use crate::scenario::SCENARIO_FILE_NAME;
use anyhow::{Context, Result, ensure};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A set of patches to apply to a base scenario.
pub struct ScenarioPatch {
    // The base scenario directory path
    base_scenario_dir: PathBuf,
    // Keeps an extracted example alive for as long as the patch
    _base_tempdir: Option<TempDir>,
    // The list of file patches to apply
    file_patches: Vec<FilePatch>,
    // Optional patch for scenario.toml (TOML table)
    toml_patch: Option<toml::Table>,
}

impl ScenarioPatch {
    /// Create a new empty `ScenarioPatch` for a base scenario at the given directory.
    pub fn new<P: Into<PathBuf>>(base_scenario_dir: P) -> Self {
        ScenarioPatch {
            base_scenario_dir: base_scenario_dir.into(),
            _base_tempdir: None,
            file_patches: Vec::new(),
            toml_patch: None,
        }
    }

    /// Create a new empty `ScenarioPatch` for one of the bundled example scenarios.
    pub fn from_example(name: &str) -> Result<Self> {
        let example = Example::from_name(name)?;
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let base_scenario_dir = temp_dir.path().join(name);
        example.extract(&base_scenario_dir)?;

        Ok(ScenarioPatch {
            _base_tempdir: Some(temp_dir),
            ..Self::new(base_scenario_dir)
        })
    }

    /// Add a single `FilePatch` to this `ScenarioPatch`.
    pub fn with_file_patch(mut self, patch: FilePatch) -> Self {
        self.file_patches.push(patch);
        self
    }

    /// Add multiple `FilePatch` entries to this `ScenarioPatch`.
    pub fn with_file_patches<I>(mut self, patches: I) -> Self
    where
        I: IntoIterator<Item = FilePatch>,
    {
        self.file_patches.extend(patches);
        self
    }

    /// Add a TOML patch (provided as a string) for `scenario.toml`.
    ///
    /// Top-level keys in the patch replace those in the base scenario.
    pub fn with_toml_patch(mut self, patch_str: impl AsRef<str>) -> Result<Self> {
        ensure!(
            self.toml_patch.is_none(),
            "TOML patch already set for this ScenarioPatch"
        );
        let patch = toml::from_str(patch_str.as_ref())
            .context("Failed to parse string passed to with_toml_patch")?;
        self.toml_patch = Some(patch);
        Ok(self)
    }

    /// Build this `ScenarioPatch` into `out_dir` (creating/overwriting files there).
    pub fn build<O: AsRef<Path>>(&self, out_dir: O) -> Result<()> {
        let base_dir = self.base_scenario_dir.as_path();
        let out_path = out_dir.as_ref();

        // Copy the whole base scenario; patched files are overwritten below
        copy_dir_all(base_dir, out_path)?;

        if let Some(toml_patch) = &self.toml_patch {
            let toml_content = fs::read_to_string(base_dir.join(SCENARIO_FILE_NAME))?;
            let merged_toml = merge_scenario_toml(&toml_content, toml_patch)?;
            fs::write(out_path.join(SCENARIO_FILE_NAME), merged_toml)?;
        }

        for patch in &self.file_patches {
            patch.apply_and_save(base_dir, out_path)?;
        }

        Ok(())
    }

    /// Build the patched scenario into a temporary directory and return the `TempDir`.
    pub fn build_to_tempdir(&self) -> Result<TempDir> {
        let temp_dir = tempfile::tempdir()?;
        self.build(temp_dir.path())?;
        Ok(temp_dir)
    }
}

/// Recursively copy the contents of one directory into another
fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &dst_path)?;
        } else {
            fs::copy(entry.path(), &dst_path)?;
        }
    }

    Ok(())
}

/// Patches for one tab-delimited input file.
///
/// Rows are given as comma-separated strings for convenience and written back tab-delimited.
#[derive(Clone, Debug)]
pub struct FilePatch {
    /// Path of the file relative to the scenario directory (e.g. "inputs/projects.tab")
    file_path: PathBuf,
    /// The header row (optional). If `None`, the header is not checked against base files.
    header_row: Option<Vec<String>>,
    /// Rows to delete (each row is a vector of fields)
    to_delete: IndexSet<Vec<String>>,
    /// Rows to add (each row is a vector of fields)
    to_add: IndexSet<Vec<String>>,
}

fn split_row(row: &str) -> Vec<String> {
    row.split(',').map(|s| s.trim().to_string()).collect()
}

impl FilePatch {
    /// Create a new empty `FilePatch` for the given file.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        FilePatch {
            file_path: file_path.into(),
            header_row: None,
            to_delete: IndexSet::new(),
            to_add: IndexSet::new(),
        }
    }

    /// The patched file's path, relative to the scenario directory
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Set the header row for this patch (header should be a comma-joined string, e.g. "a,b,c").
    pub fn with_header(mut self, header: impl AsRef<str>) -> Self {
        assert!(
            self.header_row.is_none(),
            "Header already set for this FilePatch",
        );
        self.header_row = Some(split_row(header.as_ref()));
        self
    }

    /// Add a row to the file (row should be a comma-joined string, e.g. "a,b,c").
    pub fn with_addition(mut self, row: impl AsRef<str>) -> Self {
        self.to_add.insert(split_row(row.as_ref()));
        self
    }

    /// Delete a row from the file (row should be a comma-joined string, e.g. "a,b,c").
    pub fn with_deletion(mut self, row: impl AsRef<str>) -> Self {
        self.to_delete.insert(split_row(row.as_ref()));
        self
    }

    /// Apply this patch to a base scenario and return the modified file as a string.
    fn apply(&self, base_scenario_dir: &Path) -> Result<String> {
        let base_path = base_scenario_dir.join(&self.file_path);
        ensure!(
            base_path.is_file(),
            "Base file for patching does not exist: {}",
            base_path.display()
        );
        let base = fs::read_to_string(&base_path)?;

        modify_base_with_patch(&base, self).with_context(|| {
            format!(
                "Error applying patch to file: {}",
                self.file_path.display()
            )
        })
    }

    /// Apply this patch to a base scenario and save the modified file to another directory.
    pub fn apply_and_save(&self, base_scenario_dir: &Path, out_scenario_dir: &Path) -> Result<()> {
        let modified = self.apply(base_scenario_dir)?;
        fs::write(out_scenario_dir.join(&self.file_path), modified)?;
        Ok(())
    }
}

/// Merge a TOML patch into a base TOML string and return the merged TOML.
fn merge_scenario_toml(base_toml: &str, patch: &toml::Table) -> Result<String> {
    let mut base: toml::Table = toml::from_str(base_toml)?;
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }

    Ok(toml::to_string_pretty(&base)?)
}

/// Modify a base tab-delimited file by applying a `FilePatch`.
///
/// Preserves the order of rows from the base file, with new rows appended at the end.
fn modify_base_with_patch(base: &str, patch: &FilePatch) -> Result<String> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(Trim::All)
        .from_reader(base.as_bytes());

    let base_header: Vec<String> = reader
        .headers()
        .context("Failed to read base file header")?
        .iter()
        .map(ToString::to_string)
        .collect();
    if let Some(header_row) = &patch.header_row {
        ensure!(
            base_header == *header_row,
            "Header mismatch: base file has [{}], patch has [{}]",
            base_header.join(", "),
            header_row.join(", ")
        );
    }

    let mut base_rows: IndexSet<Vec<String>> = IndexSet::new();
    for result in reader.records() {
        let row: Vec<String> = result?.iter().map(ToString::to_string).collect();
        ensure!(
            base_rows.insert(row.clone()),
            "Duplicate row in base file: {row:?}",
        );
    }

    for row in &patch.to_delete {
        ensure!(
            !patch.to_add.contains(row),
            "Row appears in both deletions and additions: {row:?}",
        );
        ensure!(
            base_rows.contains(row),
            "Row to delete not present in base file: {row:?}"
        );
    }
    base_rows.retain(|row| !patch.to_delete.contains(row));

    for row in &patch.to_add {
        ensure!(
            base_rows.insert(row.clone()),
            "Addition already present in base file: {row:?}"
        );
    }

    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(vec![]);
    writer.write_record(&base_header)?;
    for row in &base_rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(String::from_utf8(writer.into_inner()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    #[test]
    fn modify_base_with_patch_works() {
        let base = "col1\tcol2\nvalue1\tvalue2\nvalue3\tvalue4\nvalue5\tvalue6\n";

        let patch = FilePatch::new("test.tab")
            .with_header("col1,col2")
            .with_deletion("value3,value4")
            .with_addition("value7,value8");

        let modified = modify_base_with_patch(base, &patch).unwrap();
        assert_eq!(
            modified,
            "col1\tcol2\nvalue1\tvalue2\nvalue5\tvalue6\nvalue7\tvalue8\n"
        );
    }

    #[test]
    fn modify_base_with_patch_mismatched_header() {
        let base = "col1\tcol2\nvalue1\tvalue2\n";
        let patch = FilePatch::new("test.tab").with_header("col1,col3");

        assert_error!(
            modify_base_with_patch(base, &patch),
            "Header mismatch: base file has [col1, col2], patch has [col1, col3]"
        );
    }

    #[test]
    fn modify_base_with_patch_missing_row() {
        let base = "col1\tcol2\nvalue1\tvalue2\n";
        let patch = FilePatch::new("test.tab").with_deletion("value1,value3");

        assert_error!(
            modify_base_with_patch(base, &patch),
            "Row to delete not present in base file: [\"value1\", \"value3\"]"
        );
    }

    #[test]
    fn merge_scenario_toml_replaces_keys() {
        let base = r#"
            features = ["transmission"]
            subproblems = [1, 2]
        "#;
        let patch: toml::Table = toml::from_str(r#"features = ["carbon_cap"]"#).unwrap();

        let merged: toml::Table =
            toml::from_str(&merge_scenario_toml(base, &patch).unwrap()).unwrap();
        assert_eq!(merged["features"][0].as_str(), Some("carbon_cap"));
        assert_eq!(merged["subproblems"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn build_patched_scenario() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir(base.path().join("inputs")).unwrap();
        fs::write(base.path().join(SCENARIO_FILE_NAME), "features = []\n").unwrap();
        fs::write(base.path().join("inputs/load_mw.tab"), "a\tb\n1\t2\n").unwrap();

        let out = ScenarioPatch::new(base.path())
            .with_file_patch(FilePatch::new("inputs/load_mw.tab").with_addition("3,4"))
            .with_toml_patch("features = [\"carbon_cap\"]")
            .unwrap()
            .build_to_tempdir()
            .unwrap();

        assert_eq!(
            fs::read_to_string(out.path().join("inputs/load_mw.tab")).unwrap(),
            "a\tb\n1\t2\n3\t4\n"
        );
        let toml = fs::read_to_string(out.path().join(SCENARIO_FILE_NAME)).unwrap();
        assert!(toml.contains("carbon_cap"));
    }
}

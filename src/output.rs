//! The module responsible for writing output data to disk.
use crate::dynamic_components::ResultsTables;
use crate::optimisation::{ModelInstance, Solution};
use anyhow::{Context, Result, ensure};
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The name of the directory within each instance's output directory holding results tables
pub const RESULTS_DIR_NAME: &str = "results";

/// The output file name for the objective function value
const OBJECTIVE_FILE_NAME: &str = "objective_function_value.txt";

/// The output file name for the solver status
const SOLVER_STATUS_FILE_NAME: &str = "solver_status.txt";

/// The output file name for every variable value (debug only)
const DEBUG_VARIABLES_FILE_NAME: &str = "debug_variables.csv";

/// The output file name for every constraint dual (debug only)
const DEBUG_DUALS_FILE_NAME: &str = "debug_duals.csv";

/// Get the default output directory for the scenario at the specified path
pub fn get_output_dir(scenario_dir: &Path, results_root: PathBuf) -> Result<PathBuf> {
    // The scenario name is the last component of the canonical path
    let scenario_dir = scenario_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to scenario")?;

    let scenario_name = scenario_dir
        .file_name()
        .context("Scenario cannot be in root folder")?
        .to_str()
        .context("Invalid chars in scenario dir name")?;

    Ok([results_root, PathBuf::from(scenario_name)].iter().collect())
}

/// Create a new output directory, optionally overwriting existing data.
///
/// Returns `true` if an existing directory with contents was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir).context("Could not delete folder")?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Write the outputs of a solved instance to its output directory
pub fn write_instance_outputs(
    instance_dir: &Path,
    results: &ResultsTables,
    objective_value: f64,
) -> Result<()> {
    fs::create_dir_all(instance_dir)?;
    results.write_all(&instance_dir.join(RESULTS_DIR_NAME))?;
    fs::write(
        instance_dir.join(OBJECTIVE_FILE_NAME),
        format!("{objective_value}\n"),
    )?;
    write_solver_status(instance_dir, "optimal")?;

    Ok(())
}

/// Record the solver status of an instance, e.g. when it could not be solved
pub fn write_solver_status(instance_dir: &Path, status: &str) -> Result<()> {
    fs::create_dir_all(instance_dir)?;
    fs::write(instance_dir.join(SOLVER_STATUS_FILE_NAME), format!("{status}\n"))?;

    Ok(())
}

/// Write every variable value and constraint dual of a solved instance
pub fn write_debug_model(
    instance_dir: &Path,
    model: &ModelInstance,
    solution: &Solution,
) -> Result<()> {
    let file_path = instance_dir.join(DEBUG_VARIABLES_FILE_NAME);
    let mut writer = Writer::from_path(&file_path)?;
    writer.write_record(["variable", "index", "value"])?;
    for name in model.variable_names() {
        for (index, value) in model.variable_values(name, solution)? {
            writer.write_record([
                name,
                index.to_string().as_str(),
                value.to_string().as_str(),
            ])?;
        }
    }
    writer.flush()?;

    let file_path = instance_dir.join(DEBUG_DUALS_FILE_NAME);
    let mut writer = Writer::from_path(&file_path)?;
    writer.write_record(["constraint", "index", "dual"])?;
    for name in model.constraint_names() {
        for (index, dual) in model.duals(name, solution)? {
            writer.write_record([
                name,
                index.to_string().as_str(),
                dual.to_string().as_str(),
            ])?;
        }
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idx;
    use crate::optimisation::{Bounds, Constraint, SolverOptions};
    use tempfile::tempdir;

    #[test]
    fn create_output_directory_new_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("new_output");

        // Create a new directory should succeed and return false (no overwrite)
        let result = create_output_directory(&output_dir, false).unwrap();
        assert!(!result);
        assert!(output_dir.exists());
        assert!(output_dir.is_dir());
    }

    #[test]
    fn create_output_directory_existing_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("empty_output");

        fs::create_dir(&output_dir).unwrap();
        let result = create_output_directory(&output_dir, false).unwrap();
        assert!(!result);
        assert!(output_dir.exists());
    }

    #[test]
    fn create_output_directory_existing_with_files_no_overwrite() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output_with_files");

        fs::create_dir(&output_dir).unwrap();
        fs::write(output_dir.join("existing_file.txt"), "some content").unwrap();

        let result = create_output_directory(&output_dir, false);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Output folder already exists")
        );
    }

    #[test]
    fn create_output_directory_existing_with_files_allow_overwrite() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output_with_files");

        fs::create_dir(&output_dir).unwrap();
        let file_path = output_dir.join("existing_file.txt");
        fs::write(&file_path, "some content").unwrap();

        let result = create_output_directory(&output_dir, true).unwrap();
        assert!(result);
        assert!(output_dir.exists());
        assert!(!file_path.exists());
    }

    #[test]
    fn get_output_dir_uses_scenario_name() {
        let temp_dir = tempdir().unwrap();
        let scenario_dir = temp_dir.path().join("base_case");
        fs::create_dir(&scenario_dir).unwrap();

        let output_dir = get_output_dir(&scenario_dir, PathBuf::from("results_root")).unwrap();
        assert_eq!(output_dir, Path::new("results_root").join("base_case"));
    }

    #[test]
    fn instance_outputs_written() {
        let mut model = ModelInstance::new();
        model.add_variables("x", [(idx!["a"], Bounds::new(2.0, 10.0))]);
        let x = model.var("x", &idx!["a"]).unwrap();
        model
            .add_constraints("Min_X", [(idx!["a"], Constraint::ge(x.into(), 1.0))])
            .unwrap();
        model.set_objective(x * 3.0);
        let solution = model.solve(&SolverOptions::new(), true).unwrap();

        let mut results = ResultsTables::default();
        results
            .table("test_table", &["key"])
            .set(&idx!["a"], "x", solution.value(x));

        let dir = tempdir().unwrap();
        write_instance_outputs(dir.path(), &results, solution.objective_value).unwrap();
        write_debug_model(dir.path(), &model, &solution).unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read(OBJECTIVE_FILE_NAME), "6\n");
        assert_eq!(read(SOLVER_STATUS_FILE_NAME), "optimal\n");
        assert_eq!(read("results/test_table.csv"), "key,x\na,2\n");
        assert_eq!(read(DEBUG_VARIABLES_FILE_NAME), "variable,index,value\nx,(a),2\n");
        assert!(read(DEBUG_DUALS_FILE_NAME).starts_with("constraint,index,dual\nMin_X,(a),"));
    }
}

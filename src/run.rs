//! Assembling, solving and exporting the model instances of a scenario.
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::input::{InputData, load_inputs};
use crate::modules::{ModelModule, determine_modules};
use crate::optimisation::{ModelInstance, Solution, SolverOptions};
use crate::output::metadata::write_metadata;
use crate::output::{write_debug_model, write_instance_outputs, write_solver_status};
use crate::scenario::{InstanceKey, ScenarioParameters};
use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use log::{debug, info};
use std::path::Path;

/// A model instance built from a scenario's modules
pub struct AssembledInstance {
    /// The modules used to build the instance, in order
    pub modules: Vec<Box<dyn ModelModule>>,
    /// Names of the components modules contribute to shared sums
    pub dynamic: DynamicComponents,
    /// The optimisation problem
    pub model: ModelInstance,
}

impl AssembledInstance {
    /// Solve the instance
    pub fn solve(&self, options: &SolverOptions, quiet: bool) -> Result<Solution> {
        Ok(self.model.solve(options, quiet)?)
    }

    /// Collect every module's results for a solution of this instance
    pub fn export_results(&self, solution: &Solution, inputs: &InputData) -> Result<ResultsTables> {
        let mut results = ResultsTables::default();
        for module in &self.modules {
            module
                .export_results(&self.model, solution, &self.dynamic, inputs, &mut results)
                .with_context(|| {
                    format!("Failed to export results for module {}", module.name())
                })?;
        }

        Ok(results)
    }
}

/// Build the optimisation model for one instance.
///
/// Every module first records the components it contributes to shared sums, then adds its own
/// components to the model.
pub fn assemble(params: &ScenarioParameters, inputs: &InputData) -> Result<AssembledInstance> {
    let modules = determine_modules(params);

    let mut dynamic = DynamicComponents::new(inputs);
    for module in &modules {
        module.record_dynamic_components(inputs, &mut dynamic);
    }

    let mut model = ModelInstance::new();
    for module in &modules {
        debug!("Adding components for module {}", module.name());
        module
            .add_model_components(&mut model, &dynamic, inputs)
            .with_context(|| format!("Failed to add components for module {}", module.name()))?;
    }
    debug!(
        "Assembled model with {} variables and {} constraints",
        model.num_variables(),
        model.num_constraints()
    );

    Ok(AssembledInstance {
        modules,
        dynamic,
        model,
    })
}

/// Options controlling how a scenario is run
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    /// Whether to suppress the solver's console output
    pub quiet_solver: bool,
    /// Whether to write every variable value and constraint dual
    pub debug_model: bool,
}

/// Run every instance of the scenario at the given path.
///
/// Instances are solved independently and in order. Returns the objective function value of
/// each instance.
///
/// # Arguments
///
/// * `scenario_dir` - Folder containing the scenario
/// * `output_dir` - Folder to which results are written
/// * `options` - Options controlling the run
pub fn run_scenario(
    scenario_dir: &Path,
    output_dir: &Path,
    options: &RunOptions,
) -> Result<IndexMap<InstanceKey, f64>> {
    let params = ScenarioParameters::from_path(scenario_dir)?;
    write_metadata(output_dir, scenario_dir, &params.features)
        .context("Failed to save metadata")?;

    let mut objectives = IndexMap::new();
    for key in params.iter_instances() {
        info!("Running {key}");
        let inputs_dir = key.inputs_dir(scenario_dir);
        let instance_dir = output_dir.join(key.relative_dir());
        let objective = run_instance(&params, &inputs_dir, &instance_dir, options)
            .with_context(|| {
                format!("Failed to run {key} (inputs in {})", inputs_dir.display())
            })?;
        info!("Objective function value for {key}: {objective}");
        objectives.insert(key, objective);
    }

    Ok(objectives)
}

fn run_instance(
    params: &ScenarioParameters,
    inputs_dir: &Path,
    instance_dir: &Path,
    options: &RunOptions,
) -> Result<f64> {
    let inputs = load_inputs(inputs_dir, params)?;
    let instance = assemble(params, &inputs)?;

    let solution = match instance.model.solve(&params.solver_options, options.quiet_solver) {
        Ok(solution) => solution,
        Err(err) => {
            write_solver_status(instance_dir, &err.to_string())?;
            return Err(anyhow!(err).context("Failed to solve model"));
        }
    };

    let results = instance.export_results(&solution, &inputs)?;
    write_instance_outputs(instance_dir, &results, solution.objective_value)?;
    if options.debug_model {
        write_debug_model(instance_dir, &instance.model, &solution)?;
    }

    Ok(solution.objective_value)
}

/// Check that every instance of the scenario at the given path can be assembled.
///
/// Inputs are read and validated and each model is built, but nothing is solved.
pub fn validate_scenario(scenario_dir: &Path) -> Result<()> {
    let params = ScenarioParameters::from_path(scenario_dir)?;
    for key in params.iter_instances() {
        let inputs_dir = key.inputs_dir(scenario_dir);
        let inputs = load_inputs(&inputs_dir, &params)
            .with_context(|| format!("Invalid inputs for {key}"))?;
        assemble(&params, &inputs).with_context(|| format!("Failed to build model for {key}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assemble_and_solve, core_params, gen_spec_project, gen_var_project, input_data, var_value,
    };
    use crate::example::Example;
    use crate::idx;
    use crate::output::RESULTS_DIR_NAME;
    use crate::scenario::{INPUTS_DIR_NAME, SCENARIO_FILE_NAME};
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;
    use std::fs;
    use std::path::PathBuf;

    #[rstest]
    fn cheapest_generator_dispatched_first(
        core_params: ScenarioParameters,
        mut input_data: InputData,
    ) {
        for project in [
            gen_spec_project("cheap", 40.0, 1.0),
            gen_spec_project("dear", 100.0, 5.0),
        ] {
            input_data.projects.insert(project.id.clone(), project);
        }

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        let power = |project: &str| {
            var_value(
                &instance,
                &solution,
                "GenSimple_Provide_Power_MW",
                &idx![project, 1],
            )
        };
        assert_approx_eq!(f64, power("cheap"), 40.0, epsilon = 1e-6);
        assert_approx_eq!(f64, power("dear"), 10.0, epsilon = 1e-6);

        // Each timepoint has objective weight 10: (40 x 1 + 10 x 5) x 10 x 4 timepoints
        assert_approx_eq!(f64, solution.objective_value, 3600.0, epsilon = 1e-6);
    }

    #[rstest]
    fn results_exported(core_params: ScenarioParameters, mut input_data: InputData) {
        let project = gen_spec_project("gen", 100.0, 1.0);
        input_data.projects.insert(project.id.clone(), project);

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        let results = instance.export_results(&solution, &input_data).unwrap();
        assert!(results.get("costs").is_some());
        assert!(!results.get("costs").unwrap().is_empty());
    }

    #[rstest]
    fn infeasible_without_enough_capacity(
        core_params: ScenarioParameters,
        mut input_data: InputData,
    ) {
        // 50 MW of wind at a capacity factor of 0.5 cannot meet 50 MW of load
        let mut project = gen_var_project();
        project.specified_capacity.get_mut(&2030).unwrap().capacity_mw = 50.0;
        input_data.projects.insert(project.id.clone(), project);

        assert!(assemble_and_solve(&core_params, &input_data).is_err());
    }

    #[test]
    fn validate_missing_scenario() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_scenario(dir.path()).is_err());
    }

    #[test]
    fn instances_written_to_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let scenario_dir = dir.path().join("scenario");
        Example::from_name("simple")
            .unwrap()
            .extract(&scenario_dir)
            .unwrap();
        fs::write(
            scenario_dir.join(SCENARIO_FILE_NAME),
            "weather_iterations = [1, 2]\nhydro_iterations = [3]\nsubproblems = [1, 2]\n",
        )
        .unwrap();

        // Every instance gets a copy of the example's inputs
        let params = ScenarioParameters::from_path(&scenario_dir).unwrap();
        let source = scenario_dir.join(INPUTS_DIR_NAME);
        for key in params.iter_instances() {
            let dest = key.inputs_dir(&scenario_dir);
            fs::create_dir_all(&dest).unwrap();
            for entry in fs::read_dir(&source).unwrap() {
                let entry = entry.unwrap();
                fs::copy(entry.path(), dest.join(entry.file_name())).unwrap();
            }
        }

        let output_dir = dir.path().join("output");
        fs::create_dir(&output_dir).unwrap();
        let options = RunOptions {
            quiet_solver: true,
            ..Default::default()
        };
        let objectives = run_scenario(&scenario_dir, &output_dir, &options).unwrap();

        let dirs = objectives.keys().map(|key| key.relative_dir()).collect_vec();
        let expected = ["1/3/1", "1/3/2", "2/3/1", "2/3/2"]
            .map(|path| path.split('/').collect::<PathBuf>());
        assert_eq!(dirs, expected);
        for dir in dirs {
            let instance_dir = output_dir.join(dir);
            assert!(instance_dir.join("objective_function_value.txt").is_file());
            assert!(instance_dir.join(RESULTS_DIR_NAME).join("costs.csv").is_file());
        }

        // Identical inputs give identical objectives
        let first = objectives[0];
        for objective in objectives.values() {
            assert_approx_eq!(f64, *objective, first, epsilon = 1e-6);
        }
    }
}

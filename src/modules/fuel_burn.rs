//! Fuel burned by projects.
use super::ModelModule;
use super::operations::operational_type_module;
use crate::dynamic_components::{
    DynamicComponents, PROJECT_TIMEPOINT_INDEX, PROJECT_TIMEPOINT_TABLE, ResultsTables,
};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{ModelInstance, Solution};
use anyhow::{Context, Result};

/// Fuel burned by each fuel-burning project in each operational timepoint, per hour
pub const FUEL_BURN_MMBTU: &str = "Fuel_Burn_MMBtu";

/// The `project.operations.fuel_burn` module
pub struct FuelBurn;

impl ModelModule for FuelBurn {
    fn name(&self) -> &str {
        "project.operations.fuel_burn"
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut fuel_burn = Vec::new();
        for (project, tmp) in dynamic
            .project_operational_timepoints(inputs)
            .filter(|(project, _)| project.burns_fuel())
        {
            let heat_rate = project.heat_rate_mmbtu_per_mwh.with_context(|| {
                format!("Project {} burns fuel but has no heat rate", project.id)
            })?;
            let power = operational_type_module(project.operational_type)
                .fuel_burn_power_rule(model, project, tmp)?;
            fuel_burn.push((idx![&project.id, tmp.id], power * heat_rate));
        }
        model.add_expressions(FUEL_BURN_MMBTU, fuel_burn);

        Ok(())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table(PROJECT_TIMEPOINT_TABLE, &PROJECT_TIMEPOINT_INDEX);
        for (index, value) in model.expression_values(FUEL_BURN_MMBTU, solution)? {
            table.set(index, "fuel_burn_mmbtu", value);
        }

        Ok(())
    }
}

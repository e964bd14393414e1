//! Carbon emissions of projects.
use super::ModelModule;
use super::fuel_burn::FUEL_BURN_MMBTU;
use crate::dynamic_components::{
    DynamicComponents, PROJECT_TIMEPOINT_INDEX, PROJECT_TIMEPOINT_TABLE, ResultsTables,
};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{ModelInstance, Solution};
use anyhow::{Context, Result};

/// Emissions of each fuel-burning project in each operational timepoint, in tons per hour
pub const PROJECT_CARBON_EMISSIONS: &str = "Project_Carbon_Emissions";

/// The `project.operations.carbon_emissions` module
pub struct CarbonEmissions;

impl ModelModule for CarbonEmissions {
    fn name(&self) -> &str {
        "project.operations.carbon_emissions"
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut emissions = Vec::new();
        for (project, tmp) in dynamic.project_operational_timepoints(inputs) {
            let Some(fuel_id) = &project.fuel else {
                continue;
            };
            let fuel = inputs
                .fuels
                .get(fuel_id)
                .with_context(|| format!("Unknown fuel {fuel_id}"))?;
            let index = idx![&project.id, tmp.id];
            let fuel_burn = model.expr(FUEL_BURN_MMBTU, &index)?;
            emissions.push((index, fuel_burn * fuel.co2_intensity_tons_per_mmbtu));
        }
        model.add_expressions(PROJECT_CARBON_EMISSIONS, emissions);

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
        for (index, value) in model.expression_values(PROJECT_CARBON_EMISSIONS, solution)? {
            table.set(index, "carbon_emissions_tons", value);
        }

        Ok(())
    }
}

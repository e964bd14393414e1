//! Variable operating costs of projects.
//!
//! Costs are per hour. The totals entering the objective function weight each timepoint by the
//! hours it represents and the discount factor and years of its period.
use super::ModelModule;
use super::fuel_burn::FUEL_BURN_MMBTU;
use super::operations::operational_type_module;
use crate::dynamic_components::{
    DynamicComponents, PROJECT_TIMEPOINT_INDEX, PROJECT_TIMEPOINT_TABLE, ResultsTables,
};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use anyhow::{Context, Result};

/// Variable O&M cost of each project in each operational timepoint
pub const VARIABLE_OM_COST: &str = "Variable_OM_Cost";
/// Fuel cost of each fuel-burning project in each operational timepoint
pub const FUEL_COST: &str = "Fuel_Cost";
/// Total variable O&M cost in the objective function
pub const TOTAL_VARIABLE_OM_COST: &str = "Total_Variable_OM_Cost";
/// Total fuel cost in the objective function
pub const TOTAL_FUEL_COST: &str = "Total_Fuel_Cost";

/// The `project.operations.costs` module
pub struct OperationalCosts;

impl ModelModule for OperationalCosts {
    fn name(&self) -> &str {
        "project.operations.costs"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .total_cost_components
            .extend([TOTAL_VARIABLE_OM_COST.to_string(), TOTAL_FUEL_COST.to_string()]);
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut variable_om = Vec::new();
        let mut fuel = Vec::new();
        let mut total_variable_om = LinExpr::new();
        let mut total_fuel = LinExpr::new();
        for (project, tmp) in dynamic.project_operational_timepoints(inputs) {
            let index = idx![&project.id, tmp.id];
            let weight = inputs.temporal.objective_weight(tmp.id)?;

            let power = operational_type_module(project.operational_type)
                .variable_om_power_rule(model, project, tmp)?;
            let cost = power * project.variable_om_cost_per_mwh;
            total_variable_om.add_scaled(&cost, weight);
            variable_om.push((index.clone(), cost));

            if let Some(fuel_id) = &project.fuel {
                let price = inputs
                    .fuels
                    .get(fuel_id)
                    .with_context(|| format!("Unknown fuel {fuel_id}"))?
                    .price(tmp.period, tmp.month)?;
                let cost = model.expr(FUEL_BURN_MMBTU, &index)? * price;
                total_fuel.add_scaled(&cost, weight);
                fuel.push((index, cost));
            }
        }
        model.add_expressions(VARIABLE_OM_COST, variable_om);
        model.add_expressions(FUEL_COST, fuel);
        model.add_scalar_expression(TOTAL_VARIABLE_OM_COST, total_variable_om);
        model.add_scalar_expression(TOTAL_FUEL_COST, total_fuel);

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
        for (name, column) in [
            (VARIABLE_OM_COST, "variable_om_cost"),
            (FUEL_COST, "fuel_cost"),
        ] {
            for (index, value) in model.expression_values(name, solution)? {
                table.set(index, column, value);
            }
        }

        Ok(())
    }
}

//! Capacity costs of projects.
use super::ModelModule;
use super::capacity::{PROJECT_PERIOD_INDEX, PROJECT_PERIOD_TABLE, capacity_type_module};
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use anyhow::Result;

/// Annual capacity cost of each project in each operational period
pub const CAPACITY_COST: &str = "Capacity_Cost";
/// Total capacity cost in the objective function
pub const TOTAL_CAPACITY_COSTS: &str = "Total_Capacity_Costs";

/// The `project.capacity.costs` module
pub struct CapacityCosts;

impl ModelModule for CapacityCosts {
    fn name(&self) -> &str {
        "project.capacity.costs"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .total_cost_components
            .push(TOTAL_CAPACITY_COSTS.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut costs = Vec::new();
        let mut total = LinExpr::new();
        for (project, period) in dynamic.project_operational_periods(inputs) {
            let cost = capacity_type_module(project.capacity_type)
                .capacity_cost_rule(model, project, period)?;
            total.add_scaled(&cost, inputs.temporal.period(period)?.objective_weight());
            costs.push((idx![&project.id, period], cost));
        }
        model.add_expressions(CAPACITY_COST, costs);
        model.add_scalar_expression(TOTAL_CAPACITY_COSTS, total);

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
        let table = results.table(PROJECT_PERIOD_TABLE, &PROJECT_PERIOD_INDEX);
        for (index, value) in model.expression_values(CAPACITY_COST, solution)? {
            table.set(index, "capacity_cost", value);
        }

        Ok(())
    }
}

//! The load balance in each load zone and timepoint.
//!
//! Other modules register expressions indexed by load zone and timepoint which produce or consume
//! power. The load balance constraint requires production to equal consumption, with slack
//! variables for overgeneration and unserved energy in zones which allow them.
use super::ModelModule;
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, ComponentIndex, Constraint, LinExpr, ModelInstance, Solution};
use anyhow::{Context, Result};

mod aggregate_power;
pub use aggregate_power::{AggregateLoadModifierPower, AggregateProjectPower};
mod static_load;
pub use static_load::StaticLoad;

/// Slack for generation in excess of load
pub const OVERGENERATION_MW: &str = "Overgeneration_MW";
/// Slack for load which is not served
pub const UNSERVED_ENERGY_MW: &str = "Unserved_Energy_MW";
/// The load balance constraint
pub const MEET_LOAD_CONSTRAINT: &str = "Meet_Load_Constraint";
/// Total penalty for overgeneration and unserved energy in the objective function
pub const TOTAL_LOAD_BALANCE_PENALTY_COSTS: &str = "Total_Load_Balance_Penalty_Costs";

/// The name of the results table with one row per load zone and timepoint
pub const LOAD_ZONE_TIMEPOINT_TABLE: &str = "system_load_zone_timepoint";

/// Index columns of [`LOAD_ZONE_TIMEPOINT_TABLE`]
pub const LOAD_ZONE_TIMEPOINT_INDEX: [&str; 2] = ["load_zone", "timepoint"];

/// The `system.load_balance` module
pub struct LoadBalance;

/// Sum the registered components at an index
fn sum_components(
    model: &ModelInstance,
    names: &[String],
    index: &ComponentIndex,
) -> Result<LinExpr> {
    let mut total = LinExpr::new();
    for name in names {
        total += model.expr(name, index)?;
    }

    Ok(total)
}

impl ModelModule for LoadBalance {
    fn name(&self) -> &str {
        "system.load_balance"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .total_cost_components
            .push(TOTAL_LOAD_BALANCE_PENALTY_COSTS.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let zone_timepoints = move || {
            inputs.load_zones.values().flat_map(move |zone| {
                inputs
                    .temporal
                    .iter_timepoints()
                    .map(move |tmp| (zone, tmp))
            })
        };
        model.add_variables(
            OVERGENERATION_MW,
            zone_timepoints()
                .filter(|(zone, _)| zone.allow_overgeneration)
                .map(|(zone, tmp)| (idx![&zone.id, tmp.id], Bounds::non_negative())),
        );
        model.add_variables(
            UNSERVED_ENERGY_MW,
            zone_timepoints()
                .filter(|(zone, _)| zone.allow_unserved_energy)
                .map(|(zone, tmp)| (idx![&zone.id, tmp.id], Bounds::non_negative())),
        );

        let mut constraints = Vec::new();
        let mut penalty = LinExpr::new();
        for (zone, tmp) in zone_timepoints() {
            let index = idx![&zone.id, tmp.id];
            let mut production =
                sum_components(model, &dynamic.load_balance_production_components, &index)
                    .context("Failed to sum power production")?;
            let mut consumption =
                sum_components(model, &dynamic.load_balance_consumption_components, &index)
                    .context("Failed to sum power consumption")?;

            let weight = inputs.temporal.objective_weight(tmp.id)?;
            if zone.allow_unserved_energy {
                let unserved = model.var(UNSERVED_ENERGY_MW, &index)?;
                production += unserved;
                penalty += unserved * (zone.unserved_energy_penalty_per_mwh * weight);
            }
            if zone.allow_overgeneration {
                let overgeneration = model.var(OVERGENERATION_MW, &index)?;
                consumption += overgeneration;
                penalty += overgeneration * (zone.overgeneration_penalty_per_mw * weight);
            }
            constraints.push((index, Constraint::eq(production, consumption)));
        }
        model
            .add_constraints(MEET_LOAD_CONSTRAINT, constraints)
            .context("Load cannot be balanced")?;
        model.add_scalar_expression(TOTAL_LOAD_BALANCE_PENALTY_COSTS, penalty);

        Ok(())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        _dynamic: &DynamicComponents,
        inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table(LOAD_ZONE_TIMEPOINT_TABLE, &LOAD_ZONE_TIMEPOINT_INDEX);
        for (name, column) in [
            (OVERGENERATION_MW, "overgeneration_mw"),
            (UNSERVED_ENERGY_MW, "unserved_energy_mw"),
        ] {
            for (index, value) in model.variable_values(name, solution)? {
                table.set(index, column, value);
            }
        }

        // The dual is the cost of serving one more MW for the hours the timepoint represents
        for zone in inputs.load_zones.keys() {
            for tmp in inputs.temporal.iter_timepoints() {
                let index = idx![zone, tmp.id];
                if let Some(dual) = model.dual(MEET_LOAD_CONSTRAINT, &index, solution)? {
                    let weight = inputs.temporal.objective_weight(tmp.id)?;
                    table.set(&index, "marginal_price_per_mwh", dual / weight);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assemble_and_solve, core_params, gen_var_project, input_data, var_value,
    };
    use crate::project::OperationalType;
    use crate::scenario::ScenarioParameters;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn unserved_energy_penalised(core_params: ScenarioParameters, mut input_data: InputData) {
        for zone in input_data.load_zones.values_mut() {
            zone.allow_unserved_energy = true;
            zone.unserved_energy_penalty_per_mwh = 1000.0;
        }

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        for tmp in 1..=4u32 {
            let unserved = var_value(&instance, &solution, UNSERVED_ENERGY_MW, &idx!["z1", tmp]);
            assert_approx_eq!(f64, unserved, 50.0, epsilon = 1e-6);
        }

        // 50 MW x 1000 x objective weight 10 x 4 timepoints
        assert_approx_eq!(f64, solution.objective_value, 2_000_000.0, epsilon = 1e-3);
    }

    #[rstest]
    fn must_take_output_overgenerates(core_params: ScenarioParameters, mut input_data: InputData) {
        for zone in input_data.load_zones.values_mut() {
            zone.allow_overgeneration = true;
            zone.overgeneration_penalty_per_mw = 1.0;
        }
        let mut project = gen_var_project();
        project.operational_type = OperationalType::GenVarMustTake;
        project.cap_factors.values_mut().for_each(|cf| *cf = 0.8);
        input_data.projects.insert(project.id.clone(), project);

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        for tmp in 1..=4u32 {
            let overgeneration =
                var_value(&instance, &solution, OVERGENERATION_MW, &idx!["z1", tmp]);
            assert_approx_eq!(f64, overgeneration, 30.0, epsilon = 1e-6);
        }
        assert_approx_eq!(f64, solution.objective_value, 1200.0, epsilon = 1e-6);
    }

    #[rstest]
    fn infeasible_without_slack(core_params: ScenarioParameters, input_data: InputData) {
        assert!(assemble_and_solve(&core_params, &input_data).is_err());
    }
}

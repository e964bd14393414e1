//! Caps on carbon emissions in each carbon cap zone and period.
use super::ModelModule;
use super::carbon_emissions::PROJECT_CARBON_EMISSIONS;
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, Constraint, LinExpr, ModelInstance, Solution};
use anyhow::Result;

/// Emissions of projects in each carbon cap zone and period, in tons
pub const TOTAL_CARBON_CAP_PROJECT_EMISSIONS: &str = "Total_Carbon_Cap_Project_Emissions";
/// Slack for emissions above the cap
pub const CARBON_CAP_OVERAGE: &str = "Carbon_Cap_Overage";
/// The carbon cap constraint
pub const CARBON_CAP_CONSTRAINT: &str = "Carbon_Cap_Constraint";
/// Total penalty for exceeding caps in the objective function
pub const TOTAL_CARBON_CAP_PENALTY_COSTS: &str = "Total_Carbon_Cap_Penalty_Costs";

/// The `system.policy.carbon_cap` module
pub struct CarbonCap;

impl ModelModule for CarbonCap {
    fn name(&self) -> &str {
        "system.policy.carbon_cap"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .carbon_cap_balance_emission_components
            .push(TOTAL_CARBON_CAP_PROJECT_EMISSIONS.to_string());
        dynamic
            .total_cost_components
            .push(TOTAL_CARBON_CAP_PENALTY_COSTS.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut emissions = Vec::new();
        for zone in inputs.carbon_cap_zones.keys() {
            for period in inputs.temporal.iter_periods() {
                let mut total = LinExpr::new();
                for (project, tmp) in dynamic.project_operational_timepoints(inputs) {
                    if tmp.period != period.id
                        || project.carbon_cap_zone.as_ref() != Some(zone)
                    {
                        continue;
                    }
                    let index = idx![&project.id, tmp.id];
                    if let Some(expr) = model.expressions(PROJECT_CARBON_EMISSIONS)?.get(&index) {
                        total.add_scaled(expr, tmp.weighted_hours());
                    }
                }
                emissions.push((idx![zone, period.id], total));
            }
        }
        model.add_expressions(TOTAL_CARBON_CAP_PROJECT_EMISSIONS, emissions);

        let capped = move || {
            inputs
                .carbon_cap_zones
                .values()
                .flat_map(move |zone| {
                    inputs
                        .temporal
                        .iter_periods()
                        .map(move |period| (zone, period))
                })
                .filter_map(move |(zone, period)| {
                    let cap = inputs.carbon_caps.get(&(zone.id.clone(), period.id))?;
                    Some((zone, period, *cap))
                })
        };
        model.add_variables(
            CARBON_CAP_OVERAGE,
            capped()
                .filter(|(zone, _, _)| zone.allow_violation)
                .map(|(zone, period, _)| (idx![&zone.id, period.id], Bounds::non_negative())),
        );

        let mut constraints = Vec::new();
        let mut penalty = LinExpr::new();
        for (zone, period, cap) in capped() {
            let index = idx![&zone.id, period.id];
            let mut total = LinExpr::new();
            for name in &dynamic.carbon_cap_balance_emission_components {
                total += model.expr(name, &index)?;
            }
            if zone.allow_violation {
                let overage = model.var(CARBON_CAP_OVERAGE, &index)?;
                total -= overage;
                penalty += overage
                    * (zone.violation_penalty_per_emission * period.objective_weight());
            }
            constraints.push((index, Constraint::le(total, cap)));
        }
        model.add_constraints(CARBON_CAP_CONSTRAINT, constraints)?;
        model.add_scalar_expression(TOTAL_CARBON_CAP_PENALTY_COSTS, penalty);

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
        let table = results.table("system_carbon_cap", &["carbon_cap_zone", "period"]);
        for zone in inputs.carbon_cap_zones.keys() {
            for period in inputs.temporal.iter_periods() {
                let Some(cap) = inputs.carbon_caps.get(&(zone.clone(), period.id)) else {
                    continue;
                };
                let index = idx![zone, period.id];
                table.set(&index, "carbon_cap", *cap);
                table.set(
                    &index,
                    "project_emissions",
                    model.expression_value(TOTAL_CARBON_CAP_PROJECT_EMISSIONS, &index, solution)?,
                );
                if let Some(var) = model.variables(CARBON_CAP_OVERAGE)?.get(&index) {
                    table.set(&index, "overage", solution.value(*var));
                }
                if let Some(dual) = model.dual(CARBON_CAP_CONSTRAINT, &index, solution)? {
                    table.set(&index, "dual", dual);
                }
            }
        }

        Ok(())
    }
}

//! Power production of projects, summed by load zone.
//!
//! Bulk supply and load modifiers (e.g. demand response) are aggregated separately so that the
//! load net of load modifiers can be reported.
use super::static_load::LZ_LOAD_IN_TMP;
use super::{LOAD_ZONE_TIMEPOINT_INDEX, LOAD_ZONE_TIMEPOINT_TABLE};
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::modules::ModelModule;
use crate::modules::operations::POWER_PROVISION_MW;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Power produced by projects other than load modifiers in each load zone and timepoint
pub const POWER_PRODUCTION_IN_ZONE_MW: &str = "Power_Production_in_Zone_MW";
/// Power produced by load modifiers in each load zone and timepoint
pub const LOAD_MODIFIER_POWER_PRODUCTION_IN_ZONE_MW: &str =
    "Load_Modifier_Power_Production_in_Zone_MW";

/// Add an expression summing the power of projects in each load zone and timepoint
fn add_zone_power(
    model: &mut ModelInstance,
    dynamic: &DynamicComponents,
    inputs: &InputData,
    name: &str,
    load_modifiers: bool,
) -> Result<()> {
    let mut totals: IndexMap<_, LinExpr> = IndexMap::new();
    for zone in inputs.load_zones.keys() {
        for tmp in inputs.temporal.iter_timepoints() {
            totals.insert((zone.clone(), tmp.id), LinExpr::new());
        }
    }
    for (project, tmp) in dynamic
        .project_operational_timepoints(inputs)
        .filter(|(project, _)| project.load_modifier == load_modifiers)
    {
        let power = model.expr(POWER_PROVISION_MW, &idx![&project.id, tmp.id])?;
        *totals
            .get_mut(&(project.load_zone.clone(), tmp.id))
            .with_context(|| format!("Unknown load zone {}", project.load_zone))? += power;
    }
    model.add_expressions(
        name,
        totals
            .into_iter()
            .map(|((zone, tmp), expr)| (idx![&zone, tmp], expr)),
    );

    Ok(())
}

/// The `system.load_balance.aggregate_project_power` module
pub struct AggregateProjectPower;

impl ModelModule for AggregateProjectPower {
    fn name(&self) -> &str {
        "system.load_balance.aggregate_project_power"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .load_balance_production_components
            .push(POWER_PRODUCTION_IN_ZONE_MW.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        add_zone_power(model, dynamic, inputs, POWER_PRODUCTION_IN_ZONE_MW, false)
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table(LOAD_ZONE_TIMEPOINT_TABLE, &LOAD_ZONE_TIMEPOINT_INDEX);
        for (index, value) in model.expression_values(POWER_PRODUCTION_IN_ZONE_MW, solution)? {
            table.set(index, "project_power_mw", value);
        }

        Ok(())
    }
}

/// The `system.load_balance.aggregate_load_modifier_power` module
pub struct AggregateLoadModifierPower;

impl ModelModule for AggregateLoadModifierPower {
    fn name(&self) -> &str {
        "system.load_balance.aggregate_load_modifier_power"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .load_balance_production_components
            .push(LOAD_MODIFIER_POWER_PRODUCTION_IN_ZONE_MW.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        add_zone_power(
            model,
            dynamic,
            inputs,
            LOAD_MODIFIER_POWER_PRODUCTION_IN_ZONE_MW,
            true,
        )
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table(LOAD_ZONE_TIMEPOINT_TABLE, &LOAD_ZONE_TIMEPOINT_INDEX);
        for (index, value) in
            model.expression_values(LOAD_MODIFIER_POWER_PRODUCTION_IN_ZONE_MW, solution)?
        {
            let load = model.expression_value(LZ_LOAD_IN_TMP, index, solution)?;
            table.set(index, "load_modifier_power_mw", value);
            table.set(index, "load_net_of_modifiers_mw", load - value);
        }

        Ok(())
    }
}

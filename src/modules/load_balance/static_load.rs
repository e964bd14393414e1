//! Static load, which must be met in each load zone and timepoint.
use super::{LOAD_ZONE_TIMEPOINT_INDEX, LOAD_ZONE_TIMEPOINT_TABLE};
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::geography::LoadZoneID;
use crate::idx;
use crate::input::InputData;
use crate::modules::ModelModule;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use anyhow::Result;

/// Load in each load zone and timepoint, summed over load components
pub const LZ_LOAD_IN_TMP: &str = "LZ_Load_in_Tmp";

/// The `system.load_balance.static_load_requirement` module
pub struct StaticLoad;

/// Total static load in a zone and timepoint
fn total_load(inputs: &InputData, zone: &LoadZoneID, tmp: u32) -> f64 {
    inputs
        .load
        .get(&(zone.clone(), tmp))
        .map(|components| components.values().sum())
        .unwrap_or(0.0)
}

impl ModelModule for StaticLoad {
    fn name(&self) -> &str {
        "system.load_balance.static_load_requirement"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .load_balance_consumption_components
            .push(LZ_LOAD_IN_TMP.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut load = Vec::new();
        for zone in inputs.load_zones.keys() {
            for tmp in inputs.temporal.iter_timepoints() {
                load.push((
                    idx![zone, tmp.id],
                    LinExpr::constant(total_load(inputs, zone, tmp.id)),
                ));
            }
        }
        model.add_expressions(LZ_LOAD_IN_TMP, load);

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
        let table = results.table(LOAD_ZONE_TIMEPOINT_TABLE, &LOAD_ZONE_TIMEPOINT_INDEX);
        for (index, value) in model.expression_values(LZ_LOAD_IN_TMP, solution)? {
            table.set(index, "static_load_mw", value);
        }

        Ok(())
    }
}

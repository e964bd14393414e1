//! Power flows on transmission lines between load zones.
//!
//! Flows in each direction are separate non-negative variables, limited by the line's capacity.
//! Losses are a fixed fraction of the flow and are taken from the receiving end.
use super::ModelModule;
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, Constraint, LinExpr, ModelInstance, Solution};
use crate::temporal::Timepoint;
use crate::transmission::TxLine;
use anyhow::{Context, Result};
use indexmap::IndexMap;

mod capacity;
pub use capacity::{
    TX_CAPACITY_COST, TX_MAX_CAPACITY_MW, TX_MIN_CAPACITY_MW, TX_NEW_LIN_BUILD_MW,
};
use capacity::{add_capacity_components, export_capacity_results};

/// Flow from `load_zone_from` to `load_zone_to`
pub const TRANSMIT_POWER_POS_DIR_MW: &str = "Transmit_Power_Pos_Dir_MW";
/// Flow from `load_zone_to` to `load_zone_from`
pub const TRANSMIT_POWER_NEG_DIR_MW: &str = "Transmit_Power_Neg_Dir_MW";
/// Net flow on each line in each operational timepoint
pub const TRANSMIT_POWER_MW: &str = "Transmit_Power_MW";
/// Power received minus power sent by each load zone in each timepoint
pub const TRANSMISSION_NET_IMPORTS_MW: &str = "Transmission_Net_Imports_MW";
/// Limits flows in the positive direction to the line's maximum capacity
pub const TX_POS_DIR_FLOW_CONSTRAINT: &str = "Transmit_Power_Pos_Dir_Max_Constraint";
/// Limits flows in the negative direction to the line's minimum capacity
pub const TX_NEG_DIR_FLOW_CONSTRAINT: &str = "Transmit_Power_Neg_Dir_Max_Constraint";
/// Total cost of transmission capacity in the objective function
pub const TOTAL_TX_CAPACITY_COSTS: &str = "Total_Tx_Capacity_Costs";

/// The `transmission` module
pub struct Transmission;

/// Iterate over the timepoints in which lines are operational
pub fn operational_line_timepoints(inputs: &InputData) -> impl Iterator<Item = (&TxLine, &Timepoint)> {
    inputs.transmission_lines.values().flat_map(move |line| {
        inputs
            .temporal
            .iter_timepoints()
            .filter(move |tmp| line.is_operational_in(tmp.period))
            .map(move |tmp| (line, tmp))
    })
}

impl ModelModule for Transmission {
    fn name(&self) -> &str {
        "transmission"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .load_balance_production_components
            .push(TRANSMISSION_NET_IMPORTS_MW.to_string());
        dynamic
            .total_cost_components
            .push(TOTAL_TX_CAPACITY_COSTS.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let total_cost = add_capacity_components(model, inputs)?;

        let timepoints = || {
            operational_line_timepoints(inputs)
                .map(|(line, tmp)| (idx![&line.id, tmp.id], Bounds::non_negative()))
        };
        model.add_variables(TRANSMIT_POWER_POS_DIR_MW, timepoints());
        model.add_variables(TRANSMIT_POWER_NEG_DIR_MW, timepoints());

        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for (line, tmp) in operational_line_timepoints(inputs) {
            let index = idx![&line.id, tmp.id];
            let period = idx![&line.id, tmp.period];
            let pos = model.var(TRANSMIT_POWER_POS_DIR_MW, &index)?;
            let neg = model.var(TRANSMIT_POWER_NEG_DIR_MW, &index)?;
            let max = model.expr(TX_MAX_CAPACITY_MW, &period)?.clone();
            let min = model.expr(TX_MIN_CAPACITY_MW, &period)?;
            positive.push((index.clone(), Constraint::le(pos.into(), max)));
            negative.push((index, Constraint::le(LinExpr::from(neg) + min, 0.0)));
        }
        model.add_constraints(TX_POS_DIR_FLOW_CONSTRAINT, positive)?;
        model.add_constraints(TX_NEG_DIR_FLOW_CONSTRAINT, negative)?;

        let mut net_flow = Vec::new();
        let mut net_imports: IndexMap<_, LinExpr> = inputs
            .load_zones
            .keys()
            .flat_map(|zone| {
                inputs
                    .temporal
                    .iter_timepoints()
                    .map(move |tmp| ((zone.clone(), tmp.id), LinExpr::new()))
            })
            .collect();
        for (line, tmp) in operational_line_timepoints(inputs) {
            let index = idx![&line.id, tmp.id];
            let pos = model.var(TRANSMIT_POWER_POS_DIR_MW, &index)?;
            let neg = model.var(TRANSMIT_POWER_NEG_DIR_MW, &index)?;
            net_flow.push((index, LinExpr::from(pos) - neg));

            let delivered = 1.0 - line.loss_factor;
            let to = net_imports
                .get_mut(&(line.load_zone_to.clone(), tmp.id))
                .with_context(|| format!("Unknown load zone {}", line.load_zone_to))?;
            *to += pos * delivered;
            *to -= neg;
            let from = net_imports
                .get_mut(&(line.load_zone_from.clone(), tmp.id))
                .with_context(|| format!("Unknown load zone {}", line.load_zone_from))?;
            *from += neg * delivered;
            *from -= pos;
        }
        model.add_expressions(TRANSMIT_POWER_MW, net_flow);
        model.add_expressions(
            TRANSMISSION_NET_IMPORTS_MW,
            net_imports
                .into_iter()
                .map(|((zone, tmp), expr)| (idx![&zone, tmp], expr)),
        );

        model.add_scalar_expression(TOTAL_TX_CAPACITY_COSTS, total_cost);

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
        let table = results.table("transmission_timepoint", &["transmission_line", "timepoint"]);
        for (line, tmp) in operational_line_timepoints(inputs) {
            let index = idx![&line.id, tmp.id];
            let pos = solution.value(model.var(TRANSMIT_POWER_POS_DIR_MW, &index)?);
            let neg = solution.value(model.var(TRANSMIT_POWER_NEG_DIR_MW, &index)?);
            table.set(&index, "load_zone_from", line.load_zone_from.to_string());
            table.set(&index, "load_zone_to", line.load_zone_to.to_string());
            table.set(&index, "transmit_power_mw", pos - neg);
            table.set(&index, "losses_mw", (pos + neg) * line.loss_factor);
        }

        export_capacity_results(model, solution, inputs, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assemble_and_solve, input_data, two_zone_inputs, var_value};
    use crate::scenario::ScenarioParameters;
    use crate::transmission::{TxCapacityType, TxNewBuildVintage};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn losses_taken_from_receiving_end(input_data: InputData) {
        let params: ScenarioParameters = toml::from_str(r#"features = ["transmission"]"#).unwrap();
        let inputs = two_zone_inputs(input_data);
        let (instance, solution) = assemble_and_solve(&params, &inputs).unwrap();

        let sent = 50.0 / 0.9;
        for tmp in 1..=4u32 {
            let flow = instance
                .model
                .expression_value(TRANSMIT_POWER_MW, &idx!["line", tmp], &solution)
                .unwrap();
            assert_approx_eq!(f64, flow, sent, epsilon = 1e-6);
        }

        // Generation cost with objective weight 10, plus 100 MW x 1 x discount 0.5 x 10 years
        assert_approx_eq!(
            f64,
            solution.objective_value,
            sent * 10.0 * 4.0 + 500.0,
            epsilon = 1e-6
        );
    }

    /// Replace the specified line with one which must be built, and let z1 drop load at a cost
    fn new_build_inputs(input_data: InputData, cost_per_mw_yr: f64) -> InputData {
        let mut inputs = two_zone_inputs(input_data);
        let line = &mut inputs.transmission_lines[0];
        line.capacity_type = TxCapacityType::NewLin;
        line.loss_factor = 0.0;
        line.capacity.clear();
        line.new_build_vintages.insert(
            2030,
            TxNewBuildVintage {
                lifetime_yrs: 20,
                annualized_real_cost_per_mw_yr: cost_per_mw_yr,
            },
        );

        let zone = &mut inputs.load_zones[0];
        zone.allow_unserved_energy = true;
        zone.unserved_energy_penalty_per_mwh = 1000.0;

        inputs
    }

    #[rstest]
    #[case::cheaper_than_unserved_energy(10.0, 50.0)]
    #[case::dearer_than_unserved_energy(1e6, 0.0)]
    fn line_built_when_cheaper_than_unserved_energy(
        input_data: InputData,
        #[case] cost_per_mw_yr: f64,
        #[case] expected_build: f64,
    ) {
        let params: ScenarioParameters = toml::from_str(r#"features = ["transmission"]"#).unwrap();
        let inputs = new_build_inputs(input_data, cost_per_mw_yr);
        let (instance, solution) = assemble_and_solve(&params, &inputs).unwrap();

        let build = var_value(&instance, &solution, TX_NEW_LIN_BUILD_MW, &idx!["line", 2030u32]);
        assert_approx_eq!(f64, build, expected_build, epsilon = 1e-6);
        let max = instance
            .model
            .expression_value(TX_MAX_CAPACITY_MW, &idx!["line", 2030u32], &solution)
            .unwrap();
        assert_approx_eq!(f64, max, expected_build, epsilon = 1e-6);

        // Each MW built costs 5x its annual cost; unserved energy costs 10x the penalty per MWh
        let unserved = 50.0 - expected_build;
        let expected = expected_build * cost_per_mw_yr * 5.0
            + expected_build * 1.0 * 10.0 * 4.0
            + unserved * 1000.0 * 10.0 * 4.0;
        assert_approx_eq!(f64, solution.objective_value, expected, epsilon = 1e-3);
    }
}

//! Minimum transmission flows in each transmission target zone and horizon.
//!
//! The energy sent over a zone's lines within a horizon must reach the zone's target in both the
//! positive and the negative direction. Lines count either their flow in each direction or their
//! net flow. Zones which allow violations may fall short at a penalty.
use super::ModelModule;
use super::transmission::{TRANSMIT_POWER_MW, TRANSMIT_POWER_NEG_DIR_MW, TRANSMIT_POWER_POS_DIR_MW};
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::geography::TxTargetZoneID;
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, ComponentIndex, Constraint, LinExpr, ModelInstance, Solution};
use crate::temporal::{BalancingType, Horizon};
use crate::transmission::TxTarget;
use anyhow::{Context, Result};

/// Energy counting towards positive-direction targets in each zone and horizon
pub const TOTAL_TX_TARGET_ENERGY_POS_DIR_MWH: &str = "Total_Transmission_Target_Energy_Pos_Dir_MWh";
/// Energy counting towards negative-direction targets in each zone and horizon
pub const TOTAL_TX_TARGET_ENERGY_NEG_DIR_MWH: &str = "Total_Transmission_Target_Energy_Neg_Dir_MWh";
/// Shortfall against the positive-direction target
pub const TX_TARGET_SHORTAGE_POS_DIR_MWH: &str = "Transmission_Target_Shortage_Pos_Dir_MWh";
/// Shortfall against the negative-direction target
pub const TX_TARGET_SHORTAGE_NEG_DIR_MWH: &str = "Transmission_Target_Shortage_Neg_Dir_MWh";
/// The positive-direction target constraint
pub const TX_TARGET_POS_DIR_CONSTRAINT: &str = "Transmission_Target_Pos_Dir_Constraint";
/// The negative-direction target constraint
pub const TX_TARGET_NEG_DIR_CONSTRAINT: &str = "Transmission_Target_Neg_Dir_Constraint";
/// Total penalty for missing targets in the objective function
pub const TOTAL_TX_TARGET_PENALTY_COSTS: &str = "Total_Transmission_Target_Penalty_Costs";

/// The `system.policy.transmission_targets` module
pub struct TransmissionTargets;

type TargetKey = (TxTargetZoneID, BalancingType, u32);

/// Iterate over the targets whose horizons are part of the instance, with their horizons
fn targets_with_horizons(
    inputs: &InputData,
) -> impl Iterator<Item = Result<(&TargetKey, &TxTarget, &Horizon)>> {
    inputs.tx_targets.iter().map(move |(key, target)| {
        let (_, balancing_type, horizon) = key;
        let horizon = inputs
            .temporal
            .horizon(balancing_type, *horizon)
            .with_context(|| format!("Unknown {balancing_type} horizon {horizon}"))?;
        Ok((key, target, horizon))
    })
}

fn target_index((zone, balancing_type, horizon): &TargetKey) -> ComponentIndex {
    idx![zone, balancing_type, *horizon]
}

/// Energy sent over a zone's lines within a horizon, in the positive and negative directions
fn horizon_energy(
    model: &ModelInstance,
    inputs: &InputData,
    zone: &TxTargetZoneID,
    horizon: &Horizon,
) -> Result<(LinExpr, LinExpr)> {
    let mut positive = LinExpr::new();
    let mut negative = LinExpr::new();
    let lines = inputs
        .transmission_lines
        .values()
        .filter(|line| line.tx_target_zone.as_ref() == Some(zone));
    for line in lines {
        for tmp in &horizon.timepoints {
            let tmp = inputs.temporal.timepoint(*tmp)?;
            if !line.is_operational_in(tmp.period) {
                continue;
            }

            let index = idx![&line.id, tmp.id];
            if line.contributes_net_flow_to_tx_target {
                let net = model.expr(TRANSMIT_POWER_MW, &index)?;
                positive.add_scaled(net, tmp.hours);
                negative.add_scaled(net, -tmp.hours);
            } else {
                positive.add_term(model.var(TRANSMIT_POWER_POS_DIR_MW, &index)?, tmp.hours);
                negative.add_term(model.var(TRANSMIT_POWER_NEG_DIR_MW, &index)?, tmp.hours);
            }
        }
    }

    Ok((positive, negative))
}

/// The fraction of a target met, or 1 if there is no target
fn fraction_met(achieved: f64, target: f64) -> f64 {
    if target == 0.0 { 1.0 } else { achieved / target }
}

impl ModelModule for TransmissionTargets {
    fn name(&self) -> &str {
        "system.policy.transmission_targets"
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic
            .total_cost_components
            .push(TOTAL_TX_TARGET_PENALTY_COSTS.to_string());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let mut positive_energy = Vec::new();
        let mut negative_energy = Vec::new();
        let mut shortage_indices = Vec::new();
        for target in targets_with_horizons(inputs) {
            let (key, _, horizon) = target?;
            let (positive, negative) = horizon_energy(model, inputs, &key.0, horizon)?;
            let index = target_index(key);
            positive_energy.push((index.clone(), positive));
            negative_energy.push((index.clone(), negative));
            if inputs.tx_target_zones[&key.0].allow_violation {
                shortage_indices.push(index);
            }
        }
        model.add_expressions(TOTAL_TX_TARGET_ENERGY_POS_DIR_MWH, positive_energy);
        model.add_expressions(TOTAL_TX_TARGET_ENERGY_NEG_DIR_MWH, negative_energy);
        for name in [TX_TARGET_SHORTAGE_POS_DIR_MWH, TX_TARGET_SHORTAGE_NEG_DIR_MWH] {
            model.add_variables(
                name,
                shortage_indices
                    .iter()
                    .map(|index| (index.clone(), Bounds::non_negative())),
            );
        }

        let mut positive_constraints = Vec::new();
        let mut negative_constraints = Vec::new();
        let mut penalty = LinExpr::new();
        for target in targets_with_horizons(inputs) {
            let (key, target, horizon) = target?;
            let index = target_index(key);
            let mut positive = model.expr(TOTAL_TX_TARGET_ENERGY_POS_DIR_MWH, &index)?.clone();
            let mut negative = model.expr(TOTAL_TX_TARGET_ENERGY_NEG_DIR_MWH, &index)?.clone();

            let zone = &inputs.tx_target_zones[&key.0];
            if zone.allow_violation {
                let pos_shortage = model.var(TX_TARGET_SHORTAGE_POS_DIR_MWH, &index)?;
                let neg_shortage = model.var(TX_TARGET_SHORTAGE_NEG_DIR_MWH, &index)?;
                positive += pos_shortage;
                negative += neg_shortage;

                let weight = zone.violation_penalty_per_mwh
                    * inputs.temporal.horizon_objective_weight(horizon)?;
                penalty += pos_shortage * weight;
                penalty += neg_shortage * weight;
            }

            // A zero target is not enforced
            if target.pos_dir_min_mwh > 0.0 {
                positive_constraints.push((
                    index.clone(),
                    Constraint::ge(positive, target.pos_dir_min_mwh),
                ));
            }
            if target.neg_dir_min_mwh > 0.0 {
                negative_constraints.push((
                    index,
                    Constraint::ge(negative, target.neg_dir_min_mwh),
                ));
            }
        }
        model.add_constraints(TX_TARGET_POS_DIR_CONSTRAINT, positive_constraints)?;
        model.add_constraints(TX_TARGET_NEG_DIR_CONSTRAINT, negative_constraints)?;
        model.add_scalar_expression(TOTAL_TX_TARGET_PENALTY_COSTS, penalty);

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
        let table = results.table(
            "system_transmission_target",
            &["transmission_target_zone", "balancing_type", "horizon"],
        );
        for target in targets_with_horizons(inputs) {
            let (key, target, _) = target?;
            let index = target_index(key);
            for (direction, min_mwh, energy, shortage) in [
                (
                    "pos_dir",
                    target.pos_dir_min_mwh,
                    TOTAL_TX_TARGET_ENERGY_POS_DIR_MWH,
                    TX_TARGET_SHORTAGE_POS_DIR_MWH,
                ),
                (
                    "neg_dir",
                    target.neg_dir_min_mwh,
                    TOTAL_TX_TARGET_ENERGY_NEG_DIR_MWH,
                    TX_TARGET_SHORTAGE_NEG_DIR_MWH,
                ),
            ] {
                let achieved = model.expression_value(energy, &index, solution)?;
                let shortage = model
                    .variables(shortage)?
                    .get(&index)
                    .map_or(0.0, |var| solution.value(*var));
                table.set(
                    &index,
                    &format!("transmission_target_{direction}_min_mwh"),
                    min_mwh,
                );
                table.set(
                    &index,
                    &format!("transmission_target_energy_{direction}_mwh"),
                    achieved,
                );
                table.set(
                    &index,
                    &format!("fraction_of_transmission_target_{direction}_met"),
                    fraction_met(achieved, min_mwh),
                );
                table.set(
                    &index,
                    &format!("transmission_target_shortage_{direction}_mwh"),
                    shortage,
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic_components::ResultValue;
    use crate::fixture::{assemble_and_solve, gen_spec_project, input_data, two_zone_inputs};
    use crate::geography::TxTargetZone;
    use crate::scenario::ScenarioParameters;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn params() -> ScenarioParameters {
        toml::from_str(r#"features = ["transmission", "transmission_target"]"#).unwrap()
    }

    /// Two zones where z1 can meet its own load more cheaply than importing from z2, with a
    /// target of 80 MWh from z2 to z1 over the first half day
    fn targeted_inputs(
        input_data: InputData,
        allow_violation: bool,
        violation_penalty_per_mwh: f64,
    ) -> InputData {
        let mut inputs = two_zone_inputs(input_data);
        let local = gen_spec_project("local", 100.0, 0.5);
        inputs.projects.insert(local.id.clone(), local);

        let zone = TxTargetZone {
            id: "tz".into(),
            allow_violation,
            violation_penalty_per_mwh,
        };
        let line = &mut inputs.transmission_lines[0];
        line.loss_factor = 0.0;
        line.capacity.get_mut(&2030).unwrap().fixed_cost_per_mw_yr = 0.0;
        line.tx_target_zone = Some(zone.id.clone());
        inputs.tx_targets.insert(
            (zone.id.clone(), "half_day".into(), 1),
            TxTarget {
                pos_dir_min_mwh: 80.0,
                neg_dir_min_mwh: 0.0,
            },
        );
        inputs.tx_target_zones.insert(zone.id.clone(), zone);

        inputs
    }

    /// Solve and return the given columns of the target results, with the objective value
    fn solve_for_results(
        params: &ScenarioParameters,
        inputs: &InputData,
        columns: &[&str],
    ) -> (Vec<f64>, f64) {
        let (instance, solution) = assemble_and_solve(params, inputs).unwrap();
        let results = instance.export_results(&solution, inputs).unwrap();
        let table = results.get("system_transmission_target").unwrap();
        let values = columns
            .iter()
            .map(|column| {
                let Some(ResultValue::Number(value)) =
                    table.get(&idx!["tz", "half_day", 1u32], column)
                else {
                    panic!("No value reported for {column}");
                };
                *value
            })
            .collect();

        (values, solution.objective_value)
    }

    #[rstest]
    fn target_met_by_importing(params: ScenarioParameters, input_data: InputData) {
        let inputs = targeted_inputs(input_data, false, 0.0);
        let (values, objective) = solve_for_results(
            &params,
            &inputs,
            &["transmission_target_energy_pos_dir_mwh"],
        );
        assert_approx_eq!(f64, values[0], 80.0, epsilon = 1e-6);

        // 80 MWh moves from the local generator at 0.5 to the remote one at 1, weighted by 10
        assert_approx_eq!(
            f64,
            objective,
            200.0 * 0.5 * 10.0 + 80.0 * 0.5 * 10.0,
            epsilon = 1e-6
        );
    }

    #[rstest]
    #[case::penalty_above_cost_of_meeting(1.0, 1.0, 0.0)]
    #[case::penalty_below_cost_of_meeting(0.1, 0.0, 80.0)]
    fn shortage_when_penalty_is_cheaper(
        params: ScenarioParameters,
        input_data: InputData,
        #[case] penalty: f64,
        #[case] expected_fraction: f64,
        #[case] expected_shortage: f64,
    ) {
        let inputs = targeted_inputs(input_data, true, penalty);
        let (values, objective) = solve_for_results(
            &params,
            &inputs,
            &[
                "fraction_of_transmission_target_pos_dir_met",
                "transmission_target_shortage_pos_dir_mwh",
            ],
        );
        assert_approx_eq!(f64, values[0], expected_fraction, epsilon = 1e-6);
        assert_approx_eq!(f64, values[1], expected_shortage, epsilon = 1e-6);

        // A shortage is weighted like energy in the horizon's timepoints
        let met = 80.0 - expected_shortage;
        let expected = 200.0 * 0.5 * 10.0 + met * 0.5 * 10.0 + expected_shortage * penalty * 10.0;
        assert_approx_eq!(f64, objective, expected, epsilon = 1e-6);
    }

    #[rstest]
    fn net_flow_counts_against_both_directions(
        params: ScenarioParameters,
        input_data: InputData,
    ) {
        let mut inputs = targeted_inputs(input_data, false, 0.0);
        inputs.transmission_lines[0].contributes_net_flow_to_tx_target = true;
        inputs.tx_targets[0].neg_dir_min_mwh = 10.0;

        // The net flow cannot be both at least 80 MWh one way and 10 MWh the other
        assert!(assemble_and_solve(&params, &inputs).is_err());
    }
}

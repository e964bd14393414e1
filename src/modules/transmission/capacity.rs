//! Capacity of transmission lines and its cost.
//!
//! Every line has a minimum (non-positive) and a maximum capacity in each period in which it is
//! operational. Specified lines take both from the inputs. New-build lines have a build variable
//! per vintage and their capacity is what has been built by vintages still within their lifetime.
use crate::dynamic_components::ResultsTables;
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, LinExpr, ModelInstance, Solution};
use crate::transmission::{TxCapacityType, TxLine};
use anyhow::Result;

/// Capacity of new-build lines built in each vintage
pub const TX_NEW_LIN_BUILD_MW: &str = "TxNewLin_Build_MW";
/// Maximum flow in the negative direction in each operational period, as a non-positive number
pub const TX_MIN_CAPACITY_MW: &str = "Tx_Min_Capacity_MW";
/// Maximum flow in the positive direction in each operational period
pub const TX_MAX_CAPACITY_MW: &str = "Tx_Max_Capacity_MW";
/// Annual capacity cost of each line in each operational period
pub const TX_CAPACITY_COST: &str = "Tx_Capacity_Cost";

/// Iterate over the periods in which lines are operational
pub(super) fn operational_line_periods(
    inputs: &InputData,
) -> impl Iterator<Item = (&TxLine, u32)> {
    inputs.transmission_lines.values().flat_map(move |line| {
        inputs
            .temporal
            .iter_periods()
            .map(|period| period.id)
            .filter(move |period| line.is_operational_in(*period))
            .map(move |period| (line, period))
    })
}

/// The minimum and maximum capacity of a line in a period, and its annual cost
fn capacity_rule(
    model: &ModelInstance,
    line: &TxLine,
    period: u32,
) -> Result<(LinExpr, LinExpr, LinExpr)> {
    match line.capacity_type {
        TxCapacityType::Specified => {
            let capacity = &line.capacity[&period];
            Ok((
                LinExpr::constant(capacity.min_mw),
                LinExpr::constant(capacity.max_mw),
                LinExpr::constant(capacity.max_mw * capacity.fixed_cost_per_mw_yr),
            ))
        }
        TxCapacityType::NewLin => {
            let mut built = LinExpr::new();
            let mut cost = LinExpr::new();
            for (vintage, params) in line.vintages_operational_in(period) {
                let build = model.var(TX_NEW_LIN_BUILD_MW, &idx![&line.id, vintage])?;
                built.add_term(build, 1.0);
                cost.add_term(build, params.annualized_real_cost_per_mw_yr);
            }
            Ok((-built.clone(), built, cost))
        }
    }
}

/// Add the build variables and the capacity and cost expressions of every line.
///
/// Returns the total capacity cost, weighted for the objective function.
pub(super) fn add_capacity_components(
    model: &mut ModelInstance,
    inputs: &InputData,
) -> Result<LinExpr> {
    model.add_variables(
        TX_NEW_LIN_BUILD_MW,
        inputs
            .transmission_lines
            .values()
            .filter(|line| line.capacity_type == TxCapacityType::NewLin)
            .flat_map(|line| {
                line.new_build_vintages
                    .keys()
                    .map(move |vintage| (idx![&line.id, *vintage], Bounds::non_negative()))
            }),
    );

    let mut min_capacity = Vec::new();
    let mut max_capacity = Vec::new();
    let mut costs = Vec::new();
    let mut total = LinExpr::new();
    for (line, period) in operational_line_periods(inputs) {
        let (min, max, cost) = capacity_rule(model, line, period)?;
        total.add_scaled(&cost, inputs.temporal.period(period)?.objective_weight());

        let index = idx![&line.id, period];
        min_capacity.push((index.clone(), min));
        max_capacity.push((index.clone(), max));
        costs.push((index, cost));
    }
    model.add_expressions(TX_MIN_CAPACITY_MW, min_capacity);
    model.add_expressions(TX_MAX_CAPACITY_MW, max_capacity);
    model.add_expressions(TX_CAPACITY_COST, costs);

    Ok(total)
}

/// Write each line's capacity, new build and cost in every operational period
pub(super) fn export_capacity_results(
    model: &ModelInstance,
    solution: &Solution,
    inputs: &InputData,
    results: &mut ResultsTables,
) -> Result<()> {
    let table = results.table("transmission_period", &["transmission_line", "period"]);
    for (line, period) in operational_line_periods(inputs) {
        let index = idx![&line.id, period];
        table.set(&index, "capacity_type", line.capacity_type.label());
        table.set(
            &index,
            "min_capacity_mw",
            model.expression_value(TX_MIN_CAPACITY_MW, &index, solution)?,
        );
        table.set(
            &index,
            "max_capacity_mw",
            model.expression_value(TX_MAX_CAPACITY_MW, &index, solution)?,
        );
        if let Some(build) = model.variables(TX_NEW_LIN_BUILD_MW)?.get(&index) {
            table.set(&index, "new_build_mw", solution.value(*build));
        }
        table.set(
            &index,
            "capacity_cost",
            model.expression_value(TX_CAPACITY_COST, &index, solution)?,
        );
    }

    Ok(())
}

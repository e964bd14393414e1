//! Limits on the new and total capacity of groups of projects.
use super::ModelModule;
use super::capacity::{CAPACITY_MW, ENERGY_CAPACITY_MWH, NEW_CAPACITY_MW, NEW_ENERGY_CAPACITY_MWH};
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{ComponentIndex, Constraint, LinExpr, ModelInstance, Solution};
use crate::project::{CapacityGroupID, CapacityGroupRequirement};
use anyhow::Result;

/// New power capacity of each group in each period
pub const GROUP_NEW_CAPACITY: &str = "Group_New_Capacity_in_Period";
/// Total power capacity of each group in each period
pub const GROUP_TOTAL_CAPACITY: &str = "Group_Total_Capacity_in_Period";
/// New energy capacity of each group in each period
pub const GROUP_NEW_ENERGY_CAPACITY: &str = "Group_New_Energy_Capacity_in_Period";
/// Total energy capacity of each group in each period
pub const GROUP_TOTAL_ENERGY_CAPACITY: &str = "Group_Total_Energy_Capacity_in_Period";

/// A limited quantity: the group expression, the project expression it sums and its limits
struct GroupLimit {
    expression: &'static str,
    project_expression: &'static str,
    min_constraint: &'static str,
    max_constraint: &'static str,
    min: fn(&CapacityGroupRequirement) -> f64,
    max: fn(&CapacityGroupRequirement) -> Option<f64>,
    column: &'static str,
}

const GROUP_LIMITS: [GroupLimit; 4] = [
    GroupLimit {
        expression: GROUP_NEW_CAPACITY,
        project_expression: NEW_CAPACITY_MW,
        min_constraint: "Min_Group_Build_in_Period_Constraint",
        max_constraint: "Max_Group_Build_in_Period_Constraint",
        min: |req| req.new_capacity_min,
        max: |req| req.new_capacity_max,
        column: "group_new_capacity_mw",
    },
    GroupLimit {
        expression: GROUP_TOTAL_CAPACITY,
        project_expression: CAPACITY_MW,
        min_constraint: "Min_Group_Total_Cap_in_Period_Constraint",
        max_constraint: "Max_Group_Total_Cap_in_Period_Constraint",
        min: |req| req.total_capacity_min,
        max: |req| req.total_capacity_max,
        column: "group_total_capacity_mw",
    },
    GroupLimit {
        expression: GROUP_NEW_ENERGY_CAPACITY,
        project_expression: NEW_ENERGY_CAPACITY_MWH,
        min_constraint: "Min_Group_Energy_Build_in_Period_Constraint",
        max_constraint: "Max_Group_Energy_Build_in_Period_Constraint",
        min: |req| req.new_energy_min,
        max: |req| req.new_energy_max,
        column: "group_new_energy_capacity_mwh",
    },
    GroupLimit {
        expression: GROUP_TOTAL_ENERGY_CAPACITY,
        project_expression: ENERGY_CAPACITY_MWH,
        min_constraint: "Min_Group_Total_Energy_in_Period_Constraint",
        max_constraint: "Max_Group_Total_Energy_in_Period_Constraint",
        min: |req| req.total_energy_min,
        max: |req| req.total_energy_max,
        column: "group_total_energy_capacity_mwh",
    },
];

/// The `project.capacity.capacity_groups` module
pub struct CapacityGroupLimits;

/// Sum a project expression over the operational members of a group in a period
fn group_sum(
    model: &ModelInstance,
    dynamic: &DynamicComponents,
    inputs: &InputData,
    expression: &str,
    group: &CapacityGroupID,
    period: u32,
) -> Result<LinExpr> {
    let mut total = LinExpr::new();
    let members = inputs.capacity_groups.projects.get(group);
    for project in members.into_iter().flatten() {
        if dynamic.is_operational(project, period) {
            total += model.expr(expression, &idx![project, period])?;
        }
    }

    Ok(total)
}

impl ModelModule for CapacityGroupLimits {
    fn name(&self) -> &str {
        "project.capacity.capacity_groups"
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        for limit in &GROUP_LIMITS {
            let mut exprs = Vec::new();
            for (group, period) in inputs.capacity_groups.requirements.keys() {
                let expr = group_sum(
                    model,
                    dynamic,
                    inputs,
                    limit.project_expression,
                    group,
                    *period,
                )?;
                exprs.push((idx![group, *period], expr));
            }
            model.add_expressions(limit.expression, exprs);

            let mut min_constraints: Vec<(ComponentIndex, Constraint)> = Vec::new();
            let mut max_constraints = Vec::new();
            for ((group, period), requirement) in &inputs.capacity_groups.requirements {
                let index = idx![group, *period];
                let expr = model.expr(limit.expression, &index)?;
                let min = (limit.min)(requirement);
                if min > 0.0 {
                    min_constraints.push((index.clone(), Constraint::ge(expr.clone(), min)));
                }
                if let Some(max) = (limit.max)(requirement) {
                    max_constraints.push((index, Constraint::le(expr.clone(), max)));
                }
            }
            model.add_constraints(limit.min_constraint, min_constraints)?;
            model.add_constraints(limit.max_constraint, max_constraints)?;
        }

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
        let table = results.table("capacity_group_period", &["capacity_group", "period"]);
        for (group, period) in inputs.capacity_groups.requirements.keys() {
            let index = idx![group, *period];
            for limit in &GROUP_LIMITS {
                table.set(
                    &index,
                    limit.column,
                    model.expression_value(limit.expression, &index, solution)?,
                );
            }
        }

        Ok(())
    }
}

//! Capacity types whose capacity can be built by the model, with costs linear in the capacity
//! built.
//!
//! Capacity built in a vintage is operational from that period for its lifetime. Limits on the
//! cumulative capacity apply to what is operational in each vintage.
use super::CapacityTypeModule;
use crate::dynamic_components::DynamicComponents;
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, ComponentIndex, Constraint, LinExpr, ModelInstance};
use crate::project::{CapacityType, NewBuildVintage, Project};
use crate::temporal::TemporalIndex;
use anyhow::Result;

/// Generators which can be built (`gen_new_lin`)
pub struct GenNewLin;

/// Storage whose power and energy capacity can be built (`stor_new_lin`)
pub struct StorNewLin;

/// Power capacity of new generators built in each vintage
pub const GEN_NEW_LIN_BUILD_MW: &str = "GenNewLin_Build_MW";
/// Power capacity of new storage built in each vintage
pub const STOR_NEW_LIN_BUILD_MW: &str = "StorNewLin_Build_MW";
/// Energy capacity of new storage built in each vintage
pub const STOR_NEW_LIN_BUILD_MWH: &str = "StorNewLin_Build_MWh";

/// The periods in which any vintage of the project is operational
fn operational_periods(project: &Project, temporal: &TemporalIndex) -> Vec<u32> {
    temporal
        .iter_periods()
        .map(|period| period.id)
        .filter(|period| {
            project
                .new_build_vintages
                .iter()
                .any(|(vintage, params)| params.is_operational_in(*vintage, *period))
        })
        .collect()
}

/// Iterate over the vintages of a project which are operational in a period
fn vintages_operational_in(
    project: &Project,
    period: u32,
) -> impl Iterator<Item = (u32, &NewBuildVintage)> {
    project
        .new_build_vintages
        .iter()
        .filter(move |(vintage, params)| params.is_operational_in(**vintage, period))
        .map(|(vintage, params)| (*vintage, params))
}

/// Sum of a build variable over vintages operational in a period, each weighted by `coeff`
fn operational_build<F>(
    model: &ModelInstance,
    variable: &str,
    project: &Project,
    period: u32,
    coeff: F,
) -> Result<LinExpr>
where
    F: Fn(&NewBuildVintage) -> f64,
{
    let mut expr = LinExpr::new();
    for (vintage, params) in vintages_operational_in(project, period) {
        expr.add_term(model.var(variable, &idx![&project.id, vintage])?, coeff(params));
    }

    Ok(expr)
}

/// The build variable in a period, if the period is a vintage of the project
fn new_build(
    model: &ModelInstance,
    variable: &str,
    project: &Project,
    period: u32,
) -> Result<LinExpr> {
    if !project.new_build_vintages.contains_key(&period) {
        return Ok(LinExpr::new());
    }

    Ok(model.var(variable, &idx![&project.id, period])?.into())
}

/// Projects of a capacity type in the instance
fn projects_of_type(
    inputs: &InputData,
    capacity_type: CapacityType,
) -> impl Iterator<Item = &Project> {
    inputs
        .projects
        .values()
        .filter(move |project| project.capacity_type == capacity_type)
}

/// Add a build variable for every vintage of the projects, with limits on cumulative capacity
fn add_build_components<Min, Max>(
    model: &mut ModelInstance,
    inputs: &InputData,
    capacity_type: CapacityType,
    variable: &str,
    min_cumulative: Min,
    max_cumulative: Max,
) -> Result<()>
where
    Min: Fn(&NewBuildVintage) -> f64,
    Max: Fn(&NewBuildVintage) -> Option<f64>,
{
    model.add_variables(
        variable,
        projects_of_type(inputs, capacity_type).flat_map(|project| {
            project
                .new_build_vintages
                .keys()
                .map(move |vintage| (idx![&project.id, *vintage], Bounds::non_negative()))
        }),
    );

    let mut min_constraints: Vec<(ComponentIndex, Constraint)> = Vec::new();
    let mut max_constraints = Vec::new();
    for project in projects_of_type(inputs, capacity_type) {
        for (vintage, params) in &project.new_build_vintages {
            let index = idx![&project.id, *vintage];
            let cumulative = operational_build(model, variable, project, *vintage, |_| 1.0)?;
            let min = min_cumulative(params);
            if min > 0.0 {
                min_constraints.push((index.clone(), Constraint::ge(cumulative.clone(), min)));
            }
            if let Some(max) = max_cumulative(params) {
                max_constraints.push((index, Constraint::le(cumulative, max)));
            }
        }
    }
    model.add_constraints(&format!("{variable}_Min_Cumulative"), min_constraints)?;
    model.add_constraints(&format!("{variable}_Max_Cumulative"), max_constraints)?;

    Ok(())
}

impl CapacityTypeModule for GenNewLin {
    fn operational_periods(&self, project: &Project, temporal: &TemporalIndex) -> Vec<u32> {
        operational_periods(project, temporal)
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        add_build_components(
            model,
            inputs,
            CapacityType::GenNewLin,
            GEN_NEW_LIN_BUILD_MW,
            |params| params.min_cumulative_new_build_mw,
            |params| params.max_cumulative_new_build_mw,
        )
    }

    fn capacity_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        operational_build(model, GEN_NEW_LIN_BUILD_MW, project, period, |_| 1.0)
    }

    fn new_capacity_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        new_build(model, GEN_NEW_LIN_BUILD_MW, project, period)
    }

    fn capacity_cost_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        operational_build(model, GEN_NEW_LIN_BUILD_MW, project, period, |params| {
            params.annualized_real_cost_per_mw_yr
        })
    }
}

impl CapacityTypeModule for StorNewLin {
    fn operational_periods(&self, project: &Project, temporal: &TemporalIndex) -> Vec<u32> {
        operational_periods(project, temporal)
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        add_build_components(
            model,
            inputs,
            CapacityType::StorNewLin,
            STOR_NEW_LIN_BUILD_MW,
            |params| params.min_cumulative_new_build_mw,
            |params| params.max_cumulative_new_build_mw,
        )?;
        add_build_components(
            model,
            inputs,
            CapacityType::StorNewLin,
            STOR_NEW_LIN_BUILD_MWH,
            |params| params.min_cumulative_new_build_mwh,
            |params| params.max_cumulative_new_build_mwh,
        )
    }

    fn capacity_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        operational_build(model, STOR_NEW_LIN_BUILD_MW, project, period, |_| 1.0)
    }

    fn energy_capacity_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        operational_build(model, STOR_NEW_LIN_BUILD_MWH, project, period, |_| 1.0)
    }

    fn new_capacity_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        new_build(model, STOR_NEW_LIN_BUILD_MW, project, period)
    }

    fn new_energy_capacity_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        new_build(model, STOR_NEW_LIN_BUILD_MWH, project, period)
    }

    fn capacity_cost_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        let power = operational_build(model, STOR_NEW_LIN_BUILD_MW, project, period, |params| {
            params.annualized_real_cost_per_mw_yr
        })?;
        let energy = operational_build(model, STOR_NEW_LIN_BUILD_MWH, project, period, |params| {
            params.annualized_real_cost_per_mwh_yr
        })?;

        Ok(power + energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assemble_and_solve, core_params, gen_new_lin_project, input_data, temporal_index,
        var_value,
    };
    use crate::scenario::ScenarioParameters;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(2030, 20, vec![2030])]
    #[case(2020, 20, vec![2030])]
    #[case(2020, 10, vec![])]
    #[case(2050, 20, vec![])]
    fn operational_periods_follow_lifetime(
        temporal_index: TemporalIndex,
        #[case] vintage: u32,
        #[case] lifetime_yrs: u32,
        #[case] expected: Vec<u32>,
    ) {
        let mut project = gen_new_lin_project();
        let mut params = project.new_build_vintages.shift_remove(&2030).unwrap();
        params.lifetime_yrs = lifetime_yrs;
        project.new_build_vintages.insert(vintage, params);

        assert_eq!(operational_periods(&project, &temporal_index), expected);
    }

    #[rstest]
    fn build_just_enough_to_meet_load(core_params: ScenarioParameters, mut input_data: InputData) {
        let project = gen_new_lin_project();
        input_data.projects.insert(project.id.clone(), project);

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        let built = var_value(
            &instance,
            &solution,
            GEN_NEW_LIN_BUILD_MW,
            &idx!["new_gen", 2030u32],
        );
        assert_approx_eq!(f64, built, 50.0, epsilon = 1e-6);

        // 50 MW x 100 per MW-yr x discount 0.5 x 10 years
        assert_approx_eq!(f64, solution.objective_value, 25000.0, epsilon = 1e-6);
    }

    #[rstest]
    fn min_cumulative_build_enforced(core_params: ScenarioParameters, mut input_data: InputData) {
        let mut project = gen_new_lin_project();
        project
            .new_build_vintages
            .get_mut(&2030)
            .unwrap()
            .min_cumulative_new_build_mw = 80.0;
        input_data.projects.insert(project.id.clone(), project);

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        let built = var_value(
            &instance,
            &solution,
            GEN_NEW_LIN_BUILD_MW,
            &idx!["new_gen", 2030u32],
        );
        assert_approx_eq!(f64, built, 80.0, epsilon = 1e-6);
    }
}

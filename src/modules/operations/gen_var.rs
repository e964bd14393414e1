//! Variable generators (e.g. wind and solar) whose output can be curtailed.
//!
//! Output is limited by the available capacity times the capacity factor. Whatever is not
//! produced is reported as curtailment.
use super::{
    OperationalTypeModule, cap_factor, footroom, headroom, operational_timepoints_of_type,
};
use crate::dynamic_components::{DynamicComponents, ResultsTable};
use crate::idx;
use crate::input::InputData;
use crate::modules::availability::available_capacity;
use crate::optimisation::{Bounds, Constraint, LinExpr, ModelInstance, Solution};
use crate::project::{OperationalType, Project};
use crate::temporal::Timepoint;
use anyhow::Result;

/// Power provided by each project in each timepoint
pub const GEN_VAR_PROVIDE_POWER_MW: &str = "GenVar_Provide_Power_MW";

/// The `gen_var` operational type
pub struct GenVar;

/// The most the project could produce in a timepoint
fn max_output(model: &ModelInstance, project: &Project, tmp: &Timepoint) -> Result<LinExpr> {
    Ok(available_capacity(model, project, tmp)? * cap_factor(project, tmp)?)
}

impl OperationalTypeModule for GenVar {
    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        model.add_variables(
            GEN_VAR_PROVIDE_POWER_MW,
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenVar)
                .map(|(project, tmp)| (idx![&project.id, tmp.id], Bounds::non_negative())),
        );

        let mut max_power = Vec::new();
        let mut min_power = Vec::new();
        for (project, tmp) in
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenVar)
        {
            let index = idx![&project.id, tmp.id];
            let power = LinExpr::from(model.var(GEN_VAR_PROVIDE_POWER_MW, &index)?);
            let upward = power.clone() + headroom(model, dynamic, project, tmp)?;
            max_power.push((
                index.clone(),
                Constraint::le(upward, max_output(model, project, tmp)?),
            ));
            let downward = power - footroom(model, dynamic, project, tmp)?;
            min_power.push((index, Constraint::ge(downward, 0.0)));
        }
        model.add_constraints("GenVar_Max_Power_Constraint", max_power)?;
        model.add_constraints("GenVar_Min_Power_Constraint", min_power)?;

        Ok(())
    }

    fn power_provision_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        Ok(model
            .var(GEN_VAR_PROVIDE_POWER_MW, &idx![&project.id, tmp.id])?
            .into())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        dynamic: &DynamicComponents,
        inputs: &InputData,
        table: &mut ResultsTable,
    ) -> Result<()> {
        for (project, tmp) in
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenVar)
        {
            let index = idx![&project.id, tmp.id];
            let power = solution.value(model.var(GEN_VAR_PROVIDE_POWER_MW, &index)?);
            let available = solution.evaluate(&max_output(model, project, tmp)?);
            table.set(&index, "curtailment_mw", available - power);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic_components::ResultValue;
    use crate::fixture::{assemble_and_solve, core_params, gen_var_project, input_data};
    use crate::scenario::ScenarioParameters;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn excess_output_curtailed(core_params: ScenarioParameters, mut input_data: InputData) {
        // 100 MW at a capacity factor of 0.8 against 50 MW of load
        let mut project = gen_var_project();
        project.cap_factors.values_mut().for_each(|cf| *cf = 0.8);
        input_data.projects.insert(project.id.clone(), project);

        let (instance, solution) = assemble_and_solve(&core_params, &input_data).unwrap();
        let results = instance.export_results(&solution, &input_data).unwrap();
        let table = results.get("project_timepoint").unwrap();
        for tmp in 1..=4u32 {
            let Some(ResultValue::Number(curtailment)) =
                table.get(&idx!["wind", tmp], "curtailment_mw")
            else {
                panic!("No curtailment reported for timepoint {tmp}");
            };
            assert_approx_eq!(f64, *curtailment, 30.0, epsilon = 1e-6);
        }
    }
}

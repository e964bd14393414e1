//! Hydro generators with an energy budget for each horizon.
//!
//! Within each horizon of the project's balancing type, the energy produced must equal the
//! average power fraction times the available energy. Output in each timepoint is kept between
//! the minimum and maximum power fractions of the available capacity.
use super::{OperationalTypeModule, footroom, headroom, operational_timepoints_of_type};
use crate::dynamic_components::DynamicComponents;
use crate::idx;
use crate::input::InputData;
use crate::modules::availability::available_capacity;
use crate::optimisation::{Bounds, ComponentIndex, Constraint, LinExpr, ModelInstance};
use crate::project::{HydroHorizonParams, OperationalType, Project};
use crate::temporal::{TemporalIndex, Timepoint};
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Power provided by each project in each timepoint
pub const GEN_HYDRO_MUST_TAKE_PROVIDE_POWER_MW: &str = "GenHydroMustTake_Provide_Power_MW";

/// The `gen_hydro_must_take` operational type
pub struct GenHydroMustTake;

/// The hydro parameters for the horizon containing a timepoint
fn horizon_params<'a>(
    project: &'a Project,
    temporal: &TemporalIndex,
    tmp: u32,
) -> Result<(u32, &'a HydroHorizonParams)> {
    let horizon = temporal
        .horizon_of(&project.balancing_type, tmp)
        .with_context(|| {
            format!(
                "Timepoint {tmp} is not in any horizon of balancing type {}",
                project.balancing_type
            )
        })?;
    let params = project
        .hydro_horizon_params
        .get(&horizon.id)
        .with_context(|| {
            format!(
                "Missing hydro parameters for project {} in horizon {}",
                project.id, horizon.id
            )
        })?;

    Ok((horizon.id, params))
}

impl OperationalTypeModule for GenHydroMustTake {
    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        model.add_variables(
            GEN_HYDRO_MUST_TAKE_PROVIDE_POWER_MW,
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenHydroMustTake)
                .map(|(project, tmp)| (idx![&project.id, tmp.id], Bounds::non_negative())),
        );

        let mut max_power = Vec::new();
        let mut min_power = Vec::new();
        let mut budgets: IndexMap<ComponentIndex, (LinExpr, LinExpr)> = IndexMap::new();
        for (project, tmp) in
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenHydroMustTake)
        {
            let index = idx![&project.id, tmp.id];
            let (horizon, params) = horizon_params(project, &inputs.temporal, tmp.id)?;
            let power = LinExpr::from(model.var(GEN_HYDRO_MUST_TAKE_PROVIDE_POWER_MW, &index)?);
            let available = available_capacity(model, project, tmp)?;

            let upward = power.clone() + headroom(model, dynamic, project, tmp)?;
            max_power.push((
                index.clone(),
                Constraint::le(upward, &available * params.max_power_fraction),
            ));
            let downward = power.clone() - footroom(model, dynamic, project, tmp)?;
            min_power.push((
                index,
                Constraint::ge(downward, &available * params.min_power_fraction),
            ));

            // Energy produced and budgeted over the horizon
            let budget_index = idx![&project.id, horizon];
            let produced = power * tmp.hours;
            let budgeted = available * (params.average_power_fraction * tmp.hours);
            let (total_produced, total_budgeted) = budgets.entry(budget_index).or_default();
            *total_produced += produced;
            *total_budgeted += budgeted;
        }
        model.add_constraints("GenHydroMustTake_Max_Power_Constraint", max_power)?;
        model.add_constraints("GenHydroMustTake_Min_Power_Constraint", min_power)?;
        model.add_constraints(
            "GenHydroMustTake_Energy_Budget_Constraint",
            budgets
                .into_iter()
                .map(|(index, (produced, budgeted))| (index, Constraint::eq(produced, budgeted))),
        )?;

        Ok(())
    }

    fn power_provision_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        Ok(model
            .var(GEN_HYDRO_MUST_TAKE_PROVIDE_POWER_MW, &idx![&project.id, tmp.id])?
            .into())
    }
}

//! Dispatchable generators which can operate anywhere between zero and their available capacity.
use super::{OperationalTypeModule, footroom, headroom, operational_timepoints_of_type};
use crate::dynamic_components::DynamicComponents;
use crate::idx;
use crate::input::InputData;
use crate::modules::availability::available_capacity;
use crate::optimisation::{Bounds, Constraint, LinExpr, ModelInstance};
use crate::project::{OperationalType, Project};
use crate::temporal::Timepoint;
use anyhow::Result;

/// Power provided by each project in each timepoint
pub const GEN_SIMPLE_PROVIDE_POWER_MW: &str = "GenSimple_Provide_Power_MW";

/// The `gen_simple` operational type
pub struct GenSimple;

impl OperationalTypeModule for GenSimple {
    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        model.add_variables(
            GEN_SIMPLE_PROVIDE_POWER_MW,
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenSimple)
                .map(|(project, tmp)| (idx![&project.id, tmp.id], Bounds::non_negative())),
        );

        let mut max_power = Vec::new();
        let mut min_power = Vec::new();
        for (project, tmp) in
            operational_timepoints_of_type(dynamic, inputs, OperationalType::GenSimple)
        {
            let index = idx![&project.id, tmp.id];
            let power = LinExpr::from(model.var(GEN_SIMPLE_PROVIDE_POWER_MW, &index)?);
            let upward = power.clone() + headroom(model, dynamic, project, tmp)?;
            max_power.push((
                index.clone(),
                Constraint::le(upward, available_capacity(model, project, tmp)?),
            ));
            let downward = power - footroom(model, dynamic, project, tmp)?;
            min_power.push((index, Constraint::ge(downward, 0.0)));
        }
        model.add_constraints("GenSimple_Max_Power_Constraint", max_power)?;
        model.add_constraints("GenSimple_Min_Power_Constraint", min_power)?;

        Ok(())
    }

    fn power_provision_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        Ok(model
            .var(GEN_SIMPLE_PROVIDE_POWER_MW, &idx![&project.id, tmp.id])?
            .into())
    }
}

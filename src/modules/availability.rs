//! Project availability.
//!
//! The only availability type is `exogenous`, for which derates are given as input data.
use super::ModelModule;
use super::capacity::{CAPACITY_MW, ENERGY_CAPACITY_MWH};
use crate::dynamic_components::DynamicComponents;
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{LinExpr, ModelInstance};
use crate::project::Project;
use crate::temporal::Timepoint;
use anyhow::Result;

/// Fraction of each project's capacity available in each operational timepoint
pub const AVAILABILITY_DERATE: &str = "Availability_Derate";

/// The `project.availability` module
pub struct Availability;

impl ModelModule for Availability {
    fn name(&self) -> &str {
        "project.availability"
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        model.add_expressions(
            AVAILABILITY_DERATE,
            dynamic
                .project_operational_timepoints(inputs)
                .map(|(project, tmp)| {
                    (
                        idx![&project.id, tmp.id],
                        LinExpr::constant(project.availability_derate(tmp.id)),
                    )
                }),
        );

        Ok(())
    }
}

fn derated(
    model: &ModelInstance,
    capacity_expression: &str,
    project: &Project,
    tmp: &Timepoint,
) -> Result<LinExpr> {
    let derate = model
        .expr(AVAILABILITY_DERATE, &idx![&project.id, tmp.id])?
        .constant_value();
    let capacity = model.expr(capacity_expression, &idx![&project.id, tmp.period])?;

    Ok(capacity * derate)
}

/// Power capacity available to a project in a timepoint, i.e. its capacity times its derate
pub fn available_capacity(
    model: &ModelInstance,
    project: &Project,
    tmp: &Timepoint,
) -> Result<LinExpr> {
    derated(model, CAPACITY_MW, project, tmp)
}

/// Energy capacity available to a storage project in a timepoint
pub fn available_energy_capacity(
    model: &ModelInstance,
    project: &Project,
    tmp: &Timepoint,
) -> Result<LinExpr> {
    derated(model, ENERGY_CAPACITY_MWH, project, tmp)
}

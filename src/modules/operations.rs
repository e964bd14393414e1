//! Project operations.
//!
//! How a project can be dispatched depends on its operational type. Each operational type has its
//! own module implementing [`OperationalTypeModule`]; this module aggregates the power provided by
//! every project into a single expression indexed by project and timepoint.
use super::ModelModule;
use crate::dynamic_components::{
    DynamicComponents, PROJECT_TIMEPOINT_INDEX, PROJECT_TIMEPOINT_TABLE, ResultsTable,
    ResultsTables,
};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use crate::project::{OperationalType, Project};
use crate::temporal::Timepoint;
use anyhow::{Context, Result};

pub mod gen_hydro_must_take;
pub mod gen_simple;
pub mod gen_var;
pub mod gen_var_must_take;
pub mod stor;

/// Net power provided by each project in each operational timepoint
pub const POWER_PROVISION_MW: &str = "Power_Provision_MW";

/// Behaviour specific to an operational type
pub trait OperationalTypeModule {
    /// Add the variables and constraints for projects of this type
    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()>;

    /// Net power provided in a timepoint
    fn power_provision_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr>;

    /// Power on which variable O&M costs are incurred
    fn variable_om_power_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        model.expr_or_zero(POWER_PROVISION_MW, &idx![&project.id, tmp.id])
    }

    /// Power for which fuel is burned
    fn fuel_burn_power_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        model.expr_or_zero(POWER_PROVISION_MW, &idx![&project.id, tmp.id])
    }

    /// Add results specific to this type to the project timepoint table
    fn export_results(
        &self,
        _model: &ModelInstance,
        _solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        _table: &mut ResultsTable,
    ) -> Result<()> {
        Ok(())
    }
}

/// Get the module for an operational type
pub fn operational_type_module(
    operational_type: OperationalType,
) -> &'static dyn OperationalTypeModule {
    match operational_type {
        OperationalType::GenSimple => &gen_simple::GenSimple,
        OperationalType::GenVar => &gen_var::GenVar,
        OperationalType::GenVarMustTake => &gen_var_must_take::GenVarMustTake,
        OperationalType::GenHydroMustTake => &gen_hydro_must_take::GenHydroMustTake,
        OperationalType::Stor => &stor::Stor,
    }
}

/// Iterate over the operational (project, timepoint) pairs of projects of an operational type
pub fn operational_timepoints_of_type<'a>(
    dynamic: &'a DynamicComponents,
    inputs: &'a InputData,
    operational_type: OperationalType,
) -> impl Iterator<Item = (&'a Project, &'a Timepoint)> + 'a {
    dynamic
        .project_operational_timepoints(inputs)
        .filter(move |(project, _)| project.operational_type == operational_type)
}

/// Sum of the headroom variables of a project in a timepoint
pub fn headroom(
    model: &ModelInstance,
    dynamic: &DynamicComponents,
    project: &Project,
    tmp: &Timepoint,
) -> Result<LinExpr> {
    sum_variables(model, dynamic.headroom_variables(&project.id), project, tmp)
}

/// Sum of the footroom variables of a project in a timepoint
pub fn footroom(
    model: &ModelInstance,
    dynamic: &DynamicComponents,
    project: &Project,
    tmp: &Timepoint,
) -> Result<LinExpr> {
    sum_variables(model, dynamic.footroom_variables(&project.id), project, tmp)
}

fn sum_variables(
    model: &ModelInstance,
    names: &[String],
    project: &Project,
    tmp: &Timepoint,
) -> Result<LinExpr> {
    let index = idx![&project.id, tmp.id];
    let mut expr = LinExpr::new();
    for name in names {
        expr += model.var(name, &index)?;
    }

    Ok(expr)
}

/// The capacity factor of a variable generator in a timepoint
pub fn cap_factor(project: &Project, tmp: &Timepoint) -> Result<f64> {
    project.cap_factors.get(&tmp.id).copied().with_context(|| {
        format!(
            "Missing capacity factor for project {} in timepoint {}",
            project.id, tmp.id
        )
    })
}

/// The `project.operations` module
pub struct Operations;

impl ModelModule for Operations {
    fn name(&self) -> &str {
        "project.operations"
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        for operational_type in &dynamic.operational_types {
            operational_type_module(*operational_type)
                .add_model_components(model, dynamic, inputs)
                .with_context(|| {
                    format!(
                        "Failed to add components for operational type {}",
                        operational_type.label()
                    )
                })?;
        }

        let mut power = Vec::new();
        for (project, tmp) in dynamic.project_operational_timepoints(inputs) {
            let expr = operational_type_module(project.operational_type)
                .power_provision_rule(model, project, tmp)?;
            power.push((idx![&project.id, tmp.id], expr));
        }
        model.add_expressions(POWER_PROVISION_MW, power);

        Ok(())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        dynamic: &DynamicComponents,
        inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table(PROJECT_TIMEPOINT_TABLE, &PROJECT_TIMEPOINT_INDEX);
        for (project, tmp) in dynamic.project_operational_timepoints(inputs) {
            let index = idx![&project.id, tmp.id];
            table.set(&index, "period", f64::from(tmp.period));
            table.set(&index, "load_zone", project.load_zone.to_string());
            table.set(&index, "operational_type", project.operational_type.label());
            table.set(
                &index,
                "power_mw",
                model.expression_value(POWER_PROVISION_MW, &index, solution)?,
            );
        }
        for operational_type in &dynamic.operational_types {
            operational_type_module(*operational_type)
                .export_results(model, solution, dynamic, inputs, table)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{gen_var_project, temporal_index};
    use crate::temporal::TemporalIndex;
    use rstest::rstest;

    #[rstest]
    fn cap_factor_lookup(temporal_index: TemporalIndex) {
        let project = gen_var_project();
        let tmp = temporal_index.timepoint(1).unwrap();
        assert_eq!(cap_factor(&project, tmp).unwrap(), 0.5);

        let mut project = project;
        project.cap_factors.clear();
        assert!(cap_factor(&project, tmp).is_err());
    }
}

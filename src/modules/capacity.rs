//! Project capacity.
//!
//! How a project's capacity is determined depends on its capacity type. Each capacity type has its
//! own module implementing [`CapacityTypeModule`]; this module aggregates their contributions into
//! expressions indexed by project and operational period which the rest of the model uses.
use super::ModelModule;
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use crate::project::{CapacityType, Project};
use crate::temporal::TemporalIndex;
use anyhow::Result;

pub mod new_build;
pub mod specified;

/// Power capacity of each project in each operational period
pub const CAPACITY_MW: &str = "Capacity_MW";
/// Energy capacity of each project in each operational period (zero except for storage)
pub const ENERGY_CAPACITY_MWH: &str = "Energy_Capacity_MWh";
/// Power capacity built in each period
pub const NEW_CAPACITY_MW: &str = "New_Capacity_MW";
/// Energy capacity built in each period
pub const NEW_ENERGY_CAPACITY_MWH: &str = "New_Energy_Capacity_MWh";

/// The name of the results table with one row per project and period
pub const PROJECT_PERIOD_TABLE: &str = "project_period";

/// Index columns of [`PROJECT_PERIOD_TABLE`]
pub const PROJECT_PERIOD_INDEX: [&str; 2] = ["project", "period"];

/// Behaviour specific to a capacity type
pub trait CapacityTypeModule {
    /// The periods in which the project is operational
    fn operational_periods(&self, project: &Project, temporal: &TemporalIndex) -> Vec<u32>;

    /// Add any variables and constraints needed by projects of this type
    fn add_model_components(
        &self,
        _model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
    ) -> Result<()> {
        Ok(())
    }

    /// Power capacity in an operational period
    fn capacity_rule(&self, model: &ModelInstance, project: &Project, period: u32)
    -> Result<LinExpr>;

    /// Energy capacity in an operational period
    fn energy_capacity_rule(
        &self,
        _model: &ModelInstance,
        _project: &Project,
        _period: u32,
    ) -> Result<LinExpr> {
        Ok(LinExpr::new())
    }

    /// Power capacity built in a period
    fn new_capacity_rule(
        &self,
        _model: &ModelInstance,
        _project: &Project,
        _period: u32,
    ) -> Result<LinExpr> {
        Ok(LinExpr::new())
    }

    /// Energy capacity built in a period
    fn new_energy_capacity_rule(
        &self,
        _model: &ModelInstance,
        _project: &Project,
        _period: u32,
    ) -> Result<LinExpr> {
        Ok(LinExpr::new())
    }

    /// Annual capacity cost in an operational period
    fn capacity_cost_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr>;
}

/// Get the module for a capacity type
pub fn capacity_type_module(capacity_type: CapacityType) -> &'static dyn CapacityTypeModule {
    match capacity_type {
        CapacityType::GenSpec => &specified::GenSpec,
        CapacityType::StorSpec => &specified::StorSpec,
        CapacityType::GenNewLin => &new_build::GenNewLin,
        CapacityType::StorNewLin => &new_build::StorNewLin,
    }
}

/// The `project.capacity` module
pub struct Capacity;

impl ModelModule for Capacity {
    fn name(&self) -> &str {
        "project.capacity"
    }

    fn record_dynamic_components(&self, inputs: &InputData, dynamic: &mut DynamicComponents) {
        for project in inputs.projects.values() {
            let periods = capacity_type_module(project.capacity_type)
                .operational_periods(project, &inputs.temporal);
            dynamic
                .operational_periods
                .insert(project.id.clone(), periods);
        }
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        for capacity_type in &dynamic.capacity_types {
            capacity_type_module(*capacity_type).add_model_components(model, dynamic, inputs)?;
        }

        let mut capacity = Vec::new();
        let mut energy_capacity = Vec::new();
        let mut new_capacity = Vec::new();
        let mut new_energy_capacity = Vec::new();
        for (project, period) in dynamic.project_operational_periods(inputs) {
            let module = capacity_type_module(project.capacity_type);
            let index = idx![&project.id, period];
            capacity.push((index.clone(), module.capacity_rule(model, project, period)?));
            energy_capacity.push((
                index.clone(),
                module.energy_capacity_rule(model, project, period)?,
            ));
            new_capacity.push((
                index.clone(),
                module.new_capacity_rule(model, project, period)?,
            ));
            new_energy_capacity.push((
                index,
                module.new_energy_capacity_rule(model, project, period)?,
            ));
        }
        model.add_expressions(CAPACITY_MW, capacity);
        model.add_expressions(ENERGY_CAPACITY_MWH, energy_capacity);
        model.add_expressions(NEW_CAPACITY_MW, new_capacity);
        model.add_expressions(NEW_ENERGY_CAPACITY_MWH, new_energy_capacity);

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
        let table = results.table(PROJECT_PERIOD_TABLE, &PROJECT_PERIOD_INDEX);
        for (project, period) in dynamic.project_operational_periods(inputs) {
            let index = idx![&project.id, period];
            table.set(&index, "load_zone", project.load_zone.to_string());
            table.set(
                &index,
                "technology",
                project.technology.clone().unwrap_or_default(),
            );
            table.set(&index, "capacity_type", project.capacity_type.label());
            table.set(
                &index,
                "capacity_mw",
                model.expression_value(CAPACITY_MW, &index, solution)?,
            );
            table.set(
                &index,
                "new_capacity_mw",
                model.expression_value(NEW_CAPACITY_MW, &index, solution)?,
            );
            if project.capacity_type.is_storage() {
                table.set(
                    &index,
                    "energy_capacity_mwh",
                    model.expression_value(ENERGY_CAPACITY_MWH, &index, solution)?,
                );
                table.set(
                    &index,
                    "new_energy_capacity_mwh",
                    model.expression_value(NEW_ENERGY_CAPACITY_MWH, &index, solution)?,
                );
            }
        }

        Ok(())
    }
}

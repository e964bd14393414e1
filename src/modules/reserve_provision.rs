//! Provision of an operating reserve product by projects.
//!
//! Provision is a variable for each participating project and timepoint. Upward reserves are
//! recorded as headroom variables and downward reserves as footroom variables, so that the
//! project's operational type can keep the reserve within its operating limits.
use super::ModelModule;
use crate::dynamic_components::{
    DynamicComponents, PROJECT_TIMEPOINT_INDEX, PROJECT_TIMEPOINT_TABLE, ResultsTables,
};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, LinExpr, ModelInstance, Solution};
use crate::project::Project;
use crate::reserves::{BalancingAreaID, ReserveDirection, ReserveType};
use anyhow::Result;
use indexmap::IndexMap;

/// The `project.operations.reserves.<reserve>` module for one reserve product
pub struct ReserveProvision {
    reserve: ReserveType,
    name: String,
}

impl ReserveProvision {
    /// Create the module for a reserve product
    pub fn new(reserve: ReserveType) -> Self {
        Self {
            reserve,
            name: format!("project.operations.reserves.{reserve}"),
        }
    }

    /// Projects which provide this reserve, with their balancing areas
    fn providers<'a>(
        &self,
        inputs: &'a InputData,
    ) -> impl Iterator<Item = (&'a Project, &'a BalancingAreaID)> + 'a {
        let reserve = self.reserve;
        inputs.projects.values().filter_map(move |project| {
            project
                .reserve_balancing_areas
                .get(&reserve)
                .filter(|_| project.operational_type.can_provide_reserves())
                .map(|ba| (project, ba))
        })
    }
}

impl ModelModule for ReserveProvision {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_dynamic_components(&self, inputs: &InputData, dynamic: &mut DynamicComponents) {
        let variable = self.reserve.provision_variable();
        for (project, _) in self.providers(inputs) {
            match self.reserve.direction() {
                ReserveDirection::Up => {
                    dynamic.add_headroom_variable(&project.id, variable.clone());
                }
                ReserveDirection::Down => {
                    dynamic.add_footroom_variable(&project.id, variable.clone());
                }
            }
        }
        dynamic
            .reserve_provision_components
            .entry(self.reserve)
            .or_default()
            .push(self.reserve.total_provision_expression());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let variable = self.reserve.provision_variable();
        let members = self
            .providers(inputs)
            .flat_map(|(project, _)| {
                dynamic
                    .operational_timepoints(project, &inputs.temporal)
                    .map(move |tmp| (idx![&project.id, tmp.id], Bounds::non_negative()))
            })
            .collect::<Vec<_>>();
        model.add_variables(&variable, members);

        // Sum provision by balancing area and timepoint
        let data = inputs.reserve(self.reserve)?;
        let mut totals: IndexMap<(BalancingAreaID, u32), LinExpr> = IndexMap::new();
        for ba in data.balancing_areas.keys() {
            for tmp in inputs.temporal.iter_timepoints() {
                totals.insert((ba.clone(), tmp.id), LinExpr::new());
            }
        }
        for (project, ba) in self.providers(inputs) {
            for tmp in dynamic.operational_timepoints(project, &inputs.temporal) {
                let var = model.var(&variable, &idx![&project.id, tmp.id])?;
                if let Some(total) = totals.get_mut(&(ba.clone(), tmp.id)) {
                    *total += var;
                }
            }
        }
        model.add_expressions(
            &self.reserve.total_provision_expression(),
            totals
                .into_iter()
                .map(|((ba, tmp), expr)| (idx![&ba, tmp], expr)),
        );

        Ok(())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table(PROJECT_TIMEPOINT_TABLE, &PROJECT_TIMEPOINT_INDEX);
        let column = format!("{}_mw", self.reserve);
        for (index, value) in model.variable_values(&self.reserve.provision_variable(), solution)? {
            table.set(index, &column, value);
        }

        Ok(())
    }
}

//! Requirements for an operating reserve product in each balancing area.
use super::ModelModule;
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{Bounds, Constraint, LinExpr, ModelInstance, Solution};
use crate::reserves::ReserveType;
use anyhow::Result;

/// The `system.reserves.<reserve>` module for one reserve product
pub struct ReserveBalance {
    reserve: ReserveType,
    name: String,
}

impl ReserveBalance {
    /// Create the module for a reserve product
    pub fn new(reserve: ReserveType) -> Self {
        Self {
            reserve,
            name: format!("system.reserves.{reserve}"),
        }
    }

    fn violation_variable(&self) -> String {
        format!("{}_Violation_MW", self.reserve.component_prefix())
    }

    fn constraint(&self) -> String {
        format!("Meet_{}_Constraint", self.reserve.component_prefix())
    }

    fn penalty_costs(&self) -> String {
        format!("Total_{}_Penalty_Costs", self.reserve.component_prefix())
    }
}

impl ModelModule for ReserveBalance {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_dynamic_components(&self, _inputs: &InputData, dynamic: &mut DynamicComponents) {
        dynamic.total_cost_components.push(self.penalty_costs());
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        let data = inputs.reserve(self.reserve)?;
        let violation = self.violation_variable();
        model.add_variables(
            &violation,
            data.balancing_areas
                .values()
                .filter(|ba| ba.allow_violation)
                .flat_map(|ba| {
                    inputs
                        .temporal
                        .iter_timepoints()
                        .map(move |tmp| (idx![&ba.id, tmp.id], Bounds::non_negative()))
                }),
        );

        let components = dynamic
            .reserve_provision_components
            .get(&self.reserve)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut constraints = Vec::new();
        let mut penalty = LinExpr::new();
        for ba in data.balancing_areas.values() {
            for tmp in inputs.temporal.iter_timepoints() {
                let index = idx![&ba.id, tmp.id];
                let mut provision = LinExpr::new();
                for name in components {
                    provision += model.expr(name, &index)?;
                }
                if ba.allow_violation {
                    let var = model.var(&violation, &index)?;
                    provision += var;
                    penalty += var
                        * (ba.violation_penalty_per_mw
                            * inputs.temporal.objective_weight(tmp.id)?);
                }
                let requirement = data.requirement_mw(&ba.id, tmp.id);
                constraints.push((index, Constraint::ge(provision, requirement)));
            }
        }
        model.add_constraints(&self.constraint(), constraints)?;
        model.add_scalar_expression(&self.penalty_costs(), penalty);

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
        let data = inputs.reserve(self.reserve)?;
        let violation = self.violation_variable();
        let total_provision = self.reserve.total_provision_expression();
        let table = results.table(
            &format!("system_{}", self.reserve),
            &["balancing_area", "timepoint"],
        );
        for ba in data.balancing_areas.values() {
            for tmp in inputs.temporal.iter_timepoints() {
                let index = idx![&ba.id, tmp.id];
                table.set(&index, "requirement_mw", data.requirement_mw(&ba.id, tmp.id));
                table.set(
                    &index,
                    "provision_mw",
                    model.expression_value(&total_provision, &index, solution)?,
                );
                if ba.allow_violation {
                    table.set(
                        &index,
                        "violation_mw",
                        solution.value(model.var(&violation, &index)?),
                    );
                }
                if let Some(dual) = model.dual(&self.constraint(), &index, solution)? {
                    let weight = inputs.temporal.objective_weight(tmp.id)?;
                    table.set(&index, "marginal_price_per_mw", dual / weight);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assemble_and_solve, gen_spec_project, input_data, var_value};
    use crate::modules::operations::gen_simple::GEN_SIMPLE_PROVIDE_POWER_MW;
    use crate::reserves::{BalancingArea, BalancingAreaID, ReserveData};
    use crate::scenario::ScenarioParameters;
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    #[rstest]
    fn headroom_held_back_for_reserves(mut input_data: InputData) {
        let ba = BalancingAreaID::new("ba");
        let mut data = ReserveData::default();
        data.balancing_areas.insert(
            ba.clone(),
            BalancingArea {
                id: ba.clone(),
                allow_violation: false,
                violation_penalty_per_mw: 0.0,
            },
        );
        for tmp in 1..=4 {
            data.requirement.insert((ba.clone(), tmp), 20.0);
        }
        input_data.reserves = indexmap! {ReserveType::SpinningReserves => data};

        // Only the cheap generator can provide reserves
        let mut cheap = gen_spec_project("cheap", 60.0, 1.0);
        cheap
            .reserve_balancing_areas
            .insert(ReserveType::SpinningReserves, ba);
        for project in [cheap, gen_spec_project("dear", 100.0, 5.0)] {
            input_data.projects.insert(project.id.clone(), project);
        }

        let params: ScenarioParameters =
            toml::from_str(r#"features = ["spinning_reserves"]"#).unwrap();
        let (instance, solution) = assemble_and_solve(&params, &input_data).unwrap();
        for tmp in 1..=4u32 {
            let power = |project: &str| {
                var_value(
                    &instance,
                    &solution,
                    GEN_SIMPLE_PROVIDE_POWER_MW,
                    &idx![project, tmp],
                )
            };
            assert_approx_eq!(f64, power("cheap"), 40.0, epsilon = 1e-6);
            assert_approx_eq!(f64, power("dear"), 10.0, epsilon = 1e-6);
        }

        // (40 x 1 + 10 x 5) x objective weight 10 x 4 timepoints
        assert_approx_eq!(f64, solution.objective_value, 3600.0, epsilon = 1e-6);
    }
}

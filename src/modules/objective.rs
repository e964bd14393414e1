//! The objective function: minimise the sum of all registered cost components.
use super::ModelModule;
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::idx;
use crate::input::InputData;
use crate::optimisation::{LinExpr, ModelInstance, Solution};
use anyhow::{Context, Result};
use log::debug;

/// The `objective.min_total_cost` module
pub struct MinTotalCost;

impl ModelModule for MinTotalCost {
    fn name(&self) -> &str {
        "objective.min_total_cost"
    }

    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        _inputs: &InputData,
    ) -> Result<()> {
        let mut objective = LinExpr::new();
        for name in &dynamic.total_cost_components {
            let cost = model
                .expr(name, &idx![])
                .with_context(|| format!("Cost component {name} is not defined"))?;
            objective += cost;
        }
        debug!(
            "Objective function has {} cost components",
            dynamic.total_cost_components.len()
        );
        model.set_objective(objective);

        Ok(())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        dynamic: &DynamicComponents,
        _inputs: &InputData,
        results: &mut ResultsTables,
    ) -> Result<()> {
        let table = results.table("costs", &["component"]);
        for name in &dynamic.total_cost_components {
            let value = model.expression_value(name, &idx![], solution)?;
            table.set(&idx![name.as_str()], "cost", value);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::input_data;
    use crate::optimisation::{Bounds, SolverOptions};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn sums_registered_costs(input_data: InputData) {
        let mut dynamic = DynamicComponents::new(&input_data);
        dynamic.total_cost_components = vec!["A".into(), "B".into()];
        let mut model = ModelInstance::new();
        model.add_variables("X", [(idx![], Bounds::new(1.0, 1.0))]);
        let x = model.var("X", &idx![]).unwrap();
        model.add_scalar_expression("A", x * 2.0);
        model.add_scalar_expression("B", LinExpr::from(3.0));

        MinTotalCost
            .add_model_components(&mut model, &dynamic, &input_data)
            .unwrap();
        let solution = model.solve(&SolverOptions::new(), true).unwrap();
        assert_approx_eq!(f64, solution.objective_value, 5.0, epsilon = 1e-9);
    }

    #[rstest]
    fn unregistered_cost_component(input_data: InputData) {
        let mut dynamic = DynamicComponents::new(&input_data);
        dynamic.total_cost_components.push("Missing_Costs".into());
        let mut model = ModelInstance::new();

        let result = MinTotalCost.add_model_components(&mut model, &dynamic, &input_data);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cost component Missing_Costs is not defined"
        );
    }
}

//! The modules from which the optimisation model is assembled.
//!
//! Each module contributes its own variables, expressions and constraints. Building a model
//! instance happens in three passes over the ordered list of modules:
//!
//! 1. every module records the names of components it contributes to shared sums in
//!    [`DynamicComponents`];
//! 2. every module adds its components to the [`ModelInstance`], looking up other modules'
//!    components by name;
//! 3. once the model is solved, every module adds its results to the shared results tables.
use crate::dynamic_components::{DynamicComponents, ResultsTables};
use crate::input::InputData;
use crate::optimisation::{ModelInstance, Solution};
use crate::scenario::{Feature, ScenarioParameters};
use anyhow::Result;

pub mod availability;
pub mod capacity;
pub mod capacity_costs;
pub mod capacity_groups;
pub mod carbon_cap;
pub mod carbon_emissions;
pub mod fuel_burn;
pub mod load_balance;
pub mod objective;
pub mod operational_costs;
pub mod operations;
pub mod reserve_balance;
pub mod reserve_provision;
pub mod transmission;
pub mod transmission_targets;

/// A module contributing components to the optimisation model
pub trait ModelModule {
    /// The module's name, e.g. `project.capacity`
    fn name(&self) -> &str;

    /// Record the names of components this module contributes to shared sums
    fn record_dynamic_components(&self, _inputs: &InputData, _dynamic: &mut DynamicComponents) {}

    /// Add this module's components to the model
    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()>;

    /// Add this module's results to the results tables
    fn export_results(
        &self,
        _model: &ModelInstance,
        _solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        _results: &mut ResultsTables,
    ) -> Result<()> {
        Ok(())
    }
}

/// Get the ordered list of modules needed for a scenario.
///
/// Core modules are always included. Optional modules are included if their feature is enabled.
/// A module only uses components of modules earlier in the list.
pub fn determine_modules(params: &ScenarioParameters) -> Vec<Box<dyn ModelModule>> {
    let mut modules: Vec<Box<dyn ModelModule>> = vec![Box::new(capacity::Capacity)];
    if params.has_feature(Feature::CapacityGroups) {
        modules.push(Box::new(capacity_groups::CapacityGroupLimits));
    }
    modules.push(Box::new(availability::Availability));
    for reserve in params.reserve_types() {
        modules.push(Box::new(reserve_provision::ReserveProvision::new(reserve)));
    }
    modules.extend([
        Box::new(operations::Operations) as Box<dyn ModelModule>,
        Box::new(fuel_burn::FuelBurn),
        Box::new(operational_costs::OperationalCosts),
        Box::new(carbon_emissions::CarbonEmissions),
        Box::new(capacity_costs::CapacityCosts),
    ]);
    if params.has_feature(Feature::Transmission) {
        modules.push(Box::new(transmission::Transmission));
    }
    modules.extend([
        Box::new(load_balance::StaticLoad) as Box<dyn ModelModule>,
        Box::new(load_balance::AggregateProjectPower),
        Box::new(load_balance::AggregateLoadModifierPower),
        Box::new(load_balance::LoadBalance),
    ]);
    for reserve in params.reserve_types() {
        modules.push(Box::new(reserve_balance::ReserveBalance::new(reserve)));
    }
    if params.has_feature(Feature::CarbonCap) {
        modules.push(Box::new(carbon_cap::CarbonCap));
    }
    if params.has_feature(Feature::TransmissionTarget) {
        modules.push(Box::new(transmission_targets::TransmissionTargets));
    }
    modules.push(Box::new(objective::MinTotalCost));

    modules
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn core_modules_only() {
        let params: ScenarioParameters = toml::from_str("").unwrap();
        let names = determine_modules(&params)
            .iter()
            .map(|module| module.name().to_string())
            .collect_vec();
        assert_eq!(
            names,
            [
                "project.capacity",
                "project.availability",
                "project.operations",
                "project.operations.fuel_burn",
                "project.operations.costs",
                "project.operations.carbon_emissions",
                "project.capacity.costs",
                "system.load_balance.static_load_requirement",
                "system.load_balance.aggregate_project_power",
                "system.load_balance.aggregate_load_modifier_power",
                "system.load_balance",
                "objective.min_total_cost",
            ]
        );
    }

    #[test]
    fn optional_modules_follow_features() {
        let params: ScenarioParameters = toml::from_str(
            "features = [\"carbon_cap\", \"regulation_up\", \"transmission\", \"capacity_groups\"]",
        )
        .unwrap();
        let names = determine_modules(&params)
            .iter()
            .map(|module| module.name().to_string())
            .collect_vec();
        let position = |name: &str| names.iter().position(|n| n == name).unwrap();

        assert_eq!(position("project.capacity.capacity_groups"), 1);
        assert!(
            position("project.operations.reserves.regulation_up")
                < position("project.operations")
        );
        assert!(position("transmission") < position("system.load_balance"));
        assert!(
            position("system.reserves.regulation_up") < position("objective.min_total_cost")
        );
        assert_eq!(position("system.policy.carbon_cap"), names.len() - 2);
    }

    #[test]
    fn transmission_targets_follow_transmission() {
        let params: ScenarioParameters =
            toml::from_str("features = [\"transmission_target\", \"transmission\"]").unwrap();
        let names = determine_modules(&params)
            .iter()
            .map(|module| module.name().to_string())
            .collect_vec();
        let position = |name: &str| names.iter().position(|n| n == name).unwrap();

        assert!(position("transmission") < position("system.policy.transmission_targets"));
        assert_eq!(
            position("system.policy.transmission_targets"),
            names.len() - 2
        );
    }
}

//! Fixtures for tests

use crate::fuel::{Fuel, FuelID, FuelMap};
use crate::geography::{LoadZone, LoadZoneID, LoadZoneMap};
use crate::input::{InputData, LoadMap};
use crate::optimisation::{ComponentIndex, Solution, SolverOptions};
use crate::patch::{FilePatch, ScenarioPatch};
use crate::project::{
    AvailabilityType, CapacityGroups, CapacityType, NewBuildVintage, OperationalType, Project,
    ProjectMap, SpecifiedCapacity,
};
use crate::run::{AssembledInstance, assemble};
use crate::scenario::ScenarioParameters;
use crate::temporal::{BalancingType, Boundary, Horizon, Period, TemporalIndex, Timepoint};
use crate::transmission::{
    TxCapacityType, TxLine, TxLineMap, TxOperationalType, TxSpecifiedCapacity,
};
use indexmap::{IndexMap, indexmap};
use rstest::fixture;
use std::collections::HashMap;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Build a patched copy of the `simple` example to a temporary directory and return the `TempDir`.
///
/// If the patched scenario cannot be built, for whatever reason, this function will panic.
pub(crate) fn build_patched_simple_tempdir(file_patches: Vec<FilePatch>) -> tempfile::TempDir {
    ScenarioPatch::from_example("simple")
        .unwrap()
        .with_file_patches(file_patches)
        .build_to_tempdir()
        .unwrap()
}

/// Check whether the simple example passes or fails validation after applying file patches
macro_rules! patch_and_validate_simple {
    ($file_patches:expr) => {{
        (|| -> anyhow::Result<()> {
            let tmp = crate::fixture::build_patched_simple_tempdir($file_patches);
            crate::run::validate_scenario(tmp.path())
        })()
    }};
}
pub(crate) use patch_and_validate_simple;

/// Check whether validation succeeds for simple example with patches
macro_rules! assert_validate_ok_simple {
    ($file_patches:expr) => {
        assert!(crate::fixture::patch_and_validate_simple!($file_patches).is_ok())
    };
}
pub(crate) use assert_validate_ok_simple;

/// Check whether validation fails with specific message
macro_rules! assert_validate_fails_with_simple {
    ($file_patches:expr, $expected_msg:expr) => {
        let result = crate::fixture::patch_and_validate_simple!($file_patches);
        assert_eq!(result.unwrap_err().root_cause().to_string(), $expected_msg);
    };
}
pub(crate) use assert_validate_fails_with_simple;

/// Check whether the simple example runs successfully after applying file patches
macro_rules! patch_and_run_simple {
    ($file_patches:expr) => {{
        (|| -> anyhow::Result<()> {
            let tmp = crate::fixture::build_patched_simple_tempdir($file_patches);
            let output = tempfile::tempdir()?;
            crate::run::run_scenario(
                tmp.path(),
                output.path(),
                &crate::run::RunOptions::default(),
            )?;
            Ok(())
        })()
    }};
}
pub(crate) use patch_and_run_simple;

/// Check whether the simple example runs successfully after applying file patches
macro_rules! assert_patched_runs_ok_simple {
    ($file_patches:expr) => {
        assert!(crate::fixture::patch_and_run_simple!($file_patches).is_ok())
    };
}
pub(crate) use assert_patched_runs_ok_simple;

/// One period of four timepoints, with a circular "day" horizon and two linear half days
#[fixture]
pub fn temporal_index() -> TemporalIndex {
    temporal_index_with_day_boundary(Boundary::Circular)
}

/// The same as [`temporal_index`] but with the given boundary for the "day" horizon
pub fn temporal_index_with_day_boundary(day_boundary: Boundary) -> TemporalIndex {
    let periods = indexmap! {
        2030 => Period {
            id: 2030,
            discount_factor: 0.5,
            start_year: 2030,
            end_year: 2040,
            hours_in_period_timepoints: 8.0,
        }
    };
    let timepoints = (1..=4)
        .map(|id| {
            let tmp = Timepoint {
                id,
                period: 2030,
                weight: 2.0,
                hours: 1.0,
                month: 1,
            };
            (id, tmp)
        })
        .collect();

    let day = BalancingType::new("day");
    let half_day = BalancingType::new("half_day");
    let horizons = indexmap! {
        (day.clone(), 1) => Horizon {
            balancing_type: day,
            id: 1,
            boundary: day_boundary,
            timepoints: vec![1, 2, 3, 4],
        },
        (half_day.clone(), 1) => Horizon {
            balancing_type: half_day.clone(),
            id: 1,
            boundary: Boundary::Linear,
            timepoints: vec![1, 2],
        },
        (half_day.clone(), 2) => Horizon {
            balancing_type: half_day,
            id: 2,
            boundary: Boundary::Linear,
            timepoints: vec![3, 4],
        },
    };

    TemporalIndex::new(periods, timepoints, horizons).unwrap()
}

#[fixture]
pub fn load_zones() -> LoadZoneMap {
    let id = LoadZoneID::new("z1");
    indexmap! {
        id.clone() => LoadZone {
            id,
            allow_overgeneration: false,
            overgeneration_penalty_per_mw: 0.0,
            allow_unserved_energy: false,
            unserved_energy_penalty_per_mwh: 0.0,
        }
    }
}

#[fixture]
pub fn fuels() -> FuelMap {
    let id = FuelID::new("gas");
    indexmap! {
        id.clone() => Fuel {
            id,
            co2_intensity_tons_per_mmbtu: 0.05,
            fuel_group: None,
            prices: [((2030, 1), 3.0)].into_iter().collect(),
        }
    }
}

/// A project in zone z1 with no capacity and perfect efficiencies
pub fn project(
    id: &str,
    capacity_type: CapacityType,
    operational_type: OperationalType,
) -> Project {
    Project {
        id: id.into(),
        load_zone: "z1".into(),
        capacity_type,
        availability_type: AvailabilityType::Exogenous,
        operational_type,
        balancing_type: "day".into(),
        technology: None,
        variable_om_cost_per_mwh: 0.0,
        fuel: None,
        heat_rate_mmbtu_per_mwh: None,
        load_modifier: false,
        charging_efficiency: 1.0,
        discharging_efficiency: 1.0,
        specified_capacity: IndexMap::new(),
        new_build_vintages: IndexMap::new(),
        availability_derate: HashMap::new(),
        cap_factors: HashMap::new(),
        hydro_horizon_params: HashMap::new(),
        reserve_balancing_areas: IndexMap::new(),
        carbon_cap_zone: None,
    }
}

/// A dispatchable generator with specified capacity in 2030
pub fn gen_spec_project(id: &str, capacity_mw: f64, variable_om_cost_per_mwh: f64) -> Project {
    let mut project = project(id, CapacityType::GenSpec, OperationalType::GenSimple);
    project.variable_om_cost_per_mwh = variable_om_cost_per_mwh;
    project.specified_capacity.insert(
        2030,
        SpecifiedCapacity {
            capacity_mw,
            energy_capacity_mwh: 0.0,
            fixed_cost_per_mw_yr: 0.0,
            fixed_cost_per_mwh_yr: 0.0,
        },
    );
    project
}

/// A dispatchable generator which can be built in 2030
pub fn gen_new_lin_project() -> Project {
    let mut project = project("new_gen", CapacityType::GenNewLin, OperationalType::GenSimple);
    project.new_build_vintages.insert(
        2030,
        NewBuildVintage {
            lifetime_yrs: 20,
            annualized_real_cost_per_mw_yr: 100.0,
            annualized_real_cost_per_mwh_yr: 0.0,
            min_cumulative_new_build_mw: 0.0,
            max_cumulative_new_build_mw: None,
            min_cumulative_new_build_mwh: 0.0,
            max_cumulative_new_build_mwh: None,
        },
    );
    project
}

/// A 100 MW wind project with a capacity factor of 0.5 in every timepoint
pub fn gen_var_project() -> Project {
    let mut project = gen_spec_project("wind", 100.0, 0.0);
    project.operational_type = OperationalType::GenVar;
    project.cap_factors = (1..=4).map(|tmp| (tmp, 0.5)).collect();
    project
}

/// Input data with 50 MW of load in each timepoint and no projects
#[fixture]
pub fn input_data(
    temporal_index: TemporalIndex,
    load_zones: LoadZoneMap,
    fuels: FuelMap,
) -> InputData {
    let load: LoadMap = temporal_index
        .iter_timepoints()
        .map(|tmp| {
            (
                (LoadZoneID::new("z1"), tmp.id),
                indexmap! {"base".to_string() => 50.0},
            )
        })
        .collect();

    InputData {
        temporal: temporal_index,
        load_zones,
        load,
        fuels,
        projects: ProjectMap::new(),
        transmission_lines: TxLineMap::new(),
        reserves: IndexMap::new(),
        carbon_cap_zones: IndexMap::new(),
        carbon_caps: HashMap::new(),
        capacity_groups: CapacityGroups::default(),
        tx_target_zones: IndexMap::new(),
        tx_targets: IndexMap::new(),
    }
}

/// Load in z1 which can only be met by a generator in z2, over a line with 10% losses
pub fn two_zone_inputs(mut input_data: InputData) -> InputData {
    let z2 = LoadZoneID::new("z2");
    let mut zone = input_data.load_zones[0].clone();
    zone.id = z2.clone();
    input_data.load_zones.insert(z2.clone(), zone);
    for tmp in 1..=4 {
        input_data
            .load
            .insert((z2.clone(), tmp), indexmap! {"base".to_string() => 0.0});
    }

    let mut project = gen_spec_project("remote", 100.0, 1.0);
    project.load_zone = z2.clone();
    input_data.projects.insert(project.id.clone(), project);

    let line = TxLine {
        id: "line".into(),
        load_zone_from: z2,
        load_zone_to: "z1".into(),
        capacity_type: TxCapacityType::Specified,
        operational_type: TxOperationalType::Simple,
        loss_factor: 0.1,
        capacity: indexmap! {
            2030 => TxSpecifiedCapacity {
                min_mw: -100.0,
                max_mw: 100.0,
                fixed_cost_per_mw_yr: 1.0,
            }
        },
        new_build_vintages: IndexMap::new(),
        tx_target_zone: None,
        contributes_net_flow_to_tx_target: false,
    };
    input_data.transmission_lines.insert(line.id.clone(), line);

    input_data
}

/// Scenario parameters with no optional features
#[fixture]
pub fn core_params() -> ScenarioParameters {
    toml::from_str("").unwrap()
}

/// Assemble the modules for `params` over `inputs` and solve the model
pub fn assemble_and_solve(
    params: &ScenarioParameters,
    inputs: &InputData,
) -> anyhow::Result<(AssembledInstance, Solution)> {
    let instance = assemble(params, inputs)?;
    let solution = instance.solve(&SolverOptions::new(), true)?;
    Ok((instance, solution))
}

/// The solved value of a variable
pub fn var_value(
    instance: &AssembledInstance,
    solution: &Solution,
    name: &str,
    index: &ComponentIndex,
) -> f64 {
    solution.value(instance.model.var(name, index).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_and_validate_simple_ok() {
        let patches = vec![
            FilePatch::new("inputs/load_mw.tab")
                .with_header("load_zone,timepoint,load_component,load_mw")
                .with_deletion("Z1,1,base,80")
                .with_addition("Z1,1,base,90"),
        ];
        assert_validate_ok_simple!(patches);
    }

    #[test]
    fn patch_and_validate_simple_fail() {
        let patches = vec![
            FilePatch::new("inputs/load_mw.tab")
                .with_header("load_zone,timepoint,load_component,load_mw")
                .with_deletion("Z1,1,base,80"),
        ];
        assert_validate_fails_with_simple!(
            patches,
            "No load given for index (Z1, 1, base) and no default level for the component"
        );
    }

    #[test]
    fn patch_and_run_simple_ok() {
        let patches = vec![
            FilePatch::new("inputs/load_mw.tab")
                .with_header("load_zone,timepoint,load_component,load_mw")
                .with_deletion("Z1,1,base,80")
                .with_addition("Z1,1,base,90"),
        ];
        assert_patched_runs_ok_simple!(patches);
    }

    #[test]
    fn patch_and_run_simple_fail() {
        let patches = vec![
            FilePatch::new("inputs/load_zones.tab")
                .with_header(
                    "load_zone,allow_overgeneration,overgeneration_penalty_per_mw,\
                    allow_unserved_energy,unserved_energy_penalty_per_mwh",
                )
                .with_deletion("Z1,1,99999,1,99999")
                .with_addition("Z1,0,0,0,0"),
            FilePatch::new("inputs/load_mw.tab")
                .with_deletion("Z1,1,base,80")
                .with_addition("Z1,1,base,1000"),
        ];
        assert!(patch_and_run_simple!(patches).is_err());
    }
}

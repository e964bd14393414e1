//! Code for reading projects and the data attached to them.
use super::{
    check_fraction, check_non_negative, deserialise_flag, deserialise_optional, input_err_msg,
    read_tab, read_tab_optional,
};
use crate::fuel::FuelMap;
use crate::geography::{CarbonCapZoneMap, LoadZoneMap};
use crate::id::IDCollection;
use crate::project::{
    AvailabilityType, CapacityGroupID, CapacityGroupRequirement, CapacityGroups, CapacityType,
    HydroHorizonParams, NewBuildVintage, OperationalType, Project, ProjectID, ProjectMap,
    SpecifiedCapacity,
};
use crate::reserves::{BalancingArea, ReserveData, ReserveType};
use crate::temporal::{BalancingType, TemporalIndex};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const PROJECTS_FILE_NAME: &str = "projects.tab";
const SPECIFIED_CAPACITY_FILE_NAME: &str = "spec_capacity_period_params.tab";
const NEW_BUILD_GENERATOR_FILE_NAME: &str = "new_build_generator_vintage_costs.tab";
const NEW_BUILD_STORAGE_FILE_NAME: &str = "new_build_storage_vintage_costs.tab";
const AVAILABILITY_FILE_NAME: &str = "project_availability_exogenous.tab";
const PROFILES_FILE_NAME: &str = "variable_generator_profiles.tab";
const HYDRO_FILE_NAME: &str = "hydro_conventional_horizon_params.tab";
const CARBON_CAP_ZONES_FILE_NAME: &str = "project_carbon_cap_zones.tab";
const CAPACITY_GROUP_REQUIREMENTS_FILE_NAME: &str = "capacity_group_requirements.tab";
const CAPACITY_GROUP_PROJECTS_FILE_NAME: &str = "capacity_group_projects.tab";

#[derive(Deserialize)]
struct ProjectRaw {
    project: String,
    load_zone: String,
    capacity_type: CapacityType,
    availability_type: AvailabilityType,
    operational_type: OperationalType,
    balancing_type_project: String,
    #[serde(default, deserialize_with = "deserialise_optional")]
    technology: Option<String>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    variable_om_cost_per_mwh: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    fuel: Option<String>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    heat_rate_mmbtu_per_mwh: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_flag")]
    load_modifier_flag: bool,
    #[serde(default, deserialize_with = "deserialise_optional")]
    charging_efficiency: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    discharging_efficiency: Option<f64>,
}

#[derive(Deserialize)]
struct SpecifiedCapacityRaw {
    project: String,
    period: u32,
    specified_capacity_mw: f64,
    #[serde(default, deserialize_with = "deserialise_optional")]
    specified_capacity_mwh: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    fixed_cost_per_mw_yr: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    fixed_cost_per_mwh_yr: Option<f64>,
}

#[derive(Deserialize)]
struct NewBuildRaw {
    project: String,
    vintage: u32,
    lifetime_yrs: u32,
    annualized_real_cost_per_mw_yr: f64,
    #[serde(default, deserialize_with = "deserialise_optional")]
    annualized_real_cost_per_mwh_yr: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    min_cumulative_new_build_mw: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    max_cumulative_new_build_mw: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    min_cumulative_new_build_mwh: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    max_cumulative_new_build_mwh: Option<f64>,
}

#[derive(Deserialize)]
struct TimepointValueRaw {
    project: String,
    timepoint: u32,
    #[serde(alias = "availability_derate", alias = "cap_factor")]
    value: f64,
}

#[derive(Deserialize)]
struct HydroRaw {
    project: String,
    balancing_type_project: String,
    horizon: u32,
    average_power_fraction: f64,
    min_power_fraction: f64,
    max_power_fraction: f64,
}

#[derive(Deserialize)]
struct ProjectZoneRaw {
    project: String,
    #[serde(alias = "balancing_area", alias = "carbon_cap_zone")]
    zone: String,
}

#[derive(Deserialize)]
struct CapacityGroupRequirementRaw {
    capacity_group: String,
    period: u32,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_new_capacity_min: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_new_capacity_max: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_total_capacity_min: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_total_capacity_max: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_new_energy_min: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_new_energy_max: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_total_energy_min: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    capacity_group_total_energy_max: Option<f64>,
}

#[derive(Deserialize)]
struct CapacityGroupProjectRaw {
    capacity_group: String,
    project: String,
}

/// Read projects and all the data attached to them.
///
/// # Arguments
///
/// * `inputs_dir` - The instance's inputs directory
/// * `temporal` - The instance's temporal index
/// * `load_zones` - Load zones
/// * `fuels` - Fuels, with prices
/// * `reserves` - Enabled reserve products. Participation files are read for these only.
/// * `carbon_cap_zones` - Carbon cap zones (empty if the carbon cap is not enabled)
pub fn read_projects(
    inputs_dir: &Path,
    temporal: &TemporalIndex,
    load_zones: &LoadZoneMap,
    fuels: &FuelMap,
    reserves: &IndexMap<ReserveType, ReserveData>,
    carbon_cap_zones: &CarbonCapZoneMap,
) -> Result<ProjectMap> {
    let file_path = inputs_dir.join(PROJECTS_FILE_NAME);
    let mut projects = read_projects_from_iter(read_tab(&file_path)?, load_zones, fuels)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(SPECIFIED_CAPACITY_FILE_NAME);
    read_specified_capacity_from_iter(read_tab_optional(&file_path)?, &mut projects, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    for (file_name, storage) in [
        (NEW_BUILD_GENERATOR_FILE_NAME, false),
        (NEW_BUILD_STORAGE_FILE_NAME, true),
    ] {
        let file_path = inputs_dir.join(file_name);
        read_new_build_from_iter(
            read_tab_optional(&file_path)?,
            &mut projects,
            temporal,
            storage,
        )
        .with_context(|| input_err_msg(&file_path))?;
    }

    let file_path = inputs_dir.join(AVAILABILITY_FILE_NAME);
    read_availability_from_iter(read_tab_optional(&file_path)?, &mut projects, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(PROFILES_FILE_NAME);
    read_cap_factors_from_iter(read_tab_optional(&file_path)?, &mut projects, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(HYDRO_FILE_NAME);
    read_hydro_from_iter(read_tab_optional(&file_path)?, &mut projects, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    for (reserve, data) in reserves {
        let file_path = inputs_dir.join(format!("project_{reserve}_bas.tab"));
        read_reserve_bas_from_iter(read_tab_optional(&file_path)?, &mut projects, *reserve, data)
            .with_context(|| input_err_msg(&file_path))?;
    }

    if !carbon_cap_zones.is_empty() {
        let file_path = inputs_dir.join(CARBON_CAP_ZONES_FILE_NAME);
        read_carbon_cap_zones_from_iter(
            read_tab_optional(&file_path)?,
            &mut projects,
            carbon_cap_zones,
        )
        .with_context(|| input_err_msg(&file_path))?;
    }

    for project in projects.values() {
        validate_project(project, temporal, fuels)
            .with_context(|| format!("Invalid data for project {}", project.id))?;
    }

    Ok(projects)
}

fn project_mut<'a>(projects: &'a mut ProjectMap, id: &str) -> Result<&'a mut Project> {
    projects
        .get_mut(id)
        .with_context(|| format!("Unknown project {id}"))
}

fn read_projects_from_iter<I>(
    iter: I,
    load_zones: &LoadZoneMap,
    fuels: &FuelMap,
) -> Result<ProjectMap>
where
    I: Iterator<Item = ProjectRaw>,
{
    let mut projects = ProjectMap::new();
    for raw in iter {
        let load_zone = load_zones.get_id(&raw.load_zone)?.clone();
        let fuel = raw
            .fuel
            .as_deref()
            .map(|fuel| fuels.get_id(fuel).cloned())
            .transpose()?;
        let variable_om_cost_per_mwh = raw.variable_om_cost_per_mwh.unwrap_or(0.0);
        check_non_negative(variable_om_cost_per_mwh, "variable_om_cost_per_mwh")?;

        let project = Project {
            id: raw.project.as_str().into(),
            load_zone,
            capacity_type: raw.capacity_type,
            availability_type: raw.availability_type,
            operational_type: raw.operational_type,
            balancing_type: BalancingType::from(raw.balancing_type_project),
            technology: raw.technology,
            variable_om_cost_per_mwh,
            fuel,
            heat_rate_mmbtu_per_mwh: raw.heat_rate_mmbtu_per_mwh,
            load_modifier: raw.load_modifier_flag,
            charging_efficiency: raw.charging_efficiency.unwrap_or(1.0),
            discharging_efficiency: raw.discharging_efficiency.unwrap_or(1.0),
            specified_capacity: IndexMap::new(),
            new_build_vintages: IndexMap::new(),
            availability_derate: HashMap::new(),
            cap_factors: HashMap::new(),
            hydro_horizon_params: HashMap::new(),
            reserve_balancing_areas: IndexMap::new(),
            carbon_cap_zone: None,
        };
        ensure!(
            projects.insert(project.id.clone(), project).is_none(),
            "Project {} is repeated",
            raw.project
        );
    }

    Ok(projects)
}

fn read_specified_capacity_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = SpecifiedCapacityRaw>,
{
    for raw in iter {
        let project = project_mut(projects, &raw.project)?;
        ensure!(
            !project.capacity_type.is_new_build(),
            "Project {} has capacity type {} and cannot have specified capacity",
            raw.project,
            project.capacity_type.label()
        );
        if !temporal.has_period(raw.period) {
            continue;
        }

        let capacity = SpecifiedCapacity {
            capacity_mw: raw.specified_capacity_mw,
            energy_capacity_mwh: raw.specified_capacity_mwh.unwrap_or(0.0),
            fixed_cost_per_mw_yr: raw.fixed_cost_per_mw_yr.unwrap_or(0.0),
            fixed_cost_per_mwh_yr: raw.fixed_cost_per_mwh_yr.unwrap_or(0.0),
        };
        check_non_negative(capacity.capacity_mw, "specified_capacity_mw")?;
        check_non_negative(capacity.energy_capacity_mwh, "specified_capacity_mwh")?;
        check_non_negative(capacity.fixed_cost_per_mw_yr, "fixed_cost_per_mw_yr")?;
        check_non_negative(capacity.fixed_cost_per_mwh_yr, "fixed_cost_per_mwh_yr")?;
        ensure!(
            project
                .specified_capacity
                .insert(raw.period, capacity)
                .is_none(),
            "Specified capacity for project {} in period {} is repeated",
            raw.project,
            raw.period
        );
    }

    Ok(())
}

fn read_new_build_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    temporal: &TemporalIndex,
    storage: bool,
) -> Result<()>
where
    I: Iterator<Item = NewBuildRaw>,
{
    let expected = if storage {
        CapacityType::StorNewLin
    } else {
        CapacityType::GenNewLin
    };

    for raw in iter {
        let project = project_mut(projects, &raw.project)?;
        ensure!(
            project.capacity_type == expected,
            "Project {} has capacity type {}, but new-build costs are for {}",
            raw.project,
            project.capacity_type.label(),
            expected.label()
        );
        ensure!(
            raw.lifetime_yrs > 0,
            "Lifetime of project {} vintage {} must be positive",
            raw.project,
            raw.vintage
        );
        if !temporal.has_period(raw.vintage) {
            continue;
        }

        let params = NewBuildVintage {
            lifetime_yrs: raw.lifetime_yrs,
            annualized_real_cost_per_mw_yr: raw.annualized_real_cost_per_mw_yr,
            annualized_real_cost_per_mwh_yr: raw.annualized_real_cost_per_mwh_yr.unwrap_or(0.0),
            min_cumulative_new_build_mw: raw.min_cumulative_new_build_mw.unwrap_or(0.0),
            max_cumulative_new_build_mw: raw.max_cumulative_new_build_mw,
            min_cumulative_new_build_mwh: raw.min_cumulative_new_build_mwh.unwrap_or(0.0),
            max_cumulative_new_build_mwh: raw.max_cumulative_new_build_mwh,
        };
        check_non_negative(
            params.annualized_real_cost_per_mw_yr,
            "annualized_real_cost_per_mw_yr",
        )?;
        check_non_negative(
            params.annualized_real_cost_per_mwh_yr,
            "annualized_real_cost_per_mwh_yr",
        )?;
        for (min, max, unit) in [
            (
                params.min_cumulative_new_build_mw,
                params.max_cumulative_new_build_mw,
                "MW",
            ),
            (
                params.min_cumulative_new_build_mwh,
                params.max_cumulative_new_build_mwh,
                "MWh",
            ),
        ] {
            ensure!(
                max.is_none_or(|max| min <= max),
                "Minimum cumulative build ({unit}) of project {} vintage {} exceeds the maximum",
                raw.project,
                raw.vintage
            );
        }

        ensure!(
            project
                .new_build_vintages
                .insert(raw.vintage, params)
                .is_none(),
            "Vintage {} of project {} is repeated",
            raw.vintage,
            raw.project
        );
    }

    Ok(())
}

fn read_availability_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = TimepointValueRaw>,
{
    for raw in iter {
        let project = project_mut(projects, &raw.project)?;
        check_fraction(raw.value, "availability_derate")?;
        if temporal.timepoint(raw.timepoint).is_ok() {
            ensure!(
                project
                    .availability_derate
                    .insert(raw.timepoint, raw.value)
                    .is_none(),
                "Availability of project {} in timepoint {} is repeated",
                raw.project,
                raw.timepoint
            );
        }
    }

    Ok(())
}

fn read_cap_factors_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = TimepointValueRaw>,
{
    for raw in iter {
        let project = project_mut(projects, &raw.project)?;
        ensure!(
            project.operational_type.uses_cap_factors(),
            "Project {} has operational type {} and cannot have a generation profile",
            raw.project,
            project.operational_type.label()
        );
        check_non_negative(raw.value, "cap_factor")?;
        if temporal.timepoint(raw.timepoint).is_ok() {
            ensure!(
                project.cap_factors.insert(raw.timepoint, raw.value).is_none(),
                "Capacity factor of project {} in timepoint {} is repeated",
                raw.project,
                raw.timepoint
            );
        }
    }

    Ok(())
}

fn read_hydro_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = HydroRaw>,
{
    for raw in iter {
        let project = project_mut(projects, &raw.project)?;
        ensure!(
            project.operational_type == OperationalType::GenHydroMustTake,
            "Project {} has operational type {} and cannot have hydro parameters",
            raw.project,
            project.operational_type.label()
        );
        ensure!(
            0.0 <= raw.min_power_fraction
                && raw.min_power_fraction <= raw.average_power_fraction
                && raw.average_power_fraction <= raw.max_power_fraction
                && raw.max_power_fraction <= 1.0,
            "Hydro parameters of project {} in horizon {} must satisfy 0 <= min <= average <= max <= 1",
            raw.project,
            raw.horizon
        );

        let balancing_type = BalancingType::from(raw.balancing_type_project);
        if balancing_type != project.balancing_type
            || temporal
                .horizons_of_type(&balancing_type)
                .all(|horizon| horizon.id != raw.horizon)
        {
            continue;
        }

        let params = HydroHorizonParams {
            average_power_fraction: raw.average_power_fraction,
            min_power_fraction: raw.min_power_fraction,
            max_power_fraction: raw.max_power_fraction,
        };
        ensure!(
            project
                .hydro_horizon_params
                .insert(raw.horizon, params)
                .is_none(),
            "Hydro parameters of project {} in horizon {} are repeated",
            raw.project,
            raw.horizon
        );
    }

    Ok(())
}

fn read_reserve_bas_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    reserve: ReserveType,
    data: &ReserveData,
) -> Result<()>
where
    I: Iterator<Item = ProjectZoneRaw>,
{
    for raw in iter {
        let ba = data.balancing_areas.get_id(&raw.zone)?.clone();
        let project = project_mut(projects, &raw.project)?;
        ensure!(
            project.operational_type.can_provide_reserves(),
            "Project {} has operational type {} and cannot provide {reserve}",
            raw.project,
            project.operational_type.label()
        );
        ensure!(
            project.reserve_balancing_areas.insert(reserve, ba).is_none(),
            "Project {} is in more than one {reserve} balancing area",
            raw.project
        );
    }

    Ok(())
}

fn read_carbon_cap_zones_from_iter<I>(
    iter: I,
    projects: &mut ProjectMap,
    zones: &CarbonCapZoneMap,
) -> Result<()>
where
    I: Iterator<Item = ProjectZoneRaw>,
{
    for raw in iter {
        let zone = zones.get_id(&raw.zone)?.clone();
        let project = project_mut(projects, &raw.project)?;
        ensure!(
            project.carbon_cap_zone.replace(zone).is_none(),
            "Project {} is in more than one carbon cap zone",
            raw.project
        );
    }

    Ok(())
}

/// Check that a project has all the data its types require
fn validate_project(project: &Project, temporal: &TemporalIndex, fuels: &FuelMap) -> Result<()> {
    let is_storage = project.operational_type == OperationalType::Stor;
    ensure!(
        is_storage == project.capacity_type.is_storage(),
        "Operational type {} cannot be used with capacity type {}",
        project.operational_type.label(),
        project.capacity_type.label()
    );
    ensure!(
        temporal.balancing_types().contains(&project.balancing_type),
        "Unknown balancing type {}",
        project.balancing_type
    );
    if is_storage {
        for (efficiency, name) in [
            (project.charging_efficiency, "charging_efficiency"),
            (project.discharging_efficiency, "discharging_efficiency"),
        ] {
            ensure!(
                efficiency > 0.0 && efficiency <= 1.0,
                "{name} must be greater than 0 and at most 1"
            );
        }
    }

    if let Some(fuel_id) = &project.fuel {
        let heat_rate = project
            .heat_rate_mmbtu_per_mwh
            .with_context(|| format!("A heat rate is required as the project burns {fuel_id}"))?;
        check_non_negative(heat_rate, "heat_rate_mmbtu_per_mwh")?;

        let fuel = &fuels[fuel_id];
        for tmp in temporal.iter_timepoints() {
            fuel.price(tmp.period, tmp.month)?;
        }
    }

    if project.operational_type.uses_cap_factors() {
        for tmp in temporal.iter_timepoints() {
            ensure!(
                project.cap_factors.contains_key(&tmp.id),
                "Missing capacity factor for timepoint {}",
                tmp.id
            );
        }
    }

    if project.operational_type == OperationalType::GenHydroMustTake {
        for horizon in temporal.horizons_of_type(&project.balancing_type) {
            ensure!(
                project.hydro_horizon_params.contains_key(&horizon.id),
                "Missing hydro parameters for horizon {} of balancing type {}",
                horizon.id,
                project.balancing_type
            );
        }
    }

    Ok(())
}

/// Read capacity group requirements and membership
pub fn read_capacity_groups(
    inputs_dir: &Path,
    projects: &ProjectMap,
    temporal: &TemporalIndex,
) -> Result<CapacityGroups> {
    let file_path = inputs_dir.join(CAPACITY_GROUP_REQUIREMENTS_FILE_NAME);
    let requirements = read_group_requirements_from_iter(read_tab(&file_path)?, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(CAPACITY_GROUP_PROJECTS_FILE_NAME);
    let group_projects = read_group_projects_from_iter(read_tab(&file_path)?, projects)
        .with_context(|| input_err_msg(&file_path))?;

    for (group, _) in requirements.keys() {
        ensure!(
            group_projects.contains_key(group),
            "Capacity group {group} has requirements but no projects"
        );
    }

    Ok(CapacityGroups {
        requirements,
        projects: group_projects,
    })
}

fn read_group_requirements_from_iter<I>(
    iter: I,
    temporal: &TemporalIndex,
) -> Result<IndexMap<(CapacityGroupID, u32), CapacityGroupRequirement>>
where
    I: Iterator<Item = CapacityGroupRequirementRaw>,
{
    let mut requirements = IndexMap::new();
    for raw in iter {
        let requirement = CapacityGroupRequirement {
            new_capacity_min: raw.capacity_group_new_capacity_min.unwrap_or(0.0),
            new_capacity_max: raw.capacity_group_new_capacity_max,
            total_capacity_min: raw.capacity_group_total_capacity_min.unwrap_or(0.0),
            total_capacity_max: raw.capacity_group_total_capacity_max,
            new_energy_min: raw.capacity_group_new_energy_min.unwrap_or(0.0),
            new_energy_max: raw.capacity_group_new_energy_max,
            total_energy_min: raw.capacity_group_total_energy_min.unwrap_or(0.0),
            total_energy_max: raw.capacity_group_total_energy_max,
        };
        for (min, max) in [
            (requirement.new_capacity_min, requirement.new_capacity_max),
            (requirement.total_capacity_min, requirement.total_capacity_max),
            (requirement.new_energy_min, requirement.new_energy_max),
            (requirement.total_energy_min, requirement.total_energy_max),
        ] {
            check_non_negative(min, "Capacity group minimum")?;
            ensure!(
                max.is_none_or(|max| min <= max),
                "Minimum exceeds maximum for capacity group {} in period {}",
                raw.capacity_group,
                raw.period
            );
        }
        if !temporal.has_period(raw.period) {
            continue;
        }

        let key = (CapacityGroupID::from(raw.capacity_group), raw.period);
        ensure!(
            !requirements.contains_key(&key),
            "Requirements for capacity group {} in period {} are repeated",
            key.0,
            key.1
        );
        requirements.insert(key, requirement);
    }

    Ok(requirements)
}

fn read_group_projects_from_iter<I>(
    iter: I,
    projects: &ProjectMap,
) -> Result<IndexMap<CapacityGroupID, Vec<ProjectID>>>
where
    I: Iterator<Item = CapacityGroupProjectRaw>,
{
    let mut groups: IndexMap<CapacityGroupID, Vec<_>> = IndexMap::new();
    for raw in iter {
        let project = projects.get_id(&raw.project)?.clone();
        let members = groups.entry(raw.capacity_group.as_str().into()).or_default();
        ensure!(
            !members.contains(&project),
            "Project {project} is listed twice in capacity group {}",
            raw.capacity_group
        );
        members.push(project);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, fuels, load_zones, temporal_index};
    use rstest::{fixture, rstest};

    fn project_raw(
        id: &str,
        capacity_type: CapacityType,
        operational_type: OperationalType,
    ) -> ProjectRaw {
        ProjectRaw {
            project: id.into(),
            load_zone: "z1".into(),
            capacity_type,
            availability_type: AvailabilityType::Exogenous,
            operational_type,
            balancing_type_project: "day".into(),
            technology: None,
            variable_om_cost_per_mwh: None,
            fuel: None,
            heat_rate_mmbtu_per_mwh: None,
            load_modifier_flag: false,
            charging_efficiency: None,
            discharging_efficiency: None,
        }
    }

    #[fixture]
    fn projects(load_zones: LoadZoneMap, fuels: FuelMap) -> ProjectMap {
        read_projects_from_iter(
            [
                project_raw("gen", CapacityType::GenSpec, OperationalType::GenSimple),
                project_raw("wind", CapacityType::GenNewLin, OperationalType::GenVar),
                project_raw("hydro", CapacityType::GenSpec, OperationalType::GenHydroMustTake),
                project_raw("solar", CapacityType::GenSpec, OperationalType::GenVarMustTake),
            ]
            .into_iter(),
            &load_zones,
            &fuels,
        )
        .unwrap()
    }

    fn new_build_raw(project: &str, vintage: u32) -> NewBuildRaw {
        NewBuildRaw {
            project: project.into(),
            vintage,
            lifetime_yrs: 20,
            annualized_real_cost_per_mw_yr: 100.0,
            annualized_real_cost_per_mwh_yr: None,
            min_cumulative_new_build_mw: Some(10.0),
            max_cumulative_new_build_mw: None,
            min_cumulative_new_build_mwh: None,
            max_cumulative_new_build_mwh: None,
        }
    }

    #[rstest]
    fn read_projects_unknown_fuel(load_zones: LoadZoneMap, fuels: FuelMap) {
        let mut raw = project_raw("gen", CapacityType::GenSpec, OperationalType::GenSimple);
        raw.fuel = Some("unobtanium".into());
        let result = read_projects_from_iter([raw].into_iter(), &load_zones, &fuels);
        assert_error!(result, "Unknown ID unobtanium found");
    }

    #[rstest]
    fn read_new_build_ok(mut projects: ProjectMap, temporal_index: TemporalIndex) {
        read_new_build_from_iter(
            [new_build_raw("wind", 2030), new_build_raw("wind", 2050)].into_iter(),
            &mut projects,
            &temporal_index,
            false,
        )
        .unwrap();
        let vintages = &projects["wind"].new_build_vintages;
        assert_eq!(vintages.len(), 1);
        assert_eq!(vintages[&2030].min_cumulative_new_build_mw, 10.0);
        assert_eq!(vintages[&2030].max_cumulative_new_build_mw, None);
    }

    #[rstest]
    fn read_new_build_wrong_capacity_type(
        mut projects: ProjectMap,
        temporal_index: TemporalIndex,
    ) {
        let result = read_new_build_from_iter(
            [new_build_raw("gen", 2030)].into_iter(),
            &mut projects,
            &temporal_index,
            false,
        );
        assert_error!(
            result,
            "Project gen has capacity type gen_spec, but new-build costs are for gen_new_lin"
        );
    }

    #[rstest]
    fn read_cap_factors_wrong_type(mut projects: ProjectMap, temporal_index: TemporalIndex) {
        let result = read_cap_factors_from_iter(
            [TimepointValueRaw {
                project: "gen".into(),
                timepoint: 1,
                value: 0.5,
            }]
            .into_iter(),
            &mut projects,
            &temporal_index,
        );
        assert_error!(
            result,
            "Project gen has operational type gen_simple and cannot have a generation profile"
        );
    }

    #[rstest]
    fn validate_missing_cap_factor(
        mut projects: ProjectMap,
        temporal_index: TemporalIndex,
        fuels: FuelMap,
    ) {
        let raw = (1..=3).map(|tmp| TimepointValueRaw {
            project: "wind".into(),
            timepoint: tmp,
            value: 0.5,
        });
        read_cap_factors_from_iter(raw, &mut projects, &temporal_index).unwrap();
        let result = validate_project(&projects["wind"], &temporal_index, &fuels);
        assert_error!(result, "Missing capacity factor for timepoint 4");
    }

    #[rstest]
    fn validate_missing_hydro_params(
        mut projects: ProjectMap,
        temporal_index: TemporalIndex,
        fuels: FuelMap,
    ) {
        // The "half_day" balancing type has two horizons; only the first is given
        let project = &mut projects["hydro"];
        project.balancing_type = "half_day".into();
        read_hydro_from_iter(
            [HydroRaw {
                project: "hydro".into(),
                balancing_type_project: "half_day".into(),
                horizon: 1,
                average_power_fraction: 0.5,
                min_power_fraction: 0.1,
                max_power_fraction: 0.9,
            }]
            .into_iter(),
            &mut projects,
            &temporal_index,
        )
        .unwrap();
        let result = validate_project(&projects["hydro"], &temporal_index, &fuels);
        assert_error!(
            result,
            "Missing hydro parameters for horizon 2 of balancing type half_day"
        );
    }

    #[rstest]
    fn validate_storage_mismatch(temporal_index: TemporalIndex, load_zones: LoadZoneMap) {
        let projects = read_projects_from_iter(
            [project_raw("battery", CapacityType::GenSpec, OperationalType::Stor)].into_iter(),
            &load_zones,
            &FuelMap::new(),
        )
        .unwrap();
        let result = validate_project(&projects["battery"], &temporal_index, &FuelMap::new());
        assert_error!(
            result,
            "Operational type stor cannot be used with capacity type gen_spec"
        );
    }

    #[rstest]
    fn validate_fuel_without_heat_rate(
        temporal_index: TemporalIndex,
        load_zones: LoadZoneMap,
        fuels: FuelMap,
    ) {
        let mut raw = project_raw("gen", CapacityType::GenSpec, OperationalType::GenSimple);
        raw.fuel = Some("gas".into());
        let projects = read_projects_from_iter([raw].into_iter(), &load_zones, &fuels).unwrap();
        let result = validate_project(&projects["gen"], &temporal_index, &fuels);
        assert_error!(result, "A heat rate is required as the project burns gas");
    }

    #[rstest]
    fn must_take_cannot_provide_reserves(mut projects: ProjectMap) {
        let data = ReserveData {
            balancing_areas: [(
                "ba1".into(),
                BalancingArea {
                    id: "ba1".into(),
                    allow_violation: false,
                    violation_penalty_per_mw: 0.0,
                },
            )]
            .into_iter()
            .collect(),
            requirement: HashMap::new(),
        };
        let result = read_reserve_bas_from_iter(
            [ProjectZoneRaw {
                project: "solar".into(),
                zone: "ba1".into(),
            }]
            .into_iter(),
            &mut projects,
            ReserveType::SpinningReserves,
            &data,
        );
        assert_error!(
            result,
            "Project solar has operational type gen_var_must_take and cannot provide spinning_reserves"
        );
    }

    #[rstest]
    fn capacity_group_requirements_defaults(temporal_index: TemporalIndex) {
        let requirements = read_group_requirements_from_iter(
            [CapacityGroupRequirementRaw {
                capacity_group: "g1".into(),
                period: 2030,
                capacity_group_new_capacity_min: None,
                capacity_group_new_capacity_max: Some(50.0),
                capacity_group_total_capacity_min: None,
                capacity_group_total_capacity_max: None,
                capacity_group_new_energy_min: None,
                capacity_group_new_energy_max: None,
                capacity_group_total_energy_min: None,
                capacity_group_total_energy_max: None,
            }]
            .into_iter(),
            &temporal_index,
        )
        .unwrap();
        let requirement = &requirements[&(CapacityGroupID::new("g1"), 2030)];
        assert_eq!(requirement.new_capacity_min, 0.0);
        assert_eq!(requirement.new_capacity_max, Some(50.0));
        assert_eq!(requirement.total_capacity_max, None);
    }
}

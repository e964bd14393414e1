//! Projects: generators and storage.
//!
//! Each project has a capacity type (how its capacity is determined), an availability type (how
//! much of its capacity can be used in each timepoint) and an operational type (how it can be
//! dispatched).
use crate::fuel::FuelID;
use crate::geography::{CarbonCapZoneID, LoadZoneID};
use crate::id::define_id_type;
use crate::reserves::{BalancingAreaID, ReserveType};
use crate::temporal::BalancingType;
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashMap;

define_id_type! {ProjectID}
define_id_type! {CapacityGroupID}

/// How a project's capacity is determined
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapacityType {
    /// Generator with capacity specified for each period
    #[string = "gen_spec"]
    GenSpec,
    /// Generator which can be built in each vintage, with linear costs
    #[string = "gen_new_lin"]
    GenNewLin,
    /// Storage with power and energy capacity specified for each period
    #[string = "stor_spec"]
    StorSpec,
    /// Storage whose power and energy capacity can be built in each vintage
    #[string = "stor_new_lin"]
    StorNewLin,
}

impl CapacityType {
    /// The label used for this type in input files
    pub fn label(self) -> &'static str {
        match self {
            Self::GenSpec => "gen_spec",
            Self::GenNewLin => "gen_new_lin",
            Self::StorSpec => "stor_spec",
            Self::StorNewLin => "stor_new_lin",
        }
    }

    /// Whether this capacity type has an energy capacity
    pub fn is_storage(self) -> bool {
        matches!(self, Self::StorSpec | Self::StorNewLin)
    }

    /// Whether capacity is built by the model
    pub fn is_new_build(self) -> bool {
        matches!(self, Self::GenNewLin | Self::StorNewLin)
    }
}

/// How the availability of a project is determined
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AvailabilityType {
    /// Derates given as input data for each timepoint
    #[string = "exogenous"]
    Exogenous,
}

/// How a project is operated
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationalType {
    /// Dispatchable between zero and available capacity
    #[string = "gen_simple"]
    GenSimple,
    /// Variable generator which can be curtailed
    #[string = "gen_var"]
    GenVar,
    /// Variable generator which cannot be curtailed
    #[string = "gen_var_must_take"]
    GenVarMustTake,
    /// Hydro with an energy budget for each horizon
    #[string = "gen_hydro_must_take"]
    GenHydroMustTake,
    /// Storage
    #[string = "stor"]
    Stor,
}

impl OperationalType {
    /// The label used for this type in input files
    pub fn label(self) -> &'static str {
        match self {
            Self::GenSimple => "gen_simple",
            Self::GenVar => "gen_var",
            Self::GenVarMustTake => "gen_var_must_take",
            Self::GenHydroMustTake => "gen_hydro_must_take",
            Self::Stor => "stor",
        }
    }

    /// Whether projects of this type can provide operating reserves
    pub fn can_provide_reserves(self) -> bool {
        !matches!(self, Self::GenVarMustTake)
    }

    /// Whether projects of this type use capacity factor profiles
    pub fn uses_cap_factors(self) -> bool {
        matches!(self, Self::GenVar | Self::GenVarMustTake)
    }
}

/// Capacity and fixed costs of a project with specified capacity, for one period
#[derive(Clone, Debug, PartialEq)]
pub struct SpecifiedCapacity {
    /// Power capacity
    pub capacity_mw: f64,
    /// Energy capacity (storage only)
    pub energy_capacity_mwh: f64,
    /// Fixed cost per MW per year
    pub fixed_cost_per_mw_yr: f64,
    /// Fixed cost per MWh per year (storage only)
    pub fixed_cost_per_mwh_yr: f64,
}

/// Costs and build limits for a new-build project in one vintage
#[derive(Clone, Debug, PartialEq)]
pub struct NewBuildVintage {
    /// Years for which capacity built in this vintage remains operational
    pub lifetime_yrs: u32,
    /// Annualised cost per MW built
    pub annualized_real_cost_per_mw_yr: f64,
    /// Annualised cost per MWh built (storage only)
    pub annualized_real_cost_per_mwh_yr: f64,
    /// Minimum cumulative capacity built by this vintage
    pub min_cumulative_new_build_mw: f64,
    /// Maximum cumulative capacity built by this vintage
    pub max_cumulative_new_build_mw: Option<f64>,
    /// Minimum cumulative energy capacity built by this vintage (storage only)
    pub min_cumulative_new_build_mwh: f64,
    /// Maximum cumulative energy capacity built by this vintage (storage only)
    pub max_cumulative_new_build_mwh: Option<f64>,
}

impl NewBuildVintage {
    /// Whether capacity of the given vintage is operational in a period
    pub fn is_operational_in(&self, vintage: u32, period: u32) -> bool {
        vintage <= period && period < vintage + self.lifetime_yrs
    }
}

/// Energy budget and limits for a hydro project in one horizon
#[derive(Clone, Debug, PartialEq)]
pub struct HydroHorizonParams {
    /// Average output as a fraction of available capacity
    pub average_power_fraction: f64,
    /// Minimum output as a fraction of available capacity
    pub min_power_fraction: f64,
    /// Maximum output as a fraction of available capacity
    pub max_power_fraction: f64,
}

/// A generator or storage project
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    /// The project's ID
    pub id: ProjectID,
    /// The load zone in which the project is located
    pub load_zone: LoadZoneID,
    /// Capacity type
    pub capacity_type: CapacityType,
    /// Availability type
    pub availability_type: AvailabilityType,
    /// Operational type
    pub operational_type: OperationalType,
    /// Balancing type of the horizons used for intertemporal constraints
    pub balancing_type: BalancingType,
    /// Technology label, for reporting
    pub technology: Option<String>,
    /// Variable O&M cost per MWh
    pub variable_om_cost_per_mwh: f64,
    /// The fuel burned, if any
    pub fuel: Option<FuelID>,
    /// Heat rate, required if the project burns fuel
    pub heat_rate_mmbtu_per_mwh: Option<f64>,
    /// Whether the project is a load modifier (e.g. demand response) rather than bulk supply
    pub load_modifier: bool,
    /// Charging efficiency (storage only)
    pub charging_efficiency: f64,
    /// Discharging efficiency (storage only)
    pub discharging_efficiency: f64,
    /// Specified capacity by period (specified capacity types)
    pub specified_capacity: IndexMap<u32, SpecifiedCapacity>,
    /// New-build costs and limits by vintage (new-build capacity types)
    pub new_build_vintages: IndexMap<u32, NewBuildVintage>,
    /// Availability derate by timepoint. Missing timepoints are fully available.
    pub availability_derate: HashMap<u32, f64>,
    /// Capacity factor by timepoint (variable generators)
    pub cap_factors: HashMap<u32, f64>,
    /// Hydro parameters by horizon (hydro)
    pub hydro_horizon_params: HashMap<u32, HydroHorizonParams>,
    /// Balancing area for each reserve product the project can provide
    pub reserve_balancing_areas: IndexMap<ReserveType, BalancingAreaID>,
    /// Carbon cap zone to which the project's emissions count
    pub carbon_cap_zone: Option<CarbonCapZoneID>,
}

impl Project {
    /// The fraction of the project's capacity available in a timepoint
    pub fn availability_derate(&self, tmp: u32) -> f64 {
        self.availability_derate.get(&tmp).copied().unwrap_or(1.0)
    }

    /// Whether the project burns fuel
    pub fn burns_fuel(&self) -> bool {
        self.fuel.is_some()
    }
}

/// A map of projects, keyed by ID
pub type ProjectMap = IndexMap<ProjectID, Project>;

/// Limits on capacity within a group of projects in one period.
///
/// A limit of zero (minimum) or `None` (maximum) means no limit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapacityGroupRequirement {
    /// Minimum new capacity built in the period
    pub new_capacity_min: f64,
    /// Maximum new capacity built in the period
    pub new_capacity_max: Option<f64>,
    /// Minimum total capacity in the period
    pub total_capacity_min: f64,
    /// Maximum total capacity in the period
    pub total_capacity_max: Option<f64>,
    /// Minimum new energy capacity built in the period
    pub new_energy_min: f64,
    /// Maximum new energy capacity built in the period
    pub new_energy_max: Option<f64>,
    /// Minimum total energy capacity in the period
    pub total_energy_min: f64,
    /// Maximum total energy capacity in the period
    pub total_energy_max: Option<f64>,
}

/// Capacity groups: their requirements by period and member projects
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapacityGroups {
    /// Requirements by group and period
    pub requirements: IndexMap<(CapacityGroupID, u32), CapacityGroupRequirement>,
    /// Member projects of each group
    pub projects: IndexMap<CapacityGroupID, Vec<ProjectID>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2030, 2030, true)]
    #[case(2030, 2049, true)]
    #[case(2030, 2050, false)]
    #[case(2030, 2020, false)]
    fn vintage_operational_in_period(
        #[case] vintage: u32,
        #[case] period: u32,
        #[case] expected: bool,
    ) {
        let params = NewBuildVintage {
            lifetime_yrs: 20,
            annualized_real_cost_per_mw_yr: 1.0,
            annualized_real_cost_per_mwh_yr: 0.0,
            min_cumulative_new_build_mw: 0.0,
            max_cumulative_new_build_mw: None,
            min_cumulative_new_build_mwh: 0.0,
            max_cumulative_new_build_mwh: None,
        };
        assert_eq!(params.is_operational_in(vintage, period), expected);
    }
}

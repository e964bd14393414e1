//! Scenario-level parameters and the structure of a scenario's instances.
//!
//! A scenario may consist of several model instances: one for each combination of weather, hydro
//! and availability iteration, subproblem and stage. Each instance has its own directory of input
//! files.
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::optimisation::{SolverOptions, check_solver_options};
use crate::reserves::ReserveType;
use anyhow::{Context, Result, ensure};
use itertools::{Itertools, iproduct};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the file containing scenario parameters
pub const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// The name of the directory containing an instance's input files
pub const INPUTS_DIR_NAME: &str = "inputs";

/// Optional features which can be enabled for a scenario
#[derive(
    DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    /// Transmission between load zones
    #[string = "transmission"]
    Transmission,
    /// Upward load-following reserves
    #[string = "lf_reserves_up"]
    LfReservesUp,
    /// Downward load-following reserves
    #[string = "lf_reserves_down"]
    LfReservesDown,
    /// Upward regulation
    #[string = "regulation_up"]
    RegulationUp,
    /// Downward regulation
    #[string = "regulation_down"]
    RegulationDown,
    /// Spinning reserves
    #[string = "spinning_reserves"]
    SpinningReserves,
    /// A cap on carbon emissions
    #[string = "carbon_cap"]
    CarbonCap,
    /// Limits on the capacity of groups of projects
    #[string = "capacity_groups"]
    CapacityGroups,
    /// Minimum flows on groups of transmission lines over each horizon. Requires transmission.
    #[string = "transmission_target"]
    TransmissionTarget,
}

impl Feature {
    /// The reserve product enabled by this feature, if any
    pub fn reserve_type(self) -> Option<ReserveType> {
        match self {
            Self::LfReservesUp => Some(ReserveType::LfReservesUp),
            Self::LfReservesDown => Some(ReserveType::LfReservesDown),
            Self::RegulationUp => Some(ReserveType::RegulationUp),
            Self::RegulationDown => Some(ReserveType::RegulationDown),
            Self::SpinningReserves => Some(ReserveType::SpinningReserves),
            Self::Transmission
            | Self::CarbonCap
            | Self::CapacityGroups
            | Self::TransmissionTarget => None,
        }
    }
}

fn default_single() -> Vec<u32> {
    vec![1]
}

/// Parameters of a scenario, read from `scenario.toml`
#[derive(Debug, Deserialize, PartialEq)]
pub struct ScenarioParameters {
    /// Optional features enabled for this scenario
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Weather iterations. If empty, there is no weather level in the directory structure.
    #[serde(default)]
    pub weather_iterations: Vec<u32>,
    /// Hydro iterations
    #[serde(default)]
    pub hydro_iterations: Vec<u32>,
    /// Availability iterations
    #[serde(default)]
    pub availability_iterations: Vec<u32>,
    /// Subproblems, solved independently
    #[serde(default = "default_single")]
    pub subproblems: Vec<u32>,
    /// Stages of each subproblem
    #[serde(default = "default_single")]
    pub stages: Vec<u32>,
    /// Options passed to the solver
    #[serde(default)]
    pub solver_options: SolverOptions,
}

impl ScenarioParameters {
    /// Read scenario parameters from the scenario directory
    pub fn from_path(scenario_dir: &Path) -> Result<Self> {
        let file_path = scenario_dir.join(SCENARIO_FILE_NAME);
        let params: Self = read_toml(&file_path)?;
        params
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.features.iter().all_unique(),
            "Features must not be repeated"
        );
        ensure!(
            !self.has_feature(Feature::TransmissionTarget)
                || self.has_feature(Feature::Transmission),
            "The transmission_target feature requires the transmission feature"
        );
        for (name, values) in [
            ("weather_iterations", &self.weather_iterations),
            ("hydro_iterations", &self.hydro_iterations),
            ("availability_iterations", &self.availability_iterations),
            ("subproblems", &self.subproblems),
            ("stages", &self.stages),
        ] {
            ensure!(
                is_sorted_and_unique(values),
                "{name} must be in increasing order with no repeats"
            );
        }
        ensure!(!self.subproblems.is_empty(), "subproblems cannot be empty");
        ensure!(!self.stages.is_empty(), "stages cannot be empty");
        check_solver_options(&self.solver_options).context("Invalid solver_options")?;

        Ok(())
    }

    /// Whether a feature is enabled
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// The reserve products enabled for this scenario, in the order their features are listed
    pub fn reserve_types(&self) -> impl Iterator<Item = ReserveType> + '_ {
        self.features.iter().filter_map(|feature| feature.reserve_type())
    }

    /// Iterate over the instances making up the scenario, in the order they are solved
    pub fn iter_instances(&self) -> impl Iterator<Item = InstanceKey> {
        let level = |values: &[u32], present: bool| -> Vec<Option<u32>> {
            if present {
                values.iter().copied().map(Some).collect()
            } else {
                vec![None]
            }
        };

        iproduct!(
            level(&self.weather_iterations, !self.weather_iterations.is_empty()),
            level(&self.hydro_iterations, !self.hydro_iterations.is_empty()),
            level(
                &self.availability_iterations,
                !self.availability_iterations.is_empty()
            ),
            level(&self.subproblems, self.subproblems.len() > 1),
            level(&self.stages, self.stages.len() > 1)
        )
        .map(
            |(weather, hydro, availability, subproblem, stage)| InstanceKey {
                weather,
                hydro,
                availability,
                subproblem,
                stage,
            },
        )
    }
}

/// Identifies one model instance within a scenario.
///
/// A level is `None` if it is absent from the scenario's directory structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    /// Weather iteration
    pub weather: Option<u32>,
    /// Hydro iteration
    pub hydro: Option<u32>,
    /// Availability iteration
    pub availability: Option<u32>,
    /// Subproblem
    pub subproblem: Option<u32>,
    /// Stage
    pub stage: Option<u32>,
}

impl InstanceKey {
    fn levels(&self) -> impl Iterator<Item = u32> {
        [
            self.weather,
            self.hydro,
            self.availability,
            self.subproblem,
            self.stage,
        ]
        .into_iter()
        .flatten()
    }

    /// The instance's directory relative to the scenario (or results) directory
    pub fn relative_dir(&self) -> PathBuf {
        self.levels().map(|level| level.to_string()).collect()
    }

    /// The directory containing the instance's input files
    pub fn inputs_dir(&self, scenario_dir: &Path) -> PathBuf {
        scenario_dir.join(self.relative_dir()).join(INPUTS_DIR_NAME)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = [
            ("weather iteration", self.weather),
            ("hydro iteration", self.hydro),
            ("availability iteration", self.availability),
            ("subproblem", self.subproblem),
            ("stage", self.stage),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| format!("{label} {value}")))
        .join(", ");

        if labels.is_empty() {
            write!(f, "single instance")
        } else {
            write!(f, "{labels}")
        }
    }
}

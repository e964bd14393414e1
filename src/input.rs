//! Common routines for handling input data.
//!
//! Each model instance has a directory of tab-delimited input files. A value of `.` stands for a
//! missing (optional) value.
use crate::fuel::FuelMap;
use crate::geography::{CarbonCapZoneID, CarbonCapZoneMap, LoadZoneMap, TxTargetZoneMap};
use crate::project::{CapacityGroups, ProjectMap};
use crate::reserves::{ReserveData, ReserveType};
use crate::scenario::{Feature, ScenarioParameters};
use crate::temporal::TemporalIndex;
use crate::transmission::{TxLineMap, TxTargetMap};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::fs;
use std::hash::Hash;
use std::path::Path;
use std::str::FromStr;

mod fuel;
use fuel::read_fuels;
mod geography;
use geography::{
    read_carbon_caps, read_carbon_cap_zones, read_load_zones, read_tx_target_zones,
};
mod load;
pub use load::LoadMap;
use load::read_load;
mod project;
use project::{read_capacity_groups, read_projects};
mod reserves;
use reserves::read_reserve_data;
mod temporal;
use temporal::read_temporal_index;
mod transmission;
use transmission::{read_transmission_lines, read_transmission_targets};

/// The data for one model instance
#[derive(Debug)]
pub struct InputData {
    /// Periods, timepoints and horizons
    pub temporal: TemporalIndex,
    /// Load zones
    pub load_zones: LoadZoneMap,
    /// Static load by zone and timepoint, split into components
    pub load: LoadMap,
    /// Fuels
    pub fuels: FuelMap,
    /// Generator and storage projects
    pub projects: ProjectMap,
    /// Transmission lines (empty unless transmission is enabled)
    pub transmission_lines: TxLineMap,
    /// Balancing areas and requirements for each enabled reserve product
    pub reserves: IndexMap<ReserveType, ReserveData>,
    /// Carbon cap zones (empty unless the carbon cap is enabled)
    pub carbon_cap_zones: CarbonCapZoneMap,
    /// Carbon cap by zone and period
    pub carbon_caps: HashMap<(CarbonCapZoneID, u32), f64>,
    /// Capacity groups (empty unless capacity groups are enabled)
    pub capacity_groups: CapacityGroups,
    /// Transmission target zones (empty unless transmission targets are enabled)
    pub tx_target_zones: TxTargetZoneMap,
    /// Transmission targets by zone, balancing type and horizon
    pub tx_targets: TxTargetMap,
}

impl InputData {
    /// Get the data for a reserve product, which must be enabled
    pub fn reserve(&self, reserve: ReserveType) -> Result<&ReserveData> {
        self.reserves
            .get(&reserve)
            .with_context(|| format!("Reserve product {reserve} is not enabled"))
    }
}

/// Read and validate the input files for one model instance.
///
/// # Arguments
///
/// * `inputs_dir` - The instance's inputs directory
/// * `params` - The scenario's parameters, which determine which optional files are read
pub fn load_inputs(inputs_dir: &Path, params: &ScenarioParameters) -> Result<InputData> {
    ensure!(
        inputs_dir.is_dir(),
        "Inputs directory {} does not exist",
        inputs_dir.display()
    );

    let temporal = read_temporal_index(inputs_dir)?;
    let load_zones = read_load_zones(inputs_dir)?;
    let fuels = read_fuels(inputs_dir, &temporal)?;

    let mut reserves = IndexMap::new();
    for reserve in params.reserve_types() {
        let data = read_reserve_data(inputs_dir, reserve, &temporal)?;
        reserves.insert(reserve, data);
    }

    let (carbon_cap_zones, carbon_caps) = if params.has_feature(Feature::CarbonCap) {
        let zones = read_carbon_cap_zones(inputs_dir)?;
        let caps = read_carbon_caps(inputs_dir, &zones, &temporal)?;
        (zones, caps)
    } else {
        Default::default()
    };

    let projects = read_projects(
        inputs_dir,
        &temporal,
        &load_zones,
        &fuels,
        &reserves,
        &carbon_cap_zones,
    )?;
    let load = read_load(inputs_dir, &load_zones, &temporal)?;

    let mut transmission_lines = if params.has_feature(Feature::Transmission) {
        read_transmission_lines(inputs_dir, &load_zones, &temporal)?
    } else {
        TxLineMap::new()
    };

    let (tx_target_zones, tx_targets) = if params.has_feature(Feature::TransmissionTarget) {
        let zones = read_tx_target_zones(inputs_dir)?;
        let targets =
            read_transmission_targets(inputs_dir, &mut transmission_lines, &zones, &temporal)?;
        (zones, targets)
    } else {
        Default::default()
    };

    let capacity_groups = if params.has_feature(Feature::CapacityGroups) {
        read_capacity_groups(inputs_dir, &projects, &temporal)?
    } else {
        CapacityGroups::default()
    };

    debug!(
        "Read {} projects, {} load zones and {} timepoints from {}",
        projects.len(),
        load_zones.len(),
        temporal.iter_timepoints().count(),
        inputs_dir.display()
    );

    Ok(InputData {
        temporal,
        load_zones,
        load,
        fuels,
        projects,
        transmission_lines,
        reserves,
        carbon_cap_zones,
        carbon_caps,
        capacity_groups,
        tx_target_zones,
        tx_targets,
    })
}

/// Read a series of type `T`s from a tab-delimited file.
///
/// Returns an error if the file is empty.
pub fn read_tab<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_tab_internal(file_path)?;
    if vec.is_empty() {
        bail!("File {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a tab-delimited file.
///
/// Returns an empty iterator if the file does not exist.
pub fn read_tab_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    Ok(read_tab_internal(file_path)?.into_iter())
}

fn read_tab_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Deserialise an optional value, where `.` or an empty field means `None`
pub fn deserialise_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = String::deserialize(deserializer)?;
    let value = value.trim();
    if value.is_empty() || value == "." {
        return Ok(None);
    }

    value.parse().map(Some).map_err(D::Error::custom)
}

/// Deserialise a flag written as `0` or `1`
pub fn deserialise_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match u8::deserialize(deserializer)? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(D::Error::custom(format!(
            "Flag must be 0 or 1, but got {value}"
        ))),
    }
}

/// Check that a value is a fraction between 0 and 1 (inclusive)
pub fn check_fraction(value: f64, name: &str) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{name} must be between 0 and 1, but got {value}"
    );

    Ok(())
}

/// Check that a value is finite and not negative
pub fn check_non_negative(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a non-negative number, but got {value}"
    );

    Ok(())
}

/// Whether the items of an iterator are strictly increasing
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Insert a key-value pair into a HashMap if the key is not already present
pub fn try_insert<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + Hash + Clone + Debug,
{
    let existing = map.insert(key.clone(), value).is_some();
    ensure!(!existing, "Key {key:?} is repeated");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        id: String,
        value: u32,
        #[serde(default, deserialize_with = "deserialise_optional")]
        cost: Option<f64>,
        #[serde(deserialize_with = "deserialise_flag")]
        flag: bool,
    }

    /// Create an example tab-delimited file in dir_path
    fn create_tab_file(dir_path: &Path, contents: &str) -> std::path::PathBuf {
        let file_path = dir_path.join("test.tab");
        let mut file = fs::File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn read_tab_records() {
        let dir = tempdir().unwrap();
        let file_path = create_tab_file(
            dir.path(),
            "id\tvalue\tcost\tflag\nhello\t1\t2.5\t1\nworld\t2\t.\t0",
        );
        let records: Vec<Record> = read_tab(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                    cost: Some(2.5),
                    flag: true,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                    cost: None,
                    flag: false,
                }
            ]
        );
    }

    #[test]
    fn read_tab_empty_and_missing() {
        let dir = tempdir().unwrap();
        let file_path = create_tab_file(dir.path(), "id\tvalue\tcost\tflag");
        assert!(read_tab::<Record>(&file_path).is_err());
        assert_eq!(read_tab_optional::<Record>(&file_path).unwrap().count(), 0);

        let missing = dir.path().join("missing.tab");
        assert_eq!(read_tab_optional::<Record>(&missing).unwrap().count(), 0);
        assert!(read_tab::<Record>(&missing).is_err());
    }

    #[test]
    fn read_tab_bad_flag() {
        let dir = tempdir().unwrap();
        let file_path = create_tab_file(dir.path(), "id\tvalue\tcost\tflag\nhello\t1\t.\t2");
        assert!(read_tab::<Record>(&file_path).is_err());
    }

    #[test]
    fn read_toml_works() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Config {
            value: u32,
        }

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        fs::write(&file_path, "value = 1").unwrap();
        assert_eq!(
            read_toml::<Config>(&file_path).unwrap(),
            Config { value: 1 }
        );

        fs::write(&file_path, "value = \"one\"").unwrap();
        assert!(read_toml::<Config>(&file_path).is_err());
    }

    #[rstest]
    #[case(&[] as &[u32], true)]
    #[case(&[1], true)]
    #[case(&[1, 2, 5], true)]
    #[case(&[1, 1], false)]
    #[case(&[2, 1], false)]
    fn sorted_and_unique(#[case] values: &[u32], #[case] expected: bool) {
        assert_eq!(is_sorted_and_unique(values), expected);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(1.0, true)]
    #[case(-0.1, false)]
    #[case(1.1, false)]
    fn fraction_check(#[case] value: f64, #[case] ok: bool) {
        assert_eq!(check_fraction(value, "value").is_ok(), ok);
    }

    #[test]
    fn try_insert_repeated() {
        let mut map = HashMap::new();
        assert!(try_insert(&mut map, "a", 1).is_ok());
        assert!(try_insert(&mut map, "a", 2).is_err());
        assert_eq!(map["a"], 1);
    }
}

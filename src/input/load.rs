//! Code for reading static load.
use super::{check_non_negative, input_err_msg, read_tab, read_tab_optional, try_insert};
use crate::geography::{LoadZoneID, LoadZoneMap};
use crate::id::IDCollection;
use crate::temporal::TemporalIndex;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const LOAD_FILE_NAME: &str = "load_mw.tab";
const LOAD_DEFAULTS_FILE_NAME: &str = "load_level_defaults.tab";

/// Static load by load zone and timepoint, with the value of each load component
pub type LoadMap = IndexMap<(LoadZoneID, u32), IndexMap<String, f64>>;

#[derive(Deserialize)]
struct LoadRaw {
    load_zone: String,
    timepoint: u32,
    load_component: String,
    load_mw: f64,
}

#[derive(Deserialize)]
struct LoadDefaultRaw {
    load_zone: String,
    load_component: String,
    load_level_default: f64,
}

/// Read static load for every load zone and timepoint.
///
/// Load components missing for a timepoint take their default level, if one is given.
pub fn read_load(
    inputs_dir: &Path,
    load_zones: &LoadZoneMap,
    temporal: &TemporalIndex,
) -> Result<LoadMap> {
    let defaults_path = inputs_dir.join(LOAD_DEFAULTS_FILE_NAME);
    let defaults = read_load_defaults_from_iter(read_tab_optional(&defaults_path)?, load_zones)
        .with_context(|| input_err_msg(&defaults_path))?;

    let file_path = inputs_dir.join(LOAD_FILE_NAME);
    read_load_from_iter(read_tab(&file_path)?, load_zones, temporal, &defaults)
        .with_context(|| input_err_msg(&file_path))
}

fn read_load_defaults_from_iter<I>(
    iter: I,
    load_zones: &LoadZoneMap,
) -> Result<HashMap<(LoadZoneID, String), f64>>
where
    I: Iterator<Item = LoadDefaultRaw>,
{
    let mut defaults = HashMap::new();
    for raw in iter {
        let zone = load_zones.get_id(&raw.load_zone)?;
        check_non_negative(raw.load_level_default, "load_level_default")?;
        try_insert(
            &mut defaults,
            (zone.clone(), raw.load_component),
            raw.load_level_default,
        )?;
    }

    Ok(defaults)
}

fn read_load_from_iter<I>(
    iter: I,
    load_zones: &LoadZoneMap,
    temporal: &TemporalIndex,
    defaults: &HashMap<(LoadZoneID, String), f64>,
) -> Result<LoadMap>
where
    I: Iterator<Item = LoadRaw>,
{
    let mut values = HashMap::new();
    let mut components: IndexMap<LoadZoneID, IndexSet<String>> = IndexMap::new();
    for raw in iter {
        let zone = load_zones.get_id(&raw.load_zone)?;
        check_non_negative(raw.load_mw, "load_mw")?;
        components
            .entry(zone.clone())
            .or_default()
            .insert(raw.load_component.clone());
        if temporal.timepoint(raw.timepoint).is_ok() {
            try_insert(
                &mut values,
                (zone.clone(), raw.timepoint, raw.load_component),
                raw.load_mw,
            )?;
        }
    }
    for (zone, component) in defaults.keys() {
        components
            .entry(zone.clone())
            .or_default()
            .insert(component.clone());
    }

    let mut load = LoadMap::new();
    for zone in load_zones.keys() {
        let zone_components = components.get(zone);
        for tmp in temporal.iter_timepoints() {
            let mut levels = IndexMap::new();
            for component in zone_components.into_iter().flatten() {
                let key = (zone.clone(), tmp.id, component.clone());
                let level = match values.get(&key) {
                    Some(value) => *value,
                    None => *defaults
                        .get(&(zone.clone(), component.clone()))
                        .with_context(|| {
                            format!(
                                "No load given for index ({zone}, {}, {component}) and no \
                                default level for the component",
                                tmp.id
                            )
                        })?,
                };
                levels.insert(component.clone(), level);
            }
            load.insert((zone.clone(), tmp.id), levels);
        }
    }

    ensure!(
        load.values().any(|levels| !levels.is_empty()),
        "No load given for any load zone"
    );

    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, load_zones, temporal_index};
    use rstest::rstest;

    fn load_raw(tmp: u32, component: &str, load_mw: f64) -> LoadRaw {
        LoadRaw {
            load_zone: "z1".into(),
            timepoint: tmp,
            load_component: component.into(),
            load_mw,
        }
    }

    #[rstest]
    fn read_load_with_defaults(load_zones: LoadZoneMap, temporal_index: TemporalIndex) {
        let defaults = read_load_defaults_from_iter(
            [LoadDefaultRaw {
                load_zone: "z1".into(),
                load_component: "ev".into(),
                load_level_default: 5.0,
            }]
            .into_iter(),
            &load_zones,
        )
        .unwrap();
        let raw = (1..=4)
            .map(|tmp| load_raw(tmp, "base", 10.0 * f64::from(tmp)))
            .chain([load_raw(2, "ev", 7.0)]);
        let load = read_load_from_iter(raw, &load_zones, &temporal_index, &defaults).unwrap();

        let levels = &load[&(LoadZoneID::new("z1"), 1)];
        assert_eq!(levels["base"], 10.0);
        assert_eq!(levels["ev"], 5.0);
        assert_eq!(load[&(LoadZoneID::new("z1"), 2)]["ev"], 7.0);
    }

    #[rstest]
    fn read_load_missing_no_default(load_zones: LoadZoneMap, temporal_index: TemporalIndex) {
        let raw = (1..=3).map(|tmp| load_raw(tmp, "base", 10.0));
        let result = read_load_from_iter(raw, &load_zones, &temporal_index, &HashMap::new());
        assert_error!(
            result,
            "No load given for index (z1, 4, base) and no default level for the component"
        );
    }

    #[rstest]
    fn read_load_unknown_zone(load_zones: LoadZoneMap, temporal_index: TemporalIndex) {
        let raw = [LoadRaw {
            load_zone: "z9".into(),
            timepoint: 1,
            load_component: "base".into(),
            load_mw: 1.0,
        }];
        let result =
            read_load_from_iter(raw.into_iter(), &load_zones, &temporal_index, &HashMap::new());
        assert_error!(result, "Unknown ID z9 found");
    }
}

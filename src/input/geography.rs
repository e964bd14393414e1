//! Code for reading load zones, policy zones and carbon caps.
use super::{
    check_non_negative, deserialise_flag, deserialise_optional, input_err_msg, read_tab,
    try_insert,
};
use crate::geography::{
    CarbonCapZone, CarbonCapZoneID, CarbonCapZoneMap, LoadZone, LoadZoneMap, TxTargetZone,
    TxTargetZoneMap,
};
use crate::id::IDCollection;
use crate::temporal::TemporalIndex;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const LOAD_ZONES_FILE_NAME: &str = "load_zones.tab";
const CARBON_CAP_ZONES_FILE_NAME: &str = "carbon_cap_zones.tab";
const CARBON_CAP_FILE_NAME: &str = "carbon_cap.tab";
const TX_TARGET_ZONES_FILE_NAME: &str = "transmission_target_zones.tab";

#[derive(Deserialize)]
struct LoadZoneRaw {
    load_zone: String,
    #[serde(deserialize_with = "deserialise_flag")]
    allow_overgeneration: bool,
    #[serde(default, deserialize_with = "deserialise_optional")]
    overgeneration_penalty_per_mw: Option<f64>,
    #[serde(deserialize_with = "deserialise_flag")]
    allow_unserved_energy: bool,
    #[serde(default, deserialize_with = "deserialise_optional")]
    unserved_energy_penalty_per_mwh: Option<f64>,
}

#[derive(Deserialize)]
struct CarbonCapZoneRaw {
    carbon_cap_zone: String,
    #[serde(deserialize_with = "deserialise_flag")]
    allow_violation: bool,
    #[serde(default, deserialize_with = "deserialise_optional")]
    violation_penalty_per_emission: Option<f64>,
}

#[derive(Deserialize)]
struct TxTargetZoneRaw {
    transmission_target_zone: String,
    #[serde(deserialize_with = "deserialise_flag")]
    allow_violation: bool,
    #[serde(default, deserialize_with = "deserialise_optional")]
    violation_penalty_per_mwh: Option<f64>,
}

#[derive(Deserialize)]
struct CarbonCapRaw {
    carbon_cap_zone: String,
    period: u32,
    carbon_cap: f64,
}

/// Read load zones from the inputs directory
pub fn read_load_zones(inputs_dir: &Path) -> Result<LoadZoneMap> {
    let file_path = inputs_dir.join(LOAD_ZONES_FILE_NAME);
    read_load_zones_from_iter(read_tab(&file_path)?).with_context(|| input_err_msg(&file_path))
}

fn read_load_zones_from_iter<I>(iter: I) -> Result<LoadZoneMap>
where
    I: Iterator<Item = LoadZoneRaw>,
{
    let mut zones = LoadZoneMap::new();
    for raw in iter {
        let overgeneration_penalty_per_mw = raw.overgeneration_penalty_per_mw.unwrap_or(0.0);
        let unserved_energy_penalty_per_mwh = raw.unserved_energy_penalty_per_mwh.unwrap_or(0.0);
        check_non_negative(overgeneration_penalty_per_mw, "overgeneration_penalty_per_mw")?;
        check_non_negative(
            unserved_energy_penalty_per_mwh,
            "unserved_energy_penalty_per_mwh",
        )?;

        let zone = LoadZone {
            id: raw.load_zone.as_str().into(),
            allow_overgeneration: raw.allow_overgeneration,
            overgeneration_penalty_per_mw,
            allow_unserved_energy: raw.allow_unserved_energy,
            unserved_energy_penalty_per_mwh,
        };
        ensure!(
            zones.insert(zone.id.clone(), zone).is_none(),
            "Load zone {} is repeated",
            raw.load_zone
        );
    }

    Ok(zones)
}

/// Read carbon cap zones from the inputs directory
pub fn read_carbon_cap_zones(inputs_dir: &Path) -> Result<CarbonCapZoneMap> {
    let file_path = inputs_dir.join(CARBON_CAP_ZONES_FILE_NAME);
    read_carbon_cap_zones_from_iter(read_tab(&file_path)?)
        .with_context(|| input_err_msg(&file_path))
}

fn read_carbon_cap_zones_from_iter<I>(iter: I) -> Result<CarbonCapZoneMap>
where
    I: Iterator<Item = CarbonCapZoneRaw>,
{
    let mut zones = CarbonCapZoneMap::new();
    for raw in iter {
        let violation_penalty_per_emission = raw.violation_penalty_per_emission.unwrap_or(0.0);
        check_non_negative(
            violation_penalty_per_emission,
            "violation_penalty_per_emission",
        )?;

        let zone = CarbonCapZone {
            id: raw.carbon_cap_zone.as_str().into(),
            allow_violation: raw.allow_violation,
            violation_penalty_per_emission,
        };
        ensure!(
            zones.insert(zone.id.clone(), zone).is_none(),
            "Carbon cap zone {} is repeated",
            raw.carbon_cap_zone
        );
    }

    Ok(zones)
}

/// Read transmission target zones from the inputs directory
pub fn read_tx_target_zones(inputs_dir: &Path) -> Result<TxTargetZoneMap> {
    let file_path = inputs_dir.join(TX_TARGET_ZONES_FILE_NAME);
    read_tx_target_zones_from_iter(read_tab(&file_path)?)
        .with_context(|| input_err_msg(&file_path))
}

fn read_tx_target_zones_from_iter<I>(iter: I) -> Result<TxTargetZoneMap>
where
    I: Iterator<Item = TxTargetZoneRaw>,
{
    let mut zones = TxTargetZoneMap::new();
    for raw in iter {
        let violation_penalty_per_mwh = raw.violation_penalty_per_mwh.unwrap_or(0.0);
        check_non_negative(violation_penalty_per_mwh, "violation_penalty_per_mwh")?;

        let zone = TxTargetZone {
            id: raw.transmission_target_zone.as_str().into(),
            allow_violation: raw.allow_violation,
            violation_penalty_per_mwh,
        };
        ensure!(
            zones.insert(zone.id.clone(), zone).is_none(),
            "Transmission target zone {} is repeated",
            raw.transmission_target_zone
        );
    }

    Ok(zones)
}

/// Read carbon caps by zone and period.
///
/// Caps for periods not in this instance are ignored. Zones without a cap in a period are not
/// constrained in that period.
pub fn read_carbon_caps(
    inputs_dir: &Path,
    zones: &CarbonCapZoneMap,
    temporal: &TemporalIndex,
) -> Result<HashMap<(CarbonCapZoneID, u32), f64>> {
    let file_path = inputs_dir.join(CARBON_CAP_FILE_NAME);
    read_carbon_caps_from_iter(read_tab(&file_path)?, zones, temporal)
        .with_context(|| input_err_msg(&file_path))
}

fn read_carbon_caps_from_iter<I>(
    iter: I,
    zones: &CarbonCapZoneMap,
    temporal: &TemporalIndex,
) -> Result<HashMap<(CarbonCapZoneID, u32), f64>>
where
    I: Iterator<Item = CarbonCapRaw>,
{
    let mut caps = HashMap::new();
    for raw in iter {
        let zone_id = zones.get_id(&raw.carbon_cap_zone)?;
        check_non_negative(raw.carbon_cap, "carbon_cap")?;
        if temporal.has_period(raw.period) {
            try_insert(&mut caps, (zone_id.clone(), raw.period), raw.carbon_cap)?;
        }
    }

    Ok(caps)
}

//! Code for reading transmission lines and transmission targets.
use super::{
    check_non_negative, deserialise_flag, deserialise_optional, input_err_msg, read_tab,
    read_tab_optional,
};
use crate::geography::{LoadZoneMap, TxTargetZoneMap};
use crate::id::IDCollection;
use crate::temporal::{BalancingType, TemporalIndex};
use crate::transmission::{
    TxCapacityType, TxLine, TxLineMap, TxNewBuildVintage, TxOperationalType,
    TxSpecifiedCapacity, TxTarget, TxTargetMap,
};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const TX_LINES_FILE_NAME: &str = "transmission_lines.tab";
const TX_CAPACITIES_FILE_NAME: &str = "specified_transmission_line_capacities.tab";
const TX_NEW_BUILD_FILE_NAME: &str = "new_build_transmission_vintage_costs.tab";
const TX_LINE_TARGET_ZONES_FILE_NAME: &str = "transmission_line_transmission_target_zones.tab";
const TX_TARGETS_FILE_NAME: &str = "transmission_targets.tab";

#[derive(Deserialize)]
struct TxLineRaw {
    transmission_line: String,
    load_zone_from: String,
    load_zone_to: String,
    tx_capacity_type: TxCapacityType,
    tx_operational_type: TxOperationalType,
    #[serde(default, deserialize_with = "deserialise_optional")]
    tx_simple_loss_factor: Option<f64>,
}

#[derive(Deserialize)]
struct TxCapacityRaw {
    transmission_line: String,
    period: u32,
    min_mw: f64,
    max_mw: f64,
    #[serde(default, deserialize_with = "deserialise_optional")]
    fixed_cost_per_mw_yr: Option<f64>,
}

#[derive(Deserialize)]
struct TxNewBuildRaw {
    transmission_line: String,
    vintage: u32,
    tx_lifetime_yrs: u32,
    tx_annualized_real_cost_per_mw_yr: f64,
}

#[derive(Deserialize)]
struct TxLineTargetZoneRaw {
    transmission_line: String,
    transmission_target_zone: String,
    #[serde(deserialize_with = "deserialise_flag")]
    contributes_net_flow_to_transmission_target: bool,
}

#[derive(Deserialize)]
struct TxTargetRaw {
    transmission_target_zone: String,
    balancing_type: String,
    horizon: u32,
    #[serde(default, deserialize_with = "deserialise_optional")]
    transmission_target_pos_dir_mwh: Option<f64>,
    #[serde(default, deserialize_with = "deserialise_optional")]
    transmission_target_neg_dir_mwh: Option<f64>,
}

/// Read transmission lines and their capacities
pub fn read_transmission_lines(
    inputs_dir: &Path,
    load_zones: &LoadZoneMap,
    temporal: &TemporalIndex,
) -> Result<TxLineMap> {
    let file_path = inputs_dir.join(TX_LINES_FILE_NAME);
    let mut lines = read_tx_lines_from_iter(read_tab(&file_path)?, load_zones)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(TX_CAPACITIES_FILE_NAME);
    read_tx_capacities_from_iter(read_tab_optional(&file_path)?, &mut lines, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(TX_NEW_BUILD_FILE_NAME);
    read_tx_new_build_from_iter(read_tab_optional(&file_path)?, &mut lines, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(lines)
}

fn read_tx_lines_from_iter<I>(iter: I, load_zones: &LoadZoneMap) -> Result<TxLineMap>
where
    I: Iterator<Item = TxLineRaw>,
{
    let mut lines = TxLineMap::new();
    for raw in iter {
        let load_zone_from = load_zones.get_id(&raw.load_zone_from)?.clone();
        let load_zone_to = load_zones.get_id(&raw.load_zone_to)?.clone();
        ensure!(
            load_zone_from != load_zone_to,
            "Transmission line {} must connect two different load zones",
            raw.transmission_line
        );
        let loss_factor = raw.tx_simple_loss_factor.unwrap_or(0.0);
        ensure!(
            (0.0..1.0).contains(&loss_factor),
            "Loss factor of transmission line {} must be in the range [0, 1)",
            raw.transmission_line
        );

        let line = TxLine {
            id: raw.transmission_line.as_str().into(),
            load_zone_from,
            load_zone_to,
            capacity_type: raw.tx_capacity_type,
            operational_type: raw.tx_operational_type,
            loss_factor,
            capacity: IndexMap::new(),
            new_build_vintages: IndexMap::new(),
            tx_target_zone: None,
            contributes_net_flow_to_tx_target: false,
        };
        ensure!(
            lines.insert(line.id.clone(), line).is_none(),
            "Transmission line {} is repeated",
            raw.transmission_line
        );
    }

    Ok(lines)
}

fn read_tx_capacities_from_iter<I>(
    iter: I,
    lines: &mut TxLineMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = TxCapacityRaw>,
{
    for raw in iter {
        let id = lines.get_id(&raw.transmission_line)?.clone();
        check_capacity_type(&lines[&id], TxCapacityType::Specified)?;
        ensure!(
            raw.min_mw <= 0.0 && raw.max_mw >= 0.0,
            "Capacity of transmission line {id} in period {} must have min_mw <= 0 <= max_mw",
            raw.period
        );
        let fixed_cost_per_mw_yr = raw.fixed_cost_per_mw_yr.unwrap_or(0.0);
        check_non_negative(fixed_cost_per_mw_yr, "fixed_cost_per_mw_yr")?;
        if !temporal.has_period(raw.period) {
            continue;
        }

        let capacity = TxSpecifiedCapacity {
            min_mw: raw.min_mw,
            max_mw: raw.max_mw,
            fixed_cost_per_mw_yr,
        };
        ensure!(
            lines[&id].capacity.insert(raw.period, capacity).is_none(),
            "Capacity of transmission line {id} in period {} is repeated",
            raw.period
        );
    }

    Ok(())
}

fn check_capacity_type(line: &TxLine, expected: TxCapacityType) -> Result<()> {
    ensure!(
        line.capacity_type == expected,
        "Transmission line {} has capacity type {}, but the file is for {}",
        line.id,
        line.capacity_type.label(),
        expected.label()
    );

    Ok(())
}

fn read_tx_new_build_from_iter<I>(
    iter: I,
    lines: &mut TxLineMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = TxNewBuildRaw>,
{
    for raw in iter {
        let id = lines.get_id(&raw.transmission_line)?.clone();
        check_capacity_type(&lines[&id], TxCapacityType::NewLin)?;
        ensure!(
            raw.tx_lifetime_yrs > 0,
            "Lifetime of transmission line {id} vintage {} must be positive",
            raw.vintage
        );
        check_non_negative(
            raw.tx_annualized_real_cost_per_mw_yr,
            "tx_annualized_real_cost_per_mw_yr",
        )?;
        if !temporal.has_period(raw.vintage) {
            continue;
        }

        let params = TxNewBuildVintage {
            lifetime_yrs: raw.tx_lifetime_yrs,
            annualized_real_cost_per_mw_yr: raw.tx_annualized_real_cost_per_mw_yr,
        };
        ensure!(
            lines[&id]
                .new_build_vintages
                .insert(raw.vintage, params)
                .is_none(),
            "Vintage {} of transmission line {id} is repeated",
            raw.vintage
        );
    }

    Ok(())
}

/// Read which lines count towards each transmission target zone, and the zones' targets.
///
/// Targets for horizons which are not part of this instance are ignored.
pub fn read_transmission_targets(
    inputs_dir: &Path,
    lines: &mut TxLineMap,
    zones: &TxTargetZoneMap,
    temporal: &TemporalIndex,
) -> Result<TxTargetMap> {
    let file_path = inputs_dir.join(TX_LINE_TARGET_ZONES_FILE_NAME);
    read_tx_line_target_zones_from_iter(read_tab(&file_path)?, lines, zones)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(TX_TARGETS_FILE_NAME);
    read_tx_targets_from_iter(read_tab(&file_path)?, zones, temporal)
        .with_context(|| input_err_msg(&file_path))
}

fn read_tx_line_target_zones_from_iter<I>(
    iter: I,
    lines: &mut TxLineMap,
    zones: &TxTargetZoneMap,
) -> Result<()>
where
    I: Iterator<Item = TxLineTargetZoneRaw>,
{
    for raw in iter {
        let id = lines.get_id(&raw.transmission_line)?.clone();
        let zone = zones.get_id(&raw.transmission_target_zone)?.clone();
        let line = &mut lines[&id];
        ensure!(
            line.tx_target_zone.is_none(),
            "Transmission line {id} is assigned to more than one transmission target zone"
        );
        line.tx_target_zone = Some(zone);
        line.contributes_net_flow_to_tx_target = raw.contributes_net_flow_to_transmission_target;
    }

    Ok(())
}

fn read_tx_targets_from_iter<I>(
    iter: I,
    zones: &TxTargetZoneMap,
    temporal: &TemporalIndex,
) -> Result<TxTargetMap>
where
    I: Iterator<Item = TxTargetRaw>,
{
    let mut targets = TxTargetMap::new();
    for raw in iter {
        let zone = zones.get_id(&raw.transmission_target_zone)?.clone();
        let target = TxTarget {
            pos_dir_min_mwh: raw.transmission_target_pos_dir_mwh.unwrap_or(0.0),
            neg_dir_min_mwh: raw.transmission_target_neg_dir_mwh.unwrap_or(0.0),
        };
        check_non_negative(target.pos_dir_min_mwh, "transmission_target_pos_dir_mwh")?;
        check_non_negative(target.neg_dir_min_mwh, "transmission_target_neg_dir_mwh")?;

        let balancing_type = BalancingType::from(raw.balancing_type);
        if temporal.horizon(&balancing_type, raw.horizon).is_none() {
            continue;
        }
        ensure!(
            targets
                .insert((zone.clone(), balancing_type.clone(), raw.horizon), target)
                .is_none(),
            "Transmission target for zone {zone} in {balancing_type} horizon {} is repeated",
            raw.horizon
        );
    }

    Ok(targets)
}

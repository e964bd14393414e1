//! Code for reading balancing areas and requirements for reserve products.
use super::{
    check_non_negative, deserialise_flag, deserialise_optional, input_err_msg, read_tab,
    try_insert,
};
use crate::id::IDCollection;
use crate::reserves::{BalancingArea, BalancingAreaID, ReserveData, ReserveType};
use crate::temporal::TemporalIndex;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Deserialize)]
struct BalancingAreaRaw {
    balancing_area: String,
    #[serde(deserialize_with = "deserialise_flag")]
    allow_violation: bool,
    #[serde(default, deserialize_with = "deserialise_optional")]
    violation_penalty_per_mw: Option<f64>,
}

#[derive(Deserialize)]
struct RequirementRaw {
    balancing_area: String,
    timepoint: u32,
    requirement_mw: f64,
}

/// Read the balancing areas and requirements for a reserve product.
///
/// These are read from `<reserve>_balancing_areas.tab` and `<reserve>_requirement.tab`.
pub fn read_reserve_data(
    inputs_dir: &Path,
    reserve: ReserveType,
    temporal: &TemporalIndex,
) -> Result<ReserveData> {
    let file_path = inputs_dir.join(format!("{reserve}_balancing_areas.tab"));
    let balancing_areas = read_balancing_areas_from_iter(read_tab(&file_path)?)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(format!("{reserve}_requirement.tab"));
    let requirement = read_requirement_from_iter(read_tab(&file_path)?, &balancing_areas, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(ReserveData {
        balancing_areas,
        requirement,
    })
}

fn read_balancing_areas_from_iter<I>(
    iter: I,
) -> Result<IndexMap<BalancingAreaID, BalancingArea>>
where
    I: Iterator<Item = BalancingAreaRaw>,
{
    let mut areas = IndexMap::new();
    for raw in iter {
        let violation_penalty_per_mw = raw.violation_penalty_per_mw.unwrap_or(0.0);
        check_non_negative(violation_penalty_per_mw, "violation_penalty_per_mw")?;

        let area = BalancingArea {
            id: raw.balancing_area.as_str().into(),
            allow_violation: raw.allow_violation,
            violation_penalty_per_mw,
        };
        ensure!(
            areas.insert(area.id.clone(), area).is_none(),
            "Balancing area {} is repeated",
            raw.balancing_area
        );
    }

    Ok(areas)
}

fn read_requirement_from_iter<I>(
    iter: I,
    balancing_areas: &IndexMap<BalancingAreaID, BalancingArea>,
    temporal: &TemporalIndex,
) -> Result<HashMap<(BalancingAreaID, u32), f64>>
where
    I: Iterator<Item = RequirementRaw>,
{
    let mut requirement = HashMap::new();
    for raw in iter {
        let ba = balancing_areas.get_id(&raw.balancing_area)?;
        check_non_negative(raw.requirement_mw, "requirement_mw")?;
        if temporal.timepoint(raw.timepoint).is_ok() {
            try_insert(
                &mut requirement,
                (ba.clone(), raw.timepoint),
                raw.requirement_mw,
            )?;
        }
    }

    Ok(requirement)
}

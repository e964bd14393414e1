//! Code for reading fuels and fuel prices.
use super::{
    check_non_negative, deserialise_optional, input_err_msg, read_tab_optional, try_insert,
};
use crate::fuel::{Fuel, FuelMap};
use crate::id::IDCollection;
use crate::temporal::TemporalIndex;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const FUELS_FILE_NAME: &str = "fuels.tab";
const FUEL_PRICES_FILE_NAME: &str = "fuel_prices.tab";

#[derive(Deserialize)]
struct FuelRaw {
    fuel: String,
    co2_intensity_tons_per_mmbtu: f64,
    #[serde(default, deserialize_with = "deserialise_optional")]
    fuel_group: Option<String>,
}

#[derive(Deserialize)]
struct FuelPriceRaw {
    fuel: String,
    period: u32,
    month: u32,
    fuel_price_per_mmbtu: f64,
}

/// Read fuels and their prices.
///
/// Both files are optional, as a system may have no fuel-burning projects.
pub fn read_fuels(inputs_dir: &Path, temporal: &TemporalIndex) -> Result<FuelMap> {
    let file_path = inputs_dir.join(FUELS_FILE_NAME);
    let mut fuels = read_fuels_from_iter(read_tab_optional(&file_path)?)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(FUEL_PRICES_FILE_NAME);
    read_fuel_prices_from_iter(read_tab_optional(&file_path)?, &mut fuels, temporal)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(fuels)
}

fn read_fuels_from_iter<I>(iter: I) -> Result<FuelMap>
where
    I: Iterator<Item = FuelRaw>,
{
    let mut fuels = FuelMap::new();
    for raw in iter {
        ensure!(
            raw.co2_intensity_tons_per_mmbtu.is_finite(),
            "Invalid carbon intensity for fuel {}",
            raw.fuel
        );

        let fuel = Fuel {
            id: raw.fuel.as_str().into(),
            co2_intensity_tons_per_mmbtu: raw.co2_intensity_tons_per_mmbtu,
            fuel_group: raw.fuel_group,
            prices: HashMap::new(),
        };
        ensure!(
            fuels.insert(fuel.id.clone(), fuel).is_none(),
            "Fuel {} is repeated",
            raw.fuel
        );
    }

    Ok(fuels)
}

fn read_fuel_prices_from_iter<I>(
    iter: I,
    fuels: &mut FuelMap,
    temporal: &TemporalIndex,
) -> Result<()>
where
    I: Iterator<Item = FuelPriceRaw>,
{
    for raw in iter {
        let id = fuels.get_id(&raw.fuel)?.clone();
        check_non_negative(raw.fuel_price_per_mmbtu, "fuel_price_per_mmbtu")?;
        if !temporal.has_period(raw.period) {
            continue;
        }

        let fuel = &mut fuels[&id];
        try_insert(
            &mut fuel.prices,
            (raw.period, raw.month),
            raw.fuel_price_per_mmbtu,
        )
        .with_context(|| format!("Repeated price for fuel {id}"))?;
    }

    Ok(())
}

//! Fuels burned by projects.
use crate::id::define_id_type;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

define_id_type! {FuelID}

/// A fuel, with its carbon content and prices
#[derive(Clone, Debug, PartialEq)]
pub struct Fuel {
    /// The fuel's ID
    pub id: FuelID,
    /// Carbon intensity (may be negative, e.g. for some biofuels)
    pub co2_intensity_tons_per_mmbtu: f64,
    /// An optional group to which the fuel belongs
    pub fuel_group: Option<String>,
    /// Prices by period and month
    pub prices: HashMap<(u32, u32), f64>,
}

impl Fuel {
    /// The price of the fuel in the given period and month
    pub fn price(&self, period: u32, month: u32) -> Result<f64> {
        self.prices.get(&(period, month)).copied().with_context(|| {
            format!(
                "No price for fuel {} in period {period}, month {month}",
                self.id
            )
        })
    }
}

/// A map of fuels, keyed by ID
pub type FuelMap = IndexMap<FuelID, Fuel>;

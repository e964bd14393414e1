//! Code for reading periods, timepoints and horizons.
use super::{check_non_negative, input_err_msg, read_tab};
use crate::temporal::{BalancingType, Boundary, Horizon, Period, TemporalIndex, Timepoint};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const PERIODS_FILE_NAME: &str = "periods.tab";
const TIMEPOINTS_FILE_NAME: &str = "timepoints.tab";
const HORIZONS_FILE_NAME: &str = "horizons.tab";
const HORIZON_TIMEPOINTS_FILE_NAME: &str = "horizon_timepoints.tab";

#[derive(Deserialize)]
struct PeriodRaw {
    period: u32,
    discount_factor: f64,
    period_start_year: u32,
    period_end_year: u32,
    hours_in_period_timepoints: f64,
}

#[derive(Deserialize)]
struct TimepointRaw {
    timepoint: u32,
    period: u32,
    timepoint_weight: f64,
    number_of_hours_in_timepoint: f64,
    month: u32,
}

#[derive(Deserialize)]
struct HorizonRaw {
    balancing_type_horizon: String,
    horizon: u32,
    boundary: Boundary,
}

#[derive(Deserialize)]
struct HorizonTimepointRaw {
    balancing_type_horizon: String,
    horizon: u32,
    timepoint: u32,
}

/// Read the temporal index from the inputs directory
pub fn read_temporal_index(inputs_dir: &Path) -> Result<TemporalIndex> {
    let file_path = inputs_dir.join(PERIODS_FILE_NAME);
    let periods =
        read_periods_from_iter(read_tab(&file_path)?).with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(TIMEPOINTS_FILE_NAME);
    let timepoints = read_timepoints_from_iter(read_tab(&file_path)?)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(HORIZONS_FILE_NAME);
    let mut horizons = read_horizons_from_iter(read_tab(&file_path)?)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = inputs_dir.join(HORIZON_TIMEPOINTS_FILE_NAME);
    assign_horizon_timepoints(read_tab(&file_path)?, &mut horizons)
        .with_context(|| input_err_msg(&file_path))?;

    TemporalIndex::new(periods, timepoints, horizons)
}

fn read_periods_from_iter<I>(iter: I) -> Result<IndexMap<u32, Period>>
where
    I: Iterator<Item = PeriodRaw>,
{
    let mut periods = IndexMap::new();
    for raw in iter {
        ensure!(
            raw.discount_factor.is_finite() && raw.discount_factor > 0.0,
            "Discount factor for period {} must be positive",
            raw.period
        );
        check_non_negative(raw.hours_in_period_timepoints, "hours_in_period_timepoints")?;

        let period = Period {
            id: raw.period,
            discount_factor: raw.discount_factor,
            start_year: raw.period_start_year,
            end_year: raw.period_end_year,
            hours_in_period_timepoints: raw.hours_in_period_timepoints,
        };
        ensure!(
            periods.insert(raw.period, period).is_none(),
            "Period {} is repeated",
            raw.period
        );
    }

    Ok(periods)
}

fn read_timepoints_from_iter<I>(iter: I) -> Result<IndexMap<u32, Timepoint>>
where
    I: Iterator<Item = TimepointRaw>,
{
    let mut timepoints = IndexMap::new();
    for raw in iter {
        ensure!(
            raw.number_of_hours_in_timepoint > 0.0,
            "Timepoint {} must have a positive number of hours",
            raw.timepoint
        );
        check_non_negative(raw.timepoint_weight, "timepoint_weight")?;
        ensure!(
            (1..=12).contains(&raw.month),
            "Month of timepoint {} must be between 1 and 12",
            raw.timepoint
        );

        let timepoint = Timepoint {
            id: raw.timepoint,
            period: raw.period,
            weight: raw.timepoint_weight,
            hours: raw.number_of_hours_in_timepoint,
            month: raw.month,
        };
        ensure!(
            timepoints.insert(raw.timepoint, timepoint).is_none(),
            "Timepoint {} is repeated",
            raw.timepoint
        );
    }

    Ok(timepoints)
}

fn read_horizons_from_iter<I>(iter: I) -> Result<IndexMap<(BalancingType, u32), Horizon>>
where
    I: Iterator<Item = HorizonRaw>,
{
    let mut horizons = IndexMap::new();
    for raw in iter {
        let balancing_type = BalancingType::from(raw.balancing_type_horizon);
        let horizon = Horizon {
            balancing_type: balancing_type.clone(),
            id: raw.horizon,
            boundary: raw.boundary,
            timepoints: Vec::new(),
        };
        ensure!(
            horizons
                .insert((balancing_type.clone(), raw.horizon), horizon)
                .is_none(),
            "Horizon {} of balancing type {balancing_type} is repeated",
            raw.horizon
        );
    }

    Ok(horizons)
}

fn assign_horizon_timepoints<I>(
    iter: I,
    horizons: &mut IndexMap<(BalancingType, u32), Horizon>,
) -> Result<()>
where
    I: Iterator<Item = HorizonTimepointRaw>,
{
    for raw in iter {
        let key = (BalancingType::from(raw.balancing_type_horizon), raw.horizon);
        let horizon = horizons.get_mut(&key).with_context(|| {
            format!(
                "Horizon {} of balancing type {} is not defined",
                key.1, key.0
            )
        })?;
        horizon.timepoints.push(raw.timepoint);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    fn horizon_raw(balancing_type: &str, horizon: u32) -> HorizonRaw {
        HorizonRaw {
            balancing_type_horizon: balancing_type.into(),
            horizon,
            boundary: Boundary::Circular,
        }
    }

    #[test]
    fn read_horizons_repeated() {
        let result = read_horizons_from_iter(
            [horizon_raw("day", 1), horizon_raw("day", 1)].into_iter(),
        );
        assert_error!(result, "Horizon 1 of balancing type day is repeated");
    }

    #[test]
    fn assign_unknown_horizon() {
        let mut horizons = read_horizons_from_iter([horizon_raw("day", 1)].into_iter()).unwrap();
        let result = assign_horizon_timepoints(
            [HorizonTimepointRaw {
                balancing_type_horizon: "week".into(),
                horizon: 1,
                timepoint: 1,
            }]
            .into_iter(),
            &mut horizons,
        );
        assert_error!(result, "Horizon 1 of balancing type week is not defined");
    }

    #[test]
    fn read_timepoints_bad_month() {
        let result = read_timepoints_from_iter(
            [TimepointRaw {
                timepoint: 1,
                period: 2030,
                timepoint_weight: 1.0,
                number_of_hours_in_timepoint: 1.0,
                month: 13,
            }]
            .into_iter(),
        );
        assert_error!(result, "Month of timepoint 1 must be between 1 and 12");
    }

    #[test]
    fn read_periods_bad_discount_factor() {
        let result = read_periods_from_iter(
            [PeriodRaw {
                period: 2030,
                discount_factor: 0.0,
                period_start_year: 2030,
                period_end_year: 2040,
                hours_in_period_timepoints: 8760.0,
            }]
            .into_iter(),
        );
        assert_error!(result, "Discount factor for period 2030 must be positive");
    }
}

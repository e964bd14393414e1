//! The temporal index shared by all model modules.
//!
//! Timepoints are the finest operational time step. Each belongs to one investment period and,
//! for every balancing type (e.g. "day", "year"), to exactly one horizon. Intertemporal
//! constraints such as storage energy tracking are applied within horizons.
use crate::id::define_id_type;
use crate::input::is_sorted_and_unique;
use anyhow::{Context, Result, ensure};
use float_cmp::approx_eq;
use indexmap::{IndexMap, IndexSet};
use log::warn;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashMap;

define_id_type! {BalancingType}

/// Relative tolerance used when checking the hours represented by a period's timepoints
const PERIOD_HOURS_TOLERANCE: f64 = 1e-6;

/// Whether two numbers of hours are equal, within tolerance
fn hours_match(a: f64, b: f64) -> bool {
    approx_eq!(f64, a, b, epsilon = PERIOD_HOURS_TOLERANCE * b.abs().max(1.0))
}

/// An investment period
#[derive(Clone, Debug, PartialEq)]
pub struct Period {
    /// The period's ID, conventionally its first year (e.g. 2030)
    pub id: u32,
    /// Discount factor applied to all costs incurred in the period
    pub discount_factor: f64,
    /// First year represented by the period
    pub start_year: u32,
    /// Year after the last year represented by the period
    pub end_year: u32,
    /// Number of hours represented by the period's timepoints
    pub hours_in_period_timepoints: f64,
}

impl Period {
    /// The number of years represented by the period
    pub fn number_years_represented(&self) -> f64 {
        f64::from(self.end_year - self.start_year)
    }

    /// Weight applied to annual costs incurred in this period in the objective function
    pub fn objective_weight(&self) -> f64 {
        self.discount_factor * self.number_years_represented()
    }
}

/// An operational time step
#[derive(Clone, Debug, PartialEq)]
pub struct Timepoint {
    /// The timepoint's ID (e.g. 20300101)
    pub id: u32,
    /// The period to which this timepoint belongs
    pub period: u32,
    /// Number of timepoints of this type represented by this one in the period
    pub weight: f64,
    /// Length of the timepoint in hours
    pub hours: f64,
    /// Month of the year (1-12)
    pub month: u32,
}

impl Timepoint {
    /// Hours represented by this timepoint in a year of its period
    pub fn weighted_hours(&self) -> f64 {
        self.hours * self.weight
    }
}

/// What happens at the edges of a horizon
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// The first timepoint follows the last
    #[string = "circular"]
    Circular,
    /// The first timepoint has no predecessor
    #[string = "linear"]
    Linear,
    /// Linked to the previous subproblem. Treated as linear because subproblems are solved
    /// independently.
    #[string = "linked"]
    Linked,
}

/// A group of contiguous timepoints for a given balancing type
#[derive(Clone, Debug, PartialEq)]
pub struct Horizon {
    /// The balancing type of this horizon
    pub balancing_type: BalancingType,
    /// The horizon's ID
    pub id: u32,
    /// Boundary condition
    pub boundary: Boundary,
    /// The horizon's timepoints, in order
    pub timepoints: Vec<u32>,
}

/// The periods, timepoints and horizons of one model instance
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalIndex {
    periods: IndexMap<u32, Period>,
    timepoints: IndexMap<u32, Timepoint>,
    horizons: IndexMap<(BalancingType, u32), Horizon>,
    horizon_of_timepoint: HashMap<(BalancingType, u32), u32>,
}

impl TemporalIndex {
    /// Create a new temporal index, checking its consistency.
    ///
    /// # Arguments
    ///
    /// * `periods` - The periods, in order
    /// * `timepoints` - The timepoints, in order
    /// * `horizons` - Horizons with their timepoints (in any order)
    pub fn new(
        periods: IndexMap<u32, Period>,
        timepoints: IndexMap<u32, Timepoint>,
        horizons: IndexMap<(BalancingType, u32), Horizon>,
    ) -> Result<Self> {
        ensure!(!periods.is_empty(), "No periods defined");
        ensure!(!timepoints.is_empty(), "No timepoints defined");
        ensure!(
            is_sorted_and_unique(periods.keys()),
            "Periods must be listed in increasing order"
        );
        ensure!(
            is_sorted_and_unique(timepoints.keys()),
            "Timepoints must be listed in increasing order"
        );

        for period in periods.values() {
            ensure!(
                period.end_year > period.start_year,
                "Period {} must end after it starts",
                period.id
            );
        }
        for tmp in timepoints.values() {
            ensure!(
                periods.contains_key(&tmp.period),
                "Timepoint {} belongs to unknown period {}",
                tmp.id,
                tmp.period
            );
        }

        let position: HashMap<u32, usize> = timepoints
            .keys()
            .enumerate()
            .map(|(pos, tmp)| (*tmp, pos))
            .collect();

        let mut horizons = horizons;
        let mut horizon_of_timepoint = HashMap::new();
        for horizon in horizons.values_mut() {
            ensure!(
                !horizon.timepoints.is_empty(),
                "Horizon {} of balancing type {} has no timepoints",
                horizon.id,
                horizon.balancing_type
            );
            for tmp in &horizon.timepoints {
                ensure!(
                    position.contains_key(tmp),
                    "Horizon {} of balancing type {} contains unknown timepoint {tmp}",
                    horizon.id,
                    horizon.balancing_type
                );
                let previous =
                    horizon_of_timepoint.insert((horizon.balancing_type.clone(), *tmp), horizon.id);
                ensure!(
                    previous.is_none(),
                    "Timepoint {tmp} is in more than one horizon of balancing type {}",
                    horizon.balancing_type
                );
            }

            horizon.timepoints.sort_by_key(|tmp| position[tmp]);
            let contiguous = horizon
                .timepoints
                .windows(2)
                .all(|pair| position[&pair[1]] == position[&pair[0]] + 1);
            ensure!(
                contiguous,
                "Timepoints of horizon {} (balancing type {}) must be contiguous",
                horizon.id,
                horizon.balancing_type
            );
        }

        let balancing_types: IndexSet<BalancingType> = horizons
            .keys()
            .map(|(balancing_type, _)| balancing_type.clone())
            .collect();
        for balancing_type in &balancing_types {
            for tmp in timepoints.keys() {
                ensure!(
                    horizon_of_timepoint.contains_key(&(balancing_type.clone(), *tmp)),
                    "Timepoint {tmp} is not in any horizon of balancing type {balancing_type}"
                );
            }
        }

        let index = Self {
            periods,
            timepoints,
            horizons,
            horizon_of_timepoint,
        };
        index.check_period_hours();

        Ok(index)
    }

    /// Warn if a period's timepoints do not add up to the hours it is meant to represent
    fn check_period_hours(&self) {
        for period in self.periods.values() {
            let total: f64 = self
                .timepoints_in_period(period.id)
                .map(Timepoint::weighted_hours)
                .sum();
            let expected = period.hours_in_period_timepoints;
            if !hours_match(total, expected) {
                warn!(
                    "Period {} represents {expected} hours, but its timepoints represent {total} hours",
                    period.id
                );
            }
        }
    }

    /// Iterate over periods, in order
    pub fn iter_periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.values()
    }

    /// Iterate over timepoints, in order
    pub fn iter_timepoints(&self) -> impl Iterator<Item = &Timepoint> {
        self.timepoints.values()
    }

    /// Iterate over horizons
    pub fn iter_horizons(&self) -> impl Iterator<Item = &Horizon> {
        self.horizons.values()
    }

    /// Iterate over the timepoints of a period
    pub fn timepoints_in_period(&self, period: u32) -> impl Iterator<Item = &Timepoint> {
        self.timepoints
            .values()
            .filter(move |tmp| tmp.period == period)
    }

    /// Whether the given period is part of this instance
    pub fn has_period(&self, period: u32) -> bool {
        self.periods.contains_key(&period)
    }

    /// Get a period
    pub fn period(&self, period: u32) -> Result<&Period> {
        self.periods
            .get(&period)
            .with_context(|| format!("Unknown period {period}"))
    }

    /// Get a timepoint
    pub fn timepoint(&self, tmp: u32) -> Result<&Timepoint> {
        self.timepoints
            .get(&tmp)
            .with_context(|| format!("Unknown timepoint {tmp}"))
    }

    /// Get the period to which a timepoint belongs
    pub fn period_of(&self, tmp: u32) -> Result<&Period> {
        self.period(self.timepoint(tmp)?.period)
    }

    /// The balancing types used by horizons
    pub fn balancing_types(&self) -> IndexSet<&BalancingType> {
        self.horizons.keys().map(|(balancing_type, _)| balancing_type).collect()
    }

    /// Get the horizon of the given balancing type to which a timepoint belongs
    pub fn horizon_of(&self, balancing_type: &BalancingType, tmp: u32) -> Option<&Horizon> {
        let horizon = self
            .horizon_of_timepoint
            .get(&(balancing_type.clone(), tmp))?;
        self.horizons.get(&(balancing_type.clone(), *horizon))
    }

    /// Get a horizon by balancing type and ID, if it is part of this instance
    pub fn horizon(&self, balancing_type: &BalancingType, horizon: u32) -> Option<&Horizon> {
        self.horizons.get(&(balancing_type.clone(), horizon))
    }

    /// Weight applied to per-MWh quantities of a whole horizon in the objective function.
    ///
    /// This is the hours-weighted average timepoint weight of the horizon, multiplied by the
    /// discount factor and number of years represented by its period.
    pub fn horizon_objective_weight(&self, horizon: &Horizon) -> Result<f64> {
        let mut hours = 0.0;
        let mut weighted_hours = 0.0;
        for tmp in &horizon.timepoints {
            let timepoint = self.timepoint(*tmp)?;
            hours += timepoint.hours;
            weighted_hours += timepoint.weighted_hours();
        }
        let first = horizon
            .timepoints
            .first()
            .with_context(|| format!("Horizon {} has no timepoints", horizon.id))?;
        ensure!(hours > 0.0, "Horizon {} has no hours", horizon.id);

        Ok(weighted_hours / hours * self.period_of(*first)?.objective_weight())
    }

    /// Iterate over the horizons of a balancing type
    pub fn horizons_of_type<'a>(
        &'a self,
        balancing_type: &'a BalancingType,
    ) -> impl Iterator<Item = &'a Horizon> {
        self.horizons
            .values()
            .filter(move |horizon| &horizon.balancing_type == balancing_type)
    }

    /// The timepoint before `tmp` within its horizon of the given balancing type.
    ///
    /// For circular horizons the first timepoint is preceded by the last one. For linear (and
    /// linked) horizons the first timepoint has no predecessor.
    pub fn prev_timepoint(&self, balancing_type: &BalancingType, tmp: u32) -> Option<u32> {
        let horizon = self.horizon_of(balancing_type, tmp)?;
        let pos = horizon.timepoints.iter().position(|t| *t == tmp)?;
        if pos > 0 {
            return Some(horizon.timepoints[pos - 1]);
        }

        match horizon.boundary {
            Boundary::Circular => horizon.timepoints.last().copied(),
            Boundary::Linear | Boundary::Linked => None,
        }
    }

    /// Weight applied to per-hour quantities in a timepoint in the objective function.
    ///
    /// This is the number of hours the timepoint represents in a year, multiplied by the
    /// discount factor and number of years represented by its period.
    pub fn objective_weight(&self, tmp: u32) -> Result<f64> {
        let timepoint = self.timepoint(tmp)?;
        Ok(timepoint.weighted_hours() * self.period(timepoint.period)?.objective_weight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, temporal_index};
    use rstest::rstest;

    #[rstest]
    fn prev_timepoint_circular(temporal_index: TemporalIndex) {
        let day = BalancingType::new("day");
        assert_eq!(temporal_index.prev_timepoint(&day, 2), Some(1));
        assert_eq!(temporal_index.prev_timepoint(&day, 1), Some(4));
    }

    #[rstest]
    fn prev_timepoint_linear(temporal_index: TemporalIndex) {
        let hour = BalancingType::new("half_day");
        assert_eq!(temporal_index.prev_timepoint(&hour, 1), None);
        assert_eq!(temporal_index.prev_timepoint(&hour, 2), Some(1));
        assert_eq!(temporal_index.prev_timepoint(&hour, 3), None);
    }

    #[rstest]
    fn objective_weight(temporal_index: TemporalIndex) {
        // 1 hour x weight 2 x discount 0.5 x 10 years
        assert_eq!(temporal_index.objective_weight(1).unwrap(), 10.0);
        assert!(temporal_index.objective_weight(99).is_err());
    }

    #[rstest]
    fn horizon_lookup(temporal_index: TemporalIndex) {
        let day = BalancingType::new("day");
        let horizon = temporal_index.horizon_of(&day, 3).unwrap();
        assert_eq!(horizon.timepoints, [1, 2, 3, 4]);
        assert_eq!(temporal_index.balancing_types().len(), 2);
        assert_eq!(temporal_index.horizons_of_type(&day).count(), 1);
    }

    #[rstest]
    fn horizon_objective_weight(temporal_index: TemporalIndex) {
        let half_day = BalancingType::new("half_day");
        let horizon = temporal_index.horizon(&half_day, 2).unwrap();
        assert_eq!(horizon.timepoints, [3, 4]);
        assert_eq!(
            temporal_index.horizon_objective_weight(horizon).unwrap(),
            10.0
        );
        assert!(temporal_index.horizon(&half_day, 3).is_none());
    }

    fn period() -> Period {
        Period {
            id: 2030,
            discount_factor: 1.0,
            start_year: 2030,
            end_year: 2031,
            hours_in_period_timepoints: 2.0,
        }
    }

    fn timepoint(id: u32) -> Timepoint {
        Timepoint {
            id,
            period: 2030,
            weight: 1.0,
            hours: 1.0,
            month: 1,
        }
    }

    fn horizon(id: u32, timepoints: Vec<u32>) -> ((BalancingType, u32), Horizon) {
        let balancing_type = BalancingType::new("day");
        (
            (balancing_type.clone(), id),
            Horizon {
                balancing_type,
                id,
                boundary: Boundary::Linear,
                timepoints,
            },
        )
    }

    fn build(
        horizons: Vec<((BalancingType, u32), Horizon)>,
        tmps: &[u32],
    ) -> Result<TemporalIndex> {
        TemporalIndex::new(
            [(2030, period())].into_iter().collect(),
            tmps.iter().map(|id| (*id, timepoint(*id))).collect(),
            horizons.into_iter().collect(),
        )
    }

    #[test]
    fn timepoint_missing_from_horizon() {
        assert_error!(
            build(vec![horizon(1, vec![1])], &[1, 2]),
            "Timepoint 2 is not in any horizon of balancing type day"
        );
    }

    #[test]
    fn timepoint_in_two_horizons() {
        assert_error!(
            build(vec![horizon(1, vec![1, 2]), horizon(2, vec![2])], &[1, 2]),
            "Timepoint 2 is in more than one horizon of balancing type day"
        );
    }

    #[test]
    fn non_contiguous_horizon() {
        assert_error!(
            build(vec![horizon(1, vec![1, 3]), horizon(2, vec![2])], &[1, 2, 3]),
            "Timepoints of horizon 1 (balancing type day) must be contiguous"
        );
    }

    #[test]
    fn timepoints_out_of_order() {
        assert_error!(
            build(vec![horizon(1, vec![1, 2])], &[2, 1]),
            "Timepoints must be listed in increasing order"
        );
    }

    #[test]
    fn unknown_period() {
        let mut tmp = timepoint(1);
        tmp.period = 2040;
        let result = TemporalIndex::new(
            [(2030, period())].into_iter().collect(),
            [(1, tmp)].into_iter().collect(),
            [horizon(1, vec![1])].into_iter().collect(),
        );
        assert_error!(result, "Timepoint 1 belongs to unknown period 2040");
    }
}

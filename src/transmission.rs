//! Transmission lines between load zones.
use crate::geography::{LoadZoneID, TxTargetZoneID};
use crate::id::define_id_type;
use crate::temporal::BalancingType;
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {TxLineID}

/// How a line's capacity is determined
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxCapacityType {
    /// Capacity is specified exogenously for each period
    #[string = "tx_spec"]
    Specified,
    /// Capacity can be built in each vintage, with costs linear in the capacity built
    #[string = "tx_new_lin"]
    NewLin,
}

impl TxCapacityType {
    /// The label used for this type in input files
    pub fn label(self) -> &'static str {
        match self {
            Self::Specified => "tx_spec",
            Self::NewLin => "tx_new_lin",
        }
    }
}

/// How flows on a line are represented
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxOperationalType {
    /// Transport model with a fixed loss factor
    #[string = "tx_simple"]
    Simple,
}

/// The specified capacity of a line in one period
#[derive(Clone, Debug, PartialEq)]
pub struct TxSpecifiedCapacity {
    /// Maximum flow in the negative direction, as a non-positive number
    pub min_mw: f64,
    /// Maximum flow in the positive direction
    pub max_mw: f64,
    /// Fixed cost per MW of `max_mw` per year
    pub fixed_cost_per_mw_yr: f64,
}

/// Cost and lifetime of new transmission capacity built in one vintage
#[derive(Clone, Debug, PartialEq)]
pub struct TxNewBuildVintage {
    /// Years for which capacity built in this vintage remains operational
    pub lifetime_yrs: u32,
    /// Annualised cost per MW of capacity built
    pub annualized_real_cost_per_mw_yr: f64,
}

impl TxNewBuildVintage {
    /// Whether capacity of the given vintage is operational in a period
    pub fn is_operational_in(&self, vintage: u32, period: u32) -> bool {
        vintage <= period && period < vintage + self.lifetime_yrs
    }
}

/// A transmission line.
///
/// Positive flows go from `load_zone_from` to `load_zone_to`.
#[derive(Clone, Debug, PartialEq)]
pub struct TxLine {
    /// The line's ID
    pub id: TxLineID,
    /// The zone at the sending end of positive flows
    pub load_zone_from: LoadZoneID,
    /// The zone at the receiving end of positive flows
    pub load_zone_to: LoadZoneID,
    /// Capacity type
    pub capacity_type: TxCapacityType,
    /// Operational type
    pub operational_type: TxOperationalType,
    /// Fraction of the flow lost in transit
    pub loss_factor: f64,
    /// Specified capacity by period (`tx_spec` only)
    pub capacity: IndexMap<u32, TxSpecifiedCapacity>,
    /// New-build costs by vintage (`tx_new_lin` only)
    pub new_build_vintages: IndexMap<u32, TxNewBuildVintage>,
    /// The transmission target zone to whose targets the line's flows count, if any
    pub tx_target_zone: Option<TxTargetZoneID>,
    /// Whether the net flow counts towards targets, rather than the flow in each direction
    pub contributes_net_flow_to_tx_target: bool,
}

impl TxLine {
    /// Whether the line is operational in the given period.
    ///
    /// A specified line is operational in the periods for which it has a capacity. A new-build line
    /// is operational while any of its vintages is.
    pub fn is_operational_in(&self, period: u32) -> bool {
        match self.capacity_type {
            TxCapacityType::Specified => self.capacity.contains_key(&period),
            TxCapacityType::NewLin => self.vintages_operational_in(period).next().is_some(),
        }
    }

    /// Iterate over the vintages of a new-build line which are operational in a period
    pub fn vintages_operational_in(
        &self,
        period: u32,
    ) -> impl Iterator<Item = (u32, &TxNewBuildVintage)> {
        self.new_build_vintages
            .iter()
            .filter(move |(vintage, params)| params.is_operational_in(**vintage, period))
            .map(|(vintage, params)| (*vintage, params))
    }
}

/// A map of transmission lines, keyed by ID
pub type TxLineMap = IndexMap<TxLineID, TxLine>;

/// Minimum energy to be transmitted in each direction over a horizon
#[derive(Clone, Debug, PartialEq)]
pub struct TxTarget {
    /// Target for flows in the positive direction
    pub pos_dir_min_mwh: f64,
    /// Target for flows in the negative direction
    pub neg_dir_min_mwh: f64,
}

/// Transmission targets by zone, balancing type and horizon
pub type TxTargetMap = IndexMap<(TxTargetZoneID, BalancingType, u32), TxTarget>;

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use rstest::rstest;

    #[rstest]
    #[case(2020, false)]
    #[case(2030, true)]
    #[case(2049, true)]
    #[case(2050, false)]
    fn new_build_line_operational_over_lifetime(#[case] period: u32, #[case] expected: bool) {
        let line = TxLine {
            id: "tx_new".into(),
            load_zone_from: "z1".into(),
            load_zone_to: "z2".into(),
            capacity_type: TxCapacityType::NewLin,
            operational_type: TxOperationalType::Simple,
            loss_factor: 0.0,
            capacity: IndexMap::new(),
            new_build_vintages: indexmap! {
                2030 => TxNewBuildVintage {
                    lifetime_yrs: 20,
                    annualized_real_cost_per_mw_yr: 1.0,
                }
            },
            tx_target_zone: None,
            contributes_net_flow_to_tx_target: false,
        };
        assert_eq!(line.is_operational_in(period), expected);
    }
}

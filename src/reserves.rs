//! Operating reserve products and their balancing areas.
use crate::id::define_id_type;
use indexmap::IndexMap;
use std::collections::HashMap;

define_id_type! {BalancingAreaID}

/// Whether a reserve product requires headroom or footroom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveDirection {
    /// Upward reserves must fit below a project's maximum output
    Up,
    /// Downward reserves must fit above a project's minimum output
    Down,
}

/// The operating reserve products that can be modelled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ReserveType {
    /// Upward regulation
    RegulationUp,
    /// Downward regulation
    RegulationDown,
    /// Spinning reserves
    SpinningReserves,
    /// Upward load-following reserves
    LfReservesUp,
    /// Downward load-following reserves
    LfReservesDown,
}

impl ReserveType {
    /// The direction of the reserve product
    pub fn direction(self) -> ReserveDirection {
        match self {
            Self::RegulationUp | Self::SpinningReserves | Self::LfReservesUp => {
                ReserveDirection::Up
            }
            Self::RegulationDown | Self::LfReservesDown => ReserveDirection::Down,
        }
    }

    /// The prefix used for the names of this product's model components, e.g. `Regulation_Up`
    pub fn component_prefix(self) -> &'static str {
        match self {
            Self::RegulationUp => "Regulation_Up",
            Self::RegulationDown => "Regulation_Down",
            Self::SpinningReserves => "Spinning_Reserves",
            Self::LfReservesUp => "LF_Reserves_Up",
            Self::LfReservesDown => "LF_Reserves_Down",
        }
    }

    /// The name of the variable for project provision of this reserve
    pub fn provision_variable(self) -> String {
        format!("Provide_{}_MW", self.component_prefix())
    }

    /// The name of the expression for total provision within a balancing area
    pub fn total_provision_expression(self) -> String {
        format!("Total_{}_Provision_MW", self.component_prefix())
    }
}

/// A balancing area for a reserve product
#[derive(Clone, Debug, PartialEq)]
pub struct BalancingArea {
    /// The balancing area's ID
    pub id: BalancingAreaID,
    /// Whether the requirement may go unmet
    pub allow_violation: bool,
    /// Penalty per MW of unmet requirement
    pub violation_penalty_per_mw: f64,
}

/// Balancing areas and requirements for one reserve product
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReserveData {
    /// The balancing areas
    pub balancing_areas: IndexMap<BalancingAreaID, BalancingArea>,
    /// Requirement by balancing area and timepoint. Missing entries mean no requirement.
    pub requirement: HashMap<(BalancingAreaID, u32), f64>,
}

impl ReserveData {
    /// The requirement in a balancing area and timepoint
    pub fn requirement_mw(&self, ba: &BalancingAreaID, tmp: u32) -> f64 {
        self.requirement
            .get(&(ba.clone(), tmp))
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn reserve_type_names() {
        assert_eq!(ReserveType::LfReservesUp.to_string(), "lf_reserves_up");
        assert_eq!(
            ReserveType::RegulationDown.provision_variable(),
            "Provide_Regulation_Down_MW"
        );
        assert_eq!(
            ReserveType::SpinningReserves.total_provision_expression(),
            "Total_Spinning_Reserves_Provision_MW"
        );
    }

    #[test]
    fn reserve_directions() {
        let up = ReserveType::iter()
            .filter(|reserve| reserve.direction() == ReserveDirection::Up)
            .count();
        assert_eq!(up, 3);
    }
}

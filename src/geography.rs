//! Load zones and the zones in which policies apply.
use crate::id::define_id_type;
use indexmap::IndexMap;

define_id_type! {LoadZoneID}
define_id_type! {CarbonCapZoneID}
define_id_type! {TxTargetZoneID}

/// A zone in which load must be balanced
#[derive(Clone, Debug, PartialEq)]
pub struct LoadZone {
    /// The zone's ID
    pub id: LoadZoneID,
    /// Whether generation may exceed load
    pub allow_overgeneration: bool,
    /// Penalty per MW of overgeneration
    pub overgeneration_penalty_per_mw: f64,
    /// Whether load may go unserved
    pub allow_unserved_energy: bool,
    /// Penalty per MWh of unserved energy
    pub unserved_energy_penalty_per_mwh: f64,
}

/// A map of load zones, keyed by ID
pub type LoadZoneMap = IndexMap<LoadZoneID, LoadZone>;

/// A zone in which a carbon cap is enforced.
///
/// These can be different from load zones.
#[derive(Clone, Debug, PartialEq)]
pub struct CarbonCapZone {
    /// The zone's ID
    pub id: CarbonCapZoneID,
    /// Whether the cap may be violated
    pub allow_violation: bool,
    /// Penalty per unit of emissions above the cap
    pub violation_penalty_per_emission: f64,
}

/// A map of carbon cap zones, keyed by ID
pub type CarbonCapZoneMap = IndexMap<CarbonCapZoneID, CarbonCapZone>;

/// A zone in which minimum transmission flows are targeted
#[derive(Clone, Debug, PartialEq)]
pub struct TxTargetZone {
    /// The zone's ID
    pub id: TxTargetZoneID,
    /// Whether targets may be missed
    pub allow_violation: bool,
    /// Penalty per MWh of shortage
    pub violation_penalty_per_mwh: f64,
}

/// A map of transmission target zones, keyed by ID
pub type TxTargetZoneMap = IndexMap<TxTargetZoneID, TxTargetZone>;

//! Storage projects.
//!
//! Storage charges and discharges within its available power capacity. The energy in storage at
//! the start of each timepoint is tracked within horizons of the project's balancing type; at the
//! first timepoint of a linear horizon it is free.
use super::{OperationalTypeModule, footroom, headroom, operational_timepoints_of_type};
use crate::dynamic_components::{DynamicComponents, ResultsTable};
use crate::idx;
use crate::input::InputData;
use crate::modules::availability::{available_capacity, available_energy_capacity};
use crate::optimisation::{Bounds, Constraint, LinExpr, ModelInstance, Solution};
use crate::project::{OperationalType, Project};
use crate::temporal::Timepoint;
use anyhow::Result;

/// Power discharged by each project in each timepoint
pub const STOR_DISCHARGE_MW: &str = "Stor_Discharge_MW";
/// Power drawn to charge each project in each timepoint
pub const STOR_CHARGE_MW: &str = "Stor_Charge_MW";
/// Energy in storage at the start of each timepoint
pub const STOR_STARTING_ENERGY_MWH: &str = "Stor_Starting_Energy_in_Storage_MWh";

/// The `stor` operational type
pub struct Stor;

impl OperationalTypeModule for Stor {
    fn add_model_components(
        &self,
        model: &mut ModelInstance,
        dynamic: &DynamicComponents,
        inputs: &InputData,
    ) -> Result<()> {
        for name in [STOR_DISCHARGE_MW, STOR_CHARGE_MW, STOR_STARTING_ENERGY_MWH] {
            model.add_variables(
                name,
                operational_timepoints_of_type(dynamic, inputs, OperationalType::Stor)
                    .map(|(project, tmp)| (idx![&project.id, tmp.id], Bounds::non_negative())),
            );
        }

        let mut max_discharge = Vec::new();
        let mut max_charge = Vec::new();
        let mut max_energy = Vec::new();
        let mut available_discharge = Vec::new();
        let mut available_charge = Vec::new();
        let mut energy_tracking = Vec::new();
        for (project, tmp) in operational_timepoints_of_type(dynamic, inputs, OperationalType::Stor)
        {
            let index = idx![&project.id, tmp.id];
            let discharge = model.var(STOR_DISCHARGE_MW, &index)?;
            let charge = model.var(STOR_CHARGE_MW, &index)?;
            let starting_energy = model.var(STOR_STARTING_ENERGY_MWH, &index)?;
            let capacity = available_capacity(model, project, tmp)?;
            let energy_capacity = available_energy_capacity(model, project, tmp)?;

            max_discharge.push((
                index.clone(),
                Constraint::le(
                    LinExpr::from(discharge) + headroom(model, dynamic, project, tmp)?,
                    capacity.clone(),
                ),
            ));
            max_charge.push((
                index.clone(),
                Constraint::le(
                    LinExpr::from(charge) + footroom(model, dynamic, project, tmp)?,
                    capacity,
                ),
            ));
            max_energy.push((
                index.clone(),
                Constraint::le(starting_energy.into(), energy_capacity.clone()),
            ));

            // Cannot discharge more than is stored or charge more than there is room for
            available_discharge.push((
                index.clone(),
                Constraint::le(
                    discharge * (tmp.hours / project.discharging_efficiency),
                    starting_energy,
                ),
            ));
            available_charge.push((
                index.clone(),
                Constraint::le(
                    charge * (tmp.hours * project.charging_efficiency),
                    energy_capacity - starting_energy,
                ),
            ));

            let prev = inputs
                .temporal
                .prev_timepoint(&project.balancing_type, tmp.id)
                .filter(|prev| {
                    inputs
                        .temporal
                        .timepoint(*prev)
                        .is_ok_and(|prev| dynamic.is_operational(&project.id, prev.period))
                });
            if let Some(prev) = prev {
                let prev_index = idx![&project.id, prev];
                let prev_hours = inputs.temporal.timepoint(prev)?.hours;
                let mut expected = LinExpr::from(model.var(STOR_STARTING_ENERGY_MWH, &prev_index)?);
                expected += model.var(STOR_CHARGE_MW, &prev_index)?
                    * (prev_hours * project.charging_efficiency);
                expected -= model.var(STOR_DISCHARGE_MW, &prev_index)?
                    * (prev_hours / project.discharging_efficiency);
                energy_tracking.push((index, Constraint::eq(starting_energy.into(), expected)));
            }
        }
        model.add_constraints("Stor_Max_Discharge_Constraint", max_discharge)?;
        model.add_constraints("Stor_Max_Charge_Constraint", max_charge)?;
        model.add_constraints("Stor_Max_Energy_in_Storage_Constraint", max_energy)?;
        model.add_constraints("Stor_Max_Available_Discharge_Constraint", available_discharge)?;
        model.add_constraints("Stor_Max_Available_Charge_Constraint", available_charge)?;
        model.add_constraints("Stor_Energy_Tracking_Constraint", energy_tracking)?;

        Ok(())
    }

    fn power_provision_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        let index = idx![&project.id, tmp.id];
        Ok(LinExpr::from(model.var(STOR_DISCHARGE_MW, &index)?)
            - model.var(STOR_CHARGE_MW, &index)?)
    }

    fn variable_om_power_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        Ok(model
            .var(STOR_DISCHARGE_MW, &idx![&project.id, tmp.id])?
            .into())
    }

    fn fuel_burn_power_rule(
        &self,
        _model: &ModelInstance,
        _project: &Project,
        _tmp: &Timepoint,
    ) -> Result<LinExpr> {
        Ok(LinExpr::new())
    }

    fn export_results(
        &self,
        model: &ModelInstance,
        solution: &Solution,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
        table: &mut ResultsTable,
    ) -> Result<()> {
        for (name, column) in [
            (STOR_DISCHARGE_MW, "discharge_mw"),
            (STOR_CHARGE_MW, "charge_mw"),
            (STOR_STARTING_ENERGY_MWH, "starting_energy_mwh"),
        ] {
            for (index, value) in model.variable_values(name, solution)? {
                table.set(index, column, value);
            }
        }

        Ok(())
    }
}

//! Capacity types whose capacity is given as input data for each period.
use super::CapacityTypeModule;
use crate::optimisation::{LinExpr, ModelInstance};
use crate::project::{Project, SpecifiedCapacity};
use crate::temporal::TemporalIndex;
use anyhow::{Context, Result};

/// Generators with specified capacity (`gen_spec`)
pub struct GenSpec;

/// Storage with specified power and energy capacity (`stor_spec`)
pub struct StorSpec;

fn specified_capacity(project: &Project, period: u32) -> Result<&SpecifiedCapacity> {
    project.specified_capacity.get(&period).with_context(|| {
        format!(
            "No specified capacity for project {} in period {period}",
            project.id
        )
    })
}

/// Projects are operational in the periods for which they have a specified capacity
fn specified_periods(project: &Project, temporal: &TemporalIndex) -> Vec<u32> {
    temporal
        .iter_periods()
        .map(|period| period.id)
        .filter(|period| project.specified_capacity.contains_key(period))
        .collect()
}

impl CapacityTypeModule for GenSpec {
    fn operational_periods(&self, project: &Project, temporal: &TemporalIndex) -> Vec<u32> {
        specified_periods(project, temporal)
    }

    fn capacity_rule(&self, _: &ModelInstance, project: &Project, period: u32) -> Result<LinExpr> {
        Ok(specified_capacity(project, period)?.capacity_mw.into())
    }

    fn capacity_cost_rule(
        &self,
        _: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        let capacity = specified_capacity(project, period)?;
        Ok((capacity.capacity_mw * capacity.fixed_cost_per_mw_yr).into())
    }
}

impl CapacityTypeModule for StorSpec {
    fn operational_periods(&self, project: &Project, temporal: &TemporalIndex) -> Vec<u32> {
        specified_periods(project, temporal)
    }

    fn capacity_rule(&self, _: &ModelInstance, project: &Project, period: u32) -> Result<LinExpr> {
        Ok(specified_capacity(project, period)?.capacity_mw.into())
    }

    fn energy_capacity_rule(
        &self,
        _: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        Ok(specified_capacity(project, period)?
            .energy_capacity_mwh
            .into())
    }

    fn capacity_cost_rule(
        &self,
        _: &ModelInstance,
        project: &Project,
        period: u32,
    ) -> Result<LinExpr> {
        let capacity = specified_capacity(project, period)?;
        Ok((capacity.capacity_mw * capacity.fixed_cost_per_mw_yr
            + capacity.energy_capacity_mwh * capacity.fixed_cost_per_mwh_yr)
            .into())
    }
}

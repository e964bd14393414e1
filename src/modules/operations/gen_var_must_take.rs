//! Variable generators whose output cannot be curtailed.
//!
//! These have no variables: their output is always the available capacity times the capacity
//! factor. They cannot provide reserves.
use super::{OperationalTypeModule, cap_factor};
use crate::dynamic_components::DynamicComponents;
use crate::input::InputData;
use crate::modules::availability::available_capacity;
use crate::optimisation::{LinExpr, ModelInstance};
use crate::project::Project;
use crate::temporal::Timepoint;
use anyhow::Result;

/// The `gen_var_must_take` operational type
pub struct GenVarMustTake;

impl OperationalTypeModule for GenVarMustTake {
    fn add_model_components(
        &self,
        _model: &mut ModelInstance,
        _dynamic: &DynamicComponents,
        _inputs: &InputData,
    ) -> Result<()> {
        Ok(())
    }

    fn power_provision_rule(
        &self,
        model: &ModelInstance,
        project: &Project,
        tmp: &Timepoint,
    ) -> Result<LinExpr> {
        Ok(available_capacity(model, project, tmp)? * cap_factor(project, tmp)?)
    }
}

//! Sources and static blocks.

use cs_core::ValueKind;
use cs_sim::{CustomModel, EntityResult, ParameterDecl, ParameterTable};

/// Constant output `y = value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Constant;

impl CustomModel for Constant {
    fn declare(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::parameter("value", ValueKind::Real),
            ParameterDecl::output("y", ValueKind::Real),
        ]
    }

    fn initialize(&mut self, params: &mut ParameterTable) -> EntityResult<()> {
        let value = params.real("value")?;
        params.set_real("y", value)
    }

    fn step(&mut self, _time: f64, _dt: f64, params: &mut ParameterTable) -> EntityResult<()> {
        let value = params.real("value")?;
        params.set_real("y", value)
    }
}

/// Step source: `y = initial` before `step_time`, `y = final` from it on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Step;

impl CustomModel for Step {
    fn declare(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::parameter("step_time", ValueKind::Real).with_unit("s"),
            ParameterDecl::parameter("initial", ValueKind::Real),
            ParameterDecl::parameter("final", ValueKind::Real).with_default(1.0),
            ParameterDecl::output("y", ValueKind::Real),
        ]
    }

    fn initialize(&mut self, params: &mut ParameterTable) -> EntityResult<()> {
        let initial = params.real("initial")?;
        params.set_real("y", initial)
    }

    fn step(&mut self, time: f64, _dt: f64, params: &mut ParameterTable) -> EntityResult<()> {
        let y = if time >= params.real("step_time")? {
            params.real("final")?
        } else {
            params.real("initial")?
        };
        params.set_real("y", y)
    }
}

/// Static gain `y = k * u`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gain;

impl CustomModel for Gain {
    fn declare(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::input("u", ValueKind::Real),
            ParameterDecl::parameter("k", ValueKind::Real).with_default(1.0),
            ParameterDecl::output("y", ValueKind::Real),
        ]
    }

    fn step(&mut self, _time: f64, _dt: f64, params: &mut ParameterTable) -> EntityResult<()> {
        let y = params.real("k")? * params.real("u")?;
        params.set_real("y", y)
    }
}

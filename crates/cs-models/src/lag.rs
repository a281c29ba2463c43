//! First-order lag with rate limiting.
//!
//! Dynamics: `dy/dt = (gain * u - y) / tau`, clamped to
//! `[-rate_limit, rate_limit]`, integrated with explicit Euler over the
//! exchange step. The output is clamped to `[y_min, y_max]`.
//!
//! Useful as a plant (a DC motor's speed response) or as actuator dynamics
//! between a controller and a plant.

use cs_core::ValueKind;
use cs_sim::{CustomModel, EntityResult, ParameterDecl, ParameterTable};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderLag {
    /// Time constant (seconds), must be positive
    pub tau: f64,
    pub gain: f64,
    /// Rate limit (output units per second), must be positive
    pub rate_limit: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl FirstOrderLag {
    pub fn new(tau: f64, gain: f64, rate_limit: f64) -> ModelResult<Self> {
        if !(tau > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "tau must be positive",
            });
        }
        if !(rate_limit > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "rate_limit must be positive",
            });
        }
        Ok(Self {
            tau,
            gain,
            rate_limit,
            y_min: f64::NEG_INFINITY,
            y_max: f64::INFINITY,
        })
    }

    pub fn with_limits(mut self, y_min: f64, y_max: f64) -> ModelResult<Self> {
        if y_min > y_max {
            return Err(ModelError::InvalidArg {
                what: "y_min must not exceed y_max",
            });
        }
        self.y_min = y_min;
        self.y_max = y_max;
        Ok(self)
    }

    /// Output derivative, clamped to the rate limit.
    pub fn dydt(&self, y: f64, u: f64) -> f64 {
        ((self.gain * u - y) / self.tau).clamp(-self.rate_limit, self.rate_limit)
    }

    pub fn advance(&self, y: f64, u: f64, dt: f64) -> f64 {
        (y + self.dydt(y, u) * dt).clamp(self.y_min, self.y_max)
    }
}

/// Co-simulation model wrapping [`FirstOrderLag`]: input `u`, output `y`.
///
/// Dynamics parameters are read from the table at initialization.
#[derive(Debug, Clone, Default)]
pub struct LagModel {
    lag: Option<FirstOrderLag>,
}

impl LagModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomModel for LagModel {
    fn declare(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::input("u", ValueKind::Real),
            ParameterDecl::output("y", ValueKind::Real),
            ParameterDecl::parameter("tau", ValueKind::Real)
                .with_default(1.0)
                .with_unit("s"),
            ParameterDecl::parameter("gain", ValueKind::Real).with_default(1.0),
            ParameterDecl::parameter("rate_limit", ValueKind::Real).with_default(f64::INFINITY),
            ParameterDecl::parameter("y_min", ValueKind::Real).with_default(f64::NEG_INFINITY),
            ParameterDecl::parameter("y_max", ValueKind::Real).with_default(f64::INFINITY),
        ]
    }

    fn initialize(&mut self, params: &mut ParameterTable) -> EntityResult<()> {
        let lag = FirstOrderLag::new(
            params.real("tau")?,
            params.real("gain")?,
            params.real("rate_limit")?,
        )?
        .with_limits(params.real("y_min")?, params.real("y_max")?)?;
        self.lag = Some(lag);
        Ok(())
    }

    fn step(&mut self, _time: f64, dt: f64, params: &mut ParameterTable) -> EntityResult<()> {
        let Some(lag) = &self.lag else {
            return Err(cs_sim::EntityError::step_failure("lag not initialized"));
        };
        let y = lag.advance(params.real("y")?, params.real("u")?, dt);
        params.set_real("y", y)
    }
}

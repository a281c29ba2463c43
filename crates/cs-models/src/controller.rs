//! Sampled PID controller.
//!
//! Positional PID with:
//! - filtered derivative
//! - integral clamping and anti-windup (no accumulation while saturated)
//! - output clamping
//! - zero-order hold between samples

use cs_core::ValueKind;
use cs_sim::{CustomModel, EntityResult, ParameterDecl, ParameterTable};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::sampled::{SampleConfig, ZeroOrderHold};

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral time constant (seconds). Larger values reduce integral action.
    pub ti: f64,
    /// Derivative time constant (seconds).
    pub td: f64,
    /// Derivative filter time constant (seconds).
    pub td_filter: f64,
    pub out_min: f64,
    pub out_max: f64,
    /// Integral windup limit. If None, only anti-windup applies.
    pub integral_limit: Option<f64>,
}

impl PidController {
    pub fn new(
        kp: f64,
        ti: f64,
        td: f64,
        td_filter: f64,
        out_min: f64,
        out_max: f64,
    ) -> ModelResult<Self> {
        if ti <= 0.0 {
            return Err(ModelError::InvalidArg {
                what: "ti must be positive",
            });
        }
        if td < 0.0 {
            return Err(ModelError::InvalidArg {
                what: "td must be non-negative",
            });
        }
        if td_filter <= 0.0 {
            return Err(ModelError::InvalidArg {
                what: "td_filter must be positive",
            });
        }
        if out_min >= out_max {
            return Err(ModelError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ti,
            td,
            td_filter,
            out_min,
            out_max,
            integral_limit: None,
        })
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit);
        self
    }

    /// Compute the output for one sample of length `dt`.
    pub fn update(&self, state: &PidState, pv: f64, sp: f64, dt: f64) -> (PidState, f64) {
        // Positive error means pv is below setpoint
        let error = sp - pv;
        let p_term = self.kp * error;

        let ki = self.kp / self.ti;
        let new_integral = state.integral + error * dt;
        let clamped_integral = match self.integral_limit {
            Some(limit) => new_integral.clamp(-limit, limit),
            None => new_integral,
        };
        let i_term = ki * clamped_integral;

        // filt[n] = alpha * filt[n-1] + (1 - alpha) * error
        let alpha = self.td_filter / (self.td_filter + dt);
        let filtered_error = alpha * state.filtered_error + (1.0 - alpha) * error;
        let d_term = self.kp * self.td * (filtered_error - state.filtered_error) / dt;

        let output_raw = p_term + i_term + d_term;
        let output = output_raw.clamp(self.out_min, self.out_max);

        let integral = if output == output_raw {
            clamped_integral
        } else {
            state.integral
        };

        (
            PidState {
                integral,
                filtered_error,
            },
            output,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    pub integral: f64,
    pub filtered_error: f64,
}

/// [`PidController`] as a co-simulation model, updated at its own sample
/// period.
///
/// Inputs `setpoint` and `measurement`, output `output`. Tuning comes from
/// start values of `kp`, `ti`, `td`, `td_filter`, `out_min`, `out_max`,
/// `integral_limit` (0 disables) and `sample_period`.
#[derive(Debug, Clone, Default)]
pub struct SampledPid {
    running: Option<Running>,
}

#[derive(Debug, Clone)]
struct Running {
    controller: PidController,
    state: PidState,
    hold: ZeroOrderHold,
}

impl SampledPid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&PidState> {
        self.running.as_ref().map(|r| &r.state)
    }
}

impl CustomModel for SampledPid {
    fn declare(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::input("setpoint", ValueKind::Real),
            ParameterDecl::input("measurement", ValueKind::Real),
            ParameterDecl::output("output", ValueKind::Real),
            ParameterDecl::parameter("kp", ValueKind::Real).with_default(1.0),
            ParameterDecl::parameter("ti", ValueKind::Real).with_default(1.0),
            ParameterDecl::parameter("td", ValueKind::Real).with_default(0.0),
            ParameterDecl::parameter("td_filter", ValueKind::Real).with_default(0.01),
            ParameterDecl::parameter("out_min", ValueKind::Real).with_default(f64::NEG_INFINITY),
            ParameterDecl::parameter("out_max", ValueKind::Real).with_default(f64::INFINITY),
            ParameterDecl::parameter("integral_limit", ValueKind::Real).with_default(0.0),
            ParameterDecl::parameter("sample_period", ValueKind::Real)
                .with_default(0.01)
                .with_unit("s"),
        ]
    }

    fn initialize(&mut self, params: &mut ParameterTable) -> EntityResult<()> {
        let mut controller = PidController::new(
            params.real("kp")?,
            params.real("ti")?,
            params.real("td")?,
            params.real("td_filter")?,
            params.real("out_min")?,
            params.real("out_max")?,
        )?;
        let limit = params.real("integral_limit")?;
        if limit > 0.0 {
            controller = controller.with_integral_limit(limit);
        }
        let sample = SampleConfig::new(params.real("sample_period")?)?;
        let initial = params.real("output")?;
        self.running = Some(Running {
            controller,
            state: PidState::default(),
            hold: ZeroOrderHold::new(sample, 0.0, initial),
        });
        Ok(())
    }

    fn step(&mut self, time: f64, _dt: f64, params: &mut ParameterTable) -> EntityResult<()> {
        let Some(running) = self.running.as_mut() else {
            return Err(cs_sim::EntityError::step_failure("controller not initialized"));
        };
        let pv = params.real("measurement")?;
        let sp = params.real("setpoint")?;
        let dt = running.hold.clock.config.dt;
        let Running {
            controller,
            state,
            hold,
        } = running;
        hold.update_with(time, || {
            let (next, output) = controller.update(state, pv, sp, dt);
            *state = next;
            output
        });
        params.set_real("output", hold.get())
    }
}

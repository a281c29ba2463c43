//! cs-models: reusable co-simulation models.
//!
//! Every model implements [`cs_sim::CustomModel`]; wrap one in
//! [`cs_sim::CustomEntity`] to register it with a simulator.
//!
//! - sources (constant, step, gain)
//! - lag (first-order lag with rate limit)
//! - controller (sampled PID with anti-windup and zero-order hold)
//! - discrete_pid (velocity-form discrete PID)
//! - sampled (sample clock and zero-order hold)

pub mod controller;
pub mod discrete_pid;
pub mod error;
pub mod lag;
pub mod sampled;
pub mod sources;

pub use controller::{PidController, PidState, SampledPid};
pub use discrete_pid::DiscretePid;
pub use error::{ModelError, ModelResult};
pub use lag::{FirstOrderLag, LagModel};
pub use sampled::{SampleClock, SampleConfig, ZeroOrderHold};
pub use sources::{Constant, Gain, Step};

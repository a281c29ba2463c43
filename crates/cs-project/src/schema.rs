//! Run configuration schema.

use cs_core::StartValues;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

fn default_version() -> u32 {
    LATEST_VERSION
}

/// A complete co-simulation run: timing, systems, wiring, start values and
/// the parameters to log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub stop_time: f64,
    pub step_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging_step_size: Option<f64>,
    #[serde(default)]
    pub systems: Vec<SystemDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
    /// System name -> parameter name -> start value
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub start_values: IndexMap<String, StartValues>,
    /// System name -> parameter names, in column order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters_to_log: IndexMap<String, Vec<String>>,
}

impl RunConfig {
    pub fn new(name: impl Into<String>, stop_time: f64, step_size: f64) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            stop_time,
            step_size,
            logging_step_size: None,
            systems: Vec::new(),
            connections: Vec::new(),
            start_values: IndexMap::new(),
            parameters_to_log: IndexMap::new(),
        }
    }

    pub fn system(&self, name: &str) -> Option<&SystemDef> {
        self.systems.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDef {
    pub name: String,
    pub model: ModelDef,
}

/// Model backing a system. Tuning is supplied through start values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelDef {
    Constant,
    Step,
    Gain,
    FirstOrderLag,
    SampledPid,
    DiscretePid,
}

impl ModelDef {
    pub fn name(self) -> &'static str {
        match self {
            ModelDef::Constant => "constant",
            ModelDef::Step => "step",
            ModelDef::Gain => "gain",
            ModelDef::FirstOrderLag => "first_order_lag",
            ModelDef::SampledPid => "sampled_pid",
            ModelDef::DiscretePid => "discrete_pid",
        }
    }
}

/// `system.input` is driven by `from_system.output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDef {
    pub system: String,
    pub input: String,
    pub from_system: String,
    pub output: String,
}

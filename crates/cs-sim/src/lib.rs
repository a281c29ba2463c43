//! cs-sim: fixed-step co-simulation engine.
//!
//! - entity (the `SimulationEntity` contract)
//! - custom (adapter for models written in Rust)
//! - unit (adapter for native co-simulation units)
//! - system (named entities with lifecycle tracking)
//! - simulator (validation, evaluation order, time loop)
//! - recorder (logged series and result export)

pub mod custom;
pub mod entity;
pub mod error;
pub mod progress;
pub mod recorder;
pub mod simulator;
pub mod system;
pub mod unit;

pub use custom::{Causality, CustomEntity, CustomModel, ParameterDecl, ParameterTable};
pub use entity::SimulationEntity;
pub use error::{EntityError, EntityResult, SimError, SimResult};
pub use progress::SimProgress;
pub use recorder::{Recorder, SimulationResults};
pub use simulator::{SimOptions, SimState, Simulator, SimulatorBuilder, TimeGrid};
pub use system::System;
pub use unit::{ModelDescription, UnitBackend, UnitEntity, UnitVariable};

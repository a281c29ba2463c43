//! Named systems owned by the simulator.

use cs_core::StartValues;

use crate::entity::SimulationEntity;
use crate::error::EntityResult;

/// A named simulation entity.
///
/// Tracks lifecycle so that each entity is initialized and concluded at most
/// once per run, whichever exit path the simulator takes.
pub struct System {
    name: String,
    entity: Box<dyn SimulationEntity>,
    initialized: bool,
    concluded: bool,
}

impl System {
    pub fn new(name: impl Into<String>, entity: impl SimulationEntity + 'static) -> Self {
        Self::from_boxed(name, Box::new(entity))
    }

    pub fn from_boxed(name: impl Into<String>, entity: Box<dyn SimulationEntity>) -> Self {
        Self {
            name: name.into(),
            entity,
            initialized: false,
            concluded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> &dyn SimulationEntity {
        self.entity.as_ref()
    }

    pub(crate) fn entity_mut(&mut self) -> &mut dyn SimulationEntity {
        self.entity.as_mut()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_concluded(&self) -> bool {
        self.concluded
    }

    pub(crate) fn initialize(&mut self, start_values: &StartValues) -> EntityResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.entity.initialize(start_values)?;
        self.initialized = true;
        Ok(())
    }

    /// Conclude the entity if it was initialized and not yet concluded.
    ///
    /// The entity is marked concluded even when `conclude_simulation` fails,
    /// so it is never asked twice.
    pub(crate) fn conclude(&mut self) -> EntityResult<()> {
        if !self.initialized || self.concluded {
            return Ok(());
        }
        self.concluded = true;
        self.entity.conclude_simulation()
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("initialized", &self.initialized)
            .field("concluded", &self.concluded)
            .finish_non_exhaustive()
    }
}

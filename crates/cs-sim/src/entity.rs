//! The uniform contract every co-simulated model satisfies.

use cs_core::{ParameterValue, StartValues};

use crate::error::EntityResult;

/// A steppable model taking part in a co-simulation.
///
/// Two adapters ship with this crate: [`UnitEntity`](crate::unit::UnitEntity)
/// wraps a native co-simulation unit, and
/// [`CustomEntity`](crate::custom::CustomEntity) wraps a model written in Rust.
/// The simulator only ever sees `dyn SimulationEntity`.
///
/// Required:
/// - `set_parameter`: write an input. Unknown names and non-inputs fail with
///   `UnknownParameter`; incompatible kinds fail with `TypeMismatch`.
/// - `get_parameter_value`: read any readable parameter as of the last
///   completed step (or the initial value before the first step).
/// - `do_step`: advance by one exchange step. Errors are fatal to the run.
/// - `is_input` / `is_readable`: reference checks used for validation before
///   anything is stepped.
pub trait SimulationEntity {
    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> EntityResult<()>;

    fn get_parameter_value(&self, name: &str) -> EntityResult<ParameterValue>;

    /// Advance one exchange step ending at `time`.
    fn do_step(&mut self, time: f64) -> EntityResult<()>;

    fn is_input(&self, name: &str) -> bool;

    fn is_readable(&self, name: &str) -> bool;

    /// Apply start values before the first step. Called once per run, with an
    /// empty map when no start values were configured.
    fn initialize(&mut self, _start_values: &StartValues) -> EntityResult<()> {
        Ok(())
    }

    fn get_unit(&self, _name: &str) -> Option<String> {
        None
    }

    /// Release resources. Called exactly once per run, also after failures.
    fn conclude_simulation(&mut self) -> EntityResult<()> {
        Ok(())
    }
}

impl<T: SimulationEntity + ?Sized> SimulationEntity for Box<T> {
    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> EntityResult<()> {
        (**self).set_parameter(name, value)
    }

    fn get_parameter_value(&self, name: &str) -> EntityResult<ParameterValue> {
        (**self).get_parameter_value(name)
    }

    fn do_step(&mut self, time: f64) -> EntityResult<()> {
        (**self).do_step(time)
    }

    fn is_input(&self, name: &str) -> bool {
        (**self).is_input(name)
    }

    fn is_readable(&self, name: &str) -> bool {
        (**self).is_readable(name)
    }

    fn initialize(&mut self, start_values: &StartValues) -> EntityResult<()> {
        (**self).initialize(start_values)
    }

    fn get_unit(&self, name: &str) -> Option<String> {
        (**self).get_unit(name)
    }

    fn conclude_simulation(&mut self) -> EntityResult<()> {
        (**self).conclude_simulation()
    }
}

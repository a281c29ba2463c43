//! Adapter for native co-simulation units.
//!
//! [`UnitBackend`] is shaped after the FMI 2.0 co-simulation calling sequence:
//! instantiate, set up the experiment, enter and exit initialization mode,
//! step, terminate, free. A [`ModelDescription`] supplies the variable table
//! used to resolve names to value references and to dispatch typed calls.
//! Loading a unit from disk is left to the backend implementation.

use cs_core::{ParameterValue, StartValues, ValueKind};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::entity::SimulationEntity;
use crate::error::{EntityError, EntityResult};

pub type ValueReference = u32;

/// Causality of a unit variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitCausality {
    Parameter,
    CalculatedParameter,
    Input,
    Output,
    Local,
    Independent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variability {
    Constant,
    Fixed,
    Tunable,
    Discrete,
    Continuous,
}

/// How a variable's initial value is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Initial {
    Exact,
    Approx,
    Calculated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnitVariable {
    pub name: String,
    pub value_reference: ValueReference,
    pub kind: ValueKind,
    pub causality: UnitCausality,
    pub variability: Variability,
    pub initial: Option<Initial>,
    pub unit: Option<String>,
    pub start: Option<ParameterValue>,
}

impl UnitVariable {
    pub fn new(
        name: impl Into<String>,
        value_reference: ValueReference,
        kind: ValueKind,
        causality: UnitCausality,
    ) -> Self {
        let variability = match kind {
            ValueKind::Real => Variability::Continuous,
            _ => Variability::Discrete,
        };
        Self {
            name: name.into(),
            value_reference,
            kind,
            causality,
            variability,
            initial: None,
            unit: None,
            start: None,
        }
    }

    pub fn with_variability(mut self, variability: Variability) -> Self {
        self.variability = variability;
        self
    }

    pub fn with_initial(mut self, initial: Initial) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_start(mut self, start: impl Into<ParameterValue>) -> Self {
        self.start = Some(start.into());
        self
    }

    fn has_initial(&self, accepted: &[Initial]) -> bool {
        self.initial.is_some_and(|i| accepted.contains(&i))
    }

    /// Settable between instantiation and initialization mode.
    pub fn settable_when_instantiated(&self) -> bool {
        self.variability != Variability::Constant
            && (self.has_initial(&[Initial::Exact, Initial::Approx])
                || self.causality == UnitCausality::Input)
    }

    /// Settable during initialization mode.
    pub fn settable_in_initialization(&self) -> bool {
        (self.variability != Variability::Constant && self.has_initial(&[Initial::Exact]))
            || self.causality == UnitCausality::Input
    }

    /// Writable between steps.
    pub fn settable_when_stepping(&self) -> bool {
        self.causality == UnitCausality::Input
            || (self.causality == UnitCausality::Parameter
                && self.variability == Variability::Tunable)
    }
}

/// Variable table of a unit, keyed by variable name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelDescription {
    pub model_name: String,
    pub instantiation_token: String,
    variables: IndexMap<String, UnitVariable>,
}

impl ModelDescription {
    pub fn new(model_name: impl Into<String>, instantiation_token: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            instantiation_token: instantiation_token.into(),
            variables: IndexMap::new(),
        }
    }

    pub fn with_variable(mut self, variable: UnitVariable) -> Self {
        self.add_variable(variable);
        self
    }

    pub fn add_variable(&mut self, variable: UnitVariable) {
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn variable(&self, name: &str) -> Option<&UnitVariable> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &UnitVariable> {
        self.variables.values()
    }
}

/// Native calls of a co-simulation unit.
///
/// Getters and setters are typed as in FMI 2.0; the adapter dispatches on the
/// declared kind of each variable.
pub trait UnitBackend {
    fn instantiate(&mut self, instance_name: &str, instantiation_token: &str) -> EntityResult<()>;
    fn setup_experiment(&mut self, start_time: f64) -> EntityResult<()>;
    fn enter_initialization_mode(&mut self) -> EntityResult<()>;
    fn exit_initialization_mode(&mut self) -> EntityResult<()>;

    fn set_real(&mut self, vr: ValueReference, value: f64) -> EntityResult<()>;
    fn set_integer(&mut self, vr: ValueReference, value: i64) -> EntityResult<()>;
    fn set_boolean(&mut self, vr: ValueReference, value: bool) -> EntityResult<()>;
    fn set_string(&mut self, vr: ValueReference, value: &str) -> EntityResult<()>;

    fn get_real(&self, vr: ValueReference) -> EntityResult<f64>;
    fn get_integer(&self, vr: ValueReference) -> EntityResult<i64>;
    fn get_boolean(&self, vr: ValueReference) -> EntityResult<bool>;
    fn get_string(&self, vr: ValueReference) -> EntityResult<String>;

    fn do_step(&mut self, communication_point: f64, step_size: f64) -> EntityResult<()>;
    fn terminate(&mut self) -> EntityResult<()>;
    fn free_instance(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Loaded,
    Instantiated,
    Initialized,
    Terminated,
}

/// [`SimulationEntity`] adapter over a [`UnitBackend`].
///
/// The step handed to the backend is derived from consecutive `do_step`
/// times, so the unit always covers the exchange step the simulator asks for.
pub struct UnitEntity<B: UnitBackend> {
    backend: B,
    description: ModelDescription,
    instance_name: String,
    /// Time reached by the last completed step.
    last_time: f64,
    phase: Phase,
}

impl<B: UnitBackend> UnitEntity<B> {
    pub fn new(
        backend: B,
        description: ModelDescription,
        instance_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            description,
            instance_name: instance_name.into(),
            last_time: 0.0,
            phase: Phase::Loaded,
        }
    }

    pub fn description(&self) -> &ModelDescription {
        &self.description
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn lookup(&self, name: &str) -> EntityResult<&UnitVariable> {
        self.description
            .variable(name)
            .ok_or_else(|| EntityError::unknown(name))
    }

    fn write(&mut self, variable: &UnitVariable, value: ParameterValue) -> EntityResult<()> {
        let found = value.kind();
        let mismatch = || EntityError::TypeMismatch {
            name: variable.name.clone(),
            expected: variable.kind,
            found,
        };
        let value = value.coerce_to(variable.kind).ok_or_else(mismatch)?;
        let vr = variable.value_reference;
        match value {
            ParameterValue::Real(v) => self.backend.set_real(vr, v),
            ParameterValue::Integer(v) => self.backend.set_integer(vr, v),
            ParameterValue::Boolean(v) => self.backend.set_boolean(vr, v),
            ParameterValue::String(v) => self.backend.set_string(vr, &v),
            ParameterValue::RealArray(_) => Err(mismatch()),
        }
    }

    /// Apply every start value accepted by `settable`; returns the rest.
    fn apply_start_values<'a>(
        &mut self,
        pending: Vec<(&'a str, &'a ParameterValue)>,
        settable: fn(&UnitVariable) -> bool,
    ) -> EntityResult<Vec<(&'a str, &'a ParameterValue)>> {
        let mut remaining = Vec::new();
        for (name, value) in pending {
            match self.description.variable(name).filter(|v| settable(v)).cloned() {
                Some(variable) => self.write(&variable, value.clone())?,
                None => remaining.push((name, value)),
            }
        }
        Ok(remaining)
    }

    fn release(&mut self) -> EntityResult<()> {
        let result = match self.phase {
            Phase::Initialized => self.backend.terminate(),
            _ => Ok(()),
        };
        if matches!(self.phase, Phase::Instantiated | Phase::Initialized) {
            self.backend.free_instance();
        }
        self.phase = Phase::Terminated;
        result
    }
}

impl<B: UnitBackend> SimulationEntity for UnitEntity<B> {
    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> EntityResult<()> {
        let variable = self.lookup(name)?;
        if !variable.settable_when_stepping() {
            return Err(EntityError::unknown(name));
        }
        let variable = variable.clone();
        self.write(&variable, value)
    }

    fn get_parameter_value(&self, name: &str) -> EntityResult<ParameterValue> {
        let variable = self.lookup(name)?;
        let vr = variable.value_reference;
        Ok(match variable.kind {
            ValueKind::Real => ParameterValue::Real(self.backend.get_real(vr)?),
            ValueKind::Integer => ParameterValue::Integer(self.backend.get_integer(vr)?),
            ValueKind::Boolean => ParameterValue::Boolean(self.backend.get_boolean(vr)?),
            ValueKind::String => ParameterValue::String(self.backend.get_string(vr)?),
            ValueKind::RealArray => {
                return Err(EntityError::backend(format!(
                    "variable '{name}' has an array type, which units cannot expose"
                )));
            }
        })
    }

    fn do_step(&mut self, time: f64) -> EntityResult<()> {
        if self.phase != Phase::Initialized {
            return Err(EntityError::step_failure("unit is not initialized"));
        }
        let step_size = time - self.last_time;
        if step_size.is_nan() || step_size <= 0.0 {
            return Err(EntityError::step_failure(format!(
                "step to {time} does not advance past {}",
                self.last_time
            )));
        }
        self.backend
            .do_step(self.last_time, step_size)
            .map_err(|e| match e {
                EntityError::Backend { message } => EntityError::StepFailure { message },
                other => other,
            })?;
        self.last_time = time;
        Ok(())
    }

    fn is_input(&self, name: &str) -> bool {
        self.description
            .variable(name)
            .is_some_and(UnitVariable::settable_when_stepping)
    }

    fn is_readable(&self, name: &str) -> bool {
        self.description
            .variable(name)
            .is_some_and(|v| v.kind != ValueKind::RealArray)
    }

    fn initialize(&mut self, start_values: &StartValues) -> EntityResult<()> {
        if self.phase != Phase::Loaded {
            return Err(EntityError::backend("unit was already initialized"));
        }
        self.backend
            .instantiate(&self.instance_name, &self.description.instantiation_token)?;
        self.phase = Phase::Instantiated;
        self.backend.setup_experiment(0.0)?;

        let pending: Vec<_> = start_values
            .iter()
            .map(|(name, start)| (name.as_str(), &start.value))
            .collect();
        let pending = self.apply_start_values(pending, UnitVariable::settable_when_instantiated)?;

        self.backend.enter_initialization_mode()?;
        let unset = self.apply_start_values(pending, UnitVariable::settable_in_initialization)?;
        self.backend.exit_initialization_mode()?;
        self.phase = Phase::Initialized;

        if !unset.is_empty() {
            let names: Vec<&str> = unset.iter().map(|(name, _)| *name).collect();
            warn!(
                instance = %self.instance_name,
                parameters = ?names,
                "start values could not be applied"
            );
        }
        debug!(instance = %self.instance_name, model = %self.description.model_name, "unit initialized");
        Ok(())
    }

    fn get_unit(&self, name: &str) -> Option<String> {
        self.description.variable(name).and_then(|v| v.unit.clone())
    }

    fn conclude_simulation(&mut self) -> EntityResult<()> {
        self.release()
    }
}

impl<B: UnitBackend> Drop for UnitEntity<B> {
    fn drop(&mut self) {
        if self.phase != Phase::Terminated && self.phase != Phase::Loaded {
            if let Err(e) = self.release() {
                warn!(instance = %self.instance_name, error = %e, "failed to release unit");
            }
        }
    }
}

impl<B: UnitBackend> std::fmt::Debug for UnitEntity<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitEntity")
            .field("instance_name", &self.instance_name)
            .field("model", &self.description.model_name)
            .field("last_time", &self.last_time)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//! Adapter for models written directly in Rust.
//!
//! A [`CustomModel`] declares its parameters once; [`CustomEntity`] owns the
//! resulting [`ParameterTable`] and enforces the entity contract on the
//! model's behalf (input-only writes, kind checks, start values).

use cs_core::{ParameterValue, StartValues, ValueKind};
use indexmap::IndexMap;

use crate::entity::SimulationEntity;
use crate::error::{EntityError, EntityResult};

/// Role of a declared parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Causality {
    /// Written by connections each step.
    Input,
    /// Computed by the model.
    Output,
    /// Tuning value, set through start values.
    Parameter,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub kind: ValueKind,
    pub causality: Causality,
    pub unit: Option<String>,
    pub default: Option<ParameterValue>,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, kind: ValueKind, causality: Causality) -> Self {
        Self {
            name: name.into(),
            kind,
            causality,
            unit: None,
            default: None,
        }
    }

    pub fn input(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, kind, Causality::Input)
    }

    pub fn output(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, kind, Causality::Output)
    }

    pub fn parameter(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, kind, Causality::Parameter)
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<ParameterValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Clone, Debug)]
struct Slot {
    decl: ParameterDecl,
    value: ParameterValue,
}

/// Current values of a model's declared parameters, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct ParameterTable {
    slots: IndexMap<String, Slot>,
}

impl ParameterTable {
    /// Build a table from declarations. Values start at the declared default,
    /// or the zero value of the kind.
    ///
    /// Fails on duplicate names and on defaults of an incompatible kind.
    pub fn from_decls(decls: Vec<ParameterDecl>) -> EntityResult<Self> {
        let mut slots = IndexMap::with_capacity(decls.len());
        for decl in decls {
            let value = match decl.default.clone() {
                Some(default) => coerce(&decl.name, decl.kind, default)?,
                None => ParameterValue::zero(decl.kind),
            };
            if slots.contains_key(&decl.name) {
                return Err(EntityError::backend(format!(
                    "parameter '{}' declared twice",
                    decl.name
                )));
            }
            slots.insert(decl.name.clone(), Slot { decl, value });
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn decl(&self, name: &str) -> Option<&ParameterDecl> {
        self.slots.get(name).map(|slot| &slot.decl)
    }

    pub fn decls(&self) -> impl Iterator<Item = &ParameterDecl> {
        self.slots.values().map(|slot| &slot.decl)
    }

    pub fn get(&self, name: &str) -> EntityResult<&ParameterValue> {
        self.slots
            .get(name)
            .map(|slot| &slot.value)
            .ok_or_else(|| EntityError::unknown(name))
    }

    pub fn real(&self, name: &str) -> EntityResult<f64> {
        let value = self.get(name)?;
        value.as_real().ok_or_else(|| EntityError::TypeMismatch {
            name: name.to_string(),
            expected: ValueKind::Real,
            found: value.kind(),
        })
    }

    pub fn integer(&self, name: &str) -> EntityResult<i64> {
        let value = self.get(name)?;
        value.as_integer().ok_or_else(|| EntityError::TypeMismatch {
            name: name.to_string(),
            expected: ValueKind::Integer,
            found: value.kind(),
        })
    }

    pub fn boolean(&self, name: &str) -> EntityResult<bool> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| EntityError::TypeMismatch {
            name: name.to_string(),
            expected: ValueKind::Boolean,
            found: value.kind(),
        })
    }

    /// Set any declared parameter, regardless of causality.
    pub fn set(&mut self, name: &str, value: impl Into<ParameterValue>) -> EntityResult<()> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| EntityError::unknown(name))?;
        slot.value = coerce(name, slot.decl.kind, value.into())?;
        Ok(())
    }

    pub fn set_real(&mut self, name: &str, value: f64) -> EntityResult<()> {
        self.set(name, ParameterValue::Real(value))
    }
}

fn coerce(name: &str, kind: ValueKind, value: ParameterValue) -> EntityResult<ParameterValue> {
    let found = value.kind();
    value.coerce_to(kind).ok_or_else(|| EntityError::TypeMismatch {
        name: name.to_string(),
        expected: kind,
        found,
    })
}

/// A model written in Rust.
///
/// Models read inputs and parameters from the table and write outputs back.
pub trait CustomModel {
    fn declare(&self) -> Vec<ParameterDecl>;

    /// Called once, after start values have been written into the table.
    fn initialize(&mut self, _params: &mut ParameterTable) -> EntityResult<()> {
        Ok(())
    }

    /// Advance the model to `time`; `dt` is the elapsed time since the
    /// previous step (or since t = 0).
    fn step(&mut self, time: f64, dt: f64, params: &mut ParameterTable) -> EntityResult<()>;

    fn conclude(&mut self) -> EntityResult<()> {
        Ok(())
    }
}

/// [`SimulationEntity`] adapter over a [`CustomModel`].
#[derive(Debug)]
pub struct CustomEntity<M> {
    model: M,
    params: ParameterTable,
    last_time: f64,
}

impl<M: CustomModel> CustomEntity<M> {
    pub fn new(model: M) -> EntityResult<Self> {
        let params = ParameterTable::from_decls(model.declare())?;
        Ok(Self {
            model,
            params,
            last_time: 0.0,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn params(&self) -> &ParameterTable {
        &self.params
    }
}

impl<M: CustomModel> SimulationEntity for CustomEntity<M> {
    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> EntityResult<()> {
        match self.params.decl(name) {
            Some(decl) if decl.causality == Causality::Input => self.params.set(name, value),
            _ => Err(EntityError::unknown(name)),
        }
    }

    fn get_parameter_value(&self, name: &str) -> EntityResult<ParameterValue> {
        self.params.get(name).cloned()
    }

    fn do_step(&mut self, time: f64) -> EntityResult<()> {
        let dt = time - self.last_time;
        self.model.step(time, dt, &mut self.params)?;
        self.last_time = time;
        Ok(())
    }

    fn is_input(&self, name: &str) -> bool {
        self.params
            .decl(name)
            .is_some_and(|decl| decl.causality == Causality::Input)
    }

    fn is_readable(&self, name: &str) -> bool {
        self.params.contains(name)
    }

    fn initialize(&mut self, start_values: &StartValues) -> EntityResult<()> {
        for (name, start) in start_values {
            self.params.set(name, start.value.clone())?;
        }
        self.last_time = 0.0;
        self.model.initialize(&mut self.params)
    }

    fn get_unit(&self, name: &str) -> Option<String> {
        self.params.decl(name).and_then(|decl| decl.unit.clone())
    }

    fn conclude_simulation(&mut self) -> EntityResult<()> {
        self.model.conclude()
    }
}

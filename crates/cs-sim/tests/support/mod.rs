//! Journaling stub entities shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cs_core::{ParameterValue, StartValues, ValueKind};
use cs_sim::{EntityError, EntityResult, SimulationEntity};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Init(String),
    Step {
        system: String,
        time: f64,
        input: f64,
        output: f64,
    },
    Conclude(String),
}

pub type Journal = Rc<RefCell<Vec<Event>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// y = t
    Clock,
    /// y = u + 1
    Increment,
    /// y = true (boolean output)
    Flag,
}

/// One input `u`, one output `y`.
pub struct Stub {
    name: String,
    behavior: Behavior,
    u: f64,
    y: ParameterValue,
    fail_at: Option<f64>,
    fail_init: bool,
    journal: Journal,
}

impl Stub {
    pub fn new(name: &str, behavior: Behavior, journal: &Journal) -> Self {
        let y = match behavior {
            Behavior::Flag => ParameterValue::Boolean(false),
            _ => ParameterValue::Real(0.0),
        };
        Self {
            name: name.to_string(),
            behavior,
            u: 0.0,
            y,
            fail_at: None,
            fail_init: false,
            journal: journal.clone(),
        }
    }

    pub fn failing_at(mut self, time: f64) -> Self {
        self.fail_at = Some(time);
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

impl SimulationEntity for Stub {
    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> EntityResult<()> {
        if name != "u" {
            return Err(EntityError::unknown(name));
        }
        self.u = value.as_real().ok_or_else(|| EntityError::TypeMismatch {
            name: name.to_string(),
            expected: ValueKind::Real,
            found: value.kind(),
        })?;
        Ok(())
    }

    fn get_parameter_value(&self, name: &str) -> EntityResult<ParameterValue> {
        match name {
            "u" => Ok(ParameterValue::Real(self.u)),
            "y" => Ok(self.y.clone()),
            _ => Err(EntityError::unknown(name)),
        }
    }

    fn do_step(&mut self, time: f64) -> EntityResult<()> {
        if self.fail_at.is_some_and(|t| (t - time).abs() < 1e-9) {
            return Err(EntityError::step_failure("forced failure"));
        }
        self.y = match self.behavior {
            Behavior::Clock => ParameterValue::Real(time),
            Behavior::Increment => ParameterValue::Real(self.u + 1.0),
            Behavior::Flag => ParameterValue::Boolean(true),
        };
        self.journal.borrow_mut().push(Event::Step {
            system: self.name.clone(),
            time,
            input: self.u,
            output: self.y.as_real().unwrap_or(1.0),
        });
        Ok(())
    }

    fn is_input(&self, name: &str) -> bool {
        name == "u"
    }

    fn is_readable(&self, name: &str) -> bool {
        name == "u" || name == "y"
    }

    fn initialize(&mut self, start_values: &StartValues) -> EntityResult<()> {
        self.journal.borrow_mut().push(Event::Init(self.name.clone()));
        if self.fail_init {
            return Err(EntityError::backend("boom"));
        }
        if let Some(start) = start_values.get("y") {
            self.y = start.value.clone();
        }
        Ok(())
    }

    fn get_unit(&self, name: &str) -> Option<String> {
        match (self.behavior, name) {
            (Behavior::Clock, "y") => Some("s".to_string()),
            _ => None,
        }
    }

    fn conclude_simulation(&mut self) -> EntityResult<()> {
        self.journal
            .borrow_mut()
            .push(Event::Conclude(self.name.clone()));
        Ok(())
    }
}

pub fn inits(journal: &Journal, system: &str) -> usize {
    journal
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Init(s) if s == system))
        .count()
}

pub fn concludes(journal: &Journal, system: &str) -> usize {
    journal
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Conclude(s) if s == system))
        .count()
}

/// (time, input, output) of every step of `system`.
pub fn steps(journal: &Journal, system: &str) -> Vec<(f64, f64, f64)> {
    journal
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Step {
                system: s,
                time,
                input,
                output,
            } if s == system => Some((*time, *input, *output)),
            _ => None,
        })
        .collect()
}

pub fn step_count(journal: &Journal) -> usize {
    journal
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Step { .. }))
        .count()
}

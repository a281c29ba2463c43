//! Discrete PID controller in velocity form.
//!
//! ```text
//! u[k] = u[k-1] + d0 * e[k] + d1 * e[k-1] + d2 * e[k-2]
//! d0 = Kp + Ki * Ta + Kd / Ta
//! d1 = -Kp - 2 * Kd / Ta
//! d2 = Kd / Ta
//! ```
//!
//! `e = set_point - speed`, `Ta` is `sampling_rate`. The output is clamped to
//! `[u_min, u_max]` after every step. Updates happen on every exchange step.

use cs_core::ValueKind;
use cs_sim::{CustomModel, EntityResult, ParameterDecl, ParameterTable};

use crate::error::ModelError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscretePid {
    coefficients: [f64; 3],
    /// e[k], e[k-1], e[k-2]
    errors: [f64; 3],
    u_min: f64,
    u_max: f64,
}

impl DiscretePid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> [f64; 3] {
        self.coefficients
    }
}

impl CustomModel for DiscretePid {
    fn declare(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::parameter("sampling_rate", ValueKind::Real).with_default(1e-3),
            ParameterDecl::parameter("K_p", ValueKind::Real).with_default(1.0),
            ParameterDecl::parameter("K_i", ValueKind::Real).with_default(0.0),
            ParameterDecl::parameter("K_d", ValueKind::Real).with_default(0.0),
            ParameterDecl::parameter("set_point", ValueKind::Real).with_default(0.0),
            ParameterDecl::parameter("u_max", ValueKind::Real).with_default(1000.0),
            ParameterDecl::parameter("u_min", ValueKind::Real).with_default(-1000.0),
            ParameterDecl::input("speed", ValueKind::Real),
            ParameterDecl::output("u", ValueKind::Real).with_unit("V"),
        ]
    }

    fn initialize(&mut self, params: &mut ParameterTable) -> EntityResult<()> {
        let ta = params.real("sampling_rate")?;
        if !(ta.is_finite() && ta > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "sampling_rate must be positive",
            }
            .into());
        }
        let (kp, ki, kd) = (params.real("K_p")?, params.real("K_i")?, params.real("K_d")?);
        self.coefficients = [kp + ki * ta + kd / ta, -kp - 2.0 * kd / ta, kd / ta];
        self.errors = [0.0; 3];
        self.u_min = params.real("u_min")?;
        self.u_max = params.real("u_max")?;
        if self.u_min > self.u_max {
            return Err(ModelError::InvalidArg {
                what: "u_min must not exceed u_max",
            }
            .into());
        }
        Ok(())
    }

    fn step(&mut self, _time: f64, _dt: f64, params: &mut ParameterTable) -> EntityResult<()> {
        let error = params.real("set_point")? - params.real("speed")?;
        self.errors = [error, self.errors[0], self.errors[1]];
        let [d0, d1, d2] = self.coefficients;
        let [e0, e1, e2] = self.errors;
        let u = params.real("u")? + d0 * e0 + d1 * e1 + d2 * e2;
        params.set_real("u", u.clamp(self.u_min, self.u_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::{ParameterValue, StartValue, StartValues};
    use cs_sim::{CustomEntity, SimulationEntity};

    fn start(pairs: &[(&str, f64)]) -> StartValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), StartValue::new(*v)))
            .collect()
    }

    #[test]
    fn coefficients_from_gains() {
        let mut e = CustomEntity::new(DiscretePid::new()).unwrap();
        e.initialize(&start(&[
            ("sampling_rate", 0.1),
            ("K_p", 2.0),
            ("K_i", 10.0),
            ("K_d", 0.5),
        ]))
        .unwrap();
        let [d0, d1, d2] = e.model().coefficients();
        assert!((d0 - 8.0).abs() < 1e-12);
        assert!((d1 + 12.0).abs() < 1e-12);
        assert!((d2 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn integrates_constant_error() {
        let mut e = CustomEntity::new(DiscretePid::new()).unwrap();
        e.initialize(&start(&[("sampling_rate", 0.1), ("K_p", 1.0), ("K_i", 1.0), ("set_point", 1.0)]))
            .unwrap();
        // k=1: u = 0 + 1.1 * 1; k=2: u += 1.1 - 1.0
        e.do_step(0.1).unwrap();
        assert!((e.get_parameter_value("u").unwrap().as_real().unwrap() - 1.1).abs() < 1e-12);
        e.do_step(0.2).unwrap();
        assert!((e.get_parameter_value("u").unwrap().as_real().unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(e.get_unit("u").as_deref(), Some("V"));
    }

    #[test]
    fn output_is_clamped() {
        let mut e = CustomEntity::new(DiscretePid::new()).unwrap();
        e.initialize(&start(&[("K_p", 100.0), ("set_point", 100.0), ("u_max", 5.0)]))
            .unwrap();
        e.do_step(0.001).unwrap();
        assert_eq!(e.get_parameter_value("u").unwrap(), ParameterValue::Real(5.0));
    }

    #[test]
    fn integer_gains_are_accepted() {
        let mut e = CustomEntity::new(DiscretePid::new()).unwrap();
        let mut sv = StartValues::new();
        sv.insert("K_p".into(), StartValue::new(ParameterValue::Integer(3)));
        e.initialize(&sv).unwrap();
        assert_eq!(e.get_parameter_value("K_p").unwrap(), ParameterValue::Real(3.0));
    }

    #[test]
    fn rejects_non_positive_sampling_rate() {
        let mut e = CustomEntity::new(DiscretePid::new()).unwrap();
        assert!(e.initialize(&start(&[("sampling_rate", 0.0)])).is_err());
    }
}

//! Run configuration validation.

use std::collections::HashSet;

use crate::schema::{LATEST_VERSION, RunConfig};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Check a configuration before any entity is built.
pub fn validate_config(config: &RunConfig) -> Result<(), ValidationError> {
    if config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    validate_timing(config)?;

    let mut names = HashSet::new();
    for system in &config.systems {
        if !names.insert(system.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: system.name.clone(),
                context: "systems".to_string(),
            });
        }
    }

    let require = |name: &str, context: &str| {
        if names.contains(name) {
            Ok(())
        } else {
            Err(ValidationError::MissingReference {
                id: name.to_string(),
                context: context.to_string(),
            })
        }
    };

    let mut driven = HashSet::new();
    for conn in &config.connections {
        require(&conn.system, "connection system")?;
        require(&conn.from_system, "connection from_system")?;
        if !driven.insert((conn.system.as_str(), conn.input.as_str())) {
            return Err(ValidationError::DuplicateId {
                id: format!("{}.{}", conn.system, conn.input),
                context: "connection inputs".to_string(),
            });
        }
    }

    for system in config.start_values.keys() {
        require(system, "start_values")?;
    }

    let mut logged = HashSet::new();
    for (system, parameters) in &config.parameters_to_log {
        require(system, "parameters_to_log")?;
        for parameter in parameters {
            if !logged.insert((system.as_str(), parameter.as_str())) {
                return Err(ValidationError::DuplicateId {
                    id: format!("{system}.{parameter}"),
                    context: "parameters_to_log".to_string(),
                });
            }
        }
    }

    Ok(())
}

fn validate_timing(config: &RunConfig) -> Result<(), ValidationError> {
    let invalid = |field: &str, value: f64, reason: &str| ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    if !(config.step_size.is_finite() && config.step_size > 0.0) {
        return Err(invalid("step_size", config.step_size, "must be positive"));
    }
    if !(config.stop_time.is_finite() && config.stop_time > config.step_size) {
        return Err(invalid(
            "stop_time",
            config.stop_time,
            "must be greater than step_size",
        ));
    }
    if let Some(logging) = config.logging_step_size {
        if cs_core::integer_multiple(logging, config.step_size).is_err() {
            return Err(invalid(
                "logging_step_size",
                logging,
                "must be a positive integer multiple of step_size",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConnectionDef, ModelDef, SystemDef};

    fn config() -> RunConfig {
        let mut cfg = RunConfig::new("loop", 10.0, 0.01);
        cfg.systems = vec![
            SystemDef {
                name: "plant".into(),
                model: ModelDef::FirstOrderLag,
            },
            SystemDef {
                name: "pid".into(),
                model: ModelDef::DiscretePid,
            },
        ];
        cfg.connections = vec![ConnectionDef {
            system: "plant".into(),
            input: "u".into(),
            from_system: "pid".into(),
            output: "u".into(),
        }];
        cfg
    }

    #[test]
    fn valid_config_passes() {
        validate_config(&config()).unwrap();
    }

    #[test]
    fn duplicate_system() {
        let mut cfg = config();
        cfg.systems.push(cfg.systems[0].clone());
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn missing_connection_system() {
        let mut cfg = config();
        cfg.connections[0].from_system = "ghost".into();
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::MissingReference {
                id: "ghost".into(),
                context: "connection from_system".into(),
            })
        );
    }

    #[test]
    fn input_driven_twice() {
        let mut cfg = config();
        cfg.connections.push(cfg.connections[0].clone());
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn unknown_system_in_start_values_and_logs() {
        let mut cfg = config();
        cfg.start_values.insert("ghost".into(), Default::default());
        assert!(validate_config(&cfg).is_err());

        let mut cfg = config();
        cfg.parameters_to_log.insert("ghost".into(), vec!["y".into()]);
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn timing_rules() {
        let mut cfg = config();
        cfg.logging_step_size = Some(0.015);
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::InvalidValue { .. })
        ));

        let mut cfg = config();
        cfg.stop_time = 0.01;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = config();
        cfg.step_size = 0.0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = config();
        cfg.logging_step_size = Some(0.1);
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn newer_version_rejected() {
        let mut cfg = config();
        cfg.version = LATEST_VERSION + 1;
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::UnsupportedVersion {
                version: LATEST_VERSION + 1
            })
        );
    }
}

use cs_core::{ParameterValue, StartValue};
use cs_project::*;

fn motor_loop() -> RunConfig {
    let mut cfg = RunConfig::new("dc motor", 10.0, 1e-3);
    cfg.logging_step_size = Some(1e-2);
    cfg.systems = vec![
        SystemDef {
            name: "DC_Motor".into(),
            model: ModelDef::FirstOrderLag,
        },
        SystemDef {
            name: "pid".into(),
            model: ModelDef::DiscretePid,
        },
    ];
    cfg.connections = vec![
        ConnectionDef {
            system: "DC_Motor".into(),
            input: "u".into(),
            from_system: "pid".into(),
            output: "u".into(),
        },
        ConnectionDef {
            system: "pid".into(),
            input: "speed".into(),
            from_system: "DC_Motor".into(),
            output: "y".into(),
        },
    ];
    let pid = cfg.start_values.entry("pid".into()).or_default();
    pid.insert("K_p".into(), StartValue::new(ParameterValue::Integer(3)));
    pid.insert("K_i".into(), StartValue::new(20.0));
    pid.insert("set_point".into(), StartValue::with_unit(100.0, "rad/s"));
    cfg.parameters_to_log
        .insert("DC_Motor".into(), vec!["y".into()]);
    cfg.parameters_to_log.insert("pid".into(), vec!["u".into()]);
    cfg
}

#[test]
fn roundtrip_yaml() {
    let cfg = motor_loop();
    let path = std::env::temp_dir().join("cs_project_roundtrip.yaml");
    save_yaml(&path, &cfg).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(cfg, loaded);
}

#[test]
fn roundtrip_json() {
    let cfg = motor_loop();
    let path = std::env::temp_dir().join("cs_project_roundtrip.json");
    save_json(&path, &cfg).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(cfg, loaded);
}

#[test]
fn hand_written_yaml() {
    let yaml = r#"
name: motor
stop_time: 10.0
step_size: 0.001
logging_step_size: 0.01
systems:
  - name: DC_Motor
    model: { type: first_order_lag }
  - name: pid
    model: { type: discrete_pid }
connections:
  - { system: DC_Motor, input: u, from_system: pid, output: u }
  - { system: pid, input: speed, from_system: DC_Motor, output: y }
start_values:
  pid:
    K_p: 3
    K_d: 0.1
    set_point: { value: 100, unit: rad/s }
  DC_Motor:
    tau: 0.5
parameters_to_log:
  DC_Motor: [y]
  pid: [u]
"#;
    let cfg = from_yaml_str(yaml).unwrap();
    assert_eq!(cfg.version, LATEST_VERSION);
    assert_eq!(cfg.system("pid").map(|s| s.model), Some(ModelDef::DiscretePid));
    let pid = &cfg.start_values["pid"];
    assert_eq!(pid["K_p"].value, ParameterValue::Integer(3));
    assert_eq!(pid["K_d"].value, ParameterValue::Real(0.1));
    assert_eq!(pid["set_point"].unit.as_deref(), Some("rad/s"));
    assert_eq!(
        cfg.parameters_to_log.keys().collect::<Vec<_>>(),
        vec!["DC_Motor", "pid"]
    );
}

#[test]
fn invalid_yaml_is_rejected() {
    let yaml = r#"
name: broken
stop_time: 1.0
step_size: 0.1
systems:
  - name: a
    model: { type: gain }
connections:
  - { system: a, input: u, from_system: b, output: y }
"#;
    assert!(matches!(
        from_yaml_str(yaml),
        Err(ProjectError::Validation(ValidationError::MissingReference { .. }))
    ));

    let unknown_model = "name: x\nstop_time: 1.0\nstep_size: 0.1\nsystems:\n  - name: a\n    model: { type: fmu }\n";
    assert!(matches!(from_yaml_str(unknown_model), Err(ProjectError::Yaml(_))));
}

use cs_app::{
    AppError, ExportFormat, RunStage, build_simulator, evaluation_order, export, run_config,
    run_config_with_progress,
};
use cs_project::from_yaml_str;

const MOTOR: &str = r#"
name: dc motor
stop_time: 10.0
step_size: 0.01
logging_step_size: 0.1
systems:
  - name: DC_Motor
    model: { type: first_order_lag }
  - name: pid
    model: { type: discrete_pid }
connections:
  - { system: DC_Motor, input: u, from_system: pid, output: u }
  - { system: pid, input: speed, from_system: DC_Motor, output: y }
start_values:
  DC_Motor:
    tau: { value: 0.5, unit: s }
  pid:
    set_point: 10
    K_p: 0.5
    K_i: 2
    sampling_rate: 0.01
parameters_to_log:
  DC_Motor: [y]
  pid: [u]
"#;

#[test]
fn order_report_names_delayed_edge() {
    let cfg = from_yaml_str(MOTOR).unwrap();
    let report = evaluation_order(&cfg).unwrap();
    assert_eq!(report.systems, vec!["DC_Motor", "pid"]);
    assert_eq!(report.delayed, vec!["DC_Motor.u <- pid.u"]);
}

#[test]
fn run_motor_loop() {
    let cfg = from_yaml_str(MOTOR).unwrap();
    let outcome = run_config(&cfg).unwrap();
    assert_eq!(outcome.name, "dc motor");
    assert_eq!(outcome.ticks, 1000);
    assert_eq!(outcome.results.len(), 100);
    assert_eq!(outcome.results.columns(), &["DC_Motor.y", "pid.u"]);
    let y = outcome.results.real_column("DC_Motor.y").unwrap();
    assert!((y.last().unwrap() - 10.0).abs() < 0.01);
    assert_eq!(outcome.results.unit("pid.u"), Some("V"));
}

#[test]
fn progress_events_in_stage_order() {
    let cfg = from_yaml_str(MOTOR).unwrap();
    let mut stages = Vec::new();
    let mut running = 0;
    let cb: &mut dyn FnMut(cs_app::RunProgressEvent) = &mut |event| {
        if event.stage == RunStage::Running {
            running += 1;
        } else {
            stages.push(event.stage);
        }
    };
    run_config_with_progress(&cfg, Some(cb)).unwrap();
    assert_eq!(running, 1000);
    assert_eq!(
        stages,
        vec![RunStage::Building, RunStage::Initializing, RunStage::Completed]
    );
}

#[test]
fn unknown_parameter_fails_at_initialization() {
    let yaml = MOTOR.replace("input: speed", "input: velocity");
    let cfg = from_yaml_str(&yaml).unwrap();
    let mut sim = build_simulator(&cfg).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(err, cs_sim::SimError::UnknownReference { .. }), "{err}");

    assert!(matches!(run_config(&cfg), Err(AppError::Simulation(_))));
}

#[test]
fn export_csv_and_json() {
    let cfg = from_yaml_str(MOTOR).unwrap();
    let outcome = run_config(&cfg).unwrap();

    let dir = std::env::temp_dir();
    let csv_path = dir.join("cs_app_smoke.csv");
    export::write(&csv_path, &outcome.results, ExportFormat::from_path(&csv_path)).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("time,DC_Motor.y,pid.u [V]"));
    assert_eq!(lines.count(), 100);

    let json_path = dir.join("cs_app_smoke.json");
    assert_eq!(ExportFormat::from_path(&json_path), ExportFormat::Json);
    export::write_json(&json_path, &outcome.results).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["columns"][1], "pid.u");
    assert_eq!(value["time"].as_array().map(Vec::len), Some(100));
    assert_eq!(value["units"]["pid.u"], "V");
}

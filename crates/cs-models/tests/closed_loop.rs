//! Controllers closing the loop around a first-order plant.

use cs_core::StartValue;
use cs_models::{DiscretePid, LagModel, SampledPid, Step};
use cs_sim::{CustomEntity, SimOptions, Simulator};

#[test]
fn velocity_pid_drives_motor_to_set_point() {
    let mut b = Simulator::builder(SimOptions::new(10.0, 0.01).with_logging_step_size(0.1));
    b.system("DC_Motor", CustomEntity::new(LagModel::new()).unwrap())
        .system("pid", CustomEntity::new(DiscretePid::new()).unwrap())
        .connect("DC_Motor", "u", "pid", "u")
        .connect("pid", "speed", "DC_Motor", "y")
        .start_value("DC_Motor", "tau", StartValue::with_unit(0.5, "s"))
        .start_value("pid", "set_point", StartValue::new(10.0))
        .start_value("pid", "K_p", StartValue::new(0.5))
        .start_value("pid", "K_i", StartValue::new(2.0))
        .start_value("pid", "sampling_rate", StartValue::new(0.01))
        .log("DC_Motor", "y")
        .log("pid", "u");
    let mut sim = b.build().unwrap();
    let results = sim.run().unwrap();

    assert_eq!(results.len(), 100);
    assert_eq!(results.unit("pid.u"), Some("V"));
    let speed = results.real_column("DC_Motor.y").unwrap();
    let last = *speed.last().unwrap();
    assert!((last - 10.0).abs() < 0.01, "final speed {last}");
    // Rises monotonically at first
    assert!(speed[0] > 0.0);
    assert!(speed[5] > speed[0]);
}

#[test]
fn sampled_pid_tracks_step_set_point() {
    let mut b = Simulator::builder(SimOptions::new(10.0, 0.01).with_logging_step_size(0.5));
    b.system("set_point", CustomEntity::new(Step).unwrap())
        .system("plant", CustomEntity::new(LagModel::new()).unwrap())
        .system("controller", CustomEntity::new(SampledPid::new()).unwrap())
        .connect("controller", "setpoint", "set_point", "y")
        .connect("controller", "measurement", "plant", "y")
        .connect("plant", "u", "controller", "output")
        .start_value("set_point", "step_time", StartValue::new(1.0))
        .start_value("set_point", "final", StartValue::new(5.0))
        .start_value("plant", "tau", StartValue::new(0.5))
        .start_value("controller", "kp", StartValue::new(0.5))
        .start_value("controller", "ti", StartValue::new(0.25))
        .start_value("controller", "sample_period", StartValue::new(0.01))
        .log("plant", "y");
    let mut sim = b.build().unwrap();
    sim.initialize().unwrap();

    let order = sim.evaluation_order().unwrap();
    assert_eq!(
        sim.graph().names(order.systems()),
        vec!["set_point", "plant", "controller"]
    );
    assert_eq!(order.delayed_count(), 1);

    let results = sim.run().unwrap();
    let y = results.real_column("plant.y").unwrap();
    // Nothing happens before the step
    assert_eq!(y[0], 0.0);
    assert!((y.last().unwrap() - 5.0).abs() < 0.01);
}

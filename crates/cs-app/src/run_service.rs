//! Build and run simulations from a run configuration.

use std::time::Instant;

use cs_graph::{Connection, ConnectionGraph};
use cs_project::{ConnectionDef, RunConfig, validate_config};
use cs_sim::{SimOptions, SimProgress, SimulationResults, Simulator, System};
use tracing::info;

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};
use crate::registry;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub name: String,
    pub results: SimulationResults,
    pub ticks: u64,
    pub wall_time_s: f64,
}

/// Evaluation order of a configuration, by name.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReport {
    pub systems: Vec<String>,
    /// Connections resolved with previous-step values.
    pub delayed: Vec<String>,
}

fn to_connection(def: &ConnectionDef) -> Connection {
    Connection::new(
        def.system.as_str(),
        def.input.as_str(),
        def.from_system.as_str(),
        def.output.as_str(),
    )
}

pub fn sim_options(config: &RunConfig) -> SimOptions {
    SimOptions {
        stop_time: config.stop_time,
        step_size: config.step_size,
        logging_step_size: config.logging_step_size,
    }
}

/// Validate a configuration and instantiate every system it names.
pub fn build_simulator(config: &RunConfig) -> AppResult<Simulator> {
    validate_config(config)?;

    let systems = config
        .systems
        .iter()
        .map(|def| {
            registry::instantiate(&def.name, def.model).map(|e| System::from_boxed(&def.name, e))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let simulator = Simulator::new(
        sim_options(config),
        systems,
        config.connections.iter().map(to_connection).collect(),
        config.start_values.clone(),
        config.parameters_to_log.clone(),
    )?;
    Ok(simulator)
}

/// Compute the evaluation order without instantiating any model.
pub fn evaluation_order(config: &RunConfig) -> AppResult<OrderReport> {
    validate_config(config)?;
    let graph = ConnectionGraph::new(
        config.systems.iter().map(|s| s.name.as_str()),
        config.connections.iter().map(to_connection).collect(),
    )?;
    let order = graph.evaluation_order()?;
    Ok(OrderReport {
        systems: graph
            .names(order.systems())
            .into_iter()
            .map(str::to_string)
            .collect(),
        delayed: order
            .delayed_connections()
            .map(|idx| graph.connections()[idx].to_string())
            .collect(),
    })
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    sim: Option<SimProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            sim,
        });
    }
}

pub fn run_config(config: &RunConfig) -> AppResult<RunOutcome> {
    run_config_with_progress(config, None)
}

/// Build, initialize and run a configuration, streaming progress events.
pub fn run_config_with_progress(
    config: &RunConfig,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunOutcome> {
    let started = Instant::now();

    emit(&mut progress_cb, RunStage::Building, started, None);
    let mut simulator = build_simulator(config)?;

    emit(&mut progress_cb, RunStage::Initializing, started, None);
    simulator.initialize()?;

    let results = {
        let on_step: &mut dyn FnMut(SimProgress) =
            &mut |p| emit(&mut progress_cb, RunStage::Running, started, Some(p));
        simulator.run_with_progress(Some(on_step))?
    };
    let ticks = simulator.tick();

    let wall_time_s = started.elapsed().as_secs_f64();
    emit(&mut progress_cb, RunStage::Completed, started, None);
    info!(
        name = %config.name,
        ticks,
        rows = results.len(),
        wall_time_s,
        "run completed"
    );

    Ok(RunOutcome {
        name: config.name.clone(),
        results,
        ticks,
        wall_time_s,
    })
}

//! The co-simulation time loop.
//!
//! A [`Simulator`] owns every [`System`], validates the run configuration,
//! then advances all systems in lock-step by a fixed exchange step. Between
//! steps, connection values are copied from producers to consumers in the
//! evaluation order computed by [`ConnectionGraph`].

use cs_core::{
    ParameterValue, StartValue, StartValues, SystemParameter, ValueKind, integer_multiple,
    step_count,
};
use cs_graph::{Connection, ConnectionGraph, EvaluationOrder};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, trace, warn};

use crate::entity::SimulationEntity;
use crate::error::{SimError, SimResult};
use crate::progress::SimProgress;
use crate::recorder::{Recorder, SimulationResults};
use crate::system::System;

/// Timing of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Final simulation time (seconds)
    pub stop_time: f64,
    /// Exchange step (seconds)
    pub step_size: f64,
    /// Logging interval; defaults to `step_size`
    pub logging_step_size: Option<f64>,
}

impl SimOptions {
    pub fn new(stop_time: f64, step_size: f64) -> Self {
        Self {
            stop_time,
            step_size,
            logging_step_size: None,
        }
    }

    pub fn with_logging_step_size(mut self, logging_step_size: f64) -> Self {
        self.logging_step_size = Some(logging_step_size);
        self
    }

    pub fn logging_step_size(&self) -> f64 {
        self.logging_step_size.unwrap_or(self.step_size)
    }

    /// Validate timing and derive the tick grid.
    pub fn time_grid(&self) -> SimResult<TimeGrid> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        if !self.stop_time.is_finite() || self.stop_time <= self.step_size {
            return Err(SimError::invalid_config(format!(
                "stop_time ({}) must be greater than step_size ({})",
                self.stop_time, self.step_size
            )));
        }
        let logging = self.logging_step_size();
        let logging_multiple = integer_multiple(logging, self.step_size).map_err(|_| {
            SimError::invalid_config(format!(
                "logging_step_size ({logging}) must be a positive integer multiple of step_size ({})",
                self.step_size
            ))
        })?;
        Ok(TimeGrid {
            step_size: self.step_size,
            ticks: step_count(self.stop_time, self.step_size),
            logging_multiple,
        })
    }
}

/// Tick grid of a validated run. Time of tick `k` is `k * step_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeGrid {
    pub step_size: f64,
    pub ticks: u64,
    pub logging_multiple: u64,
}

impl TimeGrid {
    pub fn time_at(&self, tick: u64) -> f64 {
        tick as f64 * self.step_size
    }

    pub fn end_time(&self) -> f64 {
        self.time_at(self.ticks)
    }

    /// Number of rows a run on this grid logs.
    pub fn logged_rows(&self) -> u64 {
        self.ticks / self.logging_multiple
    }
}

/// Lifecycle of a [`Simulator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimState {
    Constructed,
    Initialized,
    Running,
    Completed,
    Failed,
}

/// Per-run state created by initialization.
struct RunState {
    grid: TimeGrid,
    order: EvaluationOrder,
    /// Connection indices resolved from the previous tick.
    delayed_edges: Vec<usize>,
    /// Producer values of delayed edges, indexed by connection.
    snapshot: Vec<Option<ParameterValue>>,
    /// System index of each logged column.
    log_sources: Vec<usize>,
    recorder: Recorder,
    tick: u64,
}

/// Fixed-step co-simulation of a set of systems.
///
/// Construct with [`Simulator::new`] or [`Simulator::builder`], then call
/// [`run`](Simulator::run). Every initialized system is concluded exactly
/// once, whether the run completes, fails, or the simulator is dropped early.
pub struct Simulator {
    options: SimOptions,
    systems: Vec<System>,
    graph: ConnectionGraph,
    start_values: IndexMap<String, StartValues>,
    logged: Vec<SystemParameter>,
    state: SimState,
    run: Option<RunState>,
}

impl Simulator {
    /// Create a simulator from registered systems and their wiring.
    ///
    /// Checks that system names are unique, that every connection, start
    /// value and logged parameter names a registered system, and that no
    /// input is driven twice. Parameter names are checked against the
    /// entities later, in [`initialize`](Simulator::initialize).
    pub fn new(
        options: SimOptions,
        systems: Vec<System>,
        connections: Vec<Connection>,
        start_values: IndexMap<String, StartValues>,
        parameters_to_log: IndexMap<String, Vec<String>>,
    ) -> SimResult<Self> {
        let graph = ConnectionGraph::new(systems.iter().map(System::name), connections)?;

        for system in start_values.keys() {
            if graph.system_id(system).is_none() {
                return Err(SimError::unknown_reference(format!(
                    "start values given for unknown system '{system}'"
                )));
            }
        }

        let mut seen = IndexSet::new();
        for (system, parameters) in &parameters_to_log {
            if graph.system_id(system).is_none() {
                return Err(SimError::unknown_reference(format!(
                    "parameters to log given for unknown system '{system}'"
                )));
            }
            for parameter in parameters {
                let key = SystemParameter::new(system.as_str(), parameter.as_str());
                if !seen.insert(key.clone()) {
                    return Err(SimError::invalid_config(format!(
                        "parameter '{key}' is logged more than once"
                    )));
                }
            }
        }

        debug!(
            systems = systems.len(),
            connections = graph.connections().len(),
            logged = seen.len(),
            "simulator constructed"
        );

        Ok(Self {
            options,
            systems,
            graph,
            start_values,
            logged: seen.into_iter().collect(),
            state: SimState::Constructed,
            run: None,
        })
    }

    pub fn builder(options: SimOptions) -> SimulatorBuilder {
        SimulatorBuilder::new(options)
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn system(&self, name: &str) -> Option<&System> {
        self.graph
            .system_id(name)
            .and_then(|id| self.systems.get(id.index()))
    }

    pub fn logged_parameters(&self) -> &[SystemParameter] {
        &self.logged
    }

    /// Evaluation order, available once initialized.
    pub fn evaluation_order(&self) -> Option<&EvaluationOrder> {
        self.run.as_ref().map(|run| &run.order)
    }

    /// Tick grid, available once initialized.
    pub fn time_grid(&self) -> Option<&TimeGrid> {
        self.run.as_ref().map(|run| &run.grid)
    }

    /// Number of completed exchange steps.
    pub fn tick(&self) -> u64 {
        self.run.as_ref().map_or(0, |run| run.tick)
    }

    pub fn time(&self) -> f64 {
        self.run
            .as_ref()
            .map_or(0.0, |run| run.grid.time_at(run.tick))
    }

    /// Current value of a system parameter.
    pub fn value(&self, system: &str, parameter: &str) -> SimResult<ParameterValue> {
        let id = self
            .graph
            .system_id(system)
            .ok_or_else(|| SimError::unknown_reference(format!("unknown system '{system}'")))?;
        read(&self.systems, id.index(), parameter, None)
    }

    /// Validate the configuration, apply start values and compute the
    /// evaluation order.
    ///
    /// On failure the simulator is `Failed` and every system initialized so
    /// far is concluded.
    pub fn initialize(&mut self) -> SimResult<()> {
        if self.state != SimState::Constructed {
            return Err(SimError::InvalidState {
                what: "initialize requires a freshly constructed simulator",
            });
        }
        match self.prepare() {
            Ok(run) => {
                info!(
                    systems = self.systems.len(),
                    connections = self.graph.connections().len(),
                    delayed = run.delayed_edges.len(),
                    ticks = run.grid.ticks,
                    "simulation initialized"
                );
                self.run = Some(run);
                self.state = SimState::Initialized;
                Ok(())
            }
            Err(e) => {
                self.state = SimState::Failed;
                self.conclude_after_failure();
                Err(e)
            }
        }
    }

    fn prepare(&mut self) -> SimResult<RunState> {
        // Timing first: nothing is touched on a bad grid.
        let grid = self.options.time_grid()?;
        self.validate_references()?;

        let empty = StartValues::new();
        for system in self.systems.iter_mut() {
            let start = self.start_values.get(system.name()).unwrap_or(&empty);
            system
                .initialize(start)
                .map_err(|e| SimError::from_entity(system.name(), None, e))?;
            debug!(system = system.name(), start_values = start.len(), "system initialized");
        }

        let order = self.graph.evaluation_order()?;
        let delayed_edges: Vec<usize> = order.delayed_connections().collect();
        let mut snapshot = vec![None; self.graph.connections().len()];
        for &conn in &delayed_edges {
            snapshot[conn] = Some(producer_value(&self.systems, &self.graph, conn, None)?);
        }

        let log_sources = self
            .logged
            .iter()
            .map(|p| {
                self.graph.system_id(&p.system).map(|id| id.index()).ok_or_else(|| {
                    SimError::unknown_reference(format!("unknown system '{}'", p.system))
                })
            })
            .collect::<SimResult<Vec<_>>>()?;

        Ok(RunState {
            grid,
            order,
            delayed_edges,
            snapshot,
            log_sources,
            recorder: Recorder::new(self.logged.clone(), grid.logging_multiple)
                .with_ticks(grid.ticks),
            tick: 0,
        })
    }

    fn validate_references(&self) -> SimResult<()> {
        for conn in self.graph.connections() {
            let consumer = self.lookup(&conn.consumer_system)?;
            if !consumer.entity().is_input(&conn.consumer_parameter) {
                return Err(SimError::unknown_reference(format!(
                    "'{}' is not an input of system '{}' (connection {conn})",
                    conn.consumer_parameter, conn.consumer_system
                )));
            }
            let producer = self.lookup(&conn.producer_system)?;
            if !producer.entity().is_readable(&conn.producer_parameter) {
                return Err(SimError::unknown_reference(format!(
                    "'{}' is not readable on system '{}' (connection {conn})",
                    conn.producer_parameter, conn.producer_system
                )));
            }
        }
        for p in &self.logged {
            if !self.lookup(&p.system)?.entity().is_readable(&p.parameter) {
                return Err(SimError::unknown_reference(format!(
                    "logged parameter '{p}' is not readable"
                )));
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> SimResult<&System> {
        self.system(name)
            .ok_or_else(|| SimError::unknown_reference(format!("unknown system '{name}'")))
    }

    /// Execute one exchange step, initializing first if needed.
    ///
    /// Returns the time reached, or `None` once every tick has run. Call
    /// [`run`](Simulator::run) to finish and collect results.
    pub fn advance(&mut self) -> SimResult<Option<f64>> {
        match self.state {
            SimState::Constructed => self.initialize()?,
            SimState::Initialized | SimState::Running => {}
            SimState::Completed | SimState::Failed => {
                return Err(SimError::InvalidState {
                    what: "simulation has already finished",
                });
            }
        }
        let Some(run) = self.run.as_mut() else {
            return Err(SimError::InvalidState {
                what: "simulation has no run state",
            });
        };
        if run.tick >= run.grid.ticks {
            return Ok(None);
        }
        self.state = SimState::Running;
        match exchange_step(&mut self.systems, &self.graph, run) {
            Ok(time) => Ok(Some(time)),
            Err(e) => {
                warn!(error = %e, "simulation failed");
                self.state = SimState::Failed;
                self.conclude_after_failure();
                Err(e)
            }
        }
    }

    /// Run to `stop_time` and return the logged series.
    pub fn run(&mut self) -> SimResult<SimulationResults> {
        self.run_with_progress(None)
    }

    /// Run to `stop_time`, reporting after every exchange step.
    pub fn run_with_progress(
        &mut self,
        mut progress: Option<&mut dyn FnMut(SimProgress)>,
    ) -> SimResult<SimulationResults> {
        if matches!(self.state, SimState::Completed | SimState::Failed) {
            return Err(SimError::InvalidState {
                what: "simulation has already finished",
            });
        }
        while let Some(time) = self.advance()? {
            if let Some(report) = progress.as_deref_mut() {
                report(SimProgress {
                    tick: self.tick(),
                    total_ticks: self.time_grid().map_or(0, |g| g.ticks),
                    time,
                    stop_time: self.options.stop_time,
                });
            }
        }
        self.finish()
    }

    fn finish(&mut self) -> SimResult<SimulationResults> {
        let Some(run) = self.run.as_mut() else {
            return Err(SimError::InvalidState {
                what: "simulation has no run state",
            });
        };
        let recorder = std::mem::replace(&mut run.recorder, Recorder::new(Vec::new(), 1));
        let (ticks, time) = (run.tick, run.grid.time_at(run.tick));

        let units: IndexMap<String, Option<String>> = self
            .logged
            .iter()
            .zip(&run.log_sources)
            .map(|(p, &idx)| (p.log_name(), self.systems[idx].entity().get_unit(&p.parameter)))
            .collect();
        let kinds: IndexMap<String, Option<ValueKind>> = self
            .logged
            .iter()
            .zip(&run.log_sources)
            .map(|(p, &idx)| {
                let kind = self.systems[idx]
                    .entity()
                    .get_parameter_value(&p.parameter)
                    .ok()
                    .map(|v| v.kind());
                (p.log_name(), kind)
            })
            .collect();

        let mut first_error = None;
        for system in self.systems.iter_mut() {
            if let Err(e) = system.conclude() {
                let err = SimError::from_entity(system.name(), None, e);
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    warn!(system = system.name(), error = %err, "conclude failed");
                }
            }
        }
        if let Some(err) = first_error {
            self.state = SimState::Failed;
            return Err(err);
        }

        self.state = SimState::Completed;
        info!(ticks, time, rows = recorder.len(), "simulation completed");
        Ok(recorder.finish(units, kinds))
    }

    /// Conclude every initialized system, logging secondary errors.
    fn conclude_after_failure(&mut self) {
        for system in self.systems.iter_mut() {
            if let Err(e) = system.conclude() {
                warn!(system = system.name(), error = %e, "conclude failed after earlier error");
            }
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if matches!(self.state, SimState::Initialized | SimState::Running) {
            debug!(tick = self.tick(), "simulator dropped before completion");
        }
        self.conclude_after_failure();
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("options", &self.options)
            .field("systems", &self.systems)
            .field("state", &self.state)
            .field("tick", &self.tick())
            .finish_non_exhaustive()
    }
}

fn read(
    systems: &[System],
    index: usize,
    parameter: &str,
    time: Option<f64>,
) -> SimResult<ParameterValue> {
    let system = systems.get(index).ok_or(SimError::InvalidState {
        what: "system index out of range",
    })?;
    system
        .entity()
        .get_parameter_value(parameter)
        .map_err(|e| SimError::from_entity(system.name(), time, e))
}

fn producer_value(
    systems: &[System],
    graph: &ConnectionGraph,
    conn: usize,
    time: Option<f64>,
) -> SimResult<ParameterValue> {
    let (producer, _) = graph.endpoints(conn).ok_or(SimError::InvalidState {
        what: "connection index out of range",
    })?;
    let parameter = &graph.connections()[conn].producer_parameter;
    read(systems, producer.index(), parameter, time)
}

fn exchange_step(
    systems: &mut [System],
    graph: &ConnectionGraph,
    run: &mut RunState,
) -> SimResult<f64> {
    let tick = run.tick + 1;
    let time = run.grid.time_at(tick);

    for &id in run.order.systems() {
        for &conn in graph.inbound_indices(id) {
            let value = if run.order.is_delayed(conn) {
                run.snapshot[conn].clone().ok_or(SimError::InvalidState {
                    what: "delayed connection has no snapshot",
                })?
            } else {
                producer_value(systems, graph, conn, Some(time))?
            };
            let input = &graph.connections()[conn].consumer_parameter;
            let system = &mut systems[id.index()];
            system
                .entity_mut()
                .set_parameter(input, value)
                .map_err(|e| SimError::from_entity(system.name(), Some(time), e))?;
        }

        let system = &mut systems[id.index()];
        trace!(system = system.name(), time, "do_step");
        system
            .entity_mut()
            .do_step(time)
            .map_err(|e| SimError::from_entity(system.name(), Some(time), e))?;
    }

    for &conn in &run.delayed_edges {
        run.snapshot[conn] = Some(producer_value(systems, graph, conn, Some(time))?);
    }

    if run.recorder.should_record(tick) {
        let values = run
            .recorder
            .columns()
            .iter()
            .zip(&run.log_sources)
            .map(|(p, &idx)| read(systems, idx, &p.parameter, Some(time)))
            .collect::<SimResult<Vec<_>>>()?;
        run.recorder.record(time, values);
    }

    run.tick = tick;
    Ok(time)
}

/// Incremental construction of a [`Simulator`].
///
/// ```
/// use cs_sim::{SimOptions, Simulator};
///
/// let sim = Simulator::builder(SimOptions::new(1.0, 0.1)).build().unwrap();
/// assert!(sim.systems().is_empty());
/// ```
pub struct SimulatorBuilder {
    options: SimOptions,
    systems: Vec<System>,
    connections: Vec<Connection>,
    start_values: IndexMap<String, StartValues>,
    parameters_to_log: IndexMap<String, Vec<String>>,
}

impl SimulatorBuilder {
    pub fn new(options: SimOptions) -> Self {
        Self {
            options,
            systems: Vec::new(),
            connections: Vec::new(),
            start_values: IndexMap::new(),
            parameters_to_log: IndexMap::new(),
        }
    }

    pub fn system(
        &mut self,
        name: impl Into<String>,
        entity: impl SimulationEntity + 'static,
    ) -> &mut Self {
        self.systems.push(System::new(name, entity));
        self
    }

    pub fn boxed_system(
        &mut self,
        name: impl Into<String>,
        entity: Box<dyn SimulationEntity>,
    ) -> &mut Self {
        self.systems.push(System::from_boxed(name, entity));
        self
    }

    /// Drive `consumer.input` from `producer.output`.
    pub fn connect(
        &mut self,
        consumer: &str,
        input: &str,
        producer: &str,
        output: &str,
    ) -> &mut Self {
        self.connections
            .push(Connection::new(consumer, input, producer, output));
        self
    }

    pub fn connection(&mut self, connection: Connection) -> &mut Self {
        self.connections.push(connection);
        self
    }

    pub fn start_value(
        &mut self,
        system: &str,
        parameter: &str,
        value: impl Into<StartValue>,
    ) -> &mut Self {
        self.start_values
            .entry(system.to_string())
            .or_default()
            .insert(parameter.to_string(), value.into());
        self
    }

    pub fn log(&mut self, system: &str, parameter: &str) -> &mut Self {
        self.parameters_to_log
            .entry(system.to_string())
            .or_default()
            .push(parameter.to_string());
        self
    }

    pub fn build(self) -> SimResult<Simulator> {
        Simulator::new(
            self.options,
            self.systems,
            self.connections,
            self.start_values,
            self.parameters_to_log,
        )
    }
}

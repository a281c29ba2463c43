//! Connection graph structure and evaluation order.
//!
//! The graph is directed over registered systems: an edge `A -> B` exists for
//! every connection whose producer is `A` and whose consumer is `B`.

use std::collections::{BTreeSet, HashSet};

use cs_core::SystemId;
use indexmap::IndexSet;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{GraphError, GraphResult};

/// How a connection is resolved during an exchange step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTiming {
    /// Producer value from the current exchange step.
    Live,
    /// Producer value from the previous exchange step.
    Delayed,
}

/// Per-step schedule: the order systems are visited in, and the timing of
/// every connection (indexed like [`ConnectionGraph::connections`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOrder {
    order: Vec<SystemId>,
    timing: Vec<EdgeTiming>,
}

impl EvaluationOrder {
    /// Systems in evaluation order.
    pub fn systems(&self) -> &[SystemId] {
        &self.order
    }

    pub fn timing(&self, connection: usize) -> EdgeTiming {
        self.timing
            .get(connection)
            .copied()
            .unwrap_or(EdgeTiming::Live)
    }

    pub fn is_delayed(&self, connection: usize) -> bool {
        self.timing(connection) == EdgeTiming::Delayed
    }

    /// Indices of all delayed connections, ascending.
    pub fn delayed_connections(&self) -> impl Iterator<Item = usize> + '_ {
        self.timing
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == EdgeTiming::Delayed)
            .map(|(i, _)| i)
    }

    pub fn delayed_count(&self) -> usize {
        self.delayed_connections().count()
    }
}

/// Connection graph over a fixed, ordered set of systems.
///
/// The graph is responsible for:
/// - Validating that connections reference registered systems
/// - Enforcing at most one driver per input
/// - Answering per-system inbound queries
/// - Computing evaluation order
#[derive(Debug, Clone)]
pub struct ConnectionGraph {
    /// System names in registration order; the position is the `SystemId` index.
    systems: IndexSet<String>,
    connections: Vec<Connection>,
    /// (producer, consumer) per connection.
    endpoints: Vec<(SystemId, SystemId)>,
    /// Inbound connection indices per system, in connection order.
    inbound: Vec<Vec<usize>>,
    /// Outbound connection indices per system, in connection order.
    outbound: Vec<Vec<usize>>,
}

impl ConnectionGraph {
    /// Build a graph from system names (in registration order) and connections.
    pub fn new<I, S>(systems: I, connections: Vec<Connection>) -> GraphResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = IndexSet::new();
        for name in systems {
            let name = name.into();
            if names.contains(&name) {
                return Err(GraphError::DuplicateSystem { name });
            }
            names.insert(name);
        }

        let mut inbound = vec![Vec::new(); names.len()];
        let mut outbound = vec![Vec::new(); names.len()];
        let mut endpoints = Vec::with_capacity(connections.len());
        let mut driven: HashSet<(&str, &str)> = HashSet::new();

        for (idx, connection) in connections.iter().enumerate() {
            let producer = lookup(&names, &connection.producer_system, "producer", connection)?;
            let consumer = lookup(&names, &connection.consumer_system, "consumer", connection)?;

            if !driven.insert((
                connection.consumer_system.as_str(),
                connection.consumer_parameter.as_str(),
            )) {
                return Err(GraphError::DuplicateDriver {
                    system: connection.consumer_system.clone(),
                    parameter: connection.consumer_parameter.clone(),
                });
            }

            endpoints.push((producer, consumer));
            inbound[consumer.index()].push(idx);
            outbound[producer.index()].push(idx);
        }

        Ok(Self {
            systems: names,
            connections,
            endpoints,
            inbound,
            outbound,
        })
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn system_id(&self, name: &str) -> Option<SystemId> {
        self.systems.get_index_of(name).map(SystemId::from_index)
    }

    pub fn system_name(&self, id: SystemId) -> Option<&str> {
        self.systems.get_index(id.index()).map(String::as_str)
    }

    /// Registered system names in registration order.
    pub fn systems(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(String::as_str)
    }

    /// Resolve ids to names, skipping unknown ids.
    pub fn names(&self, ids: &[SystemId]) -> Vec<&str> {
        ids.iter().filter_map(|id| self.system_name(*id)).collect()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Producer and consumer ids of a connection.
    pub fn endpoints(&self, connection: usize) -> Option<(SystemId, SystemId)> {
        self.endpoints.get(connection).copied()
    }

    /// Indices of connections driving inputs of `id`.
    pub fn inbound_indices(&self, id: SystemId) -> &[usize] {
        self.inbound.get(id.index()).map_or(&[], Vec::as_slice)
    }

    /// Connections driving inputs of the named system.
    pub fn inbound(&self, system: &str) -> impl Iterator<Item = &Connection> {
        let indices = self
            .system_id(system)
            .map_or(&[][..], |id| self.inbound_indices(id));
        indices.iter().map(|&i| &self.connections[i])
    }

    /// Connections fed by outputs of the named system.
    pub fn outbound(&self, system: &str) -> impl Iterator<Item = &Connection> {
        let indices = self
            .system_id(system)
            .and_then(|id| self.outbound.get(id.index()))
            .map_or(&[][..], Vec::as_slice);
        indices.iter().map(|&i| &self.connections[i])
    }

    /// Compute the evaluation order.
    ///
    /// Kahn's algorithm; among ready systems the earliest-registered goes
    /// first. When none is ready, a system is forced from a cycle that no
    /// other unscheduled system feeds (see [`Self::cycle_entry`]) and its
    /// inbound connections from unscheduled producers become delayed. Only
    /// connections that lie on a cycle are ever delayed. Every system is
    /// scheduled exactly once.
    pub fn evaluation_order(&self) -> GraphResult<EvaluationOrder> {
        let n = self.systems.len();

        // Remaining inbound connections from unscheduled producers
        let mut in_degree: Vec<usize> = self.inbound.iter().map(Vec::len).collect();
        let mut scheduled = vec![false; n];
        let mut timing = vec![EdgeTiming::Live; self.connections.len()];
        let mut order = Vec::with_capacity(n);

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();

        for _ in 0..n {
            let (next, forced) = match ready.pop_first() {
                Some(idx) => (idx, false),
                None => match self.cycle_entry(&scheduled) {
                    Some(idx) => (idx, true),
                    None => break,
                },
            };

            for &conn in &self.inbound[next] {
                let (producer, _) = self.endpoints[conn];
                if !scheduled[producer.index()] {
                    timing[conn] = EdgeTiming::Delayed;
                }
            }

            scheduled[next] = true;
            order.push(SystemId::from_index(next));
            debug!(
                system = %self.systems[next],
                position = order.len() - 1,
                forced,
                "system scheduled"
            );

            for &conn in &self.outbound[next] {
                let (_, consumer) = self.endpoints[conn];
                let c = consumer.index();
                if scheduled[c] {
                    continue;
                }
                in_degree[c] = in_degree[c].saturating_sub(1);
                if in_degree[c] == 0 {
                    ready.insert(c);
                }
            }
        }

        if order.len() != n {
            return Err(GraphError::Cyclic {
                scheduled: order.len(),
                total: n,
            });
        }

        Ok(EvaluationOrder { order, timing })
    }

    /// Earliest-registered unscheduled system whose strongly connected
    /// component, restricted to unscheduled systems, has no producer outside
    /// itself.
    ///
    /// With no system ready every unscheduled system has an unscheduled
    /// producer, so such a component is a cycle (or a self-loop) and every
    /// unscheduled producer of the returned system lies on it.
    fn cycle_entry(&self, scheduled: &[bool]) -> Option<usize> {
        (0..self.systems.len())
            .filter(|&i| !scheduled[i])
            .find(|&i| {
                let upstream = self.reachable(i, scheduled, Direction::Upstream);
                let downstream = self.reachable(i, scheduled, Direction::Downstream);
                upstream
                    .iter()
                    .zip(&downstream)
                    .all(|(&up, &down)| !up || down)
            })
    }

    /// Unscheduled systems reachable from `start` (itself included).
    fn reachable(&self, start: usize, scheduled: &[bool], direction: Direction) -> Vec<bool> {
        let mut seen = vec![false; self.systems.len()];
        seen[start] = true;
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            let edges = match direction {
                Direction::Upstream => &self.inbound[idx],
                Direction::Downstream => &self.outbound[idx],
            };
            for &conn in edges {
                let (producer, consumer) = self.endpoints[conn];
                let next = match direction {
                    Direction::Upstream => producer.index(),
                    Direction::Downstream => consumer.index(),
                };
                if !scheduled[next] && !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        seen
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Upstream,
    Downstream,
}

fn lookup(
    names: &IndexSet<String>,
    name: &str,
    role: &'static str,
    connection: &Connection,
) -> GraphResult<SystemId> {
    names
        .get_index_of(name)
        .map(SystemId::from_index)
        .ok_or_else(|| GraphError::UnknownSystem {
            name: name.to_string(),
            role,
            connection: connection.to_string(),
        })
}

//! cs-graph: connection graph and evaluation order for co-simulation.
//!
//! A [`Connection`] says "input X of system A is driven by output Y of
//! system B". The [`ConnectionGraph`] collects connections over a fixed set of
//! registered systems and computes a deterministic [`EvaluationOrder`].
//!
//! # Delayed edges
//!
//! The graph may be cyclic. Cycles are not solved by fixed-point iteration
//! within a step. Instead, whenever no remaining system has all of its
//! producers scheduled, a system is scheduled anyway from a cycle that no
//! other remaining system feeds (the earliest-registered such system). Each
//! of its inbound connections from an unscheduled producer lies on that cycle
//! and is marked *delayed*: the consumer reads the value the producer exposed at the
//! end of the previous exchange step (or after initialization, before the
//! first step). This is one-step-delayed feedback, which changes numerical
//! behavior compared to a fixed-point co-simulation scheme. Systems that
//! merely sit downstream of a cycle keep live inputs.
//!
//! # Example
//!
//! ```
//! use cs_graph::{Connection, ConnectionGraph};
//!
//! let graph = ConnectionGraph::new(
//!     ["controller", "plant"],
//!     vec![
//!         Connection::new("plant", "u", "controller", "u"),
//!         Connection::new("controller", "speed", "plant", "y"),
//!     ],
//! )
//! .unwrap();
//!
//! let order = graph.evaluation_order().unwrap();
//! assert_eq!(graph.names(order.systems()), vec!["controller", "plant"]);
//! assert!(order.is_delayed(1));
//! assert!(!order.is_delayed(0));
//! ```

pub mod connection;
pub mod error;
pub mod graph;

// Re-exports for ergonomics
pub use connection::Connection;
pub use error::{GraphError, GraphResult};
pub use graph::{ConnectionGraph, EdgeTiming, EvaluationOrder};

//! Integration tests for evaluation order properties.

use std::collections::HashSet;

use cs_graph::{Connection, ConnectionGraph, EdgeTiming};
use proptest::prelude::*;

/// Whether `to` is reachable from `from` along connections.
fn reaches(graph: &ConnectionGraph, from: usize, to: usize) -> bool {
    let mut seen = HashSet::from([from]);
    let mut stack = vec![from];
    while let Some(idx) = stack.pop() {
        if idx == to {
            return true;
        }
        for conn in 0..graph.connections().len() {
            let (producer, consumer) = graph.endpoints(conn).unwrap();
            if producer.index() == idx && seen.insert(consumer.index()) {
                stack.push(consumer.index());
            }
        }
    }
    false
}

fn system_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("s{i}")).collect()
}

/// Build connections from (consumer, producer) index pairs, one input per pair.
fn connections_from(pairs: &[(usize, usize)]) -> Vec<Connection> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .enumerate()
        .filter(|(_, pair)| seen.insert(**pair))
        .map(|(k, (consumer, producer))| {
            Connection::new(
                format!("s{consumer}"),
                format!("in{k}"),
                format!("s{producer}"),
                "out",
            )
        })
        .collect()
}

#[test]
fn controller_plant_loop() {
    // Plant registered first: plant is forced, controller reads plant live.
    let graph = ConnectionGraph::new(
        ["DC_Motor", "pid"],
        vec![
            Connection::new("DC_Motor", "u", "pid", "u"),
            Connection::new("pid", "speed", "DC_Motor", "y"),
        ],
    )
    .unwrap();

    let order = graph.evaluation_order().unwrap();
    assert_eq!(graph.names(order.systems()), vec!["DC_Motor", "pid"]);
    assert_eq!(order.timing(0), EdgeTiming::Delayed);
    assert_eq!(order.timing(1), EdgeTiming::Live);
}

#[test]
fn three_cycle_delays_single_back_edge() {
    // a -> b -> c -> a
    let graph = ConnectionGraph::new(
        ["a", "b", "c"],
        vec![
            Connection::new("b", "u", "a", "y"),
            Connection::new("c", "u", "b", "y"),
            Connection::new("a", "u", "c", "y"),
        ],
    )
    .unwrap();

    let order = graph.evaluation_order().unwrap();
    assert_eq!(graph.names(order.systems()), vec!["a", "b", "c"]);
    assert_eq!(order.delayed_connections().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn system_fed_by_cycle_reads_live() {
    // a <-> b feeds c; c is registered first but lies on no cycle
    let graph = ConnectionGraph::new(
        ["c", "a", "b"],
        vec![
            Connection::new("a", "u", "b", "y"),
            Connection::new("b", "u", "a", "y"),
            Connection::new("c", "u", "b", "y"),
        ],
    )
    .unwrap();

    let order = graph.evaluation_order().unwrap();
    assert_eq!(graph.names(order.systems()), vec!["a", "b", "c"]);
    assert_eq!(order.timing(0), EdgeTiming::Delayed);
    assert_eq!(order.timing(1), EdgeTiming::Live);
    assert_eq!(order.timing(2), EdgeTiming::Live);
}

#[test]
fn cycle_feeding_cycle_delays_one_edge_each() {
    // x <-> y feeds p <-> q; p and q are registered first
    let graph = ConnectionGraph::new(
        ["q", "p", "y", "x"],
        vec![
            Connection::new("p", "u", "q", "y"),
            Connection::new("q", "u", "p", "y"),
            Connection::new("p", "v", "x", "y"),
            Connection::new("x", "u", "y", "y"),
            Connection::new("y", "u", "x", "y"),
        ],
    )
    .unwrap();

    let order = graph.evaluation_order().unwrap();
    assert_eq!(graph.names(order.systems()), vec!["y", "x", "q", "p"]);
    assert_eq!(order.delayed_connections().collect::<Vec<_>>(), vec![1, 4]);
}

#[test]
fn cycle_downstream_of_source() {
    // src -> a <-> b
    let graph = ConnectionGraph::new(
        ["b", "a", "src"],
        vec![
            Connection::new("a", "u", "src", "y"),
            Connection::new("b", "u", "a", "y"),
            Connection::new("a", "v", "b", "y"),
        ],
    )
    .unwrap();

    let order = graph.evaluation_order().unwrap();
    // src is the only ready system; then the a/b cycle is broken at b.
    assert_eq!(graph.names(order.systems()), vec!["src", "b", "a"]);
    assert_eq!(order.timing(0), EdgeTiming::Live);
    assert_eq!(order.timing(1), EdgeTiming::Delayed);
    assert_eq!(order.timing(2), EdgeTiming::Live);
}

proptest! {
    #[test]
    fn order_is_deterministic_and_complete(
        n in 1_usize..8,
        raw in prop::collection::vec((0_usize..8, 0_usize..8), 0..20),
    ) {
        let pairs: Vec<(usize, usize)> = raw.into_iter().map(|(c, p)| (c % n, p % n)).collect();
        let graph = ConnectionGraph::new(system_names(n), connections_from(&pairs)).unwrap();

        let first = graph.evaluation_order().unwrap();
        let second = graph.evaluation_order().unwrap();
        prop_assert_eq!(&first, &second);

        // Every system exactly once
        let mut seen: Vec<usize> = first.systems().iter().map(|id| id.index()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());

        // Live edges: producer strictly before consumer. Delayed: not before.
        let position = |idx: usize| first.systems().iter().position(|id| id.index() == idx).unwrap();
        for conn in 0..graph.connections().len() {
            let (producer, consumer) = graph.endpoints(conn).unwrap();
            let (p, c) = (position(producer.index()), position(consumer.index()));
            match first.timing(conn) {
                EdgeTiming::Live => prop_assert!(p < c),
                EdgeTiming::Delayed => prop_assert!(p >= c),
            }
        }

        // Delayed edges lie on a cycle: the consumer feeds back to the producer
        for conn in first.delayed_connections() {
            let (producer, consumer) = graph.endpoints(conn).unwrap();
            prop_assert!(reaches(&graph, consumer.index(), producer.index()));
        }
    }

    #[test]
    fn acyclic_graphs_have_no_delayed_edges(
        n in 2_usize..8,
        raw in prop::collection::vec((0_usize..8, 0_usize..8), 0..20),
    ) {
        // Only edges from lower to higher index: a DAG
        let pairs: Vec<(usize, usize)> = raw
            .into_iter()
            .map(|(a, b)| (a % n, b % n))
            .filter(|(c, p)| p < c)
            .collect();
        let graph = ConnectionGraph::new(system_names(n), connections_from(&pairs)).unwrap();
        let order = graph.evaluation_order().unwrap();
        prop_assert_eq!(order.delayed_count(), 0);
    }
}

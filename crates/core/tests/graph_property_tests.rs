use std::collections::{BTreeSet, HashSet};

use arb_engine_core::{ArbEngine, PredecessorGraph, RateTable};
use common::error::Error;
use common::numeric_kernel::{RELATIVE_TOLERANCE, approx_eq_relative};
use common::types::{EdgeKey, is_connected};
use proptest::prelude::*;
use proptest::strategy::Strategy;

const CODES: [&str; 6] = ["AUD", "CAD", "EUR", "GBP", "JPY", "USD"];

/// Random rate tables over up to six currencies, plus two currency picks.
fn table_strategy() -> impl Strategy<Value = (Vec<(String, f64)>, usize, usize)> {
    (2usize..=CODES.len()).prop_flat_map(|num_nodes| {
        let edge_generator = (0usize..num_nodes, 0usize..num_nodes, 0.01f64..10.0);
        let edges_generator = prop::collection::vec(edge_generator, 1..30).prop_map(|edges| {
            edges
                .into_iter()
                .filter(|(u, v, _)| u != v)
                .map(|(u, v, rate)| (format!("{}_{}", CODES[u], CODES[v]), rate))
                .collect::<Vec<_>>()
        });

        (edges_generator, 0usize..num_nodes, 0usize..num_nodes)
    })
}

fn present_currencies(pairs: &[(String, f64)]) -> BTreeSet<String> {
    pairs
        .iter()
        .flat_map(|(key, _)| {
            let edge = EdgeKey::parse(key).unwrap();
            [edge.from.to_string(), edge.to.to_string()]
        })
        .collect()
}

/// Hop distance between every pair of currencies (Floyd-Warshall on unit weights).
fn hop_distances(table: &RateTable, codes: &[String]) -> Vec<Vec<Option<usize>>> {
    let n = codes.len();
    let pos = |c: &str| codes.iter().position(|code| code == c).unwrap();

    let mut dist = vec![vec![None; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = Some(0);
    }
    for (edge, _) in table.iter() {
        dist[pos(edge.from.as_str())][pos(edge.to.as_str())] = Some(1);
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if let (Some(a), Some(b)) = (dist[i][k], dist[k][j]) {
                    if dist[i][j].is_none_or(|d| a + b < d) {
                        dist[i][j] = Some(a + b);
                    }
                }
            }
        }
    }
    dist
}

proptest! {
    /// Property: node_pointers should be monotonic
    #[test]
    fn node_pointers_monotonic((pairs, _, _) in table_strategy()) {
        let table = RateTable::from_pairs(pairs).unwrap();
        let graph = PredecessorGraph::from_rate_table(&table);
        for i in 0..graph.num_nodes() {
            prop_assert!(graph.node_pointers[i] <= graph.node_pointers[i + 1]);
        }
        prop_assert_eq!(graph.node_pointers[graph.num_nodes()], graph.num_edges());
    }

    /// Property: every table edge u -> v is listed exactly once as a predecessor of v
    #[test]
    fn all_edges_included_as_predecessors((pairs, _, _) in table_strategy()) {
        let table = RateTable::from_pairs(pairs).unwrap();
        let graph = PredecessorGraph::from_rate_table(&table);

        prop_assert_eq!(graph.num_edges(), table.len());
        for (edge, _) in table.iter() {
            let u = graph.node_index(&edge.from).unwrap();
            let v = graph.node_index(&edge.to).unwrap();
            prop_assert_eq!(graph.predecessors(v).iter().filter(|&&p| p == u).count(), 1);
        }
    }

    /// Property: the returned path is connected, runs from -> to, and has minimal hop count
    #[test]
    fn shortest_path_is_minimal((pairs, a, b) in table_strategy()) {
        let codes: Vec<String> = present_currencies(&pairs).into_iter().collect();
        prop_assume!(!codes.is_empty());
        let from = &codes[a % codes.len()];
        let to = &codes[b % codes.len()];

        let mut engine: ArbEngine = ArbEngine::default();
        engine.load_rates(pairs.iter().map(|(k, r)| (k.as_str(), *r))).unwrap();
        let dist = hop_distances(engine.rates(), &codes);
        let expected = dist[a % codes.len()][b % codes.len()];

        match (engine.find_shortest_path(from, to), expected) {
            (Ok(conversion), Some(hops)) => {
                prop_assert_eq!(conversion.hops(), hops);
                prop_assert!(is_connected(&conversion.path));
                if let (Some(first), Some(last)) = (conversion.path.first(), conversion.path.last()) {
                    prop_assert_eq!(first.from.as_str(), from.as_str());
                    prop_assert_eq!(last.to.as_str(), to.as_str());
                } else {
                    prop_assert_eq!(from, to);
                    prop_assert_eq!(conversion.multiplier, 1.0);
                }
                let fresh = engine.rates().multiplier(&conversion.path).unwrap();
                prop_assert!(approx_eq_relative(conversion.multiplier, fresh, RELATIVE_TOLERANCE));
            }
            (Err(Error::NoPathFound { .. }), None) => {}
            (other, expected) => {
                prop_assert!(false, "got {:?}, expected {:?} hops", other, expected);
            }
        }
    }

    /// Property: cycles are simple, closed at home, deduplicated, and priced correctly
    #[test]
    fn cycles_are_simple_and_priced((pairs, h, _) in table_strategy()) {
        let codes: Vec<String> = present_currencies(&pairs).into_iter().collect();
        prop_assume!(!codes.is_empty());
        let home = &codes[h % codes.len()];

        let mut engine: ArbEngine = ArbEngine::default();
        engine.load_rates(pairs.iter().map(|(k, r)| (k.as_str(), *r))).unwrap();
        let cycles = engine.find_cycles(home).unwrap();

        let mut seen = HashSet::new();
        for (i, record) in cycles.iter().enumerate() {
            prop_assert_eq!(record.id, i);
            prop_assert!(seen.insert(record.path.clone()));
            prop_assert!(is_connected(&record.path));
            prop_assert_eq!(record.path.first().unwrap().from.as_str(), home.as_str());
            prop_assert_eq!(record.path.last().unwrap().to.as_str(), home.as_str());

            let stops: Vec<&str> = record.path.iter().map(|e| e.to.as_str()).collect();
            let unique: HashSet<&str> = stops.iter().copied().collect();
            prop_assert_eq!(stops.len(), unique.len());

            let fresh = engine.rates().multiplier(&record.path).unwrap();
            prop_assert!(approx_eq_relative(record.multiplier, fresh, RELATIVE_TOLERANCE));
        }

        let again = engine.find_cycles(home).unwrap();
        prop_assert_eq!(cycles, again);
    }

    /// Property: a rate update reprices exactly the cycles that contain the edge
    #[test]
    fn incremental_update_matches_full_recompute(
        (pairs, h, e) in table_strategy(),
        new_rate in 0.01f64..10.0,
    ) {
        prop_assume!(!pairs.is_empty());
        let codes: Vec<String> = present_currencies(&pairs).into_iter().collect();
        let home = &codes[h % codes.len()];

        let mut engine: ArbEngine = ArbEngine::default();
        engine.load_rates(pairs.iter().map(|(k, r)| (k.as_str(), *r))).unwrap();
        let before = engine.find_cycles(home).unwrap();

        let edges: Vec<EdgeKey> = engine.rates().iter().map(|(edge, _)| edge.clone()).collect();
        let changed = &edges[e % edges.len()];

        let affected = engine.update_rate(&changed.to_string(), new_rate).unwrap();
        let after = engine.analysis().unwrap().registry.records().to_vec();
        prop_assert_eq!(before.len(), after.len());

        for (old, new) in before.iter().zip(&after) {
            prop_assert_eq!(&old.path, &new.path);
            if old.contains_edge(changed) {
                prop_assert!(affected.contains(&old.id));
                let fresh = engine.rates().multiplier(&new.path).unwrap();
                prop_assert!(approx_eq_relative(new.multiplier, fresh, RELATIVE_TOLERANCE));
            } else {
                prop_assert!(!affected.contains(&old.id));
                prop_assert_eq!(old.multiplier.to_bits(), new.multiplier.to_bits());
            }
        }

        // A fresh engine over the updated table agrees with the patched registry.
        let mut fresh_engine: ArbEngine = ArbEngine::default();
        fresh_engine
            .load_rates(engine.rates().iter().map(|(edge, rate)| (edge.to_string(), rate)))
            .unwrap();
        let recomputed = fresh_engine.find_cycles(home).unwrap();
        prop_assert_eq!(recomputed.len(), after.len());
        for (patched, full) in after.iter().zip(&recomputed) {
            prop_assert_eq!(&patched.path, &full.path);
            prop_assert!(approx_eq_relative(patched.multiplier, full.multiplier, RELATIVE_TOLERANCE));
        }
    }
}

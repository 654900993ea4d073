use std::collections::BTreeSet;

use common::error::Error;
use common::types::{Currency, EdgeKey, Path};

use super::rate_table::RateTable;

/// Predecessor adjacency in Compressed Sparse Row (CSR) format.
///
/// The graph is indexed by reverse edges so traversals can walk backward from
/// a destination toward every currency that reaches it in one hop:
/// - `currencies[v]` -> currency code of node `v`, sorted ascending
/// - `node_pointers[v]..node_pointers[v+1]` -> slots in `predecessors` for node `v`
/// - `predecessors[i]` -> a node with a direct edge *into* `v`
///
/// Predecessors of a node are stored in ascending `from` order. Rates are not
/// stored: topology is a pure function of the rate table's edge set.
#[derive(Debug, Clone, Default)]
pub struct PredecessorGraph {
    pub currencies: Vec<Currency>,
    pub node_pointers: Vec<usize>,
    pub predecessors: Vec<usize>,
}

impl PredecessorGraph {
    /// Derives predecessor adjacency from the rate table's edge set.
    pub fn from_rate_table(table: &RateTable) -> Self {
        let currencies: Vec<Currency> = table
            .iter()
            .flat_map(|(edge, _)| [edge.from.clone(), edge.to.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Table iteration is ordered by (from, to); the counting pass below is
        // stable, so each predecessor list stays sorted by `from`.
        let edges: Vec<(usize, usize)> = table
            .iter()
            .filter_map(|(edge, _)| {
                let u = currencies.binary_search(&edge.from).ok()?;
                let v = currencies.binary_search(&edge.to).ok()?;
                Some((u, v))
            })
            .collect();

        let (node_pointers, predecessors) = Self::build_csr_from_edges(currencies.len(), &edges);

        Self {
            currencies,
            node_pointers,
            predecessors,
        }
    }

    /// Two-pass counting construction of the reverse CSR arrays.
    ///
    /// # Arguments
    /// * `num_nodes`: The total number of vertices (|V|).
    /// * `edges`: Directed `(from, to)` node pairs.
    ///
    /// # Returns
    /// 1. `node_pointers`: start offset of each node's predecessor block (size |V| + 1).
    /// 2. `predecessors`: source node of every edge, grouped by target node.
    fn build_csr_from_edges(num_nodes: usize, edges: &[(usize, usize)]) -> (Vec<usize>, Vec<usize>) {
        let mut node_pointers = vec![0; num_nodes + 1];

        for &(_, v) in edges {
            node_pointers[v + 1] += 1;
        }

        for i in 1..=num_nodes {
            node_pointers[i] += node_pointers[i - 1];
        }

        let mut predecessors = vec![0; edges.len()];
        let mut cursor = node_pointers.clone();

        for &(u, v) in edges {
            predecessors[cursor[v]] = u;
            cursor[v] += 1;
        }

        (node_pointers, predecessors)
    }

    pub fn num_nodes(&self) -> usize {
        self.currencies.len()
    }

    pub fn num_edges(&self) -> usize {
        self.predecessors.len()
    }

    /// Node index of a currency, if it appears on any edge.
    pub fn node_index(&self, currency: &Currency) -> Option<usize> {
        self.currencies.binary_search(currency).ok()
    }

    /// # Errors
    /// Returns `Error::UnknownCurrency` if the currency has no edge.
    pub fn require_node(&self, currency: &Currency) -> Result<usize, Error> {
        self.node_index(currency)
            .ok_or_else(|| Error::UnknownCurrency(currency.to_string()))
    }

    /// Nodes with a direct edge into `node`; empty for an out-of-range index.
    pub fn predecessors(&self, node: usize) -> &[usize] {
        match (self.node_pointers.get(node), self.node_pointers.get(node + 1)) {
            (Some(&start), Some(&end)) => &self.predecessors[start..end],
            _ => &[],
        }
    }

    /// Converts a backward BFS trail into a forward path.
    ///
    /// `trail` lists nodes from the destination back toward the source, so
    /// `trail[i + 1] -> trail[i]` is an edge. The result lists edges in travel order.
    ///
    /// # Errors
    /// Returns `Error::UnknownCurrency` if the trail references an out-of-range node.
    pub fn trail_to_path(&self, trail: &[usize]) -> Result<Path, Error> {
        let node = |idx: usize| {
            self.currencies
                .get(idx)
                .cloned()
                .ok_or_else(|| Error::UnknownCurrency(format!("#{idx}")))
        };

        trail
            .windows(2)
            .rev()
            .map(|pair| {
                Ok(EdgeKey {
                    from: node(pair[1])?,
                    to: node(pair[0])?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(pairs: &[(&str, f64)]) -> PredecessorGraph {
        let table = RateTable::from_pairs(pairs.iter().copied()).unwrap();
        PredecessorGraph::from_rate_table(&table)
    }

    fn currency(code: &str) -> Currency {
        Currency::parse(code).unwrap()
    }

    fn preds_of(g: &PredecessorGraph, code: &str) -> Vec<String> {
        let v = g.node_index(&currency(code)).unwrap();
        g.predecessors(v)
            .iter()
            .map(|&u| g.currencies[u].to_string())
            .collect()
    }

    #[test]
    fn builds_reverse_csr_for_small_graph() {
        let g = graph(&[("C_B", 0.99), ("A_C", 1.1), ("A_B", 0.9)]);

        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
        // A has no predecessors, B has {A, C}, C has {A}.
        assert_eq!(g.node_pointers, vec![0, 0, 2, 3]);
        assert_eq!(g.predecessors, vec![0, 2, 0]);
    }

    #[test]
    fn predecessor_lists_follow_source_order() {
        let g = graph(&[
            ("USD_GBP", 0.56),
            ("GBP_USD", 1.3),
            ("GBP_SGD", 1.8),
            ("SGD_USD", 0.67),
            ("SGD_JPY", 50.0),
            ("USD_JPY", 70.0),
            ("JPY_USD", 0.015),
        ]);

        assert_eq!(preds_of(&g, "JPY"), vec!["SGD", "USD"]);
        assert_eq!(preds_of(&g, "USD"), vec!["GBP", "JPY", "SGD"]);
        assert_eq!(preds_of(&g, "SGD"), vec!["GBP"]);
        assert_eq!(preds_of(&g, "GBP"), vec!["USD"]);
    }

    #[test]
    fn empty_table_yields_empty_graph() {
        let g = PredecessorGraph::from_rate_table(&RateTable::new());

        assert_eq!(g.num_nodes(), 0);
        assert_eq!(g.node_pointers, vec![0]);
        assert!(g.predecessors.is_empty());
        assert!(g.predecessors(0).is_empty());
    }

    #[test]
    fn unknown_currency_is_reported() {
        let g = graph(&[("USD_GBP", 0.56)]);
        assert_eq!(
            g.require_node(&currency("EUR")),
            Err(Error::UnknownCurrency("EUR".to_string()))
        );
    }

    #[test]
    fn rate_values_do_not_affect_topology() {
        let a = graph(&[("USD_GBP", 0.56), ("GBP_USD", 1.3)]);
        let b = graph(&[("USD_GBP", 9.0), ("GBP_USD", 0.01)]);

        assert_eq!(a.currencies, b.currencies);
        assert_eq!(a.node_pointers, b.node_pointers);
        assert_eq!(a.predecessors, b.predecessors);
    }

    #[test]
    fn trail_is_reversed_into_travel_order() {
        let g = graph(&[("GBP_SGD", 1.8), ("SGD_JPY", 50.0)]);
        let jpy = g.node_index(&currency("JPY")).unwrap();
        let sgd = g.node_index(&currency("SGD")).unwrap();
        let gbp = g.node_index(&currency("GBP")).unwrap();

        let path = g.trail_to_path(&[jpy, sgd, gbp]).unwrap();
        let keys: Vec<String> = path.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["GBP_SGD", "SGD_JPY"]);

        assert!(g.trail_to_path(&[jpy]).unwrap().is_empty());
    }
}

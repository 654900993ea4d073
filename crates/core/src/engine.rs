use std::sync::atomic::AtomicBool;

use tracing::{debug, info};

use super::cycles::{BfsCycleEnumerator, EnumerationLimits};
use super::graph::PredecessorGraph;
use super::inverse_index::InverseIndex;
use super::path_finder::shortest_path;
use super::rate_table::{LoadSummary, RateTable};
use super::registry::CycleRegistry;
use super::traits::CycleSolver;
use super::updater::apply_rate_change;
use common::error::Error;
use common::types::{ConversionPath, Currency, CycleId, CycleRecord, EdgeKey};

/// Registry of the cycles through one home currency plus its inverse index.
///
/// The two always travel together: the index is rebuilt whenever the registry
/// is re-enumerated.
#[derive(Debug, Clone)]
pub struct CycleAnalysis {
    pub registry: CycleRegistry,
    pub index: InverseIndex,
}

/// Incremental arbitrage-detection engine.
///
/// Owns the rate table, the predecessor graph derived from it, and the cycle
/// analysis for the most recently requested home currency. The graph is
/// rebuilt lazily after a topology change; rate-only changes go through the
/// inverse index and reprice only the affected cycles.
///
/// Not internally synchronized. A multi-writer host must serialize rate
/// updates, re-enumeration and `best_cycle` reads behind one lock.
#[derive(Debug, Clone)]
pub struct ArbEngine<S = BfsCycleEnumerator> {
    rates: RateTable,
    graph: PredecessorGraph,
    topology_dirty: bool,
    solver: S,
    analysis: Option<CycleAnalysis>,
}

impl Default for ArbEngine<BfsCycleEnumerator> {
    fn default() -> Self {
        Self::new(BfsCycleEnumerator::default())
    }
}

impl ArbEngine<BfsCycleEnumerator> {
    pub fn with_limits(limits: EnumerationLimits) -> Self {
        Self::new(BfsCycleEnumerator::new(limits))
    }
}

fn parse_currency(code: &str) -> Result<Currency, Error> {
    Currency::parse(code).map_err(|_| Error::UnknownCurrency(code.to_string()))
}

impl<S: CycleSolver> ArbEngine<S> {
    pub fn new(solver: S) -> Self {
        Self {
            rates: RateTable::new(),
            graph: PredecessorGraph::default(),
            topology_dirty: false,
            solver,
            analysis: None,
        }
    }

    /// Seeds the rate table from `"<FROM>_<TO>" -> rate` pairs.
    ///
    /// The batch is validated as a whole before anything is written. New edges
    /// mark the graph for rebuild and discard the cycle analysis; a batch that
    /// only overwrites existing rates reprices the current analysis in place.
    ///
    /// # Errors
    /// Returns `Error::InvalidPairKey` or `Error::InvalidRate`.
    pub fn load_rates<I, K>(&mut self, pairs: I) -> Result<LoadSummary, Error>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let summary = self.rates.load_pairs(pairs)?;

        if summary.changed_topology() {
            self.invalidate_topology();
        } else if let Some(analysis) = self.analysis.as_mut() {
            analysis.registry.refresh_all(&self.rates)?;
        }

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            edges = self.rates.len(),
            "rates loaded"
        );
        Ok(summary)
    }

    /// Registers a new edge.
    ///
    /// # Errors
    /// Returns `Error::InvalidPairKey`, `Error::InvalidRate` or `Error::DuplicateEdge`.
    pub fn add_edge(&mut self, key: &str, rate: f64) -> Result<(), Error> {
        let edge = EdgeKey::parse(key)?;
        self.rates.insert(edge, rate)?;
        self.invalidate_topology();
        Ok(())
    }

    /// Removes an edge and returns its last rate.
    ///
    /// # Errors
    /// Returns `Error::InvalidPairKey` or `Error::UnknownEdge`.
    pub fn remove_edge(&mut self, key: &str) -> Result<f64, Error> {
        let edge = EdgeKey::parse(key)?;
        let rate = self.rates.remove(&edge)?;
        self.invalidate_topology();
        Ok(rate)
    }

    /// Minimum-hop conversion path from `from` to `to` and its multiplier.
    ///
    /// `from == to` yields an empty path with multiplier `1.0`.
    ///
    /// # Errors
    /// Returns `Error::UnknownCurrency` if either currency has no edge, or
    /// `Error::NoPathFound` if `to` is unreachable from `from`.
    pub fn find_shortest_path(&mut self, from: &str, to: &str) -> Result<ConversionPath, Error> {
        let from = parse_currency(from)?;
        let to = parse_currency(to)?;

        self.refresh_graph();
        let from_node = self.graph.require_node(&from)?;
        let to_node = self.graph.require_node(&to)?;

        let path = shortest_path(&self.graph, from_node, to_node)?;
        let multiplier = self.rates.multiplier(&path)?;

        debug!(%from, %to, hops = path.len(), multiplier, "shortest path found");
        Ok(ConversionPath { path, multiplier })
    }

    /// Enumerates the cycles through `home`, replacing the current analysis.
    ///
    /// Ids are assigned in enumeration order and the inverse index is rebuilt.
    ///
    /// # Errors
    /// Returns `Error::UnknownCurrency` if `home` has no edge.
    pub fn find_cycles(&mut self, home: &str) -> Result<Vec<CycleRecord>, Error> {
        self.find_cycles_cancellable(home, &AtomicBool::new(false))
    }

    /// Like [`ArbEngine::find_cycles`], but stops once `cancel` is set.
    ///
    /// A cancelled enumeration leaves the previous analysis untouched.
    ///
    /// # Errors
    /// Returns `Error::UnknownCurrency` or `Error::EnumerationCancelled`.
    pub fn find_cycles_cancellable(
        &mut self,
        home: &str,
        cancel: &AtomicBool,
    ) -> Result<Vec<CycleRecord>, Error> {
        let home = parse_currency(home)?;
        let analysis = self.enumerate(home, cancel)?;
        let records = analysis.registry.records().to_vec();
        self.analysis = Some(analysis);
        Ok(records)
    }

    /// The most profitable cycle through `home`, if its multiplier exceeds 1.0.
    ///
    /// Reuses the current analysis when it belongs to `home`; otherwise the
    /// cycles are enumerated first.
    ///
    /// # Errors
    /// Returns `Error::UnknownCurrency` if `home` has no edge.
    pub fn get_best_arbitrage(&mut self, home: &str) -> Result<Option<(CycleId, f64)>, Error> {
        let home = parse_currency(home)?;

        let current = self
            .analysis
            .as_ref()
            .is_some_and(|analysis| analysis.registry.home() == &home);
        if !current {
            let analysis = self.enumerate(home, &AtomicBool::new(false))?;
            self.analysis = Some(analysis);
        }

        Ok(self
            .best_cycle()
            .filter(|record| record.is_profitable())
            .map(|record| (record.id, record.multiplier)))
    }

    /// Changes the rate of an existing edge and returns the ids of the cycles
    /// whose multiplier was recomputed.
    ///
    /// With no cycle analysis in place only the rate table changes.
    ///
    /// # Errors
    /// Returns `Error::InvalidPairKey`, `Error::InvalidRate`,
    /// `Error::UnknownEdge` or `Error::StaleIndex`.
    pub fn update_rate(&mut self, key: &str, new_rate: f64) -> Result<Vec<CycleId>, Error> {
        let edge = EdgeKey::parse(key)?;

        match self.analysis.as_mut() {
            Some(CycleAnalysis { registry, index }) => {
                apply_rate_change(&edge, new_rate, &mut self.rates, registry, index)
            }
            None => {
                self.rates.set_rate(&edge, new_rate)?;
                Ok(Vec::new())
            }
        }
    }

    /// Highest-multiplier record of the current analysis, profitable or not.
    pub fn best_cycle(&self) -> Option<&CycleRecord> {
        self.analysis
            .as_ref()
            .and_then(|analysis| analysis.registry.best_cycle())
    }

    pub fn analysis(&self) -> Option<&CycleAnalysis> {
        self.analysis.as_ref()
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn home(&self) -> Option<&Currency> {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.registry.home())
    }

    fn enumerate(&mut self, home: Currency, cancel: &AtomicBool) -> Result<CycleAnalysis, Error> {
        self.refresh_graph();
        let home_node = self.graph.require_node(&home)?;

        let cycles = self
            .solver
            .enumerate_cycles(&self.graph, home_node, cancel)?;
        let registry = CycleRegistry::register(home, cycles, &self.rates)?;
        let index = InverseIndex::build(&registry);

        info!(
            home = %registry.home(),
            cycles = registry.len(),
            indexed_edges = index.len(),
            "cycle analysis rebuilt"
        );
        Ok(CycleAnalysis { registry, index })
    }

    fn invalidate_topology(&mut self) {
        self.topology_dirty = true;
        if self.analysis.take().is_some() {
            debug!("topology changed, cycle analysis discarded");
        }
    }

    fn refresh_graph(&mut self) {
        if self.topology_dirty {
            self.graph = PredecessorGraph::from_rate_table(&self.rates);
            self.topology_dirty = false;
            debug!(
                nodes = self.graph.num_nodes(),
                edges = self.graph.num_edges(),
                "predecessor graph rebuilt"
            );
        }
    }
}

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::graph::PredecessorGraph;
use super::traits::CycleSolver;
use common::{error::Error, types::Path};

/// Default number of times an interior currency may be enqueued.
pub const DEFAULT_MAX_VISITS: usize = 2;

/// Bounds on cycle enumeration.
///
/// The number of simple cycles through a currency grows combinatorially with
/// graph density, so callers on dense graphs should set `max_hops` or
/// `max_cycles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerationLimits {
    /// Longest cycle kept, in edges. `None` leaves length bounded only by simplicity.
    pub max_hops: Option<usize>,
    /// Stop once this many distinct cycles have been found.
    pub max_cycles: Option<usize>,
    /// How many times a non-home currency may be enqueued across the whole search.
    pub max_visits: usize,
}

impl Default for EnumerationLimits {
    fn default() -> Self {
        Self {
            max_hops: None,
            max_cycles: None,
            max_visits: DEFAULT_MAX_VISITS,
        }
    }
}

/// Breadth-first enumerator of simple cycles through a home currency.
///
/// The search is seeded at `home` and walks predecessor adjacency, exactly
/// like the shortest-path search, but keeps draining the queue after the
/// first closure. Each queue entry carries its trail of nodes back from
/// `home`. A currency already on the trail is never re-entered, and a global
/// per-currency counter caps how often a currency may be enqueued at all.
/// `home` starts at count one and is only ever used to close a cycle.
///
/// Worst-case cost is exponential in the number of currencies on dense graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsCycleEnumerator {
    pub limits: EnumerationLimits,
}

impl BfsCycleEnumerator {
    pub fn new(limits: EnumerationLimits) -> Self {
        Self { limits }
    }

    fn exceeds_hops(&self, hops: usize) -> bool {
        self.limits.max_hops.is_some_and(|max| hops > max)
    }
}

impl CycleSolver for BfsCycleEnumerator {
    /// Collects every simple cycle through `home` reachable within the limits.
    ///
    /// # Returns
    /// - `Ok(cycles)` → Cycles in discovery order, deduplicated by edge sequence.
    /// - `Err(Error::UnknownCurrency)` → `home` is out of bounds.
    /// - `Err(Error::EnumerationCancelled)` → `cancel` was set mid-search.
    fn enumerate_cycles(
        &self,
        graph: &PredecessorGraph,
        home: usize,
        cancel: &AtomicBool,
    ) -> Result<Vec<Path>, Error> {
        let num_nodes = graph.num_nodes();
        if home >= num_nodes {
            return Err(Error::UnknownCurrency(format!("#{home}")));
        }

        let mut visits = vec![0usize; num_nodes];
        visits[home] = 1;

        let mut queue: VecDeque<Vec<usize>> = VecDeque::new();
        queue.push_back(vec![home]);

        let mut seen: HashSet<Path> = HashSet::new();
        let mut cycles: Vec<Path> = Vec::new();

        while let Some(trail) = queue.pop_front() {
            let Some(&node) = trail.last() else {
                continue;
            };
            // Closing from here yields a cycle of `trail.len()` edges.
            let hops = trail.len();

            for &pred in graph.predecessors(node) {
                if cancel.load(Ordering::Relaxed) {
                    debug!(found = cycles.len(), "cycle enumeration cancelled");
                    return Err(Error::EnumerationCancelled);
                }

                if pred == home {
                    if self.exceeds_hops(hops) {
                        continue;
                    }
                    let mut closed = trail.clone();
                    closed.push(home);
                    let path = graph.trail_to_path(&closed)?;

                    if seen.insert(path.clone()) {
                        cycles.push(path);
                        if self.limits.max_cycles.is_some_and(|max| cycles.len() >= max) {
                            warn!(
                                home = %graph.currencies[home],
                                limit = cycles.len(),
                                "cycle enumeration truncated at max_cycles"
                            );
                            return Ok(cycles);
                        }
                    }
                    continue;
                }

                if trail.contains(&pred)
                    || visits[pred] >= self.limits.max_visits
                    || self.exceeds_hops(hops + 1)
                {
                    continue;
                }

                visits[pred] += 1;
                let mut next = trail.clone();
                next.push(pred);
                queue.push_back(next);
            }
        }

        debug!(
            home = %graph.currencies[home],
            cycles = cycles.len(),
            "cycle enumeration complete"
        );
        Ok(cycles)
    }
}

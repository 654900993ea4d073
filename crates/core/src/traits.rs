use std::sync::atomic::AtomicBool;

use super::graph::PredecessorGraph;
use common::{error::Error, types::Path};

/// Trait for solvers capable of enumerating cycles through a home currency.
pub trait CycleSolver {
    /// Enumerates the cycles that start and end at node `home`.
    ///
    /// Returns each cycle as a forward path, in discovery order, without
    /// duplicates. Implementations must poll `cancel` between cycle-closure
    /// checks and fail with `Error::EnumerationCancelled` once it is set.
    fn enumerate_cycles(
        &self,
        graph: &PredecessorGraph,
        home: usize,
        cancel: &AtomicBool,
    ) -> Result<Vec<Path>, Error>;
}

use std::collections::{BTreeSet, HashMap};

use super::registry::CycleRegistry;
use common::error::Error;
use common::types::{CycleId, EdgeKey};

/// Reverse index from an edge to the ids of the cycles whose path uses it.
///
/// An edge appears in the bucket of a cycle iff it is on that cycle's stored
/// path. The index is stamped with the registry generation it reflects and
/// refuses to answer once the registry membership has moved on.
#[derive(Debug, Clone, Default)]
pub struct InverseIndex {
    buckets: HashMap<EdgeKey, BTreeSet<CycleId>>,
    registry_generation: u64,
}

impl InverseIndex {
    pub fn build(registry: &CycleRegistry) -> Self {
        let mut index = Self {
            buckets: HashMap::new(),
            registry_generation: registry.generation(),
        };
        for record in registry.records() {
            index.insert_record(record.id, &record.path);
        }
        index
    }

    fn insert_record(&mut self, id: CycleId, path: &[EdgeKey]) {
        for edge in path {
            self.buckets.entry(edge.clone()).or_default().insert(id);
        }
    }

    /// Patches the index for a single cycle just added to `registry`.
    ///
    /// A registry that has not moved since the index was stamped is a no-op
    /// (e.g. a duplicate registration).
    ///
    /// # Errors
    /// Returns `Error::StaleIndex` unless the registry is exactly one membership
    /// change ahead of the index, and `Error::UnknownCycle` for an unassigned id.
    pub fn amend(&mut self, registry: &CycleRegistry, id: CycleId) -> Result<(), Error> {
        let registry_generation = registry.generation();
        if registry_generation == self.registry_generation {
            return Ok(());
        }
        if registry_generation != self.registry_generation + 1 {
            return Err(self.stale(registry_generation));
        }

        let record = registry.get(id)?;
        self.insert_record(record.id, &record.path);
        self.registry_generation = registry_generation;
        Ok(())
    }

    /// # Errors
    /// Returns `Error::StaleIndex` if `registry` changed membership since the
    /// index was built or last amended.
    pub fn ensure_fresh(&self, registry: &CycleRegistry) -> Result<(), Error> {
        if registry.generation() == self.registry_generation {
            Ok(())
        } else {
            Err(self.stale(registry.generation()))
        }
    }

    /// Ids of the cycles containing `edge`, ascending. Unindexed edges yield none.
    ///
    /// # Errors
    /// Returns `Error::StaleIndex` if the index no longer matches `registry`.
    pub fn affected_cycles(
        &self,
        edge: &EdgeKey,
        registry: &CycleRegistry,
    ) -> Result<Vec<CycleId>, Error> {
        self.ensure_fresh(registry)?;
        Ok(self
            .buckets
            .get(edge)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    pub fn cycles_for(&self, edge: &EdgeKey) -> Option<&BTreeSet<CycleId>> {
        self.buckets.get(edge)
    }

    /// Number of distinct edges indexed.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn registry_generation(&self) -> u64 {
        self.registry_generation
    }

    fn stale(&self, registry_generation: u64) -> Error {
        Error::StaleIndex {
            index_generation: self.registry_generation,
            registry_generation,
        }
    }
}

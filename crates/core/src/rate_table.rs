use std::collections::BTreeMap;

use common::error::Error;
use common::numeric_kernel::{is_valid_rate, path_multiplier};
use common::types::EdgeKey;

/// Outcome of a batch load into the rate table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Edges that did not exist before the load.
    pub inserted: usize,
    /// Existing edges whose rate was overwritten.
    pub updated: usize,
}

impl LoadSummary {
    pub fn changed_topology(&self) -> bool {
        self.inserted > 0
    }
}

/// Source of truth for directed edges and their current rate.
///
/// Edges are kept ordered by `(from, to)`, which makes every structure
/// derived from the table (graph adjacency, BFS discovery order) deterministic.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: BTreeMap<EdgeKey, f64>,
}

fn validate_rate(edge: &EdgeKey, rate: f64) -> Result<(), Error> {
    if is_valid_rate(rate) {
        Ok(())
    } else {
        Err(Error::InvalidRate {
            pair: edge.to_string(),
            rate,
        })
    }
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `"<FROM>_<TO>" -> rate` pairs.
    ///
    /// # Errors
    /// See [`RateTable::load_pairs`].
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut table = Self::new();
        table.load_pairs(pairs)?;
        Ok(table)
    }

    /// Loads a batch of `"<FROM>_<TO>" -> rate` pairs.
    ///
    /// Every key and rate is validated before the table is touched, so a
    /// rejected batch leaves the table unchanged. A pair and its textual
    /// inverse are independent entries. Within one batch the last occurrence
    /// of a key wins.
    ///
    /// # Errors
    /// Returns `Error::InvalidPairKey` for a malformed key or
    /// `Error::InvalidRate` for a non-positive or non-finite rate.
    pub fn load_pairs<I, K>(&mut self, pairs: I) -> Result<LoadSummary, Error>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let parsed = pairs
            .into_iter()
            .map(|(key, rate)| {
                let edge = EdgeKey::parse(key.as_ref())?;
                validate_rate(&edge, rate)?;
                Ok((edge, rate))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let mut summary = LoadSummary::default();
        for (edge, rate) in parsed {
            match self.rates.insert(edge, rate) {
                Some(_) => summary.updated += 1,
                None => summary.inserted += 1,
            }
        }
        Ok(summary)
    }

    /// Registers a new edge.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` or `Error::DuplicateEdge`.
    pub fn insert(&mut self, edge: EdgeKey, rate: f64) -> Result<(), Error> {
        validate_rate(&edge, rate)?;
        if self.rates.contains_key(&edge) {
            return Err(Error::DuplicateEdge(edge.to_string()));
        }
        self.rates.insert(edge, rate);
        Ok(())
    }

    /// Overwrites the rate of an existing edge and returns the previous rate.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` or `Error::UnknownEdge`; the table is
    /// unchanged in both cases.
    pub fn set_rate(&mut self, edge: &EdgeKey, rate: f64) -> Result<f64, Error> {
        validate_rate(edge, rate)?;
        let slot = self
            .rates
            .get_mut(edge)
            .ok_or_else(|| Error::UnknownEdge(edge.to_string()))?;
        Ok(std::mem::replace(slot, rate))
    }

    /// Removes an edge and returns its last rate.
    ///
    /// # Errors
    /// Returns `Error::UnknownEdge` if the edge is not registered.
    pub fn remove(&mut self, edge: &EdgeKey) -> Result<f64, Error> {
        self.rates
            .remove(edge)
            .ok_or_else(|| Error::UnknownEdge(edge.to_string()))
    }

    pub fn rate(&self, edge: &EdgeKey) -> Option<f64> {
        self.rates.get(edge).copied()
    }

    pub fn contains(&self, edge: &EdgeKey) -> bool {
        self.rates.contains_key(edge)
    }

    /// Product of the current rates along `path`.
    ///
    /// # Errors
    /// Returns `Error::UnknownEdge` for the first edge missing from the table.
    pub fn multiplier(&self, path: &[EdgeKey]) -> Result<f64, Error> {
        let rates = path
            .iter()
            .map(|edge| {
                self.rate(edge)
                    .ok_or_else(|| Error::UnknownEdge(edge.to_string()))
            })
            .collect::<Result<Vec<f64>, Error>>()?;
        Ok(path_multiplier(rates))
    }

    /// Edges in `(from, to)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, f64)> {
        self.rates.iter().map(|(edge, rate)| (edge, *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

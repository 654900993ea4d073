use std::collections::HashMap;

use super::rate_table::RateTable;
use common::error::Error;
use common::types::{Currency, CycleId, CycleRecord, Path, is_connected};

/// Discovered cycles for one home currency, each with its cached multiplier.
///
/// Ids are assigned in registration order and equal the record's position.
/// `generation` advances on every membership change and is what the inverse
/// index compares against to detect staleness. Rate-only refreshes leave it
/// untouched.
#[derive(Debug, Clone)]
pub struct CycleRegistry {
    home: Currency,
    records: Vec<CycleRecord>,
    by_path: HashMap<Path, CycleId>,
    generation: u64,
}

impl CycleRegistry {
    pub fn new(home: Currency) -> Self {
        Self {
            home,
            records: Vec::new(),
            by_path: HashMap::new(),
            generation: 0,
        }
    }

    /// Registers a batch of cycles in order, pricing each against `rates`.
    ///
    /// # Errors
    /// See [`CycleRegistry::register_cycle`].
    pub fn register<I>(home: Currency, cycles: I, rates: &RateTable) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Path>,
    {
        let mut registry = Self::new(home);
        for path in cycles {
            registry.register_cycle(path, rates)?;
        }
        Ok(registry)
    }

    /// Adds one cycle and returns its id.
    ///
    /// A cycle already present returns its existing id without changing the
    /// registry.
    ///
    /// # Errors
    /// Returns `Error::InvalidCycle` if the path is empty, disconnected, or not
    /// closed at the home currency, and `Error::UnknownEdge` if one of its
    /// edges has no rate.
    pub fn register_cycle(&mut self, path: Path, rates: &RateTable) -> Result<CycleId, Error> {
        if let Some(&id) = self.by_path.get(&path) {
            return Ok(id);
        }

        let closed_at_home = matches!(
            (path.first(), path.last()),
            (Some(first), Some(last)) if first.from == self.home && last.to == self.home
        );
        if !closed_at_home || !is_connected(&path) {
            let keys: Vec<String> = path.iter().map(ToString::to_string).collect();
            return Err(Error::InvalidCycle(format!("[{}]", keys.join(", "))));
        }

        let multiplier = rates.multiplier(&path)?;
        let id = self.records.len();

        self.by_path.insert(path.clone(), id);
        self.records.push(CycleRecord {
            id,
            path,
            multiplier,
        });
        self.generation += 1;

        Ok(id)
    }

    /// # Errors
    /// Returns `Error::UnknownCycle` for an id the registry never assigned.
    pub fn get(&self, id: CycleId) -> Result<&CycleRecord, Error> {
        self.records.get(id).ok_or(Error::UnknownCycle(id))
    }

    /// The record with the largest multiplier; ties go to the lowest id.
    ///
    /// A multiplier above 1.0 marks an arbitrage for the home currency.
    pub fn best_cycle(&self) -> Option<&CycleRecord> {
        self.records.iter().fold(None, |best, record| match best {
            Some(current) if current.multiplier >= record.multiplier => Some(current),
            _ => Some(record),
        })
    }

    /// Recomputes the multiplier of `id` from its stored path against `rates`
    /// without writing it back.
    ///
    /// # Errors
    /// Returns `Error::UnknownCycle` or `Error::UnknownEdge`.
    pub fn price(&self, id: CycleId, rates: &RateTable) -> Result<f64, Error> {
        rates.multiplier(&self.get(id)?.path)
    }

    /// Overwrites the cached multiplier of `id`.
    ///
    /// # Errors
    /// Returns `Error::UnknownCycle` for an id the registry never assigned.
    pub fn set_multiplier(&mut self, id: CycleId, multiplier: f64) -> Result<(), Error> {
        let record = self.records.get_mut(id).ok_or(Error::UnknownCycle(id))?;
        record.multiplier = multiplier;
        Ok(())
    }

    /// Reprices every record against `rates`. Membership is unchanged.
    ///
    /// # Errors
    /// Returns `Error::UnknownEdge` if a stored path references a missing
    /// edge; no record is modified in that case.
    pub fn refresh_all(&mut self, rates: &RateTable) -> Result<(), Error> {
        let multipliers = self
            .records
            .iter()
            .map(|record| rates.multiplier(&record.path))
            .collect::<Result<Vec<f64>, Error>>()?;

        for (record, multiplier) in self.records.iter_mut().zip(multipliers) {
            record.multiplier = multiplier;
        }
        Ok(())
    }

    pub fn home(&self) -> &Currency {
        &self.home
    }

    pub fn records(&self) -> &[CycleRecord] {
        &self.records
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::EdgeKey;

    fn path(keys: &[&str]) -> Path {
        keys.iter().map(|k| EdgeKey::parse(k).unwrap()).collect()
    }

    fn sgd() -> Currency {
        Currency::parse("SGD").unwrap()
    }

    fn rates() -> RateTable {
        RateTable::from_pairs([
            ("USD_GBP", 0.56),
            ("GBP_SGD", 1.8),
            ("SGD_USD", 0.67),
            ("SGD_JPY", 50.0),
            ("JPY_USD", 0.015),
            ("JPY_SGD", 0.025),
        ])
        .unwrap()
    }

    fn registry() -> CycleRegistry {
        CycleRegistry::register(
            sgd(),
            [
                path(&["SGD_USD", "USD_GBP", "GBP_SGD"]),
                path(&["SGD_JPY", "JPY_SGD"]),
                path(&["SGD_JPY", "JPY_USD", "USD_GBP", "GBP_SGD"]),
            ],
            &rates(),
        )
        .unwrap()
    }

    #[test]
    fn ids_follow_registration_order() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.generation(), 3);
        for (i, record) in registry.records().iter().enumerate() {
            assert_eq!(record.id, i);
        }
        assert_eq!(
            registry.get(1).unwrap().path,
            path(&["SGD_JPY", "JPY_SGD"])
        );
        assert_eq!(registry.get(7), Err(Error::UnknownCycle(7)));
    }

    #[test]
    fn multipliers_are_priced_on_registration() {
        let registry = registry();
        let expected = [0.67 * 0.56 * 1.8, 50.0 * 0.025, 50.0 * 0.015 * 0.56 * 1.8];
        for (record, want) in registry.records().iter().zip(expected) {
            assert!((record.multiplier - want).abs() < 1e-12);
        }
    }

    #[test]
    fn best_cycle_is_the_arbitrage() {
        let registry = registry();
        let best = registry.best_cycle().unwrap();
        assert_eq!(best.id, 1);
        assert!(best.is_profitable());
    }

    #[test]
    fn best_cycle_of_empty_registry_is_none() {
        assert!(CycleRegistry::new(sgd()).best_cycle().is_none());
    }

    #[test]
    fn best_cycle_tie_goes_to_lowest_id() {
        let rates = RateTable::from_pairs([("SGD_JPY", 2.0), ("JPY_SGD", 0.5), ("SGD_USD", 4.0), ("USD_SGD", 0.25)])
            .unwrap();
        let registry = CycleRegistry::register(
            sgd(),
            [path(&["SGD_JPY", "JPY_SGD"]), path(&["SGD_USD", "USD_SGD"])],
            &rates,
        )
        .unwrap();
        assert_eq!(registry.best_cycle().unwrap().id, 0);
    }

    #[test]
    fn duplicate_cycle_keeps_its_id() {
        let mut registry = registry();
        let id = registry
            .register_cycle(path(&["SGD_JPY", "JPY_SGD"]), &rates())
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.generation(), 3);
    }

    #[test]
    fn rejects_paths_that_are_not_home_cycles() {
        let mut registry = CycleRegistry::new(sgd());
        let rates = rates();

        assert!(matches!(
            registry.register_cycle(Vec::new(), &rates),
            Err(Error::InvalidCycle(_))
        ));
        assert!(matches!(
            registry.register_cycle(path(&["USD_GBP", "GBP_SGD", "SGD_USD"]), &rates),
            Err(Error::InvalidCycle(_))
        ));
        assert!(matches!(
            registry.register_cycle(path(&["SGD_JPY", "USD_GBP", "GBP_SGD"]), &rates),
            Err(Error::InvalidCycle(_))
        ));
        assert_eq!(
            registry.register_cycle(path(&["SGD_EUR", "EUR_SGD"]), &rates),
            Err(Error::UnknownEdge("SGD_EUR".to_string()))
        );
        assert!(registry.is_empty());
        assert_eq!(registry.generation(), 0);
    }

    #[test]
    fn refresh_all_reprices_without_membership_change() {
        let mut registry = registry();
        let mut rates = rates();
        rates
            .set_rate(&EdgeKey::parse("USD_GBP").unwrap(), 0.6)
            .unwrap();

        registry.refresh_all(&rates).unwrap();
        assert_eq!(registry.generation(), 3);
        assert!((registry.get(0).unwrap().multiplier - 0.67 * 0.6 * 1.8).abs() < 1e-12);
        assert!((registry.get(1).unwrap().multiplier - 1.25).abs() < 1e-12);
    }
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A path or cycle request named a currency that has no edge in the rate table.
    #[error("Currency {0} is not present in the rate graph.")]
    UnknownCurrency(String),

    /// The BFS drained its queue without reaching the source currency.
    #[error("No conversion path from {from} to {to}.")]
    NoPathFound { from: String, to: String },

    /// Rates must be finite and strictly positive.
    #[error("Invalid rate {rate} for pair {pair}: rates must be finite and > 0.")]
    InvalidRate { pair: String, rate: f64 },

    /// A rate update or removal targeted an edge that was never registered.
    #[error("Edge {0} is not registered in the rate table.")]
    UnknownEdge(String),

    /// An edge with this key already exists.
    #[error("Edge {0} is already registered in the rate table.")]
    DuplicateEdge(String),

    /// The pair key is not of the form `<FROM>_<TO>` with two distinct currencies.
    #[error("Invalid pair key {0:?}: expected <FROM>_<TO> with two distinct currency codes.")]
    InvalidPairKey(String),

    /// A path offered to the registry is not a closed, connected cycle through its home.
    #[error("Path {0} is not a cycle through the registry's home currency.")]
    InvalidCycle(String),

    /// Lookup of a cycle id the registry never assigned.
    #[error("Cycle {0} is not present in the registry.")]
    UnknownCycle(usize),

    /// The inverse index was built for a different registry membership.
    ///
    /// This is a programming-contract violation: the index must be rebuilt or
    /// amended whenever cycles are added to or removed from the registry.
    #[error(
        "Inverse index is stale: built at registry generation {index_generation}, registry is at {registry_generation}."
    )]
    StaleIndex {
        index_generation: u64,
        registry_generation: u64,
    },

    /// Cycle enumeration observed its cancellation flag and stopped.
    #[error("Cycle enumeration was cancelled.")]
    EnumerationCancelled,
}

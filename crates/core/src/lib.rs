//! Incremental arbitrage detection over a directed graph of exchange rates.
//!
//! Cycles through a home currency are enumerated once and registered together
//! with an inverse index from edge to cycle ids, so a single rate change only
//! reprices the cycles that actually use that edge.

pub mod cycles;
pub mod engine;
pub mod graph;
pub mod inverse_index;
pub mod path_finder;
pub mod rate_table;
pub mod registry;
pub mod traits;
pub mod updater;

pub use cycles::{BfsCycleEnumerator, EnumerationLimits};
pub use engine::{ArbEngine, CycleAnalysis};
pub use graph::PredecessorGraph;
pub use inverse_index::InverseIndex;
pub use rate_table::{LoadSummary, RateTable};
pub use registry::CycleRegistry;

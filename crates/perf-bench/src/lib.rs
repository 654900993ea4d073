// ----------------------------
// Incremental vs full recompute
// ----------------------------

use arb_engine_core::ArbEngine;
use common::error::Error;

/// Currencies of the benchmark market. Every ordered pair is quoted.
pub const CURRENCIES: [&str; 7] = ["AUD", "CAD", "CHF", "EUR", "GBP", "JPY", "USD"];

pub const HOME: &str = "USD";
pub const NUM_UPDATES: usize = 500;

/// Generates a complete market over [`CURRENCIES`].
///
/// Rates hover around 1.0 and are varied by pair index so no two cycles
/// price identically.
pub fn generate_dense_rates() -> Vec<(String, f64)> {
    let mut pairs = Vec::with_capacity(CURRENCIES.len() * (CURRENCIES.len() - 1));
    for (i, from) in CURRENCIES.iter().enumerate() {
        for (j, to) in CURRENCIES.iter().enumerate() {
            if i == j {
                continue;
            }
            let skew = ((i * 7 + j * 3) % 11) as f64 * 1e-3;
            pairs.push((format!("{}_{}", from, to), 0.995 + skew));
        }
    }
    pairs
}

/// Deterministic stream of rate changes cycling over the market's pairs.
pub fn generate_updates(pairs: &[(String, f64)]) -> Vec<(String, f64)> {
    (0..NUM_UPDATES)
        .map(|i| {
            let (pair, rate) = &pairs[(i * 13) % pairs.len()];
            let step = 1.0 + ((i % 9) as f64 - 4.0) * 1e-4;
            (pair.clone(), rate * step)
        })
        .collect()
}

/// Engine seeded with `pairs`, with the cycles through [`HOME`] registered.
pub fn prepared_engine(pairs: &[(String, f64)]) -> Result<ArbEngine, Error> {
    let mut engine: ArbEngine = ArbEngine::default();
    engine.load_rates(pairs.iter().map(|(pair, rate)| (pair.as_str(), *rate)))?;
    engine.find_cycles(HOME)?;
    Ok(engine)
}

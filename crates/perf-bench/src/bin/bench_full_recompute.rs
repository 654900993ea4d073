use std::hint::black_box;
use std::time::Instant;

use common::error::Error;
use perf_bench::*;

fn main() -> Result<(), Error> {
    let pairs = generate_dense_rates();
    let updates = generate_updates(&pairs);
    let mut engine = prepared_engine(&pairs)?;
    let num_cycles = engine.analysis().map_or(0, |a| a.registry.len());

    let start_time = Instant::now();
    let mut repriced = 0usize;

    // Baseline: re-enumerate and reprice every cycle after each change.
    for (pair, rate) in &updates {
        engine.load_rates([(pair.as_str(), *rate)])?;
        repriced += engine.find_cycles(HOME)?.len();
    }

    let elapsed_time = start_time.elapsed();

    let best = black_box(engine.best_cycle().map_or(0.0, |record| record.multiplier));

    println!(
        "--- Full Recompute Benchmark Results ({} Cycles, {} Updates) ---",
        num_cycles, NUM_UPDATES
    );
    println!("Cycles Repriced: {}", repriced);
    println!("Best Multiplier: {:.10}", best);
    println!("Elapsed Time: {:?}", elapsed_time);
    Ok(())
}

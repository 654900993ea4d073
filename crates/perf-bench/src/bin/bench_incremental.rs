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

    // Each update touches only the cycles that contain its edge.
    for (pair, rate) in &updates {
        repriced += engine.update_rate(pair, *rate)?.len();
    }

    let elapsed_time = start_time.elapsed();

    let best = black_box(engine.best_cycle().map_or(0.0, |record| record.multiplier));

    println!(
        "--- Incremental Benchmark Results ({} Cycles, {} Updates) ---",
        num_cycles, NUM_UPDATES
    );
    println!("Cycles Repriced: {}", repriced);
    println!("Best Multiplier: {:.10}", best);
    println!("Elapsed Time: {:?}", elapsed_time);
    Ok(())
}

pub mod config;
pub mod csv_streamer;
pub mod error;
pub mod producer;
pub mod searcher;
pub mod sim_streamer;
pub mod types;
pub mod writer;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, mpsc::Receiver, mpsc::Sender, watch};
use tokio::time::Duration;
use tracing::{error, info, warn};

use arb_engine_core::ArbEngine;
use crate::config::Config;
use csv_streamer::{CsvStreamer, read_rate_records};
use error::Error;
use producer::Producer;
use searcher::ArbSearcher;
use sim_streamer::SimulatorStreamer;
use types::{DataSource, JoinHandleResult, RateUpdate, SharedEngine};
use writer::Writer;

#[derive(Parser, Debug)]
#[command(name = "executor", about = "Incremental currency-arbitrage engine")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "crates/executor/Config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream rate updates through the engine and report arbitrage.
    Run {
        #[command(subcommand)]
        source: Option<Source>,
    },
    /// Print the minimum-hop conversion path between two currencies.
    Path { from: String, to: String },
    /// Enumerate the cycles through a home currency.
    Cycles {
        /// Defaults to `engine.home` from the configuration.
        home: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum Source {
    /// Random-walk the loaded rates.
    Sim,
    /// Replay `pair,rate` updates from a CSV file.
    Csv { path: PathBuf },
}

impl From<Option<Source>> for DataSource {
    fn from(source: Option<Source>) -> Self {
        match source {
            None | Some(Source::Sim) => DataSource::Sim,
            Some(Source::Csv { path }) => DataSource::Csv(path),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;
    config.logging.init();

    let engine = load_engine(&config)?;

    match cli.command {
        Command::Run { source } => run_pipeline(engine, &config, source.into()).await,
        Command::Path { from, to } => print_path(engine, &from, &to),
        Command::Cycles { home } => {
            print_cycles(engine, home.as_deref().unwrap_or(&config.engine.home))
        }
    }
}

/// Builds the engine from the configured rate file.
fn load_engine(config: &Config) -> Result<ArbEngine, Error> {
    let seed = read_rate_records(&config.engine.rates_path)?;
    let mut engine = ArbEngine::with_limits(config.engine.limits());
    engine.load_rates(seed.iter().map(|update| (update.pair.as_str(), update.new_rate)))?;
    Ok(engine)
}

fn print_path(mut engine: ArbEngine, from: &str, to: &str) -> Result<(), Error> {
    let conversion = engine.find_shortest_path(from, to)?;
    let hops: Vec<String> = conversion.edge_keys();
    println!(
        "{} -> {}: [{}] multiplier {:.6}",
        from.to_uppercase(),
        to.to_uppercase(),
        hops.join(", "),
        conversion.multiplier
    );
    Ok(())
}

fn print_cycles(mut engine: ArbEngine, home: &str) -> Result<(), Error> {
    let cycles = engine.find_cycles(home)?;
    for record in &cycles {
        println!(
            "#{:<4} {:.6}  [{}]",
            record.id,
            record.multiplier,
            record.edge_keys().join(", ")
        );
    }
    match engine.get_best_arbitrage(home)? {
        Some((id, multiplier)) => println!("Best arbitrage: #{} multiplier {:.6}", id, multiplier),
        None => println!("No arbitrage among {} cycles.", cycles.len()),
    }
    Ok(())
}

/// Runs producer, writer and searcher until the producer finishes or Ctrl-C.
async fn run_pipeline(
    mut engine: ArbEngine,
    config: &Config,
    source: DataSource,
) -> Result<(), Error> {
    let home = config.engine.home.as_str();
    let cycles = engine.find_cycles(home)?;
    info!(home, cycles = cycles.len(), "Cycle registry ready.");

    let sim_pairs: Vec<(String, f64)> = engine
        .rates()
        .iter()
        .map(|(edge, rate)| (edge.to_string(), rate))
        .collect();
    let shared_engine: SharedEngine = Arc::new(RwLock::new(engine));

    let (sender, receiver) =
        mpsc::channel::<Vec<RateUpdate>>(config.producer.channel_capacity.max(1));
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let mut producer_handle = spawn_producer(&source, sender, config, sim_pairs);
    let writer_handle = spawn_writer(shared_engine.clone(), receiver, shutdown_rx.clone());
    let searcher_handle = spawn_searcher(
        shared_engine.clone(),
        config.searcher.interval_ms,
        shutdown_rx,
    );

    let producer_finished = tokio::select! {
        result = &mut producer_handle => {
            match result {
                Ok(Ok(())) => info!("Producer finished."),
                Ok(Err(e)) => error!(error = %e, "Producer failed."),
                Err(e) => error!(error = %e, "Producer task panicked."),
            }
            true
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down pipeline.");
            false
        }
    };

    if !producer_finished {
        producer_handle.abort();
    }

    // The writer drains whatever the producer already queued before it sees
    // a closed channel; only an interrupt cuts it short.
    if producer_finished {
        writer_handle.await??;
        let _ = shutdown_tx.send(());
    } else {
        let _ = shutdown_tx.send(());
        writer_handle.await??;
    }
    searcher_handle.await??;

    let mut engine = shared_engine.write().await;
    match engine.get_best_arbitrage(home)? {
        Some((id, multiplier)) => info!(id, multiplier, "Final best arbitrage."),
        None => warn!(home, "No arbitrage opportunity at shutdown."),
    }

    info!("Pipeline shut down.");
    Ok(())
}

pub fn spawn_producer(
    source: &DataSource,
    sender: Sender<Vec<RateUpdate>>,
    config: &Config,
    sim_pairs: Vec<(String, f64)>,
) -> JoinHandleResult {
    match source {
        DataSource::Sim => {
            info!("Starting SimulatorStreamer producer task...");
            let streamer = SimulatorStreamer::new(sim_pairs, config.simulator.clone());
            Producer::new(streamer).spawn(sender)
        }
        DataSource::Csv(path) => {
            info!(path = %path.display(), "Starting CsvStreamer producer task...");
            let streamer = CsvStreamer::new(path.clone(), config.producer.batch_size);
            Producer::new(streamer).spawn(sender)
        }
    }
}

fn spawn_writer(
    shared_engine: SharedEngine,
    receiver: Receiver<Vec<RateUpdate>>,
    shutdown: watch::Receiver<()>,
) -> JoinHandleResult {
    Writer::new(shared_engine, receiver, shutdown).spawn_task()
}

fn spawn_searcher(
    shared_engine: SharedEngine,
    interval_ms: u64,
    shutdown: watch::Receiver<()>,
) -> JoinHandleResult {
    ArbSearcher::new(
        shared_engine,
        Duration::from_millis(interval_ms.max(1)),
        shutdown,
    )
    .spawn_task()
}

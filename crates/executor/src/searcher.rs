use tokio::select;
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use super::error::Error;
use super::types::{JoinHandleResult, SharedEngine};
use common::types::CycleRecord;

/// Periodically reports the best cycle of the shared engine.
///
/// Reads only the incrementally maintained registry; it never re-enumerates.
pub struct ArbSearcher {
    engine: SharedEngine,
    interval: Duration,
    shutdown: watch::Receiver<()>,
}

impl ArbSearcher {
    pub fn new(engine: SharedEngine, interval: Duration, shutdown: watch::Receiver<()>) -> Self {
        ArbSearcher {
            engine,
            interval,
            shutdown,
        }
    }

    /// Snapshot of the highest-multiplier cycle, profitable or not.
    pub async fn scan(&self) -> Option<CycleRecord> {
        let engine_guard = self.engine.read().await;
        engine_guard.best_cycle().cloned()
    }

    pub async fn search_for_arbs(mut self) -> Result<(), Error> {
        info!("Searcher ready.");

        let mut interval = time::interval(self.interval);

        // The first tick occurs immediately, but we skip it to wait the full duration
        interval.tick().await;

        loop {
            select! {
                _ = interval.tick() => {
                    match self.scan().await {
                        Some(record) if record.is_profitable() => {
                            let path: Vec<String> =
                                record.path.iter().map(ToString::to_string).collect();
                            info!(
                                id = record.id,
                                multiplier = record.multiplier,
                                path = ?path,
                                "Arbitrage FOUND"
                            );
                        }
                        Some(record) => {
                            debug!(
                                id = record.id,
                                multiplier = record.multiplier,
                                "Search complete: No arbitrage opportunities."
                            );
                        }
                        None => {
                            debug!("Searcher: No cycles registered. Skipping.");
                        }
                    }
                }

                _ = self.shutdown.changed() => {
                    info!("Shutdown signal received, stopping searcher.");
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn spawn_task(self) -> JoinHandleResult {
        tokio::spawn(self.search_for_arbs())
    }
}

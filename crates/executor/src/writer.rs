use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::Error;
use super::types::{JoinHandleResult, RateUpdate, SharedEngine};

/// Async consumer that applies rate updates to the shared engine.
pub struct Writer {
    engine: SharedEngine,
    receiver: Receiver<Vec<RateUpdate>>,
    shutdown: watch::Receiver<()>, // signal for graceful shutdown
}

/// Outcome of applying one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: usize,
    pub rejected: usize,
    pub repriced: usize,
}

impl Writer {
    pub fn new(
        engine: SharedEngine,
        receiver: Receiver<Vec<RateUpdate>>,
        shutdown: watch::Receiver<()>,
    ) -> Self {
        Self {
            engine,
            receiver,
            shutdown,
        }
    }

    /// Applies one batch under a single write lock.
    ///
    /// A rejected update is logged and skipped; the rest of the batch still
    /// goes through.
    pub async fn apply_batch(&self, updates: &[RateUpdate]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut engine = self.engine.write().await;

        for update in updates {
            match engine.update_rate(&update.pair, update.new_rate) {
                Ok(affected) => {
                    report.applied += 1;
                    report.repriced += affected.len();
                }
                Err(e) => {
                    report.rejected += 1;
                    warn!(pair = %update.pair, rate = update.new_rate, error = %e, "Rate update rejected");
                }
            }
        }
        report
    }

    /// Run the writer asynchronously.
    ///
    /// Consumes batches from the receiver and applies them to the engine,
    /// releasing the write lock after each batch. Exits when the receiver is
    /// closed or the shutdown signal is received.
    pub async fn process_updates(mut self) -> Result<(), Error> {
        info!("Writer ready.");

        loop {
            select! {
                biased;

                updates = self.receiver.recv() => {
                    match updates {
                        Some(updates) => {
                            let report = self.apply_batch(&updates).await;
                            debug!(
                                applied = report.applied,
                                rejected = report.rejected,
                                repriced = report.repriced,
                                "Batch applied"
                            );
                        }
                        None => {
                            info!("Receiver closed, shutting down writer.");
                            break;
                        }
                    }
                }

                _ = self.shutdown.changed() => {
                    info!("Shutdown signal received, stopping writer.");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Spawns the writer onto the Tokio runtime.
    pub fn spawn_task(self) -> JoinHandleResult {
        tokio::spawn(self.process_updates())
    }
}

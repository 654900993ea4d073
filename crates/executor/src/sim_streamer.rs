use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use super::config::SimulatorConfig;
use super::error::Error;
use super::types::{RateUpdate, UpdateStreamer};

/// Largest relative move accepted per update (50%), keeping every rate positive.
const MAX_FLUCTUATION_BPS: f64 = 5_000.0;

/// Produces synthetic rate updates for simulation purposes.
///
/// Starts from a snapshot of the loaded rate table and random-walks the rates
/// of existing pairs, so every update targets an edge the engine knows about.
pub struct SimulatorStreamer {
    pairs: Vec<(String, f64)>,
    config: SimulatorConfig,
    seed: Option<u64>,
}

impl SimulatorStreamer {
    pub fn new(pairs: Vec<(String, f64)>, config: SimulatorConfig) -> Self {
        Self {
            pairs,
            config,
            seed: None,
        }
    }

    /// Fixes the RNG seed so runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[async_trait]
impl UpdateStreamer for SimulatorStreamer {
    /// Periodically sends batches of rate updates until `rounds` batches have
    /// been sent, or forever when unset. Backpressure comes from awaiting
    /// `sender.send()`.
    async fn run_stream(mut self, sender: Sender<Vec<RateUpdate>>) -> Result<(), Error> {
        if self.pairs.is_empty() {
            warn!("Simulator has no pairs to update, stopping.");
            return Ok(());
        }

        let mut interval = time::interval(Duration::from_millis(self.config.interval_ms.max(1)));
        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let max_move = self.config.fluctuation_bps.abs().min(MAX_FLUCTUATION_BPS) / 10_000.0;
        let pair_range = 0..self.pairs.len();
        let mut rounds_sent = 0usize;

        info!(
            pairs = self.pairs.len(),
            batch_size = self.config.batch_size,
            "Simulator started."
        );

        loop {
            if self.config.rounds.is_some_and(|rounds| rounds_sent >= rounds) {
                info!(rounds = rounds_sent, "Simulator finished.");
                return Ok(());
            }

            interval.tick().await;

            let updates: Vec<RateUpdate> = (0..self.config.batch_size)
                .map(|_| {
                    let (pair, rate) = &mut self.pairs[rng.random_range(pair_range.clone())];
                    *rate *= 1.0 + rng.random_range(-max_move..=max_move);

                    RateUpdate {
                        pair: pair.clone(),
                        new_rate: *rate,
                    }
                })
                .collect();

            debug!("Simulator sent {} updates.", updates.len());
            if sender.send(updates).await.is_err() {
                error!("Simulator shutting down: Writer receiver dropped.");
                return Err(Error::ChannelSendFailed);
            }
            rounds_sent += 1;
        }
    }
}

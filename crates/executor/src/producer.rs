use tokio::sync::mpsc::Sender;
use tracing::info;

use super::types::{JoinHandleResult, RateUpdate, UpdateStreamer};

pub struct Producer<S: UpdateStreamer> {
    streamer: S,
}

impl<S> Producer<S>
where
    S: UpdateStreamer,
{
    pub fn new(streamer: S) -> Self {
        Producer { streamer }
    }

    pub fn spawn(self, sender: Sender<Vec<RateUpdate>>) -> JoinHandleResult {
        info!("Producer ready.");
        tokio::spawn(async move { self.streamer.run_stream(sender).await })
    }
}

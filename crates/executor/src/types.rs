use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

use super::error::Error;
use arb_engine_core::ArbEngine;

/// A trait defining the contract for any source that generates and streams rate
/// updates into the pipeline.
///
/// The trait bounds (`Send`, `Sync`, `'static`) are required so the
/// implementation can run on the multi-threaded Tokio runtime.
#[async_trait::async_trait]
pub trait UpdateStreamer: Send + Sync + 'static {
    async fn run_stream(self, sender: Sender<Vec<RateUpdate>>) -> Result<(), Error>;
}

/// A single rate-change event for an existing edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RateUpdate {
    pub pair: String,  // "<FROM>_<TO>" edge key
    pub new_rate: f64, // The rate that replaces the old one
}

/// Engine shared between the writer and searcher tasks.
///
/// Rate updates and best-cycle reads are serialized through this lock, so a
/// reader never observes a registry mid-reprice.
pub type SharedEngine = Arc<RwLock<ArbEngine>>;

pub type JoinHandleResult = JoinHandle<Result<(), Error>>;

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sim,
    Csv(PathBuf),
}

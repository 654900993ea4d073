use thiserror::Error;

use common::error::Error as ArbEngineError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Channel sender failed: Receiver has been dropped.")]
    ChannelSendFailed,

    #[error("Engine error: {0}")]
    EngineError(#[from] ArbEngineError),

    #[error("Configuration error: {0}")]
    ConfigLoadError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Pipeline task failed: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::Sender;
use tracing::{error, info};

use super::error::Error;
use super::types::{RateUpdate, UpdateStreamer};

// Helper struct for CSV parsing
#[derive(Debug, Deserialize, Default)]
pub struct CsvRecord {
    #[serde(rename = "pair")]
    pub pair: String,

    #[serde(rename = "rate")]
    pub rate_value: f64,
}

/// Reads `pair,rate` rows from a headed CSV file.
///
/// Used both for the initial rate table and for streamed updates; keys and
/// rates are validated later by the engine.
pub fn read_rate_records(path: &Path) -> Result<Vec<RateUpdate>, Error> {
    let file = File::open(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to read rate file");
        Error::IoError(e)
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut updates = Vec::new();

    for result in rdr.deserialize() {
        let record: CsvRecord = result?;
        updates.push(RateUpdate {
            pair: record.pair,
            new_rate: record.rate_value,
        });
    }
    Ok(updates)
}

/// Replays rate updates from a CSV file in fixed-size batches.
pub struct CsvStreamer {
    path: PathBuf,
    batch_size: usize,
}

impl CsvStreamer {
    pub fn new(path: PathBuf, batch_size: usize) -> Self {
        CsvStreamer {
            path,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait::async_trait]
impl UpdateStreamer for CsvStreamer {
    async fn run_stream(self, sender: Sender<Vec<RateUpdate>>) -> Result<(), Error> {
        let all_updates = read_rate_records(&self.path)?;
        let total_updates = all_updates.len();
        let mut updates_sent = 0;

        info!("CsvStreamer: Starting transfer of {} updates...", total_updates);

        for chunk in all_updates.chunks(self.batch_size) {
            let batch: Vec<RateUpdate> = chunk.to_vec();
            if let Err(e) = sender.send(batch).await {
                error!(
                    "CsvStreamer shutting down: Writer receiver dropped during send. Error: {}",
                    e
                );
                return Err(Error::ChannelSendFailed);
            }

            updates_sent += chunk.len();
        }

        info!(
            "CsvStreamer: Successfully transferred {} updates in batches.",
            updates_sent
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::sync::mpsc;

    const MOCK_CSV_CONTENT: &str = "\
pair,rate
USD_GBP, 0.56
GBP_SGD,1.8
JPY_USD,75
sgd_jpy,50.5
";

    const BATCH_SIZE: usize = 3;

    fn mock_file() -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(MOCK_CSV_CONTENT.as_bytes())
            .expect("Failed to write mock content");
        temp_file
    }

    #[test]
    fn test_read_rate_records_success() {
        let temp_file = mock_file();
        let result = read_rate_records(temp_file.path());

        assert!(
            result.is_ok(),
            "Parsing failed with error: {:?}",
            result.err()
        );

        let updates = result.unwrap();
        let expected: Vec<(String, f64)> = vec![
            ("USD_GBP".into(), 0.56),
            ("GBP_SGD".into(), 1.8),
            ("JPY_USD".into(), 75.0),
            ("sgd_jpy".into(), 50.5),
        ];
        let parsed: Vec<(String, f64)> = updates
            .into_iter()
            .map(|u| (u.pair, u.new_rate))
            .collect();

        assert_eq!(parsed, expected, "Parsed updates do not match expected data.");
    }

    #[test]
    fn test_read_rate_records_file_not_found() {
        let result = read_rate_records(Path::new("non_existent_file.csv"));

        if let Err(Error::IoError(e)) = result {
            assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        } else {
            panic!("Expected IoError, got: {:?}", result);
        }
    }

    #[test]
    fn test_read_rate_records_bad_rate() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(b"pair,rate\nUSD_GBP,abc\n")
            .expect("Failed to write mock content");

        let result = read_rate_records(temp_file.path());
        assert!(matches!(result, Err(Error::CsvError(_))));
    }

    #[tokio::test]
    async fn test_stream_sends_all_updates_in_batches() {
        let temp_file = mock_file();
        let streamer = CsvStreamer::new(temp_file.path().to_path_buf(), BATCH_SIZE);
        let (tx, mut rx) = mpsc::channel(10);

        streamer.run_stream(tx).await.expect("Stream should finish");

        let first = rx.recv().await.expect("First batch");
        let second = rx.recv().await.expect("Second batch");
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].pair, "sgd_jpy");
        assert!(rx.recv().await.is_none(), "Sender should be dropped");
    }

    #[tokio::test]
    async fn test_stream_fails_when_receiver_dropped() {
        let temp_file = mock_file();
        let streamer = CsvStreamer::new(temp_file.path().to_path_buf(), 1);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = streamer.run_stream(tx).await;
        assert!(matches!(result, Err(Error::ChannelSendFailed)));
    }
}

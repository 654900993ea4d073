use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use super::error::Error;
use arb_engine_core::EnumerationLimits;
use arb_engine_core::cycles::DEFAULT_MAX_VISITS;

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Currency whose cycles are enumerated and monitored.
    pub home: String,
    /// CSV file of `pair,rate` rows seeding the rate table.
    pub rates_path: PathBuf,
    pub max_hops: Option<usize>,
    pub max_cycles: Option<usize>,
    #[serde(default = "default_max_visits")]
    pub max_visits: usize,
}

fn default_max_visits() -> usize {
    DEFAULT_MAX_VISITS
}

impl EngineConfig {
    pub fn limits(&self) -> EnumerationLimits {
        EnumerationLimits {
            max_hops: self.max_hops,
            max_cycles: self.max_cycles,
            max_visits: self.max_visits,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    pub batch_size: usize,
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub batch_size: usize,
    pub interval_ms: u64,
    /// Maximum relative move applied to a rate per update, in basis points.
    pub fluctuation_bps: f64,
    /// Number of batches before the simulator stops; runs until interrupted when unset.
    pub rounds: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearcherConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Installs the global tracing subscriber. `RUST_LOG` overrides `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).init(),
            _ => fmt().with_env_filter(filter).init(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub producer: ProducerConfig,
    pub simulator: SimulatorConfig,
    pub searcher: SearcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Loads configuration from a TOML file layered with `EXECUTOR__*` environment variables.
///
/// A relative `engine.rates_path` is resolved against the config file's directory.
pub fn load_config(config_file_path: &Path) -> Result<Config, Error> {
    if !config_file_path.exists() {
        return Err(Error::ConfigLoadError(format!(
            "Configuration file not found at path: {}",
            config_file_path.display()
        )));
    }

    let s = ConfigLoader::builder()
        .add_source(File::from(config_file_path).required(true))
        .add_source(
            Environment::with_prefix("EXECUTOR")
                .try_parsing(true)
                .separator("__"),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let mut app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    if app_config.engine.rates_path.is_relative() {
        if let Some(base) = config_file_path.parent() {
            app_config.engine.rates_path = base.join(&app_config.engine.rates_path);
        }
    }

    Ok(app_config)
}

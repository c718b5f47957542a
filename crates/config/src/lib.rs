//! Configuration for the arb-monitor workspace.
//!
//! All tuning values the detection core consumes (supported venues,
//! tracked instruments, the staleness bound, the spread-ratio threshold,
//! the supervisor's restart policy) live here rather than as constants,
//! since the right values are venue- and instrument-dependent.

use common::Exchange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Venues to ingest. Each gets one supervised feed worker.
    pub exchanges: Vec<Exchange>,
    /// Canonical symbols to track (e.g. "BTC/USDT"). Quotes for anything
    /// else are dropped at normalization time.
    pub instruments: Vec<String>,
    pub detector: DetectorSettings,
    pub supervisor: SupervisorSettings,
    pub mux: MuxSettings,
    pub feed: FeedSourceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorSettings {
    /// Maximum quote age before it is excluded from cross-exchange
    /// comparison.
    pub staleness_bound_ms: u64,
    /// Minimum `spread / buy_price` for an opportunity to be emitted.
    pub min_spread_ratio: Decimal,
    /// Window during which a byte-identical opportunity is not re-emitted.
    pub dedup_ttl_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupervisorSettings {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Failure count within the sliding window that flips a worker to
    /// `FailedPermanently`.
    pub max_consecutive_failures: u32,
    pub failure_window_secs: u64,
    /// A connection older than this resets the consecutive-failure count.
    pub stable_reset_secs: u64,
    /// How long shutdown waits for a worker task before aborting it.
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MuxSettings {
    /// Bounded per-worker buffer; overflowing drops the oldest entry.
    pub worker_buffer: usize,
}

/// Where raw venue messages come from. Live websocket clients sit behind
/// the `FeedWorker` boundary and are wired in externally; these are the
/// sources the workspace ships.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum FeedSourceConfig {
    /// Synthetic random-walk feeds emitting venue-native ticker JSON.
    #[serde(rename = "sim")]
    Sim {
        tick_interval_ms: u64,
        /// Half-spread around the simulated mid, in basis points.
        spread_bps: u32,
        /// Per-tick drift bound as a fraction of the base price, in bps.
        volatility_bps: u32,
        /// Starting mid price per exchange name.
        base_prices: HashMap<String, Decimal>,
    },
    /// Prerecorded NDJSON replay, one `<exchange>.ndjson` file per venue.
    #[serde(rename = "replay")]
    Replay { dir: String, speed: f64 },
}

impl MonitorConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: MonitorConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchanges.len() < 2 {
            return Err(ConfigError::ValidationError(
                "At least two exchanges are required for cross-exchange comparison".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for exchange in &self.exchanges {
            if !seen.insert(exchange) {
                return Err(ConfigError::ValidationError(format!(
                    "Exchange '{}' listed more than once",
                    exchange
                )));
            }
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::ValidationError(
                "No instruments configured".to_string(),
            ));
        }
        if self.detector.staleness_bound_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Staleness bound must be greater than 0".to_string(),
            ));
        }
        if self.detector.min_spread_ratio < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "Minimum spread ratio cannot be negative".to_string(),
            ));
        }
        if self.supervisor.initial_backoff_ms == 0
            || self.supervisor.initial_backoff_ms > self.supervisor.max_backoff_ms
        {
            return Err(ConfigError::ValidationError(
                "Backoff delays must satisfy 0 < initial <= max".to_string(),
            ));
        }
        if self.supervisor.max_consecutive_failures == 0 {
            return Err(ConfigError::ValidationError(
                "Failure ceiling must be at least 1".to_string(),
            ));
        }
        if self.mux.worker_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "Mux worker buffer must be non-empty".to_string(),
            ));
        }
        if let FeedSourceConfig::Replay { speed, .. } = &self.feed {
            if *speed <= 0.0 {
                return Err(ConfigError::ValidationError(
                    "Replay speed must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

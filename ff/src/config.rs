//! Fable configuration types and loading

use eyre::{Context, Result};
use fetchgate::ThrottleConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chain::Address;
use crate::format::Shape;

/// Main Fable configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// JSON-RPC endpoint configuration
    pub rpc: RpcConfig,

    /// Deployed contract addresses
    pub deployment: DeploymentConfig,

    /// Per-feed throttle intervals
    pub throttle: ThrottleSettings,

    /// Watcher polling
    pub poll: PollConfig,
}

impl Config {
    /// Validate configuration before any network use
    pub fn validate(&self) -> Result<()> {
        if self.rpc.url.trim().is_empty() {
            return Err(eyre::eyre!("rpc.url must not be empty"));
        }
        if self.deployment.game.is_zero() {
            return Err(eyre::eyre!(
                "deployment.game is not set. Add the Game contract address to your config file."
            ));
        }
        if self.deployment.inventory.is_zero() {
            return Err(eyre::eyre!(
                "deployment.inventory is not set. Add the Inventory contract address to your config file."
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.fable.yml`, then `<config_dir>/fable/fable.yml`,
    /// then defaults. Only an explicit path that fails to load is an error.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up. Errors are swallowed.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::default_paths(),
        };

        candidates
            .into_iter()
            .find(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".fable.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fable").join("fable.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Effective configuration as a displayable shape
    pub fn to_shape(&self) -> Shape {
        Shape::record()
            .field("log-level", self.log_level.clone())
            .field(
                "rpc",
                Shape::record()
                    .field("url", self.rpc.url.as_str())
                    .field("timeout-ms", self.rpc.timeout_ms)
                    .field("max-retries", self.rpc.max_retries)
                    .field("initial-backoff-ms", self.rpc.initial_backoff_ms),
            )
            .field(
                "deployment",
                Shape::record()
                    .field("game", self.deployment.game.to_string())
                    .field("inventory", self.deployment.inventory.to_string()),
            )
            .field(
                "throttle",
                Shape::record()
                    .field("game-data", self.throttle.game_data.interval_ms)
                    .field("cards", self.throttle.cards.interval_ms),
            )
            .field("poll", Shape::record().field("interval-ms", self.poll.interval_ms))
    }
}

/// JSON-RPC endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Endpoint URL
    pub url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry; doubles on each further retry
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
            timeout_ms: 10_000,
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

/// Deployed contract addresses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Game contract
    pub game: Address,

    /// Inventory contract (decks)
    pub inventory: Address,
}

/// Throttle intervals for the polled feeds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    #[serde(rename = "game-data")]
    pub game_data: ThrottleConfig,

    pub cards: ThrottleConfig,
}

/// Watcher polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Time between polls in milliseconds
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

//! # Node Configuration
//!
//! Loaded from a TOML file, then overridden by environment variables.
//!
//! ## Config File Format
//!
//! ```toml
//! data_dir = "./data"
//! flush_debounce_secs = 5
//! metrics_port = 9464
//!
//! [[networks]]
//! name = "mainnet"
//! provider_id = 7
//! chain_snapshot_path = "./chain/mainnet.json"
//! attesters_path = "./attesters/mainnet.json"
//! publishers = ["0x1111111111111111111111111111111111111111"]
//! min_publisher_balance = "1000000000000000000"
//! provider_take_rate_bps = 1000
//! rewards_interval_secs = 600
//! ```
//!
//! ## Environment Overrides
//!
//! - `AF_CONFIG`: config file path (default `./af-node.toml`, missing file = defaults)
//! - `AF_DATA_DIR`, `AF_METRICS_PORT`, `AF_FLUSH_DEBOUNCE_SECS`, `AF_LOG_LEVEL`

use serde::Deserialize;
use shared_types::{parse_decimal_u256, Address, NetworkName, U256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "./af-node.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Parsed but unusable value.
    #[error("Invalid config for network {network:?}: {message}")]
    Invalid { network: String, message: String },
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_flush_debounce_secs() -> u64 {
    5
}

fn default_metrics_port() -> u16 {
    9464
}

fn default_min_publisher_balance() -> String {
    "0".to_string()
}

fn default_provider_queue_interval() -> u64 {
    60
}

fn default_rollup_view_interval() -> u64 {
    60
}

fn default_publisher_balance_interval() -> u64 {
    300
}

fn default_rewards_interval() -> u64 {
    600
}

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Root of the per-network persisted files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_flush_debounce_secs")]
    pub flush_debounce_secs: u64,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Overrides the telemetry log filter when set.
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            flush_debounce_secs: default_flush_debounce_secs(),
            metrics_port: default_metrics_port(),
            log_level: None,
            networks: Vec::new(),
        }
    }
}

/// One monitored network.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,

    /// Absent: provider scraping is unconfigured and the snapshot stays empty.
    #[serde(default)]
    pub provider_id: Option<u64>,

    /// JSON document read by the file chain client.
    pub chain_snapshot_path: PathBuf,

    /// External attester roster.
    pub attesters_path: PathBuf,

    #[serde(default)]
    pub publishers: Vec<Address>,

    /// Decimal string; amounts do not fit TOML integers.
    #[serde(default = "default_min_publisher_balance")]
    pub min_publisher_balance: String,

    #[serde(default)]
    pub provider_take_rate_bps: u32,

    #[serde(default = "default_provider_queue_interval")]
    pub provider_queue_interval_secs: u64,

    #[serde(default = "default_rollup_view_interval")]
    pub rollup_view_interval_secs: u64,

    #[serde(default = "default_publisher_balance_interval")]
    pub publisher_balance_interval_secs: u64,

    #[serde(default = "default_rewards_interval")]
    pub rewards_interval_secs: u64,
}

impl NetworkConfig {
    pub fn network_name(&self) -> NetworkName {
        NetworkName::new(self.name.clone())
    }

    pub fn min_publisher_balance(&self) -> Result<U256, ConfigError> {
        parse_decimal_u256(&self.min_publisher_balance).map_err(|e| ConfigError::Invalid {
            network: self.name.clone(),
            message: format!("min_publisher_balance: {}", e),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            network: self.name.clone(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        self.min_publisher_balance()?;
        if self.provider_take_rate_bps > 10_000 {
            return Err(invalid(format!(
                "provider_take_rate_bps {} exceeds 10000",
                self.provider_take_rate_bps
            )));
        }
        for (field, secs) in [
            ("provider_queue_interval_secs", self.provider_queue_interval_secs),
            ("rollup_view_interval_secs", self.rollup_view_interval_secs),
            ("publisher_balance_interval_secs", self.publisher_balance_interval_secs),
            ("rewards_interval_secs", self.rewards_interval_secs),
        ] {
            if secs == 0 {
                return Err(invalid(format!("{} must be positive", field)));
            }
        }
        Ok(())
    }
}

impl RuntimeConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io {
                path: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `AF_CONFIG` and apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let path = lookup("AF_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(path)?;
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Override scalar fields from `lookup`. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("AF_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("AF_METRICS_PORT").and_then(|v| v.parse().ok()) {
            self.metrics_port = port;
        }
        if let Some(secs) = lookup("AF_FLUSH_DEBOUNCE_SECS").and_then(|v| v.parse().ok()) {
            self.flush_debounce_secs = secs;
        }
        if let Some(level) = lookup("AF_LOG_LEVEL") {
            self.log_level = Some(level);
        }
    }

    pub fn flush_debounce(&self) -> Duration {
        Duration::from_secs(self.flush_debounce_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for network in &self.networks {
            network.validate()?;
            if !seen.insert(network.name.as_str()) {
                return Err(ConfigError::Invalid {
                    network: network.name.clone(),
                    message: "network configured twice".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
data_dir = "/var/lib/af"

[[networks]]
name = "mainnet"
provider_id = 7
chain_snapshot_path = "/chain/mainnet.json"
attesters_path = "/attesters/mainnet.json"
publishers = ["0x1111111111111111111111111111111111111111"]
min_publisher_balance = "1000000000000000000"
provider_take_rate_bps = 1000
rewards_interval_secs = 900

[[networks]]
name = "testnet"
chain_snapshot_path = "/chain/testnet.json"
attesters_path = "/attesters/testnet.json"
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = RuntimeConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/af"));
        assert_eq!(config.flush_debounce_secs, 5);
        assert_eq!(config.metrics_port, 9464);
        assert_eq!(config.networks.len(), 2);

        let mainnet = &config.networks[0];
        assert_eq!(mainnet.provider_id, Some(7));
        assert_eq!(mainnet.publishers, vec![Address([0x11; 20])]);
        assert_eq!(
            mainnet.min_publisher_balance().unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(mainnet.rewards_interval_secs, 900);
        assert_eq!(mainnet.rollup_view_interval_secs, 60);

        let testnet = &config.networks[1];
        assert_eq!(testnet.provider_id, None);
        assert!(testnet.publishers.is_empty());
        assert_eq!(testnet.min_publisher_balance().unwrap(), U256::zero());
        assert_eq!(testnet.publisher_balance_interval_secs, 300);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_balance = SAMPLE.replace("1000000000000000000", "lots");
        assert!(matches!(
            RuntimeConfig::parse(&bad_balance),
            Err(ConfigError::Invalid { .. })
        ));

        let zero_interval = SAMPLE.replace("rewards_interval_secs = 900", "rewards_interval_secs = 0");
        assert!(matches!(
            RuntimeConfig::parse(&zero_interval),
            Err(ConfigError::Invalid { .. })
        ));

        let duplicate = SAMPLE.replace("name = \"testnet\"", "name = \"mainnet\"");
        assert!(matches!(
            RuntimeConfig::parse(&duplicate),
            Err(ConfigError::Invalid { .. })
        ));

        assert!(matches!(
            RuntimeConfig::parse("networks = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RuntimeConfig::load(dir.path().join("absent.toml")).unwrap();
        assert!(config.networks.is_empty());
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AF_DATA_DIR", "/tmp/af"),
            ("AF_METRICS_PORT", "9100"),
            ("AF_FLUSH_DEBOUNCE_SECS", "not-a-number"),
            ("AF_LOG_LEVEL", "debug"),
        ]);
        let mut config = RuntimeConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/af"));
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(config.flush_debounce_secs, 5);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }
}

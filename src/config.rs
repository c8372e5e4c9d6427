use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Base configuration for the engine.
/// Flattened into the CLI; also loadable from JSON via serde.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct BaseConfig {
    /// Path for persistent storage (RocksDB).
    #[arg(long, default_value = "./data")]
    pub storage_path: String,

    /// Prefix prepended to every document key.
    #[arg(long, default_value = "doc/")]
    pub key_prefix: String,

    /// How long to wait for the ledger to confirm an anchor.
    #[arg(long, default_value_t = 30_000)]
    pub ledger_timeout_ms: u64,

    /// Bound on a single transmit to one recipient.
    #[arg(long, default_value_t = 10_000)]
    pub transmit_timeout_ms: u64,

    /// Maximum number of transmits in flight during one distribution.
    #[arg(long, default_value_t = 8)]
    pub max_concurrent_transmits: usize,
}

impl BaseConfig {
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    pub fn transmit_timeout(&self) -> Duration {
        Duration::from_millis(self.transmit_timeout_ms)
    }
}

impl Default for BaseConfig {
    fn default() -> Self {
        BaseConfig {
            storage_path: "./data".to_string(),
            key_prefix: "doc/".to_string(),
            ledger_timeout_ms: 30_000,
            transmit_timeout_ms: 10_000,
            max_concurrent_transmits: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: BaseConfig = serde_json::from_str(r#"{"ledger_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.ledger_timeout(), Duration::from_millis(500));
        assert_eq!(config.key_prefix, "doc/");
        assert_eq!(config.max_concurrent_transmits, 8);
    }
}

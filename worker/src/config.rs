use std::time::Duration;

use serde::{Deserialize, Serialize};
use solitaire_protocol::LEADERBOARD_KEY;

use crate::ConfigError;

/// Settings of the score-submission worker, every field optional in JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Key the leaderboard is stored under.
    pub leaderboard_key: String,
    /// Optimistic writes retried at most this many times before giving up.
    pub max_attempts: u32,
    /// Upper bound for one whole load-merge-store round trip.
    pub store_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            leaderboard_key: LEADERBOARD_KEY.to_string(),
            max_attempts: 5,
            store_timeout_ms: 2_000,
        }
    }
}

impl WorkerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leaderboard_key.is_empty() {
            return Err(ConfigError::Validation(
                "leaderboard_key must not be empty".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "max_attempts must be > 0".to_string(),
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "store_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the transcription service (e.g., "http://localhost:8000")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Owner scope used when querying the history store for reconciliation
    #[serde(default = "default_owner_scope")]
    pub owner_scope: String,

    /// Status poll cadence while the transcript is still pending, in milliseconds
    #[serde(default = "default_fast_poll_interval_ms")]
    pub fast_poll_interval_ms: u64,

    /// Status poll cadence once the transcript is visible and only the summary
    /// remains, in milliseconds
    #[serde(default = "default_slow_poll_interval_ms")]
    pub slow_poll_interval_ms: u64,

    /// Consecutive status-poll failures tolerated before polling is suspended
    /// and the history store decides
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Deadline for a single network request, in milliseconds. Independent of
    /// the poll cadence so a hung request cannot starve the next tick.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// History reconciliation cadence, in milliseconds
    #[serde(default = "default_reconciliation_interval_ms")]
    pub reconciliation_interval_ms: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_owner_scope() -> String {
    "default".to_string()
}

fn default_fast_poll_interval_ms() -> u64 {
    5_000
}

fn default_slow_poll_interval_ms() -> u64 {
    15_000
}

fn default_max_consecutive_failures() -> u32 {
    3
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_reconciliation_interval_ms() -> u64 {
    60_000
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            owner_scope: default_owner_scope(),
            fast_poll_interval_ms: default_fast_poll_interval_ms(),
            slow_poll_interval_ms: default_slow_poll_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            request_timeout_ms: default_request_timeout_ms(),
            reconciliation_interval_ms: default_reconciliation_interval_ms(),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Every interval and counter must be a positive integer, and the
    /// reconciliation cadence must be at least as coarse as the slow poll
    /// cadence so the fallback path never duplicates the primary load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, u64); 5] = [
            ("fast_poll_interval_ms", self.fast_poll_interval_ms),
            ("slow_poll_interval_ms", self.slow_poll_interval_ms),
            (
                "max_consecutive_failures",
                u64::from(self.max_consecutive_failures),
            ),
            ("request_timeout_ms", self.request_timeout_ms),
            ("reconciliation_interval_ms", self.reconciliation_interval_ms),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::NonPositive { name });
            }
        }
        if self.reconciliation_interval_ms < self.slow_poll_interval_ms {
            return Err(ConfigError::ReconciliationTooTight {
                reconciliation_ms: self.reconciliation_interval_ms,
                slow_ms: self.slow_poll_interval_ms,
            });
        }
        Ok(())
    }

    pub fn fast_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fast_poll_interval_ms)
    }

    pub fn slow_poll_interval(&self) -> Duration {
        Duration::from_millis(self.slow_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconciliation_interval(&self) -> Duration {
        Duration::from_millis(self.reconciliation_interval_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("{name} must be a positive integer")]
    NonPositive { name: &'static str },

    #[error(
        "reconciliation_interval_ms ({reconciliation_ms}) must not be tighter than slow_poll_interval_ms ({slow_ms})"
    )]
    ReconciliationTooTight { reconciliation_ms: u64, slow_ms: u64 },
}

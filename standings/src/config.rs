//! Configuration for the standings engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EngineError;

/// Secondary ordering for equal leaderboard totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Participant ID ascending
    #[default]
    UserIdAscending,
    /// Display name ascending, then participant ID
    NameThenUserId,
}

/// Configuration shared by the reconciler and the live leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Participants processed concurrently against the store
    pub max_concurrency: usize,
    /// Budget for one leaderboard request (ms)
    pub request_timeout_ms: u64,
    /// Budget for one reconciliation run (ms)
    pub commit_timeout_ms: u64,
    /// Ordering of equal totals
    pub tie_break: TieBreak,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            request_timeout_ms: 10_000,
            commit_timeout_ms: 120_000,
            tie_break: TieBreak::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_concurrency == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 || self.commit_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

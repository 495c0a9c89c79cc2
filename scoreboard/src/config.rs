//! Configuration for Scoreboard
//!
//! CLI arguments and environment variable handling using clap.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use standings::EngineConfig;

/// Scoreboard - bank prediction scores and print the live leaderboard
#[derive(Parser, Debug, Clone)]
#[command(name = "scoreboard")]
#[command(about = "Prediction game scoring and leaderboard operations")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "prediction_game")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Engine configuration file (YAML)
    #[arg(long, env = "SCOREBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override: participants processed concurrently
    #[arg(long, env = "MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Override: leaderboard request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Organizer operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Recalculate and bank every prediction score now
    Commit {
        /// Only re-bank this participant
        #[arg(long)]
        user: Option<String>,
    },
    /// Print the live leaderboard
    Leaderboard {
        /// Only print the first N rows
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Args {
    /// Build the engine config from the optional file plus CLI overrides.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                EngineConfig::from_yaml(&yaml)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        if let Some(max) = self.max_concurrency {
            config.max_concurrency = max;
        }
        if let Some(timeout) = self.request_timeout_ms {
            config.request_timeout_ms = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Default tracing filter directive.
    pub fn log_filter(&self) -> String {
        format!(
            "scoreboard={level},standings={level},info",
            level = self.log_level
        )
    }
}

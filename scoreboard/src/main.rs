//! Scoreboard - prediction game operator CLI
//!
//! `scoreboard commit` banks every prediction score; `scoreboard leaderboard`
//! prints the live standings. Reports go to stdout as JSON, logs to stderr.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scoreboard::{Args, Command, MongoClient, MongoRepositories};
use standings::{LiveLeaderboard, Reconciler, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.log_filter().into());
    let (plain, json) = if args.log_json {
        (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();

    let config = match args.engine_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        mongodb = %args.mongodb_uri,
        database = %args.mongodb_db,
        max_concurrency = config.max_concurrency,
        tie_break = ?config.tie_break,
        "Scoreboard starting"
    );

    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    let store = Arc::new(MongoRepositories::new(&client).await?);
    let repos = Repositories::from_store(store);

    match &args.command {
        Command::Commit { user } => {
            let reconciler = Reconciler::new(repos, config);
            let report = match user {
                Some(user_id) => reconciler.commit_participant(user_id).await?,
                None => reconciler.commit().await?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_clean() {
                error!(
                    failed = report.failures.len(),
                    "Some participants were not banked; re-run to retry"
                );
                std::process::exit(1);
            }
        }
        Command::Leaderboard { limit } => {
            let board = LiveLeaderboard::new(repos, config);
            let report = match limit {
                Some(limit) => board.top(*limit).await?,
                None => board.query().await?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

//! Scoreboard - operator CLI for the prediction game
//!
//! Wires the `standings` engine to MongoDB and exposes the two organizer
//! operations: banking every prediction score, and printing the live
//! leaderboard.

pub mod config;
pub mod db;

pub use config::{Args, Command};
pub use db::{MongoClient, MongoRepositories};

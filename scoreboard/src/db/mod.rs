//! MongoDB persistence for the prediction game.

pub mod mongo;
pub mod repositories;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use repositories::MongoRepositories;

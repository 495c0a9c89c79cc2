//! Prediction Scoring for the event-prediction game
//!
//! This crate holds the pure half of the game: the data model shared by every
//! surface, typed answer values, and the comparison rules that turn a
//! (prediction, outcome) pair into partial credit.
//!
//! - **Numeric**: proximity credit by percentage distance from the outcome
//! - **Time**: proximity credit by distance in time-slider units
//! - **Exact**: full credit only on strict type-and-value equality
//! - **Unscored**: free text and multi-select, never compared
//!
//! Nothing here performs I/O or can fail; storage, batching and ranking live
//! in the `standings` crate.
//!
//! # Example
//!
//! ```
//! use scoring::{score, AnswerValue, FieldType, ScoringField};
//! use std::collections::BTreeMap;
//!
//! let fields = vec![ScoringField::new("wineBottles", "Wine bottles", FieldType::Numeric)];
//! let predicted = BTreeMap::from([("wineBottles".to_string(), AnswerValue::Number(22.0))]);
//! let actual = BTreeMap::from([("wineBottles".to_string(), AnswerValue::Number(20.0))]);
//!
//! let card = score(&fields, &predicted, &actual);
//! assert_eq!(card.total, 25);
//! ```

pub mod scorer;
pub mod types;
pub mod value;

// Re-export main types
pub use scorer::{score, Credit, FieldScore, ScoreCard};
pub use types::*;
pub use value::{AnswerValue, StoredAnswer};

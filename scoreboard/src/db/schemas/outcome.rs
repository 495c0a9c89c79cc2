//! Outcome document schema
//!
//! The organizer surface keeps exactly one document, `_id = "current"`.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use scoring::{AnswerValue, OutcomeRecord};

use crate::db::mongo::IntoIndexes;

/// Collection name for the outcome record
pub const OUTCOME_COLLECTION: &str = "outcomes";

/// ID of the single current outcome document
pub const CURRENT_OUTCOME_ID: &str = "current";

/// Outcome document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct OutcomeDoc {
    pub _id: String,

    /// Actual value per field key
    #[serde(default)]
    pub values: BTreeMap<String, AnswerValue>,

    /// Last organizer update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl From<OutcomeDoc> for OutcomeRecord {
    fn from(doc: OutcomeDoc) -> Self {
        OutcomeRecord {
            values: doc.values,
            updated_at: doc.updated_at.map(DateTime::to_chrono),
        }
    }
}

impl IntoIndexes for OutcomeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![]
    }
}

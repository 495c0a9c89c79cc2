//! Answer document schema
//!
//! One document per submitted answer, with one typed column per value kind.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use scoring::StoredAnswer;

use crate::db::mongo::IntoIndexes;

/// Collection name for answers
pub const ANSWER_COLLECTION: &str = "answers";

/// Answer document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnswerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Participant who answered
    pub user_id: String,

    /// Field the answer belongs to
    pub field_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,

    /// Last change by the participant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl From<AnswerDoc> for StoredAnswer {
    fn from(doc: AnswerDoc) -> Self {
        StoredAnswer {
            user_id: doc.user_id,
            field_key: doc.field_key,
            number_value: doc.number_value,
            boolean_value: doc.boolean_value,
            choice_value: doc.choice_value,
            text_value: doc.text_value,
            choices: doc.choices,
            updated_at: doc.updated_at.map(DateTime::to_chrono),
        }
    }
}

impl IntoIndexes for AnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "field_key": 1 },
            Some(
                IndexOptions::builder()
                    .name("user_field_index".to_string())
                    .build(),
            ),
        )]
    }
}

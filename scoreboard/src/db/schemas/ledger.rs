//! Point ledger document schema
//!
//! Shared with the registration, quiz and game surfaces. Only the prediction
//! source is keyed: a partial unique index guarantees at most one prediction
//! row per participant, while other sources may append freely.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use scoring::{LedgerEntry, PointSource};

use crate::db::mongo::IntoIndexes;

/// Collection name for the point ledger
pub const LEDGER_COLLECTION: &str = "point_ledger";

/// Ledger document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LedgerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub user_id: String,

    /// Point source tag, e.g. "prediction" or "quiz"
    pub source: String,

    pub points: i64,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime,

    pub updated_at: DateTime,
}

impl From<LedgerDoc> for LedgerEntry {
    fn from(doc: LedgerDoc) -> Self {
        LedgerEntry {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doc.user_id,
            source: PointSource::from(doc.source),
            points: doc.points,
            description: doc.description,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

impl IntoIndexes for LedgerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user_id": 1, "source": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! {
                            "source": PointSource::Prediction.as_str(),
                        })
                        .name("prediction_row_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_to_entry() {
        let id = ObjectId::new();
        let now = DateTime::now();
        let entry = LedgerEntry::from(LedgerDoc {
            _id: Some(id),
            user_id: "ann".to_string(),
            source: "prediction".to_string(),
            points: 25,
            description: "Wine bottles: 25".to_string(),
            created_at: now,
            updated_at: now,
        });

        assert_eq!(entry.id, id.to_hex());
        assert_eq!(entry.source, PointSource::Prediction);
        assert_eq!(entry.created_at, now.to_chrono());
    }

    #[test]
    fn test_unknown_source_survives() {
        let now = DateTime::now();
        let entry = LedgerEntry::from(LedgerDoc {
            _id: None,
            user_id: "ann".to_string(),
            source: "bingo".to_string(),
            points: 3,
            description: String::new(),
            created_at: now,
            updated_at: now,
        });
        assert_eq!(entry.source.as_str(), "bingo");
    }

    #[test]
    fn test_prediction_index_is_partial() {
        let indices = LedgerDoc::into_indices();
        let opts = indices[0].1.as_ref().unwrap();
        assert_eq!(opts.unique, Some(true));
        assert_eq!(
            opts.partial_filter_expression,
            Some(doc! { "source": "prediction" })
        );
    }
}

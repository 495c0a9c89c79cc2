//! Field set document schema
//!
//! One document per prediction round; the organizer's form surface flips
//! `is_active` to choose which round is scored.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use scoring::{FieldSet, ScoringField};

use crate::db::mongo::IntoIndexes;

/// Collection name for field sets
pub const FIELD_SET_COLLECTION: &str = "scoring_fields";

/// Field set document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FieldSetDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Stable set identifier
    pub set_id: String,

    /// Display name
    pub name: String,

    /// Whether this is the set currently being scored
    #[serde(default)]
    pub is_active: bool,

    /// Questions, embedded
    #[serde(default)]
    pub fields: Vec<ScoringField>,
}

impl From<FieldSetDoc> for FieldSet {
    fn from(doc: FieldSetDoc) -> Self {
        FieldSet {
            id: doc.set_id,
            name: doc.name,
            is_active: doc.is_active,
            fields: doc.fields,
        }
    }
}

impl IntoIndexes for FieldSetDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "set_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("set_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "is_active": 1 },
                Some(
                    IndexOptions::builder()
                        .name("is_active_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

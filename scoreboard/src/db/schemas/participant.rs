//! Participant document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use scoring::Participant;

use crate::db::mongo::IntoIndexes;

/// Collection name for participants
pub const PARTICIPANT_COLLECTION: &str = "participants";

/// Participant document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ParticipantDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Stable participant ID
    pub user_id: String,

    /// Display name
    pub name: String,

    /// Whether the participant appears on the leaderboard
    #[serde(default = "default_true")]
    pub is_eligible: bool,
}

fn default_true() -> bool {
    true
}

impl From<ParticipantDoc> for Participant {
    fn from(doc: ParticipantDoc) -> Self {
        Participant::new(doc.user_id, doc.name)
    }
}

impl IntoIndexes for ParticipantDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

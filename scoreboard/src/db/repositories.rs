//! MongoDB-backed repository implementations

use async_trait::async_trait;
use bson::{doc, Bson, DateTime};
use tracing::debug;

use scoring::{
    FieldSet, LedgerEntry, LedgerUpsert, OutcomeRecord, Participant, PointSource, StoredAnswer,
    UpsertOutcome,
};
use standings::{
    AnswerRepository, FieldRepository, LedgerRepository, OutcomeRepository, ParticipantDirectory,
    StoreError,
};

use crate::db::mongo::{store_error, MongoClient, MongoCollection};
use crate::db::schemas::{
    AnswerDoc, FieldSetDoc, LedgerDoc, OutcomeDoc, ParticipantDoc, ANSWER_COLLECTION,
    CURRENT_OUTCOME_ID, FIELD_SET_COLLECTION, LEDGER_COLLECTION, OUTCOME_COLLECTION,
    PARTICIPANT_COLLECTION,
};

/// Every collection the engine touches.
#[derive(Clone)]
pub struct MongoRepositories {
    field_sets: MongoCollection<FieldSetDoc>,
    answers: MongoCollection<AnswerDoc>,
    outcomes: MongoCollection<OutcomeDoc>,
    ledger: MongoCollection<LedgerDoc>,
    participants: MongoCollection<ParticipantDoc>,
}

impl MongoRepositories {
    /// Open the collections and apply their indexes.
    pub async fn new(client: &MongoClient) -> Result<Self, StoreError> {
        Ok(Self {
            field_sets: client.collection(FIELD_SET_COLLECTION).await?,
            answers: client.collection(ANSWER_COLLECTION).await?,
            outcomes: client.collection(OUTCOME_COLLECTION).await?,
            ledger: client.collection(LEDGER_COLLECTION).await?,
            participants: client.collection(PARTICIPANT_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl FieldRepository for MongoRepositories {
    async fn active_field_set(&self) -> Result<Option<FieldSet>, StoreError> {
        let doc = self.field_sets.find_one(doc! { "is_active": true }).await?;
        Ok(doc.map(FieldSet::from))
    }
}

#[async_trait]
impl AnswerRepository for MongoRepositories {
    async fn respondents(&self) -> Result<Vec<String>, StoreError> {
        let values = self
            .answers
            .inner()
            .distinct("user_id", doc! {})
            .await
            .map_err(store_error)?;

        let mut user_ids: Vec<String> = values
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect();
        user_ids.sort();
        Ok(user_ids)
    }

    async fn answers_for(&self, user_id: &str) -> Result<Vec<StoredAnswer>, StoreError> {
        let docs = self
            .answers
            .find_many(doc! { "user_id": user_id }, doc! { "_id": 1 })
            .await?;
        Ok(docs.into_iter().map(StoredAnswer::from).collect())
    }
}

#[async_trait]
impl OutcomeRepository for MongoRepositories {
    async fn current(&self) -> Result<Option<OutcomeRecord>, StoreError> {
        let doc = self
            .outcomes
            .find_one(doc! { "_id": CURRENT_OUTCOME_ID })
            .await?;
        Ok(doc.map(OutcomeRecord::from))
    }
}

#[async_trait]
impl LedgerRepository for MongoRepositories {
    async fn upsert(&self, entry: LedgerUpsert) -> Result<UpsertOutcome, StoreError> {
        let now = DateTime::now();
        let description = entry.description.as_str();

        // A single pipeline update: the server evaluates the comparison
        // against the stored row, so there is no read-then-write window.
        let pipeline = vec![doc! {
            "$set": {
                "user_id": { "$literal": entry.user_id.as_str() },
                "source": { "$literal": entry.source.as_str() },
                "created_at": { "$ifNull": ["$created_at", now] },
                "updated_at": {
                    "$cond": [
                        { "$and": [
                            { "$eq": ["$points", entry.points] },
                            { "$eq": ["$description", { "$literal": description }] },
                        ] },
                        "$updated_at",
                        now,
                    ]
                },
                "points": entry.points,
                "description": { "$literal": description },
            }
        }];

        let result = self
            .ledger
            .inner()
            .update_one(
                doc! { "user_id": entry.user_id.as_str(), "source": entry.source.as_str() },
                pipeline,
            )
            .upsert(true)
            .await
            .map_err(store_error)?;

        let outcome = if result.upserted_id.is_some() {
            UpsertOutcome::Inserted
        } else if result.modified_count > 0 {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Unchanged
        };

        debug!(
            user_id = %entry.user_id,
            source = entry.source.as_str(),
            outcome = ?outcome,
            "Ledger upsert"
        );
        Ok(outcome)
    }

    async fn entries_for(&self, user_id: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let docs = self
            .ledger
            .find_many(
                doc! { "user_id": user_id },
                doc! { "source": 1, "created_at": 1, "_id": 1 },
            )
            .await?;
        Ok(docs.into_iter().map(LedgerEntry::from).collect())
    }

    async fn find(
        &self,
        user_id: &str,
        source: &PointSource,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        let doc = self
            .ledger
            .find_one(doc! { "user_id": user_id, "source": source.as_str() })
            .await?;
        Ok(doc.map(LedgerEntry::from))
    }
}

#[async_trait]
impl ParticipantDirectory for MongoRepositories {
    async fn eligible(&self) -> Result<Vec<Participant>, StoreError> {
        let docs = self
            .participants
            .find_many(doc! { "is_eligible": { "$ne": false } }, doc! { "user_id": 1 })
            .await?;
        Ok(docs.into_iter().map(Participant::from).collect())
    }
}

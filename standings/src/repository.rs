//! Repository traits for the backing store.
//!
//! Every collaborator the engine reads from or writes to is injected through
//! one of these traits, so the reconciler and leaderboard never hold a global
//! client and the scorer stays free of I/O.

use async_trait::async_trait;
use std::sync::Arc;

use scoring::{
    FieldSet, LedgerEntry, LedgerUpsert, OutcomeRecord, Participant, PointSource, StoredAnswer,
    UpsertOutcome,
};

use crate::error::StoreError;

/// Question metadata provider.
#[async_trait]
pub trait FieldRepository: Send + Sync {
    /// The currently active field set, if one exists.
    async fn active_field_set(&self) -> Result<Option<FieldSet>, StoreError>;
}

/// Submitted answers provider.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Participants who have stored at least one answer.
    async fn respondents(&self) -> Result<Vec<String>, StoreError>;

    /// Every stored answer row for a participant, in store order.
    async fn answers_for(&self, user_id: &str) -> Result<Vec<StoredAnswer>, StoreError>;
}

/// Organizer outcome provider.
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    /// The single current outcome record, if the organizer created one.
    async fn current(&self) -> Result<Option<OutcomeRecord>, StoreError>;
}

/// Generic point ledger.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Atomically insert or update the row keyed by `(user_id, source)`.
    ///
    /// Implementations must not split this into a read followed by a write,
    /// and must leave `updated_at` untouched when content is unchanged.
    async fn upsert(&self, entry: LedgerUpsert) -> Result<UpsertOutcome, StoreError>;

    /// All rows for a participant, every source.
    async fn entries_for(&self, user_id: &str) -> Result<Vec<LedgerEntry>, StoreError>;

    /// The row for one `(user_id, source)` key.
    async fn find(
        &self,
        user_id: &str,
        source: &PointSource,
    ) -> Result<Option<LedgerEntry>, StoreError>;
}

/// Eligible participants.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn eligible(&self) -> Result<Vec<Participant>, StoreError>;
}

/// Injected repository handles.
#[derive(Clone)]
pub struct Repositories {
    pub fields: Arc<dyn FieldRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub outcomes: Arc<dyn OutcomeRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub participants: Arc<dyn ParticipantDirectory>,
}

impl Repositories {
    /// Use one store for every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: FieldRepository
            + AnswerRepository
            + OutcomeRepository
            + LedgerRepository
            + ParticipantDirectory
            + 'static,
    {
        Self {
            fields: store.clone(),
            answers: store.clone(),
            outcomes: store.clone(),
            ledger: store.clone(),
            participants: store,
        }
    }
}

//! In-memory repositories.
//!
//! Implements every repository trait in-process. Used by tests, demos and
//! single-node setups; configurable failures let callers exercise the error
//! paths the same way a flaky store would.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use scoring::{
    AnswerValue, FieldSet, LedgerEntry, LedgerUpsert, OutcomeRecord, Participant, PointSource,
    StoredAnswer, UpsertOutcome,
};

use crate::error::StoreError;
use crate::repository::{
    AnswerRepository, FieldRepository, LedgerRepository, OutcomeRepository, ParticipantDirectory,
};

type LedgerKey = (String, PointSource);

/// In-process store backing every repository trait.
pub struct MemoryStore {
    field_set: RwLock<Option<FieldSet>>,
    answers: RwLock<BTreeMap<String, Vec<StoredAnswer>>>,
    outcome: RwLock<Option<OutcomeRecord>>,
    participants: RwLock<Vec<Participant>>,
    /// Rows per `(user_id, source)`; upserted keys hold at most one row
    ledger: DashMap<LedgerKey, Vec<LedgerEntry>>,
    available: AtomicBool,
    failing_users: DashSet<String>,
    /// Artificial delay before every repository call, in milliseconds
    latency_ms: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            field_set: RwLock::new(None),
            answers: RwLock::new(BTreeMap::new()),
            outcome: RwLock::new(None),
            participants: RwLock::new(Vec::new()),
            ledger: DashMap::new(),
            available: AtomicBool::new(true),
            failing_users: DashSet::new(),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Replace the field set.
    pub async fn set_field_set(&self, field_set: FieldSet) {
        *self.field_set.write().await = Some(field_set);
    }

    /// Set one actual value, creating the record on first use.
    pub async fn record_outcome(&self, key: impl Into<String>, value: AnswerValue) {
        let mut outcome = self.outcome.write().await;
        outcome.get_or_insert_with(OutcomeRecord::new).set(key, value);
    }

    /// Remove one actual value.
    pub async fn clear_outcome(&self, key: &str) {
        if let Some(record) = self.outcome.write().await.as_mut() {
            record.clear(key);
        }
    }

    /// Append a stored answer row.
    pub async fn submit_answer(&self, answer: StoredAnswer) {
        self.answers
            .write()
            .await
            .entry(answer.user_id.clone())
            .or_default()
            .push(answer);
    }

    /// Replace every answer row for a participant.
    pub async fn replace_answers(&self, user_id: &str, answers: Vec<StoredAnswer>) {
        self.answers
            .write()
            .await
            .insert(user_id.to_string(), answers);
    }

    /// Register an eligible participant.
    pub async fn add_participant(&self, participant: Participant) {
        self.participants.write().await.push(participant);
    }

    /// Award points outside reconciliation.
    ///
    /// Registration, quiz and game awards append a row. A `Prediction` award
    /// replaces the participant's single prediction row instead, the same way
    /// the persistent store's unique index forces it to.
    pub fn award(
        &self,
        user_id: impl Into<String>,
        source: PointSource,
        points: i64,
        description: impl Into<String>,
    ) {
        let upsert = LedgerUpsert::new(user_id, source, points, description);
        if upsert.source == PointSource::Prediction {
            self.upsert_row(upsert);
            return;
        }

        let key = (upsert.user_id.clone(), upsert.source.clone());
        self.ledger.entry(key).or_default().push(new_entry(upsert));
    }

    /// Total number of ledger rows.
    pub fn ledger_len(&self) -> usize {
        self.ledger.iter().map(|rows| rows.value().len()).sum()
    }

    /// Toggle whole-store availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every per-participant read and write for `user_id` fail.
    pub fn fail_user(&self, user_id: impl Into<String>) {
        self.failing_users.insert(user_id.into());
    }

    /// Stop failing a participant.
    pub fn heal_user(&self, user_id: &str) {
        self.failing_users.remove(user_id);
    }

    /// Delay every repository call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    async fn pause(&self) {
        let millis = self.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Insert or update the single row for `(user_id, source)`.
    ///
    /// The shard lock is held for the whole entry, so concurrent upserts on
    /// one key serialize instead of racing.
    fn upsert_row(&self, entry: LedgerUpsert) -> UpsertOutcome {
        let key = (entry.user_id.clone(), entry.source.clone());
        match self.ledger.entry(key) {
            Entry::Occupied(mut occupied) => match occupied.get_mut().first_mut() {
                Some(existing) if entry.matches(existing) => UpsertOutcome::Unchanged,
                Some(existing) => {
                    existing.points = entry.points;
                    existing.description = entry.description;
                    existing.updated_at = Utc::now();
                    UpsertOutcome::Updated
                }
                None => {
                    occupied.get_mut().push(new_entry(entry));
                    UpsertOutcome::Inserted
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(vec![new_entry(entry)]);
                UpsertOutcome::Inserted
            }
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store disabled".to_string()))
        }
    }

    fn check_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if self.failing_users.contains(user_id) {
            return Err(StoreError::Query(format!("injected failure for {user_id}")));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FieldRepository for MemoryStore {
    async fn active_field_set(&self) -> Result<Option<FieldSet>, StoreError> {
        self.pause().await;
        self.check_available()?;
        let field_set = self.field_set.read().await;
        Ok(field_set.as_ref().filter(|set| set.is_active).cloned())
    }
}

#[async_trait]
impl AnswerRepository for MemoryStore {
    async fn respondents(&self) -> Result<Vec<String>, StoreError> {
        self.pause().await;
        self.check_available()?;
        let answers = self.answers.read().await;
        Ok(answers
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(user_id, _)| user_id.clone())
            .collect())
    }

    async fn answers_for(&self, user_id: &str) -> Result<Vec<StoredAnswer>, StoreError> {
        self.pause().await;
        self.check_user(user_id)?;
        let answers = self.answers.read().await;
        Ok(answers.get(user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl OutcomeRepository for MemoryStore {
    async fn current(&self) -> Result<Option<OutcomeRecord>, StoreError> {
        self.pause().await;
        self.check_available()?;
        Ok(self.outcome.read().await.clone())
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn upsert(&self, entry: LedgerUpsert) -> Result<UpsertOutcome, StoreError> {
        self.pause().await;
        self.check_user(&entry.user_id)?;
        Ok(self.upsert_row(entry))
    }

    async fn entries_for(&self, user_id: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        self.pause().await;
        self.check_user(user_id)?;
        let mut entries: Vec<LedgerEntry> = self
            .ledger
            .iter()
            .filter(|rows| rows.key().0 == user_id)
            .flat_map(|rows| rows.value().clone())
            .collect();
        entries.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then(a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(entries)
    }

    async fn find(
        &self,
        user_id: &str,
        source: &PointSource,
    ) -> Result<Option<LedgerEntry>, StoreError> {
        self.pause().await;
        self.check_user(user_id)?;
        Ok(self
            .ledger
            .get(&(user_id.to_string(), source.clone()))
            .and_then(|rows| rows.first().cloned()))
    }
}

#[async_trait]
impl ParticipantDirectory for MemoryStore {
    async fn eligible(&self) -> Result<Vec<Participant>, StoreError> {
        self.pause().await;
        self.check_available()?;
        Ok(self.participants.read().await.clone())
    }
}

fn new_entry(upsert: LedgerUpsert) -> LedgerEntry {
    let now = Utc::now();
    LedgerEntry {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: upsert.user_id,
        source: upsert.source,
        points: upsert.points,
        description: upsert.description,
        created_at: now,
        updated_at: now,
    }
}

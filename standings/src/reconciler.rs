//! Ledger Reconciler - banks prediction scores.
//!
//! The organizer triggers a run after entering or correcting outcomes. Every
//! respondent is scored against the current outcome record and exactly one
//! `prediction` ledger row per participant is inserted or updated in place.
//! Re-running with unchanged inputs leaves every stored row as it was.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use scoring::{AnswerValue, LedgerUpsert, PointSource, ScoringField, UpsertOutcome};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, StoreError};
use crate::reader::{AnswerReader, FieldReader, OutcomeReader};
use crate::repository::Repositories;

/// A participant whose banked score could not be updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantFailure {
    pub user_id: String,
    pub error: String,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// Participants whose prediction row is now current
    pub participants_processed: usize,
    /// Sum of banked prediction points across processed participants
    pub total_points_awarded: u64,
    /// Rows created by this run
    pub inserted: usize,
    /// Rows whose points or description changed
    pub updated: usize,
    /// Rows already up to date
    pub unchanged: usize,
    /// Respondents with nothing scoreable and no banked row to correct
    pub skipped: usize,
    /// Participants not updated by this run
    pub failures: Vec<ParticipantFailure>,
}

impl CommitReport {
    /// Whether every respondent was handled.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of banking one participant.
enum Banked {
    Row { points: u32, outcome: UpsertOutcome },
    Skipped,
}

/// Organizer-triggered batch that writes the banked prediction scores.
pub struct Reconciler {
    repos: Repositories,
    config: EngineConfig,
    fields: FieldReader,
    answers: AnswerReader,
    outcomes: OutcomeReader,
}

impl Reconciler {
    /// Create a reconciler over injected repositories.
    pub fn new(repos: Repositories, config: EngineConfig) -> Self {
        Self {
            fields: FieldReader::new(repos.fields.clone()),
            answers: AnswerReader::new(repos.answers.clone()),
            outcomes: OutcomeReader::new(repos.outcomes.clone()),
            repos,
            config,
        }
    }

    /// Recalculate and bank every respondent's prediction score now.
    ///
    /// Loading fields, outcomes and the respondent list is all-or-nothing.
    /// After that, a failure for one participant is recorded in the report
    /// and the run carries on with the others.
    pub async fn commit(&self) -> Result<CommitReport> {
        self.config.validate()?;
        self.with_budget(async {
            let respondents = self.repos.answers.respondents().await?;
            self.run(respondents).await
        })
        .await
    }

    /// Re-bank a single participant, e.g. after correcting their answers.
    pub async fn commit_participant(&self, user_id: &str) -> Result<CommitReport> {
        self.config.validate()?;
        self.with_budget(self.run(vec![user_id.to_string()])).await
    }

    async fn with_budget<F>(&self, work: F) -> Result<CommitReport>
    where
        F: std::future::Future<Output = Result<CommitReport>>,
    {
        match tokio::time::timeout(self.config.commit_timeout(), work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(after_ms = self.config.commit_timeout_ms, "Reconciliation timed out");
                Err(EngineError::Timeout {
                    operation: "reconciliation",
                    after_ms: self.config.commit_timeout_ms,
                })
            }
        }
    }

    async fn run(&self, user_ids: Vec<String>) -> Result<CommitReport> {
        let fields = self.fields.active_fields().await?;
        let outcome = self.outcomes.actuals(&fields).await?;

        info!(
            participants = user_ids.len(),
            fields = fields.len(),
            outcomes_entered = outcome.values.len(),
            "Starting prediction reconciliation"
        );

        let fields = &fields;
        let actuals = &outcome.values;
        let results: Vec<(String, std::result::Result<Banked, StoreError>)> =
            stream::iter(user_ids)
                .map(|user_id| async move {
                    let result = self.bank(&user_id, fields, actuals).await;
                    (user_id, result)
                })
                .buffered(self.config.max_concurrency)
                .collect()
                .await;

        let mut report = CommitReport::default();
        for (user_id, result) in results {
            match result {
                Ok(Banked::Row { points, outcome }) => {
                    report.participants_processed += 1;
                    report.total_points_awarded += u64::from(points);
                    match outcome {
                        UpsertOutcome::Inserted => report.inserted += 1,
                        UpsertOutcome::Updated => report.updated += 1,
                        UpsertOutcome::Unchanged => report.unchanged += 1,
                    }
                }
                Ok(Banked::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Failed to bank prediction score");
                    report.failures.push(ParticipantFailure {
                        user_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.participants_processed,
            points = report.total_points_awarded,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Prediction reconciliation finished"
        );

        Ok(report)
    }

    async fn bank(
        &self,
        user_id: &str,
        fields: &[ScoringField],
        actuals: &BTreeMap<String, AnswerValue>,
    ) -> std::result::Result<Banked, StoreError> {
        let predicted = self.answers.predictions(user_id, fields).await?;
        if predicted.is_empty() {
            // A row banked before its fields were retired must drop to zero.
            let banked = self
                .repos
                .ledger
                .find(user_id, &PointSource::Prediction)
                .await?;
            if banked.is_none() {
                debug!(user_id = %user_id, "No scoreable predictions, skipping");
                return Ok(Banked::Skipped);
            }
        }

        // Zero-point rows are still written: "submitted, scored nothing" must
        // stay distinguishable from "never submitted".
        let card = scoring::score(fields, &predicted, actuals);
        let upsert = LedgerUpsert::new(
            user_id,
            PointSource::Prediction,
            i64::from(card.total),
            card.describe(),
        );
        let outcome = self.repos.ledger.upsert(upsert).await?;

        debug!(
            user_id = %user_id,
            points = card.total,
            fields_scored = card.fields_scored(),
            outcome = ?outcome,
            "Banked prediction score"
        );

        Ok(Banked::Row {
            points: card.total,
            outcome,
        })
    }
}

//! Live leaderboard aggregation.
//!
//! Called on every leaderboard request. The prediction component is always
//! recomputed from current answers and the current (possibly partial) outcome
//! record; the banked `prediction` ledger row is never read here, so organizers
//! see the effect of an outcome correction before committing it. All other
//! sources come from the point ledger.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use scoring::{AnswerValue, OutcomeState, Participant, PointSource, ScoreCard, ScoringField};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::config::{EngineConfig, TieBreak};
use crate::error::{EngineError, Result, StoreError};
use crate::reader::{AnswerReader, FieldReader, OutcomeReader, OutcomeSnapshot};
use crate::repository::Repositories;

/// One ranked participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct LeaderboardRow {
    /// 1-based competition rank; equal totals share a rank
    pub rank: usize,
    pub user_id: String,
    pub name: String,
    pub total_points: i64,
    /// Live prediction score
    pub prediction_points: i64,
    pub registration_points: i64,
    pub quiz_points: i64,
    pub game_points: i64,
    /// Sources outside the well-known ones
    pub other_points: i64,
    /// Points per source name, prediction included
    pub per_source: BTreeMap<String, i64>,
    /// Live prediction breakdown
    pub breakdown: ScoreCard,
}

/// How much of the outcome record is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct OutcomeStats {
    /// Scoreable fields with an outcome entered
    pub outcome_fields_entered: usize,
    /// Active scoreable fields
    pub total_scoreable_fields: usize,
    pub outcome_last_updated: Option<DateTime<Utc>>,
    pub state: OutcomeState,
}

impl OutcomeStats {
    fn new(fields: &[ScoringField], outcome: &OutcomeSnapshot) -> Self {
        let total = fields.iter().filter(|f| f.field_type.is_scoreable()).count();
        let entered = outcome.values.len();
        Self {
            outcome_fields_entered: entered,
            total_scoreable_fields: total,
            outcome_last_updated: outcome.updated_at,
            state: OutcomeState::from_counts(entered, total),
        }
    }
}

/// Ranked rows plus outcome completeness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct LeaderboardReport {
    pub rows: Vec<LeaderboardRow>,
    pub stats: OutcomeStats,
    pub generated_at: DateTime<Utc>,
}

/// Read path assembling the ranked, multi-source leaderboard.
pub struct LiveLeaderboard {
    repos: Repositories,
    config: EngineConfig,
    fields: FieldReader,
    answers: AnswerReader,
    outcomes: OutcomeReader,
}

impl LiveLeaderboard {
    /// Create a leaderboard over injected repositories.
    pub fn new(repos: Repositories, config: EngineConfig) -> Self {
        Self {
            fields: FieldReader::new(repos.fields.clone()),
            answers: AnswerReader::new(repos.answers.clone()),
            outcomes: OutcomeReader::new(repos.outcomes.clone()),
            repos,
            config,
        }
    }

    /// Build the full leaderboard.
    ///
    /// Fails closed: any store error or a blown time budget fails the whole
    /// request rather than returning a partial ranking.
    pub async fn query(&self) -> Result<LeaderboardReport> {
        self.config.validate()?;
        let result = match tokio::time::timeout(self.config.request_timeout(), self.build()).await
        {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                operation: "leaderboard",
                after_ms: self.config.request_timeout_ms,
            }),
        };

        if let Err(e) = &result {
            error!(error = %e, "Leaderboard request failed");
        }
        result
    }

    /// The first `limit` ranked rows.
    pub async fn top(&self, limit: usize) -> Result<LeaderboardReport> {
        let mut report = self.query().await?;
        report.rows.truncate(limit);
        Ok(report)
    }

    /// One participant's row, ranked against everyone.
    pub async fn participant(&self, user_id: &str) -> Result<Option<LeaderboardRow>> {
        let report = self.query().await?;
        Ok(report.rows.into_iter().find(|row| row.user_id == user_id))
    }

    async fn build(&self) -> Result<LeaderboardReport> {
        let fields = self.fields.active_fields().await?;
        let outcome = self.outcomes.actuals(&fields).await?;
        let participants = self.repos.participants.eligible().await?;

        let fields_ref = &fields;
        let actuals = &outcome.values;
        let rows: Vec<LeaderboardRow> = stream::iter(participants)
            .map(|participant| async move { self.row_for(participant, fields_ref, actuals).await })
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

        let rows = rank(rows, self.config.tie_break);
        let stats = OutcomeStats::new(&fields, &outcome);

        info!(
            participants = rows.len(),
            outcomes_entered = stats.outcome_fields_entered,
            scoreable_fields = stats.total_scoreable_fields,
            "Leaderboard computed"
        );

        Ok(LeaderboardReport {
            rows,
            stats,
            generated_at: Utc::now(),
        })
    }

    async fn row_for(
        &self,
        participant: Participant,
        fields: &[ScoringField],
        actuals: &BTreeMap<String, AnswerValue>,
    ) -> std::result::Result<LeaderboardRow, StoreError> {
        let predicted = self.answers.predictions(&participant.user_id, fields).await?;
        let card = scoring::score(fields, &predicted, actuals);
        let entries = self.repos.ledger.entries_for(&participant.user_id).await?;

        let prediction_points = i64::from(card.total);
        let mut per_source = BTreeMap::from([(PointSource::Prediction.to_string(), prediction_points)]);
        let (mut registration, mut quiz, mut game, mut other) = (0, 0, 0, 0);

        for entry in entries {
            let bucket = match &entry.source {
                // Banked score; the live value above replaces it.
                PointSource::Prediction => continue,
                PointSource::Registration => &mut registration,
                PointSource::Quiz => &mut quiz,
                PointSource::Game => &mut game,
                PointSource::Other(_) => &mut other,
            };
            *bucket = add_points(*bucket, entry.points, &participant.user_id)?;
            let source_total = per_source.entry(entry.source.to_string()).or_insert(0);
            *source_total = add_points(*source_total, entry.points, &participant.user_id)?;
        }

        let total_points = [registration, quiz, game, other]
            .into_iter()
            .try_fold(prediction_points, |total, points| {
                add_points(total, points, &participant.user_id)
            })?;

        debug!(
            user_id = %participant.user_id,
            prediction = prediction_points,
            "Aggregated participant"
        );

        Ok(LeaderboardRow {
            rank: 0,
            total_points,
            user_id: participant.user_id,
            name: participant.name,
            prediction_points,
            registration_points: registration,
            quiz_points: quiz,
            game_points: game,
            other_points: other,
            per_source,
            breakdown: card,
        })
    }
}

fn add_points(total: i64, points: i64, user_id: &str) -> std::result::Result<i64, StoreError> {
    total
        .checked_add(points)
        .ok_or_else(|| StoreError::Query(format!("ledger points overflow for {user_id}")))
}

/// Sort rows into the leaderboard's total order and assign ranks.
///
/// Higher totals first, equal totals by `tie_break`. Equal totals share a
/// rank and the following rank is skipped (1, 2, 2, 4).
pub fn rank(mut rows: Vec<LeaderboardRow>, tie_break: TieBreak) -> Vec<LeaderboardRow> {
    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| tie_order(a, b, tie_break))
    });

    let mut previous = None;
    let mut current_rank = 0;
    for (index, row) in rows.iter_mut().enumerate() {
        if previous != Some(row.total_points) {
            current_rank = index + 1;
            previous = Some(row.total_points);
        }
        row.rank = current_rank;
    }
    rows
}

fn tie_order(a: &LeaderboardRow, b: &LeaderboardRow, tie_break: TieBreak) -> Ordering {
    match tie_break {
        TieBreak::UserIdAscending => a.user_id.cmp(&b.user_id),
        TieBreak::NameThenUserId => a.name.cmp(&b.name).then_with(|| a.user_id.cmp(&b.user_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use scoring::{FieldSet, FieldType, StoredAnswer};
    use std::sync::Arc;

    fn row(user_id: &str, name: &str, total: i64) -> LeaderboardRow {
        LeaderboardRow {
            rank: 0,
            user_id: user_id.to_string(),
            name: name.to_string(),
            total_points: total,
            prediction_points: total,
            registration_points: 0,
            quiz_points: 0,
            game_points: 0,
            other_points: 0,
            per_source: BTreeMap::new(),
            breakdown: ScoreCard::default(),
        }
    }

    #[test]
    fn test_rank_competition_numbering() {
        let rows = rank(
            vec![
                row("d", "Dirk", 10),
                row("c", "Cas", 50),
                row("a", "Zoe", 50),
                row("b", "Bea", 75),
            ],
            TieBreak::UserIdAscending,
        );
        let order: Vec<(&str, usize)> = rows.iter().map(|r| (r.user_id.as_str(), r.rank)).collect();
        assert_eq!(order, [("b", 1), ("a", 2), ("c", 2), ("d", 4)]);
    }

    #[test]
    fn test_rank_name_tie_break() {
        let rows = rank(
            vec![row("a", "Zoe", 50), row("c", "Cas", 50)],
            TieBreak::NameThenUserId,
        );
        assert_eq!(rows[0].user_id, "c");
        assert_eq!(rows[1].user_id, "a");
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .set_field_set(FieldSet::new(
                "party",
                "Party predictions",
                vec![
                    ScoringField::new("wineBottles", "Wine bottles", FieldType::Numeric),
                    ScoringField::new("bedtime", "Bedtime", FieldType::Time),
                ],
            ))
            .await;
        store.add_participant(Participant::new("ann", "Ann")).await;
        store.add_participant(Participant::new("bob", "Bob")).await;
        store
            .submit_answer(StoredAnswer::new("ann", "wineBottles").with_number(20.0))
            .await;
        store.award("bob", PointSource::Registration, 20, "registered");
        store.award("bob", PointSource::Quiz, 15, "quiz round 1");
        store.award("bob", PointSource::Other("bonus".into()), 5, "early bird");
        store
    }

    #[tokio::test]
    async fn test_query_merges_sources() {
        let store = seeded().await;
        store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
        let board = LiveLeaderboard::new(Repositories::from_store(store), EngineConfig::default());

        let report = board.query().await.unwrap();
        assert_eq!(report.rows[0].user_id, "ann");
        assert_eq!(report.rows[0].total_points, 50);
        assert_eq!(report.rows[1].total_points, 40);
        assert_eq!(report.rows[1].registration_points, 20);
        assert_eq!(report.rows[1].quiz_points, 15);
        assert_eq!(report.rows[1].other_points, 5);
        assert_eq!(report.rows[1].per_source["bonus"], 5);
        assert_eq!(report.rows[1].per_source["prediction"], 0);
        assert_eq!(report.stats.outcome_fields_entered, 1);
        assert_eq!(report.stats.total_scoreable_fields, 2);
        assert_eq!(report.stats.state, OutcomeState::Partial);
    }

    #[tokio::test]
    async fn test_banked_prediction_row_is_ignored() {
        let store = seeded().await;
        store.award("ann", PointSource::Prediction, 999, "stale bank");
        let board = LiveLeaderboard::new(Repositories::from_store(store), EngineConfig::default());

        let ann = board.participant("ann").await.unwrap().unwrap();
        assert_eq!(ann.prediction_points, 0);
        assert_eq!(ann.total_points, 0);
    }

    #[tokio::test]
    async fn test_store_error_fails_closed() {
        let store = seeded().await;
        store.fail_user("bob");
        let board = LiveLeaderboard::new(Repositories::from_store(store), EngineConfig::default());

        assert!(matches!(board.query().await, Err(EngineError::Store(_))));
    }

    #[tokio::test]
    async fn test_point_overflow_fails_closed() {
        let store = seeded().await;
        store.award("bob", PointSource::Game, i64::MAX, "impossible stack");
        let board = LiveLeaderboard::new(Repositories::from_store(store), EngineConfig::default());

        assert!(matches!(
            board.query().await,
            Err(EngineError::Store(StoreError::Query(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_budget_exceeded_fails_closed() {
        let store = seeded().await;
        store.set_latency(std::time::Duration::from_secs(60));
        let config = EngineConfig {
            request_timeout_ms: 500,
            ..EngineConfig::default()
        };
        let board = LiveLeaderboard::new(Repositories::from_store(store), config);

        assert!(matches!(
            board.query().await,
            Err(EngineError::Timeout {
                operation: "leaderboard",
                after_ms: 500
            })
        ));
        assert!(board.top(10).await.is_err());
    }

    #[tokio::test]
    async fn test_top_truncates_after_ranking() {
        let store = seeded().await;
        let board = LiveLeaderboard::new(Repositories::from_store(store), EngineConfig::default());

        let report = board.top(1).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].user_id, "bob");
        assert_eq!(report.stats.state, OutcomeState::Empty);
    }
}

//! End-to-end scoring scenarios against the in-memory store.

use std::sync::Arc;

use scoring::{
    AnswerValue, Credit, FieldSet, FieldType, Participant, PointSource, ScoringField, StoredAnswer,
};
use standings::{
    EngineConfig, LedgerRepository, LiveLeaderboard, MemoryStore, Reconciler, Repositories,
};

/// Twelve scoreable questions plus one free-text question.
fn party_fields() -> Vec<ScoringField> {
    let mut fields = vec![
        ScoringField::new("wineBottles", "Wine bottles", FieldType::Numeric).ordered(0, 0),
        ScoringField::new("firstSleeper", "First asleep", FieldType::Exact)
            .ordered(0, 1)
            .with_options(["Jan", "Piet", "Klaas"]),
        ScoringField::new("bedtime", "Last one to bed", FieldType::Time).ordered(0, 2),
        ScoringField::new("motto", "Party motto", FieldType::Unscored).ordered(9, 0),
    ];
    for i in 0..9 {
        fields.push(
            ScoringField::new(format!("extra{i}"), format!("Extra {i}"), FieldType::Numeric)
                .ordered(1, i),
        );
    }
    fields
}

async fn party() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .set_field_set(FieldSet::new("party-2026", "Party predictions", party_fields()))
        .await;
    for (id, name) in [("ann", "Ann"), ("bob", "Bob"), ("cas", "Cas"), ("dirk", "Dirk")] {
        store.add_participant(Participant::new(id, name)).await;
    }

    let answers = [
        ("ann", 20.0, Some("Jan"), 6.0),
        ("bob", 22.0, Some("Piet"), 7.0),
        ("cas", 30.0, None, 9.0),
    ];
    for (user, wine, sleeper, bedtime) in answers {
        store
            .submit_answer(StoredAnswer::new(user, "wineBottles").with_number(wine))
            .await;
        store
            .submit_answer(StoredAnswer::new(user, "bedtime").with_number(bedtime))
            .await;
        store
            .submit_answer(StoredAnswer::new(user, "motto").with_text("cheers"))
            .await;
        if let Some(sleeper) = sleeper {
            store
                .submit_answer(StoredAnswer::new(user, "firstSleeper").with_choice(sleeper))
                .await;
        }
    }
    store
}

fn engines(store: &Arc<MemoryStore>) -> (Reconciler, LiveLeaderboard) {
    let repos = Repositories::from_store(store.clone());
    (
        Reconciler::new(repos.clone(), EngineConfig::default()),
        LiveLeaderboard::new(repos, EngineConfig::default()),
    )
}

#[tokio::test]
async fn wine_bottle_proximity() {
    let store = party().await;
    store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
    let (_, board) = engines(&store);

    let report = board.query().await.unwrap();
    let points = |user: &str| {
        report
            .rows
            .iter()
            .find(|r| r.user_id == user)
            .and_then(|r| r.breakdown.get("wineBottles"))
            .map(|f| f.points)
    };
    assert_eq!(points("ann"), Some(50));
    assert_eq!(points("bob"), Some(25));
    assert_eq!(points("cas"), Some(0));
    assert_eq!(points("dirk"), None);
}

#[tokio::test]
async fn first_sleeper_exact_or_absent() {
    let store = party().await;
    store
        .record_outcome("firstSleeper", AnswerValue::Choice("Jan".into()))
        .await;
    let (_, board) = engines(&store);

    let report = board.query().await.unwrap();
    let entry = |user: &str| {
        report
            .rows
            .iter()
            .find(|r| r.user_id == user)
            .and_then(|r| r.breakdown.get("firstSleeper").cloned())
    };
    assert_eq!(entry("ann").map(|f| f.credit), Some(Credit::Exact));
    assert_eq!(entry("bob").map(|f| f.credit), Some(Credit::Miss));
    // Cas never answered: excluded, not zero.
    assert!(entry("cas").is_none());
}

#[tokio::test]
async fn completeness_counts_fields_not_answers() {
    let store = party().await;
    store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
    store.record_outcome("extra3", AnswerValue::Number(1.0)).await;
    store.record_outcome("motto", AnswerValue::Text("cheers".into())).await;
    let (_, board) = engines(&store);

    let stats = board.query().await.unwrap().stats;
    assert_eq!(stats.outcome_fields_entered, 2);
    assert_eq!(stats.total_scoreable_fields, 12);
    assert!(stats.outcome_last_updated.is_some());
}

#[tokio::test]
async fn reconciliation_twice_keeps_one_row_each() {
    let store = party().await;
    store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
    store.record_outcome("bedtime", AnswerValue::Units(6)).await;
    let (reconciler, _) = engines(&store);

    let first = reconciler.commit().await.unwrap();
    let ann_before = store.find("ann", &PointSource::Prediction).await.unwrap();
    let second = reconciler.commit().await.unwrap();

    assert_eq!(first.participants_processed, 3);
    assert_eq!(second.participants_processed, 3);
    assert_eq!(first.total_points_awarded, second.total_points_awarded);
    assert_eq!(second.unchanged, 3);
    assert_eq!(store.ledger_len(), 3);
    assert_eq!(store.find("ann", &PointSource::Prediction).await.unwrap(), ann_before);
    assert!(store.find("dirk", &PointSource::Prediction).await.unwrap().is_none());
}

#[tokio::test]
async fn correcting_one_outcome_only_moves_that_field() {
    let store = party().await;
    store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
    store.record_outcome("bedtime", AnswerValue::Units(6)).await;
    let (_, board) = engines(&store);
    let before = board.query().await.unwrap();

    // Bedtime moves from 6 to 7 units.
    store.record_outcome("bedtime", AnswerValue::Units(7)).await;
    let after = board.query().await.unwrap();

    for user in ["ann", "bob", "cas"] {
        let old = before.rows.iter().find(|r| r.user_id == user).unwrap();
        let new = after.rows.iter().find(|r| r.user_id == user).unwrap();
        assert_eq!(old.breakdown.get("wineBottles"), new.breakdown.get("wineBottles"));
    }

    let bedtime = |report: &standings::LeaderboardReport, user: &str| {
        report
            .rows
            .iter()
            .find(|r| r.user_id == user)
            .and_then(|r| r.breakdown.get("bedtime"))
            .map(|f| f.points)
    };
    assert_eq!(bedtime(&before, "ann"), Some(50));
    assert_eq!(bedtime(&after, "ann"), Some(25));
    assert_eq!(bedtime(&before, "bob"), Some(25));
    assert_eq!(bedtime(&after, "bob"), Some(50));
    assert_eq!(bedtime(&before, "cas"), Some(0));
    assert_eq!(bedtime(&after, "cas"), Some(10));
}

#[tokio::test]
async fn live_view_runs_ahead_of_bank() {
    let store = party().await;
    store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
    let (reconciler, board) = engines(&store);
    reconciler.commit().await.unwrap();

    store.record_outcome("wineBottles", AnswerValue::Number(30.0)).await;
    let cas = board.participant("cas").await.unwrap().unwrap();
    assert_eq!(cas.prediction_points, 50);

    let banked = store.find("cas", &PointSource::Prediction).await.unwrap().unwrap();
    assert_eq!(banked.points, 0);
}

#[tokio::test]
async fn ties_are_stable_across_queries() {
    let store = party().await;
    store.award("dirk", PointSource::Game, 25, "stacked 12 blocks");
    store.record_outcome("wineBottles", AnswerValue::Number(20.0)).await;
    let (_, board) = engines(&store);

    let first: Vec<String> = board
        .query()
        .await
        .unwrap()
        .rows
        .into_iter()
        .map(|r| r.user_id)
        .collect();
    for _ in 0..5 {
        let again: Vec<String> = board
            .query()
            .await
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(again, first);
    }

    // bob and dirk both have 25 points; bob sorts first by id.
    assert_eq!(first, ["ann", "bob", "dirk", "cas"]);
}

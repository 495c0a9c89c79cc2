//! Readers that turn stored rows into scoreable values.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use scoring::{AnswerValue, ScoringField, StoredAnswer};

use crate::error::StoreError;
use crate::repository::{AnswerRepository, FieldRepository, OutcomeRepository};

/// Loads the active question list.
#[derive(Clone)]
pub struct FieldReader {
    repo: Arc<dyn FieldRepository>,
}

impl FieldReader {
    pub fn new(repo: Arc<dyn FieldRepository>) -> Self {
        Self { repo }
    }

    /// Active fields of the active set, ordered by section then field order.
    ///
    /// No active set means nothing to score: an empty list, not an error.
    pub async fn active_fields(&self) -> Result<Vec<ScoringField>, StoreError> {
        let Some(set) = self.repo.active_field_set().await? else {
            debug!("No active field set");
            return Ok(Vec::new());
        };

        let mut fields: Vec<ScoringField> =
            set.fields.into_iter().filter(|f| f.is_active).collect();
        fields.sort_by(|a, b| {
            (a.section_order, a.field_order, &a.key).cmp(&(b.section_order, b.field_order, &b.key))
        });
        Ok(fields)
    }
}

/// Loads one participant's predictions.
#[derive(Clone)]
pub struct AnswerReader {
    repo: Arc<dyn AnswerRepository>,
}

impl AnswerReader {
    pub fn new(repo: Arc<dyn AnswerRepository>) -> Self {
        Self { repo }
    }

    /// One coerced value per active field key.
    ///
    /// Answers to unknown or retired fields are ignored. When several rows
    /// exist for one key the most recently updated wins; on equal timestamps
    /// the later row in store order wins. A row whose value does not fit the
    /// field type is dropped as if it were never submitted.
    pub async fn predictions(
        &self,
        user_id: &str,
        fields: &[ScoringField],
    ) -> Result<BTreeMap<String, AnswerValue>, StoreError> {
        let rows = self.repo.answers_for(user_id).await?;
        Ok(normalize_answers(user_id, &rows, fields))
    }
}

fn normalize_answers(
    user_id: &str,
    rows: &[StoredAnswer],
    fields: &[ScoringField],
) -> BTreeMap<String, AnswerValue> {
    let by_key: BTreeMap<&str, &ScoringField> = fields
        .iter()
        .filter(|f| f.is_active)
        .map(|f| (f.key.as_str(), f))
        .collect();

    let mut latest: BTreeMap<&str, &StoredAnswer> = BTreeMap::new();
    for row in rows {
        let key = row.field_key.as_str();
        if !by_key.contains_key(key) {
            continue;
        }
        let newer = latest
            .get(key)
            .map_or(true, |current| current.updated_at <= row.updated_at);
        if newer {
            latest.insert(key, row);
        }
    }

    let mut values = BTreeMap::new();
    for (key, row) in latest {
        let field = by_key[key];
        if !field.field_type.is_scoreable() {
            continue;
        }
        match row
            .typed_value(field.field_type)
            .and_then(|v| v.coerce(field.field_type))
        {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => warn!(
                user_id = %user_id,
                field = %key,
                field_type = field.field_type.as_str(),
                "Answer does not fit field type, treating as absent"
            ),
        }
    }
    values
}

/// Coerced view of the outcome record.
#[derive(Debug, Clone, Default)]
pub struct OutcomeSnapshot {
    /// Actual values for active scoreable fields
    pub values: BTreeMap<String, AnswerValue>,
    /// Last organizer update
    pub updated_at: Option<DateTime<Utc>>,
}

/// Loads the current outcome record.
#[derive(Clone)]
pub struct OutcomeReader {
    repo: Arc<dyn OutcomeRepository>,
}

impl OutcomeReader {
    pub fn new(repo: Arc<dyn OutcomeRepository>) -> Self {
        Self { repo }
    }

    /// Actual values restricted to `fields`, coerced per field type.
    pub async fn actuals(&self, fields: &[ScoringField]) -> Result<OutcomeSnapshot, StoreError> {
        let Some(record) = self.repo.current().await? else {
            return Ok(OutcomeSnapshot::default());
        };

        let mut values = BTreeMap::new();
        for field in fields.iter().filter(|f| f.field_type.is_scoreable()) {
            let Some(raw) = record.values.get(&field.key) else {
                continue;
            };
            match raw.coerce(field.field_type) {
                Some(value) => {
                    values.insert(field.key.clone(), value);
                }
                None => warn!(
                    field = %field.key,
                    field_type = field.field_type.as_str(),
                    "Outcome does not fit field type, treating as unresulted"
                ),
            }
        }

        Ok(OutcomeSnapshot {
            values,
            updated_at: record.updated_at,
        })
    }
}

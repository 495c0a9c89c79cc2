//! Core types for the prediction game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::value::AnswerValue;

/// How a question is compared against its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Proximity by percentage distance
    Numeric,
    /// Proximity by time-slider units
    Time,
    /// Strict equality (labels, booleans, single choice)
    Exact,
    /// Free text and multi-select
    Unscored,
}

impl FieldType {
    /// Whether answers to this type ever contribute points.
    pub fn is_scoreable(self) -> bool {
        !matches!(self, Self::Unscored)
    }

    /// Get a stable string identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Time => "time",
            Self::Exact => "exact",
            Self::Unscored => "unscored",
        }
    }
}

/// A question participants predict against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ScoringField {
    /// Stable key answers and outcomes are stored under
    pub key: String,
    /// Human-readable question label
    pub label: String,
    /// Comparison strategy
    pub field_type: FieldType,
    /// Selectable options (choice fields)
    #[serde(default)]
    pub options: Vec<String>,
    /// Ordering of the section this field lives in
    #[serde(default)]
    pub section_order: i32,
    /// Ordering within the section
    #[serde(default)]
    pub field_order: i32,
    /// Retired fields keep their answers but are no longer scored
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ScoringField {
    /// Create an active field with default ordering.
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            options: Vec::new(),
            section_order: 0,
            field_order: 0,
            is_active: true,
        }
    }

    /// Set section and in-section ordering.
    pub fn ordered(mut self, section_order: i32, field_order: i32) -> Self {
        self.section_order = section_order;
        self.field_order = field_order;
        self
    }

    /// Set selectable options.
    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the field retired.
    pub fn retired(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// The set of questions for one prediction round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    /// Set identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Only the active set is scored
    pub is_active: bool,
    /// Questions in this set
    pub fields: Vec<ScoringField>,
}

impl FieldSet {
    /// Create an active field set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, fields: Vec<ScoringField>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            fields,
        }
    }
}

/// Organizer-entered ground truth.
///
/// There is exactly one current record. It starts empty and fills up as the
/// organizer learns outcomes; any subset of keys may be present at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct OutcomeRecord {
    /// Actual value per field key
    pub values: BTreeMap<String, AnswerValue>,
    /// Last organizer update
    pub updated_at: Option<DateTime<Utc>>,
}

impl OutcomeRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an actual value and bump the update time.
    pub fn set(&mut self, key: impl Into<String>, value: AnswerValue) {
        self.values.insert(key.into(), value);
        self.updated_at = Some(Utc::now());
    }

    /// Builder form of [`OutcomeRecord::set`].
    pub fn with(mut self, key: impl Into<String>, value: AnswerValue) -> Self {
        self.set(key, value);
        self
    }

    /// Remove an actual value (organizer correction).
    pub fn clear(&mut self, key: &str) -> Option<AnswerValue> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.updated_at = Some(Utc::now());
        }
        removed
    }
}

/// Advisory completeness of the outcome record.
///
/// Nothing enforces `Complete`; scoring behaves the same in every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum OutcomeState {
    /// No scoreable outcome entered yet
    Empty,
    /// Some scoreable outcomes entered
    Partial,
    /// Every scoreable field has an outcome
    Complete,
}

impl OutcomeState {
    /// Derive the state from entered and total scoreable counts.
    pub fn from_counts(entered: usize, total: usize) -> Self {
        if entered == 0 {
            Self::Empty
        } else if entered < total {
            Self::Partial
        } else {
            Self::Complete
        }
    }
}

/// A participant eligible for the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable participant ID
    pub user_id: String,
    /// Display name
    pub name: String,
}

impl Participant {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }
}

/// Where a block of points came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PointSource {
    /// Banked prediction score (written by reconciliation only)
    Prediction,
    /// Completing registration
    Registration,
    /// Quiz answers
    Quiz,
    /// Stacking mini-game
    Game,
    /// Anything else the surrounding system awards
    Other(String),
}

impl PointSource {
    /// Get the stored string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Prediction => "prediction",
            Self::Registration => "registration",
            Self::Quiz => "quiz",
            Self::Game => "game",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for PointSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "prediction" => Self::Prediction,
            "registration" => Self::Registration,
            "quiz" => Self::Quiz,
            "game" => Self::Game,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for PointSource {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PointSource> for String {
    fn from(value: PointSource) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row in the generic point ledger.
///
/// At most one row exists per `(user_id, source)` for the prediction source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Row ID
    pub id: String,
    /// Participant the points belong to
    pub user_id: String,
    /// Origin of the points
    pub source: PointSource,
    /// Signed amount
    pub points: i64,
    /// Human-readable explanation
    pub description: String,
    /// When the row was first written
    pub created_at: DateTime<Utc>,
    /// When points or description last changed
    pub updated_at: DateTime<Utc>,
}

/// Insert-or-update request keyed by `(user_id, source)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerUpsert {
    pub user_id: String,
    pub source: PointSource,
    pub points: i64,
    pub description: String,
}

impl LedgerUpsert {
    pub fn new(
        user_id: impl Into<String>,
        source: PointSource,
        points: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            source,
            points,
            description: description.into(),
        }
    }

    /// Whether `entry` already holds exactly this content.
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        entry.points == self.points && entry.description == self.description
    }
}

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No row existed; one was created
    Inserted,
    /// Points or description changed
    Updated,
    /// Stored row already matched
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_source_roundtrip() {
        for source in [
            PointSource::Prediction,
            PointSource::Registration,
            PointSource::Quiz,
            PointSource::Game,
            PointSource::Other("bonus".to_string()),
        ] {
            let json = serde_json::to_string(&source).unwrap();
            let parsed: PointSource = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, source);
        }
        assert_eq!(PointSource::from("quiz"), PointSource::Quiz);
    }

    #[test]
    fn test_outcome_state() {
        assert_eq!(OutcomeState::from_counts(0, 12), OutcomeState::Empty);
        assert_eq!(OutcomeState::from_counts(2, 12), OutcomeState::Partial);
        assert_eq!(OutcomeState::from_counts(12, 12), OutcomeState::Complete);
        assert_eq!(OutcomeState::from_counts(0, 0), OutcomeState::Empty);
    }

    #[test]
    fn test_outcome_clear_only_bumps_on_change() {
        let mut record = OutcomeRecord::new();
        assert!(record.clear("missing").is_none());
        assert!(record.updated_at.is_none());

        record.set("wineBottles", AnswerValue::Number(20.0));
        assert!(record.updated_at.is_some());
        assert_eq!(record.clear("wineBottles"), Some(AnswerValue::Number(20.0)));
    }

    #[test]
    fn test_field_defaults_from_json() {
        let field: ScoringField = serde_json::from_str(
            r#"{"key": "eggs", "label": "Eggs eaten", "field_type": "numeric"}"#,
        )
        .unwrap();
        assert!(field.is_active);
        assert!(field.options.is_empty());
        assert!(field.field_type.is_scoreable());
    }
}

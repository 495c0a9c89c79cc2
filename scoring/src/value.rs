//! Typed answer values.
//!
//! Participants and organizers both submit values through the same shape.
//! Before anything is compared, a value is coerced to the form its field type
//! scores on; a value that cannot be coerced is a type mismatch and is treated
//! exactly like a missing answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::FieldType;

/// A single logical answer (or outcome) value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// A plain number (counts, amounts)
    Number(f64),
    /// Discrete time-slider units, e.g. 30-minute steps
    Units(i64),
    /// Yes/no answer
    Boolean(bool),
    /// Selected label, option or participant reference
    Choice(String),
    /// Free text
    Text(String),
    /// Multi-select
    Multi(Vec<String>),
}

impl AnswerValue {
    /// Normalize this value to the shape `field_type` compares on.
    ///
    /// Returns `None` on a type mismatch. On exact fields a plain string is a
    /// plain string: `Text` folds into `Choice`, but no string ever becomes a
    /// number or boolean, so `Text("true")` never equals `Boolean(true)`.
    pub fn coerce(&self, field_type: FieldType) -> Option<AnswerValue> {
        match field_type {
            FieldType::Numeric => match self {
                Self::Number(n) if n.is_finite() => Some(Self::Number(*n)),
                Self::Units(u) => Some(Self::Number(*u as f64)),
                _ => None,
            },
            FieldType::Time => match self {
                Self::Units(u) => Some(Self::Units(*u)),
                Self::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                    Some(Self::Units(*n as i64))
                }
                _ => None,
            },
            FieldType::Exact => match self {
                Self::Multi(_) => None,
                Self::Number(n) if !n.is_finite() => None,
                Self::Text(s) => Some(Self::Choice(s.clone())),
                other => Some(other.clone()),
            },
            FieldType::Unscored => None,
        }
    }

    /// Short display form used in ledger descriptions.
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Units(u) => format!("{u}u"),
            Self::Boolean(b) => b.to_string(),
            Self::Choice(s) | Self::Text(s) => s.clone(),
            Self::Multi(items) => items.join("|"),
        }
    }
}

/// An answer row as persisted by the submission surface.
///
/// Submission forms write one typed column per answer; which one is
/// meaningful depends on the field's type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAnswer {
    /// Participant who answered
    pub user_id: String,
    /// Field this answer belongs to
    pub field_key: String,
    /// Numeric column (numbers and time-slider positions)
    #[serde(default)]
    pub number_value: Option<f64>,
    /// Boolean column
    #[serde(default)]
    pub boolean_value: Option<bool>,
    /// Selected label or reference
    #[serde(default)]
    pub choice_value: Option<String>,
    /// Free text column
    #[serde(default)]
    pub text_value: Option<String>,
    /// Multi-select column
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    /// Last time the participant changed this answer
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredAnswer {
    /// Create an empty answer row for a participant and field.
    pub fn new(user_id: impl Into<String>, field_key: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            field_key: field_key.into(),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Set the numeric column.
    pub fn with_number(mut self, value: f64) -> Self {
        self.number_value = Some(value);
        self
    }

    /// Set the boolean column.
    pub fn with_boolean(mut self, value: bool) -> Self {
        self.boolean_value = Some(value);
        self
    }

    /// Set the choice column.
    pub fn with_choice(mut self, value: impl Into<String>) -> Self {
        self.choice_value = Some(value.into());
        self
    }

    /// Set the free text column.
    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.text_value = Some(value.into());
        self
    }

    /// Set the update timestamp.
    pub fn updated(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Pick the column that carries the value for `field_type`.
    pub fn typed_value(&self, field_type: FieldType) -> Option<AnswerValue> {
        match field_type {
            FieldType::Numeric => self.number_value.map(AnswerValue::Number),
            FieldType::Time => self.number_value.map(AnswerValue::Number),
            FieldType::Exact => self
                .boolean_value
                .map(AnswerValue::Boolean)
                .or_else(|| self.choice_value.clone().map(AnswerValue::Choice))
                .or_else(|| self.number_value.map(AnswerValue::Number))
                .or_else(|| self.text_value.clone().map(AnswerValue::Text)),
            FieldType::Unscored => self
                .text_value
                .clone()
                .map(AnswerValue::Text)
                .or_else(|| self.choices.clone().map(AnswerValue::Multi)),
        }
    }
}

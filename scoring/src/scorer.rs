//! The Scorer.
//!
//! Turns a participant's predictions and the current outcome record into a
//! total plus a per-field breakdown. Total: it never fails and never touches
//! storage. A field appears in the breakdown only when both sides hold a value
//! of the right shape; an unresulted field is absent, not zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{FieldType, ScoringField};
use crate::value::AnswerValue;

/// Percentage distance (inclusive) that still earns [`Credit::Close`].
pub const CLOSE_PERCENT: f64 = 10.0;
/// Percentage distance (inclusive) that still earns [`Credit::Near`].
pub const NEAR_PERCENT: f64 = 25.0;
/// Unit distance (inclusive) that still earns [`Credit::Close`].
pub const CLOSE_UNITS: u64 = 1;
/// Unit distance (inclusive) that still earns [`Credit::Near`].
pub const NEAR_UNITS: u64 = 2;

/// Partial credit for one compared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Credit {
    Miss,
    Near,
    Close,
    Exact,
}

impl Credit {
    /// Points awarded for this credit.
    pub fn points(self) -> u32 {
        match self {
            Self::Miss => 0,
            Self::Near => 10,
            Self::Close => 25,
            Self::Exact => 50,
        }
    }
}

impl FieldType {
    /// Compare a coerced prediction with a coerced outcome.
    ///
    /// `None` means the pair is not comparable (wrong shapes or an unscored
    /// type) and the field must be left out of the breakdown.
    pub fn compare(self, predicted: &AnswerValue, actual: &AnswerValue) -> Option<Credit> {
        match self {
            Self::Numeric => numeric_proximity(predicted, actual),
            Self::Time => time_proximity(predicted, actual),
            Self::Exact => exact_match(predicted, actual),
            Self::Unscored => None,
        }
    }
}

/// Inputs above this are scaled down before the percentage test.
const LARGE_MAGNITUDE: f64 = f64::MAX / 256.0;

/// Proximity by percentage of the actual value.
///
/// An actual of zero only allows an exact hit. The percentage test is done
/// multiplied out so that "exactly 10% off" stays inclusive in floating point.
pub fn numeric_proximity(predicted: &AnswerValue, actual: &AnswerValue) -> Option<Credit> {
    let (AnswerValue::Number(p), AnswerValue::Number(a)) = (predicted, actual) else {
        return None;
    };
    if !p.is_finite() || !a.is_finite() {
        return None;
    }

    if p == a {
        return Some(Credit::Exact);
    }
    if *a == 0.0 {
        return Some(Credit::Miss);
    }

    // Near f64::MAX the difference and the products below overflow to
    // infinity; scaling by a power of two first keeps every step finite and
    // exact.
    let scale = if p.abs().max(a.abs()) > LARGE_MAGNITUDE {
        1.0 / 256.0
    } else {
        1.0
    };
    let diff = (p * scale - a * scale).abs();
    let magnitude = a.abs() * scale;
    let scaled = diff * 100.0;
    let credit = if scaled <= CLOSE_PERCENT * magnitude {
        Credit::Close
    } else if scaled <= NEAR_PERCENT * magnitude {
        Credit::Near
    } else {
        Credit::Miss
    };
    Some(credit)
}

/// Proximity by distance in time-slider units.
pub fn time_proximity(predicted: &AnswerValue, actual: &AnswerValue) -> Option<Credit> {
    let (AnswerValue::Units(p), AnswerValue::Units(a)) = (predicted, actual) else {
        return None;
    };

    let credit = match p.abs_diff(*a) {
        0 => Credit::Exact,
        d if d <= CLOSE_UNITS => Credit::Close,
        d if d <= NEAR_UNITS => Credit::Near,
        _ => Credit::Miss,
    };
    Some(credit)
}

/// All-or-nothing strict equality.
pub fn exact_match(predicted: &AnswerValue, actual: &AnswerValue) -> Option<Credit> {
    if matches!(predicted, AnswerValue::Multi(_)) || matches!(actual, AnswerValue::Multi(_)) {
        return None;
    }
    Some(if predicted == actual {
        Credit::Exact
    } else {
        Credit::Miss
    })
}

/// One compared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FieldScore {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub predicted: AnswerValue,
    pub actual: AnswerValue,
    pub credit: Credit,
    pub points: u32,
}

/// Result of scoring one participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ScoreCard {
    /// Sum of every breakdown entry
    pub total: u32,
    /// Compared fields in field order
    pub breakdown: Vec<FieldScore>,
}

impl ScoreCard {
    /// Number of fields that were compared.
    pub fn fields_scored(&self) -> usize {
        self.breakdown.len()
    }

    /// Breakdown entry for a field, if it was compared.
    pub fn get(&self, key: &str) -> Option<&FieldScore> {
        self.breakdown.iter().find(|entry| entry.key == key)
    }

    /// Human-readable summary stored with banked scores.
    pub fn describe(&self) -> String {
        if self.breakdown.is_empty() {
            return "no scored predictions".to_string();
        }
        self.breakdown
            .iter()
            .map(|entry| format!("{}: {}", entry.label, entry.points))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Score `predicted` against `actual` over `fields`.
///
/// Values are coerced per field type first; a value that does not fit its
/// field counts as absent. Retired and unscored fields are skipped.
pub fn score(
    fields: &[ScoringField],
    predicted: &BTreeMap<String, AnswerValue>,
    actual: &BTreeMap<String, AnswerValue>,
) -> ScoreCard {
    let mut card = ScoreCard::default();

    for field in fields {
        if !field.is_active || !field.field_type.is_scoreable() {
            continue;
        }
        let Some(p) = predicted.get(&field.key).and_then(|v| v.coerce(field.field_type)) else {
            continue;
        };
        let Some(a) = actual.get(&field.key).and_then(|v| v.coerce(field.field_type)) else {
            continue;
        };
        let Some(credit) = field.field_type.compare(&p, &a) else {
            continue;
        };

        let points = credit.points();
        card.total += points;
        card.breakdown.push(FieldScore {
            key: field.key.clone(),
            label: field.label.clone(),
            field_type: field.field_type,
            predicted: p,
            actual: a,
            credit,
            points,
        });
    }

    card
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, AnswerValue)]) -> BTreeMap<String, AnswerValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn numeric(p: f64, a: f64) -> u32 {
        numeric_proximity(&AnswerValue::Number(p), &AnswerValue::Number(a))
            .map(Credit::points)
            .unwrap()
    }

    fn time(p: i64, a: i64) -> u32 {
        time_proximity(&AnswerValue::Units(p), &AnswerValue::Units(a))
            .map(Credit::points)
            .unwrap()
    }

    #[test]
    fn test_identity_scores_full_credit() {
        for a in [0.0, 1.0, 20.0, -7.5, 1234.5] {
            assert_eq!(numeric(a, a), 50);
        }
        for a in [0, 1, 16, 47] {
            assert_eq!(time(a, a), 50);
        }
    }

    #[test]
    fn test_numeric_boundaries_inclusive() {
        // wineBottles = 20
        assert_eq!(numeric(20.0, 20.0), 50);
        assert_eq!(numeric(22.0, 20.0), 25);
        assert_eq!(numeric(18.0, 20.0), 25);
        assert_eq!(numeric(22.01, 20.0), 10);
        assert_eq!(numeric(25.0, 20.0), 10);
        assert_eq!(numeric(25.01, 20.0), 0);
        assert_eq!(numeric(30.0, 20.0), 0);
    }

    #[test]
    fn test_numeric_zero_actual() {
        assert_eq!(numeric(0.0, 0.0), 50);
        assert_eq!(numeric(0.5, 0.0), 0);
        assert_eq!(numeric(-1.0, 0.0), 0);
    }

    #[test]
    fn test_numeric_negative_actual_uses_magnitude() {
        assert_eq!(numeric(-11.0, -10.0), 25);
        assert_eq!(numeric(-12.5, -10.0), 10);
    }

    #[test]
    fn test_numeric_near_f64_max_does_not_overflow() {
        assert_eq!(numeric(0.0, 1.7e308), 0);
        assert_eq!(numeric(-1.7e308, 1.7e308), 0);
        assert_eq!(numeric(1.6e308, 1.7e308), 25);
        assert_eq!(numeric(1.7e308, 1.7e308), 50);
        assert_eq!(numeric(f64::MAX, f64::MAX * 0.9), 10);
    }

    #[test]
    fn test_time_steps() {
        assert_eq!(time(5, 4), 25);
        assert_eq!(time(2, 4), 10);
        assert_eq!(time(7, 4), 0);
        assert_eq!(time(i64::MIN, i64::MAX), 0);
    }

    #[test]
    fn test_exact_is_strict() {
        let t = AnswerValue::Boolean(true);
        assert_eq!(exact_match(&t, &t), Some(Credit::Exact));
        assert_eq!(
            exact_match(&AnswerValue::Text("true".into()), &t),
            Some(Credit::Miss)
        );
        assert_eq!(
            exact_match(
                &AnswerValue::Choice("Jan".into()),
                &AnswerValue::Choice("Piet".into())
            ),
            Some(Credit::Miss)
        );
    }

    #[test]
    fn test_missing_side_is_absent_not_zero() {
        let fields = vec![
            ScoringField::new("firstSleeper", "First asleep", FieldType::Exact),
            ScoringField::new("wineBottles", "Wine bottles", FieldType::Numeric),
        ];
        let actual = values(&[
            ("firstSleeper", AnswerValue::Choice("Jan".into())),
            ("wineBottles", AnswerValue::Number(20.0)),
        ]);
        let predicted = values(&[("wineBottles", AnswerValue::Number(30.0))]);

        let card = score(&fields, &predicted, &actual);
        assert_eq!(card.total, 0);
        assert_eq!(card.fields_scored(), 1);
        assert!(card.get("firstSleeper").is_none());
        assert_eq!(card.get("wineBottles").map(|f| f.credit), Some(Credit::Miss));
    }

    #[test]
    fn test_unscored_and_retired_never_appear() {
        let fields = vec![
            ScoringField::new("motto", "Motto", FieldType::Unscored),
            ScoringField::new("eggs", "Eggs", FieldType::Numeric).retired(),
        ];
        let both = values(&[
            ("motto", AnswerValue::Text("cheers".into())),
            ("eggs", AnswerValue::Number(3.0)),
        ]);
        let card = score(&fields, &both, &both);
        assert_eq!(card, ScoreCard::default());
        assert_eq!(card.describe(), "no scored predictions");
    }

    #[test]
    fn test_type_mismatch_is_absent() {
        let fields = vec![ScoringField::new("bedtime", "Bedtime", FieldType::Time)];
        let predicted = values(&[("bedtime", AnswerValue::Text("late".into()))]);
        let actual = values(&[("bedtime", AnswerValue::Units(4))]);
        assert_eq!(score(&fields, &predicted, &actual).fields_scored(), 0);
    }

    #[test]
    fn test_total_and_description_follow_field_order() {
        let fields = vec![
            ScoringField::new("wineBottles", "Wine bottles", FieldType::Numeric),
            ScoringField::new("bedtime", "Bedtime", FieldType::Time),
            ScoringField::new("firstSleeper", "First asleep", FieldType::Exact),
        ];
        let actual = values(&[
            ("wineBottles", AnswerValue::Number(20.0)),
            ("bedtime", AnswerValue::Units(6)),
            ("firstSleeper", AnswerValue::Choice("Jan".into())),
        ]);
        let predicted = values(&[
            ("wineBottles", AnswerValue::Number(22.0)),
            ("bedtime", AnswerValue::Number(8.0)),
            ("firstSleeper", AnswerValue::Choice("Jan".into())),
        ]);

        let card = score(&fields, &predicted, &actual);
        assert_eq!(card.total, 25 + 10 + 50);
        assert_eq!(
            card.describe(),
            "Wine bottles: 25, Bedtime: 10, First asleep: 50"
        );
        assert!(card
            .breakdown
            .iter()
            .all(|f| [0, 10, 25, 50].contains(&f.points)));
    }
}

//! The fixed predicate vocabulary.
//!
//! Each predicate is a pure comparison between a rule-supplied value
//! and an extracted field value. The date predicates take `now` as a
//! parameter so evaluation is deterministic under test.
//!
//! Case handling: `contains`/`not_contains` are case-insensitive,
//! `equals`/`not_equals` are case-sensitive exact matches.

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;
use crate::message::FieldValue;
use crate::rules::validate::ConditionValue;

/// The closed set of condition predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    Lte,
    Gte,
}

impl Predicate {
    /// Parse a rule-file predicate name. Returns `None` for anything
    /// outside the closed vocabulary.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(Self::Contains),
            "not_contains" => Some(Self::NotContains),
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "lte" => Some(Self::Lte),
            "gte" => Some(Self::Gte),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Lte => "lte",
            Self::Gte => "gte",
        }
    }

    /// Apply the predicate to a rule value and an extracted field value.
    ///
    /// Validation normally guarantees the operand types line up; a
    /// mismatch that slips through (e.g. a hand-built condition) is
    /// still rejected rather than coerced.
    pub fn test(
        &self,
        rule_value: &ConditionValue,
        extracted: FieldValue<'_>,
        now: DateTime<Utc>,
    ) -> Result<bool, ValidationError> {
        match (self, rule_value, extracted) {
            (Self::Contains, ConditionValue::Text(value), FieldValue::Text(text)) => {
                Ok(text.to_lowercase().contains(&value.to_lowercase()))
            }
            (Self::NotContains, ConditionValue::Text(value), FieldValue::Text(text)) => {
                Ok(!text.to_lowercase().contains(&value.to_lowercase()))
            }
            (Self::Equals, ConditionValue::Text(value), FieldValue::Text(text)) => {
                Ok(text == value)
            }
            (Self::NotEquals, ConditionValue::Text(value), FieldValue::Text(text)) => {
                Ok(text != value)
            }
            // Received within the last N days: the earliest acceptable
            // instant (now - N days) is at or before the message's.
            (Self::Lte, ConditionValue::Days(days), FieldValue::Date(date)) => {
                let offset = days_duration(*days).ok_or_else(|| day_offset_error())?;
                let earliest = now
                    .checked_sub_signed(offset)
                    .ok_or_else(|| day_offset_error())?;
                Ok(earliest <= date)
            }
            // Received at or before N days in the future. Vacuously true
            // for past mail; kept as the source behavior defines it.
            (Self::Gte, ConditionValue::Days(days), FieldValue::Date(date)) => {
                let offset = days_duration(*days).ok_or_else(|| day_offset_error())?;
                let latest = now
                    .checked_add_signed(offset)
                    .ok_or_else(|| day_offset_error())?;
                Ok(latest >= date)
            }
            _ => Err(ValidationError::TypeMismatch {
                predicate: self.as_str().to_string(),
                got: match extracted {
                    FieldValue::Text(_) => "text".to_string(),
                    FieldValue::Date(_) => "date".to_string(),
                },
            }),
        }
    }
}

/// A (possibly fractional) day offset as a duration.
///
/// Returns `None` for non-finite offsets and for offsets too large to
/// represent, so a wild rule value surfaces as an error instead of a
/// panic in the timestamp arithmetic.
fn days_duration(days: f64) -> Option<Duration> {
    if !days.is_finite() {
        return None;
    }
    let seconds = days * 86_400.0;
    if seconds <= i64::MIN as f64 || seconds >= i64::MAX as f64 {
        return None;
    }
    Duration::try_seconds(seconds as i64)
}

fn day_offset_error() -> ValidationError {
    ValidationError::InvalidValueType {
        field: "date_received".to_string(),
        expected: "day offset within representable range".to_string(),
    }
}

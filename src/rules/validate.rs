//! Closed-vocabulary validation of rule conditions and actions.
//!
//! Validation runs before any field extraction or gateway call and
//! turns the raw string-typed rule representation into checked enums,
//! so everything downstream can match exhaustively.

use crate::error::ValidationError;
use crate::message::Field;
use crate::rules::model::{Action, Condition};
use crate::rules::predicate::Predicate;

/// A rule-supplied comparison value after type checking.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Text(String),
    /// Day offset for the date predicates (integer or fractional).
    Days(f64),
}

/// A condition whose field, predicate and value passed validation.
#[derive(Debug, Clone)]
pub struct CheckedCondition {
    pub field: Field,
    pub predicate: Predicate,
    pub value: ConditionValue,
}

/// Labels the `mark_as` action may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkLabel {
    Read,
    Unread,
    Important,
}

impl MarkLabel {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "READ" => Some(Self::Read),
            "UNREAD" => Some(Self::Unread),
            "IMPORTANT" => Some(Self::Important),
            _ => None,
        }
    }
}

/// The closed set of folder destinations for `move_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Inbox,
    Spam,
    Trash,
}

impl Folder {
    /// All destinations, in the order the provider lists them.
    pub const ALL: [Folder; 3] = [Folder::Inbox, Folder::Spam, Folder::Trash];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "INBOX" => Some(Self::Inbox),
            "SPAM" => Some(Self::Spam),
            "TRASH" => Some(Self::Trash),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Inbox => "INBOX",
            Self::Spam => "SPAM",
            Self::Trash => "TRASH",
        }
    }
}

/// An action whose name and value passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckedAction {
    MarkAs(MarkLabel),
    MoveTo(Folder),
}

/// Validate one condition against the closed field/predicate/value
/// vocabularies.
///
/// `date_received` only pairs with `lte`/`gte` and a numeric day
/// offset; the header fields only pair with string values. Nothing is
/// coerced — a wrong type is rejected outright.
pub fn validate_condition(condition: &Condition) -> Result<CheckedCondition, ValidationError> {
    let field = Field::parse(&condition.field)
        .ok_or_else(|| ValidationError::UnknownField(condition.field.clone()))?;

    let predicate = Predicate::parse(&condition.predicate)
        .ok_or_else(|| ValidationError::UnknownPredicate(condition.predicate.clone()))?;

    let value = match field {
        Field::DateReceived => {
            if !matches!(predicate, Predicate::Lte | Predicate::Gte) {
                return Err(ValidationError::IncompatiblePredicate {
                    field: field.as_str().to_string(),
                    predicate: predicate.as_str().to_string(),
                });
            }
            let days = condition.value.as_f64().ok_or_else(|| {
                ValidationError::InvalidValueType {
                    field: field.as_str().to_string(),
                    expected: "number of days".to_string(),
                }
            })?;
            ConditionValue::Days(days)
        }
        Field::From | Field::To | Field::Subject => {
            let text = condition.value.as_str().ok_or_else(|| {
                ValidationError::InvalidValueType {
                    field: field.as_str().to_string(),
                    expected: "string".to_string(),
                }
            })?;
            ConditionValue::Text(text.to_string())
        }
    };

    Ok(CheckedCondition {
        field,
        predicate,
        value,
    })
}

/// Validate one action against the closed action/value vocabularies.
pub fn validate_action(action: &Action) -> Result<CheckedAction, ValidationError> {
    match action.action.as_str() {
        "mark_as" => MarkLabel::parse(&action.value)
            .map(CheckedAction::MarkAs)
            .ok_or_else(|| ValidationError::InvalidActionValue {
                action: action.action.clone(),
                value: action.value.clone(),
            }),
        "move_to" => Folder::parse(&action.value)
            .map(CheckedAction::MoveTo)
            .ok_or_else(|| ValidationError::InvalidActionValue {
                action: action.action.clone(),
                value: action.value.clone(),
            }),
        other => Err(ValidationError::UnknownAction(other.to_string())),
    }
}

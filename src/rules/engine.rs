//! Rule evaluation — single conditions and their ALL/ANY combination.
//!
//! Conditions run in rule order and short-circuit: under `ALL` the
//! first false result decides, under `ANY` the first true one. A
//! validation error in any condition that is actually reached aborts
//! evaluation for that message (no partial-credit matching); the
//! runner isolates the failure to that message.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::ValidationError;
use crate::message::Message;
use crate::rules::model::{Combinator, Condition, Rule};
use crate::rules::validate::validate_condition;

/// Outcome of evaluating one rule against one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub matched: bool,
    /// How many conditions were actually evaluated before the outcome
    /// was decided. Makes the short-circuit behavior observable.
    pub conditions_checked: usize,
}

/// Evaluates a loaded rule against messages.
pub struct RuleEngine {
    rule: Rule,
}

impl RuleEngine {
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Evaluate the rule's conditions against one message.
    ///
    /// With zero conditions, `ALL` matches vacuously and `ANY` does not.
    pub fn evaluate(
        &self,
        message: &Message,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, ValidationError> {
        let mut checked = 0;

        for condition in &self.rule.conditions {
            let hit = check_condition(message, condition, now)?;
            checked += 1;

            match self.rule.combinator {
                Combinator::All if !hit => {
                    debug!(
                        rule = %self.rule.name,
                        message_id = %message.id,
                        condition = checked,
                        "Condition failed, rule not matched"
                    );
                    return Ok(Evaluation {
                        matched: false,
                        conditions_checked: checked,
                    });
                }
                Combinator::Any if hit => {
                    debug!(
                        rule = %self.rule.name,
                        message_id = %message.id,
                        condition = checked,
                        "Condition hit, rule matched"
                    );
                    return Ok(Evaluation {
                        matched: true,
                        conditions_checked: checked,
                    });
                }
                Combinator::All | Combinator::Any => {}
            }
        }

        // Exhausted: ALL means every condition held, ANY means none did.
        Ok(Evaluation {
            matched: self.rule.combinator == Combinator::All,
            conditions_checked: checked,
        })
    }
}

/// Evaluate one condition: validate, extract the field, apply the
/// predicate. Errors propagate unchanged.
pub fn check_condition(
    message: &Message,
    condition: &Condition,
    now: DateTime<Utc>,
) -> Result<bool, ValidationError> {
    let checked = validate_condition(condition)?;
    let extracted = message.extract(checked.field);
    checked.predicate.test(&checked.value, extracted, now)
}

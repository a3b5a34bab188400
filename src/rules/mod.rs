//! Declarative rule engine: model, validation, predicates, evaluation.

pub mod engine;
pub mod model;
pub mod predicate;
pub mod validate;

pub use engine::{Evaluation, RuleEngine};
pub use model::{Action, Combinator, Condition, Rule};
pub use predicate::Predicate;
pub use validate::{CheckedAction, CheckedCondition, ConditionValue, Folder, MarkLabel};

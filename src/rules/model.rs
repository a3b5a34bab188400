//! Rule data model and JSON loading.
//!
//! A rule file looks like:
//!
//! ```json
//! {
//!   "name": "File invoices",
//!   "conditional_predicate": "ALL",
//!   "conditions": [
//!     { "field": "subject", "predicate": "contains", "value": "invoice" },
//!     { "field": "date_received", "predicate": "lte", "value": 2 }
//!   ],
//!   "actions": [
//!     { "action": "mark_as", "value": "IMPORTANT" }
//!   ]
//! }
//! ```
//!
//! Field, predicate and action names stay as raw strings here; the
//! validator checks them against the closed vocabularies and produces
//! the typed representation (`validate::CheckedCondition`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a rule's conditions combine.
///
/// With zero conditions, `All` matches vacuously and `Any` never
/// matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "ANY")]
    Any,
}

/// One field/predicate/value test, as written in the rule file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub predicate: String,
    /// String for header fields, number of days for `date_received`.
    pub value: serde_json::Value,
}

/// One mutating action to apply on match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub action: String,
    pub value: String,
}

/// A named condition/action bundle driving one automation pass.
///
/// Immutable once loaded; conditions and actions are evaluated in the
/// order given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(rename = "conditional_predicate")]
    pub combinator: Combinator,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl Rule {
    /// Load a rule from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::RuleFile {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::RuleParse {
            path: path.display().to_string(),
            source,
        })
    }
}

//! inbox-rules — declarative Gmail rule automation.
//!
//! Fetches messages from a mailbox (live API or a local mirror),
//! evaluates each against a JSON-defined rule, and applies label and
//! folder actions on match.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod message;
pub mod rules;
pub mod runner;
pub mod source;
pub mod store;

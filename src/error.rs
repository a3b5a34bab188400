//! Error types for inbox-rules.

/// Top-level error type for an automation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read rule file {path}: {source}")]
    RuleFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse rule file {path}: {source}")]
    RuleParse {
        path: String,
        source: serde_json::Error,
    },
}

/// Rejection of a malformed rule condition or action.
///
/// Raised once per condition/action before any field extraction or
/// gateway call, so a bad rule fails without partial side effects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("Predicate {predicate} is not valid for field {field}")]
    IncompatiblePredicate { field: String, predicate: String },

    #[error("Invalid value type for field {field}: expected {expected}")]
    InvalidValueType { field: String, expected: String },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid value {value} for action {action}")]
    InvalidActionValue { action: String, value: String },

    #[error("Type mismatch: predicate {predicate} cannot compare {got}")]
    TypeMismatch { predicate: String, got: String },
}

/// A provider record or store row that cannot be normalized.
///
/// Fatal for the single message's evaluation; the runner records it
/// and moves on to the next message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("Message {id} is missing header {header}")]
    MissingHeader { id: String, header: String },

    #[error("Message {id} has unparsable date: {raw}")]
    UnparsableDate { id: String, raw: String },
}

/// Errors surfaced by the mailbox provider's REST API.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gmail API returned {status} for {operation}: {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response shape from {operation}: {reason}")]
    BadResponse { operation: String, reason: String },
}

/// Persistence mirror errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

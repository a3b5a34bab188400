//! Environment-driven configuration.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::gateway::DEFAULT_API_BASE;

/// Where the automation run pulls its messages from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Live Gmail API.
    Live,
    /// Rows previously mirrored into the local store.
    Store,
}

impl SourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "live" => Some(Self::Live),
            "store" => Some(Self::Store),
            _ => None,
        }
    }
}

/// Run configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth access token, acquired by an external flow.
    pub access_token: SecretString,
    /// Gmail API base URL (overridable for testing against a stub).
    pub api_base: String,
    /// Labels to filter the listing by (empty = whole mailbox).
    pub label_filter: Vec<String>,
    /// SQLite path for the message mirror. `None` disables mirroring.
    pub db_path: Option<PathBuf>,
    pub source: SourceKind,
}

impl Config {
    /// Build config from environment variables.
    ///
    /// `GMAIL_ACCESS_TOKEN` is required. `INBOX_RULES_SOURCE=store`
    /// additionally requires `INBOX_RULES_DB_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = std::env::var("GMAIL_ACCESS_TOKEN")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".into()))?;

        let api_base =
            std::env::var("GMAIL_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let label_filter = parse_label_filter(
            &std::env::var("GMAIL_LABEL_FILTER").unwrap_or_else(|_| "INBOX".to_string()),
        );

        let db_path = std::env::var("INBOX_RULES_DB_PATH").ok().map(PathBuf::from);

        let source_raw =
            std::env::var("INBOX_RULES_SOURCE").unwrap_or_else(|_| "live".to_string());
        let source = SourceKind::parse(&source_raw).ok_or_else(|| ConfigError::InvalidValue {
            key: "INBOX_RULES_SOURCE".into(),
            message: format!("expected \"live\" or \"store\", got \"{source_raw}\""),
        })?;

        if source == SourceKind::Store && db_path.is_none() {
            return Err(ConfigError::InvalidValue {
                key: "INBOX_RULES_SOURCE".into(),
                message: "source \"store\" requires INBOX_RULES_DB_PATH".into(),
            });
        }

        Ok(Self {
            access_token,
            api_base,
            label_filter,
            db_path,
            source,
        })
    }
}

/// Split a comma-separated label list, dropping empties.
pub fn parse_label_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_filter_single() {
        assert_eq!(parse_label_filter("INBOX"), vec!["INBOX"]);
    }

    #[test]
    fn label_filter_multiple_with_whitespace() {
        assert_eq!(
            parse_label_filter("INBOX, IMPORTANT , UNREAD"),
            vec!["INBOX", "IMPORTANT", "UNREAD"]
        );
    }

    #[test]
    fn label_filter_empty_yields_no_labels() {
        assert!(parse_label_filter("").is_empty());
        assert!(parse_label_filter(" , ,").is_empty());
    }

    #[test]
    fn source_kind_parses() {
        assert_eq!(SourceKind::parse("live"), Some(SourceKind::Live));
        assert_eq!(SourceKind::parse("store"), Some(SourceKind::Store));
        assert_eq!(SourceKind::parse("database"), None);
        assert_eq!(SourceKind::parse("LIVE"), None);
    }
}

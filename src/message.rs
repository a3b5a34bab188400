//! Normalized message model and field extraction.
//!
//! The Gmail API returns messages as a payload with a flat header list;
//! `Message::from_raw` projects the headers we evaluate rules against
//! into a normalized record. The persisted store yields the same record
//! via `Message::from_row`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::MessageError;

// ── Wire types ──────────────────────────────────────────────────────

/// A single RFC 822 header as the Gmail API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

/// Payload of a raw Gmail message (headers only — bodies are out of scope).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub headers: Vec<RawHeader>,
}

/// Raw message record from `users/me/messages/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: String,
    #[serde(rename = "labelIds", default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub payload: RawPayload,
}

// ── Normalized message ──────────────────────────────────────────────

/// Normalized projection of a provider message.
///
/// Owned by the runner for one evaluation pass; the rule engine never
/// mutates it. Label changes happen remotely via the gateway.
#[derive(Debug, Clone)]
pub struct Message {
    /// Provider-native message id.
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date_received: DateTime<Utc>,
    /// Labels attached at fetch time (INBOX, UNREAD, ...).
    pub raw_labels: HashSet<String>,
}

impl Message {
    /// Normalize a raw Gmail record.
    ///
    /// Fails if any of the From/To/Subject/Date headers is absent or the
    /// date does not parse. An empty header value is valid.
    pub fn from_raw(raw: &RawMessage) -> Result<Self, MessageError> {
        let header = |name: &str| -> Result<String, MessageError> {
            raw.payload
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.clone())
                .ok_or_else(|| MessageError::MissingHeader {
                    id: raw.id.clone(),
                    header: name.to_string(),
                })
        };

        let date_raw = header("Date")?;
        let date_received = parse_mail_date(&date_raw).ok_or_else(|| {
            MessageError::UnparsableDate {
                id: raw.id.clone(),
                raw: date_raw.clone(),
            }
        })?;

        Ok(Self {
            id: raw.id.clone(),
            from: header("From")?,
            to: header("To")?,
            subject: header("Subject")?,
            date_received,
            raw_labels: raw.label_ids.iter().cloned().collect(),
        })
    }

    /// Rebuild a message from a mirrored store row.
    ///
    /// Row shape is positional: `(local_id, gmail_id, subject, from,
    /// to, received_at)` with the timestamp stored as RFC 3339. Labels
    /// are not mirrored, so `raw_labels` comes back empty.
    pub fn from_row(
        gmail_id: &str,
        subject: &str,
        from: &str,
        to: &str,
        received_at: &str,
    ) -> Result<Self, MessageError> {
        let date_received = DateTime::parse_from_rfc3339(received_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| MessageError::UnparsableDate {
                id: gmail_id.to_string(),
                raw: received_at.to_string(),
            })?;

        Ok(Self {
            id: gmail_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            date_received,
            raw_labels: HashSet::new(),
        })
    }

    /// Extract the value of a named field.
    pub fn extract(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::From => FieldValue::Text(&self.from),
            Field::To => FieldValue::Text(&self.to),
            Field::Subject => FieldValue::Text(&self.subject),
            Field::DateReceived => FieldValue::Date(self.date_received),
        }
    }
}

/// Parse an email Date header — RFC 2822 as sent by real mail servers,
/// with an RFC 3339 fallback for providers that normalize it.
fn parse_mail_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

// ── Fields ──────────────────────────────────────────────────────────

/// The closed set of message fields a condition may test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    From,
    To,
    Subject,
    DateReceived,
}

impl Field {
    /// Parse a rule-file field name. Returns `None` for anything outside
    /// the closed vocabulary.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "from" => Some(Self::From),
            "to" => Some(Self::To),
            "subject" => Some(Self::Subject),
            "date_received" => Some(Self::DateReceived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
            Self::Subject => "subject",
            Self::DateReceived => "date_received",
        }
    }
}

/// An extracted field value — text for the header fields, an instant
/// for `date_received`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Date(DateTime<Utc>),
}

// ── Tests ───────────────────────────────────────────────────────────

//! Gmail REST gateway — list/get/modify over `users/me/messages`.
//!
//! The client owns the injected access token for its whole lifetime;
//! token acquisition and refresh happen outside this crate. Label adds
//! and removes are idempotent on the provider side, so re-applying an
//! action is a no-op success.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::error::GatewayError;
use crate::message::RawMessage;

/// Default Gmail API base URL.
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Mutating label operations against the mail provider.
#[async_trait]
pub trait MailboxGateway: Send + Sync {
    async fn add_label(&self, message_id: &str, label: &str) -> Result<(), GatewayError>;
    async fn remove_label(&self, message_id: &str, label: &str) -> Result<(), GatewayError>;
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListEntry {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<ListEntry>,
}

// ── Client ──────────────────────────────────────────────────────────

/// Authenticated Gmail REST client.
pub struct GmailClient {
    http: reqwest::Client,
    api_base: String,
    access_token: SecretString,
    label_filter: Vec<String>,
}

impl GmailClient {
    pub fn new(access_token: SecretString, api_base: String, label_filter: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            access_token,
            label_filter,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.access_token.clone(),
            config.api_base.clone(),
            config.label_filter.clone(),
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/users/me/messages{path}", self.api_base)
    }

    /// List message ids matching the configured label filter.
    pub async fn list_message_ids(&self) -> Result<Vec<String>, GatewayError> {
        let mut request = self.http.get(self.api_url("")).bearer_auth(self.access_token.expose_secret());
        for label in &self.label_filter {
            request = request.query(&[("labelIds", label)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Api {
                operation: "list".into(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let list: ListResponse = response.json().await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    /// Fetch one raw message record (headers and labels).
    pub async fn get_raw_message(&self, message_id: &str) -> Result<RawMessage, GatewayError> {
        let response = self
            .http
            .get(self.api_url(&format!("/{message_id}")))
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Api {
                operation: "get".into(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response.json().await.map_err(|e| GatewayError::BadResponse {
            operation: "get".into(),
            reason: e.to_string(),
        })
    }

    /// POST a label modification for one message.
    async fn modify(
        &self,
        message_id: &str,
        add: &[&str],
        remove: &[&str],
    ) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "addLabelIds": add,
            "removeLabelIds": remove,
        });

        let response = self
            .http
            .post(self.api_url(&format!("/{message_id}/modify")))
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Api {
                operation: "modify".into(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        tracing::debug!(message_id, ?add, ?remove, "Labels modified");
        Ok(())
    }
}

#[async_trait]
impl MailboxGateway for GmailClient {
    async fn add_label(&self, message_id: &str, label: &str) -> Result<(), GatewayError> {
        self.modify(message_id, &[label], &[]).await
    }

    async fn remove_label(&self, message_id: &str, label: &str) -> Result<(), GatewayError> {
        self.modify(message_id, &[], &[label]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GmailClient {
        GmailClient::new(
            SecretString::from("test-token"),
            DEFAULT_API_BASE.to_string(),
            vec!["INBOX".into()],
        )
    }

    #[test]
    fn builds_list_url() {
        assert_eq!(
            client().api_url(""),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages"
        );
    }

    #[test]
    fn builds_modify_url() {
        assert_eq!(
            client().api_url("/abc123/modify"),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/abc123/modify"
        );
    }

    #[test]
    fn list_response_parses() {
        let json = r#"{"messages":[{"id":"m1","threadId":"t1"},{"id":"m2","threadId":"t2"}],"resultSizeEstimate":2}"#;
        let list: ListResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = list.messages.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn empty_list_response_parses() {
        // Gmail omits "messages" entirely when the mailbox query is empty
        let list: ListResponse = serde_json::from_str(r#"{"resultSizeEstimate":0}"#).unwrap();
        assert!(list.messages.is_empty());
    }

    #[test]
    fn raw_message_parses() {
        let json = r#"{
            "id": "m1",
            "threadId": "t1",
            "labelIds": ["INBOX", "UNREAD"],
            "payload": { "headers": [
                {"name": "From", "value": "a@x.com"},
                {"name": "Subject", "value": "hi"}
            ]}
        }"#;
        let raw: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, "m1");
        assert_eq!(raw.label_ids, vec!["INBOX", "UNREAD"]);
        assert_eq!(raw.payload.headers.len(), 2);
    }
}

//! Message sources — where a run pulls its messages from.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, StoreError};
use crate::gateway::GmailClient;
use crate::message::Message;
use crate::store::MessageStore;

/// A sequence of normalized messages, live or persisted.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn list_message_ids(&self) -> Result<Vec<String>, Error>;
    async fn get_message(&self, id: &str) -> Result<Message, Error>;
}

#[async_trait]
impl MessageSource for GmailClient {
    async fn list_message_ids(&self) -> Result<Vec<String>, Error> {
        Ok(GmailClient::list_message_ids(self).await?)
    }

    async fn get_message(&self, id: &str) -> Result<Message, Error> {
        let raw = self.get_raw_message(id).await?;
        Ok(Message::from_raw(&raw)?)
    }
}

/// Source backed by previously mirrored rows.
pub struct StoreSource {
    store: Arc<MessageStore>,
}

impl StoreSource {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageSource for StoreSource {
    async fn list_message_ids(&self) -> Result<Vec<String>, Error> {
        let rows = self.store.fetch_all()?;
        Ok(rows.into_iter().map(|r| r.gmail_id).collect())
    }

    async fn get_message(&self, id: &str) -> Result<Message, Error> {
        let row = self
            .store
            .get(id)?
            .ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        Ok(Message::from_row(
            &row.gmail_id,
            &row.subject,
            &row.from_email,
            &row.to_email,
            &row.received_at,
        )?)
    }
}

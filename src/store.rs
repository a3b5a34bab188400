//! SQLite mirror of fetched messages.
//!
//! Rows are keyed by the provider id so repeated runs upsert instead
//! of duplicating. The upsert is a single atomic
//! `INSERT .. ON CONFLICT DO UPDATE` statement.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StoreError;

/// Shared handle to the mirror database.
///
/// A `Mutex<Connection>` serializes every statement; the mirror sees
/// one upsert per fetched message, so contention is a non-issue, and
/// rusqlite's `Connection` is `!Sync` anyway.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a lock on the underlying connection.
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Database mutex poisoned")
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS email_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                gmail_id TEXT NOT NULL UNIQUE,
                subject TEXT NOT NULL,
                from_email TEXT NOT NULL,
                to_email TEXT NOT NULL,
                received_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_email_messages_received
                ON email_messages(received_at);",
        )?;
        Ok(())
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// A mirrored message row, positional per the store schema:
/// `(local_id, gmail_id, subject, from, to, received_at)`.
#[derive(Debug, Clone)]
pub struct StoredEmail {
    pub local_id: i64,
    pub gmail_id: String,
    pub subject: String,
    pub from_email: String,
    pub to_email: String,
    /// RFC 3339 timestamp as stored.
    pub received_at: String,
}

/// CRUD over the mirrored messages table.
pub struct MessageStore {
    db: Arc<Database>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or update a row keyed by the provider id.
    pub fn upsert(
        &self,
        gmail_id: &str,
        subject: &str,
        from_email: &str,
        to_email: &str,
        received_at: DateTime<Utc>,
    ) -> Result<Upsert, StoreError> {
        let conn = self.db.conn();
        let existed: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM email_messages WHERE gmail_id = ?1)",
            rusqlite::params![gmail_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO email_messages (gmail_id, subject, from_email, to_email, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(gmail_id) DO UPDATE SET
                subject = excluded.subject,
                from_email = excluded.from_email,
                to_email = excluded.to_email,
                received_at = excluded.received_at",
            rusqlite::params![
                gmail_id,
                subject,
                from_email,
                to_email,
                received_at.to_rfc3339(),
            ],
        )?;

        let outcome = if existed {
            Upsert::Updated
        } else {
            Upsert::Inserted
        };
        debug!(gmail_id, ?outcome, "Message mirrored");
        Ok(outcome)
    }

    /// Look up one row by provider id.
    pub fn get(&self, gmail_id: &str) -> Result<Option<StoredEmail>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, gmail_id, subject, from_email, to_email, received_at
             FROM email_messages WHERE gmail_id = ?1",
        )?;
        let mut rows = stmt.query_map(rusqlite::params![gmail_id], row_to_email)?;
        match rows.next() {
            Some(Ok(email)) => Ok(Some(email)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// All mirrored rows, oldest insert first.
    pub fn fetch_all(&self) -> Result<Vec<StoredEmail>, StoreError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, gmail_id, subject, from_email, to_email, received_at
             FROM email_messages ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], row_to_email)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn row_to_email(row: &rusqlite::Row<'_>) -> Result<StoredEmail, rusqlite::Error> {
    Ok(StoredEmail {
        local_id: row.get(0)?,
        gmail_id: row.get(1)?,
        subject: row.get(2)?,
        from_email: row.get(3)?,
        to_email: row.get(4)?,
        received_at: row.get(5)?,
    })
}

// ── Tests ───────────────────────────────────────────────────────────

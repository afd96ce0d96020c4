//! Ledger Store
//!
//! Durable per-account document persistence. One row per account holding the
//! serialized [`Account`] document plus a version counter; `save` is a
//! compare-and-swap on that version so concurrent writers on the same account
//! cannot silently overwrite each other's committed state.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::ledger::account::Account;

/// Monotonic per-document version, bumped on every committed save.
pub type Version = i64;

/// Result of a compare-and-swap save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Someone else committed since this document was loaded.
    Conflict,
}

/// Storage contract the engine depends on. The whole document is written
/// atomically; there is no partial update path.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load an account document with its current version.
    async fn load(&self, account_id: &str) -> Result<Option<(Account, Version)>>;

    /// Replace the document if its stored version still equals `expected`.
    async fn save(&self, account: &Account, expected: Version) -> Result<SaveOutcome>;

    /// Insert a new document at version 1. Returns false when the id already
    /// exists (the existing document is left untouched).
    async fn create(&self, account: &Account) -> Result<bool>;
}

/// SQLite-backed store.
pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// Open (or create) the database and initialize the schema.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open ledger database at {}", db_path))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                account_id TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                version INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn load(&self, account_id: &str) -> Result<Option<(Account, Version)>> {
        let conn = self.conn.lock().await;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT doc, version FROM accounts WHERE account_id = ?1",
                params![account_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to load account document")?;

        match row {
            Some((doc, version)) => {
                let account: Account = serde_json::from_str(&doc)
                    .context("Corrupt account document in store")?;
                Ok(Some((account, version)))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, account: &Account, expected: Version) -> Result<SaveOutcome> {
        let doc = serde_json::to_string(account).context("Failed to serialize account")?;
        let conn = self.conn.lock().await;

        let rows = conn
            .execute(
                "UPDATE accounts SET doc = ?1, version = version + 1
                 WHERE account_id = ?2 AND version = ?3",
                params![doc, account.account_id, expected],
            )
            .context("Failed to save account document")?;

        if rows == 0 {
            debug!(
                account_id = %account.account_id,
                expected, "Version conflict on save"
            );
            return Ok(SaveOutcome::Conflict);
        }
        Ok(SaveOutcome::Saved)
    }

    async fn create(&self, account: &Account) -> Result<bool> {
        let doc = serde_json::to_string(account).context("Failed to serialize account")?;
        let conn = self.conn.lock().await;

        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO accounts (account_id, doc, version)
                 VALUES (?1, ?2, 1)",
                params![account.account_id, doc],
            )
            .context("Failed to create account document")?;

        Ok(rows == 1)
    }
}

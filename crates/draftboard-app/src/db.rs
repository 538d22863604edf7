// SQLite persistence for the draft board snapshot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use draftboard_core::draft::state::DraftState;
use draftboard_core::snapshot::{self, STORAGE_KEY};

/// Key-value blob store holding the latest board snapshot.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the table
    /// exists. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection. A poisoned lock still guards a usable
    /// connection since every write is a single statement.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store raw text under `key`, replacing any previous value.
    pub fn save_value(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO draft_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, now],
            )
            .context("failed to save state")?;
        Ok(())
    }

    /// Raw text stored under `key`, if any.
    pub fn load_value(&self, key: &str) -> Result<Option<String>> {
        self.conn()
            .query_row(
                "SELECT value FROM draft_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load state")
    }

    /// When `key` was last written, as an RFC 3339 timestamp.
    pub fn updated_at(&self, key: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT updated_at FROM draft_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load state timestamp")?;

        raw.map(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&chrono::Utc))
                .with_context(|| format!("bad timestamp {s:?} for key {key}"))
        })
        .transpose()
    }

    pub fn remove_value(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM draft_state WHERE key = ?1", params![key])
            .context("failed to remove state")?;
        Ok(())
    }

    /// Persist `state` as the board snapshot.
    pub fn save_snapshot(&self, state: &DraftState) -> Result<()> {
        let text = snapshot::encode(state).context("failed to encode snapshot")?;
        self.save_value(STORAGE_KEY, &text)
    }

    /// The stored snapshot text, unparsed.
    pub fn load_snapshot(&self) -> Result<Option<String>> {
        self.load_value(STORAGE_KEY)
    }

    /// When the snapshot was last saved, if one is stored.
    pub fn snapshot_updated_at(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        self.updated_at(STORAGE_KEY)
    }

    pub fn remove_snapshot(&self) -> Result<()> {
        self.remove_value(STORAGE_KEY)
    }
}

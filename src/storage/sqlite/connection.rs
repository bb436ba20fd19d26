use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::errors::{AlertError, AlertResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS subscribers (
    user_id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS subscriber_preferences (
    user_id TEXT NOT NULL,
    category TEXT NOT NULL,
    enabled INTEGER NOT NULL,
    PRIMARY KEY (user_id, category),
    FOREIGN KEY (user_id) REFERENCES subscribers(user_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_preferences_category ON subscriber_preferences(category, enabled);

CREATE TABLE IF NOT EXISTS channel_bindings (
    category TEXT PRIMARY KEY,
    channel_id TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Shared handle to the bot's database. Every repository goes through the
/// same mutex, so writes from the poll loop and from interactive actions are
/// serialised.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> AlertResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> AlertResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AlertResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AlertError> {
        self.conn
            .lock()
            .map_err(|_| AlertError::Database(rusqlite::Error::InvalidQuery))
    }
}

/// Discord snowflakes are stored as TEXT; SQLite integers are signed.
pub(crate) fn snowflake_from_row(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub mod migrations;
pub mod models;
pub mod queries;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::{Connection, ErrorCode, ffi};
use tracing::info;

pub use queries::notifications::NotificationKind;

/// Hard caps on list views. Older rows are unreachable past these.
pub const FEED_LIMIT: u32 = 100;
pub const LIST_LIMIT: u32 = 200;
pub const SEARCH_USERS_LIMIT: u32 = 50;
pub const SEARCH_POSTS_LIMIT: u32 = 100;
pub const MUTUAL_FOLLOWERS_LIMIT: u32 = 3;

/// Returned (inside `anyhow::Error`) when a username is already registered.
#[derive(Debug, thiserror::Error)]
#[error("username already taken: {0}")]
pub struct DuplicateUsername(pub String);

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn, &path.display().to_string())
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, ":memory:")
    }

    fn init(conn: Connection, label: &str) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run(&conn)?;

        info!("Database opened at {}", label);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Borrow the connection for the duration of one request. All queries
    /// and commands hang off the returned handle.
    pub fn session(&self) -> Result<Session<'_>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        Ok(Session { conn })
    }
}

pub struct Session<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl Session<'_> {
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Seconds since the epoch with microsecond precision, the unit every
/// `created_at` column is stored in.
pub fn now_ts() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// True for UNIQUE / PRIMARY KEY violations. Foreign key and NOT NULL
/// violations are real errors and stay errors.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

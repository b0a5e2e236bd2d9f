use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use thiserror::Error;
use tokio::sync::watch;

/// Storage key the identifier is kept under.
pub const ID_STORAGE_KEY: &str = "id";

/// Sentinel stored before any identifier has been assigned.
pub const UNDEFINED_ID: &str = "undefined";

/// Observable identifier value mirrored to a local SQLite file.
///
/// The store is an explicit object: it is created by [`SessionStore::open`],
/// which reads the persisted value (or falls back to [`UNDEFINED_ID`]), and
/// mutated only through [`SessionStore::set_id`], which writes through to
/// storage before observers see the new value. Clones share the same channel
/// and pool.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    value: watch::Sender<String>,
}

impl SessionStore {
    /// Opens the backing database, bootstrapping the schema when missing,
    /// and seeds the in-memory value from the stored one.
    pub async fn open(database_url: &str) -> Result<Self, SessionError> {
        // A single connection keeps updates ordered with reads across clones.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(SessionError::Connect)?;

        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .map_err(SessionError::Schema)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS local_state (\
                 key TEXT PRIMARY KEY,\
                 value TEXT NOT NULL,\
                 updated_at TEXT NOT NULL\
             )",
        )
        .execute(&pool)
        .await
        .map_err(SessionError::Schema)?;

        let stored = fetch_value(&pool, ID_STORAGE_KEY).await?;
        let initial = stored.unwrap_or_else(|| UNDEFINED_ID.to_string());
        let (value, _) = watch::channel(initial);

        Ok(Self { pool, value })
    }

    /// Returns the current identifier.
    pub fn current_id(&self) -> String {
        self.value.borrow().clone()
    }

    /// Returns `true` once an identifier other than the sentinel is held.
    pub fn signed_in(&self) -> bool {
        self.value.borrow().as_str() != UNDEFINED_ID
    }

    /// Registers an observer notified after every accepted update.
    ///
    /// The receiver always holds the latest value; a fresh subscription can
    /// read it immediately without waiting for a change.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.value.subscribe()
    }

    /// Replaces the identifier, persisting it before observers are notified.
    ///
    /// When the write fails the error is returned and the in-memory value is
    /// left untouched, so memory and storage never disagree.
    pub async fn set_id(&self, id: impl Into<String>) -> Result<(), SessionError> {
        let id = id.into();
        persist_value(&self.pool, ID_STORAGE_KEY, &id, Utc::now()).await?;
        self.value.send_replace(id);
        Ok(())
    }

    /// Puts the store back into its pre-sign-in state.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.set_id(UNDEFINED_ID).await
    }
}

async fn fetch_value(pool: &SqlitePool, key: &str) -> Result<Option<String>, SessionError> {
    let row = sqlx::query("SELECT value FROM local_state WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.get("value")))
}

async fn persist_value(
    pool: &SqlitePool,
    key: &str,
    value: &str,
    updated_at: DateTime<Utc>,
) -> Result<(), SessionError> {
    sqlx::query(
        "INSERT INTO local_state (key, value, updated_at) \
         VALUES (?, ?, ?) \
         ON CONFLICT(key) DO UPDATE \
         SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true))
    .execute(pool)
    .await?;

    Ok(())
}

/// Errors produced while opening or updating the store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to bootstrap local state schema: {0}")]
    Schema(sqlx::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

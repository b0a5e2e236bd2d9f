use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, Row, SqlitePool};
use thiserror::Error;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to interact with user accounts.
    pub fn users(&self) -> UserRepository {
        UserRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository for rows in the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Inserts a new user and returns the assigned row id.
    ///
    /// A violation of the unique username constraint is reported as
    /// [`UserError::UsernameTaken`], covering registrations that race an
    /// earlier [`find_by_username`](Self::find_by_username) check.
    pub async fn insert(&self, user: NewUser<'_>) -> Result<i64, UserError> {
        let row = sqlx::query(
            "INSERT INTO users (username, password, created_at) \
             VALUES (?, ?, ?) \
             RETURNING id",
        )
        .bind(user.username)
        .bind(user.password)
        .bind(to_rfc3339(user.created_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some("2067") {
                    UserError::UsernameTaken
                } else {
                    UserError::Database(sqlx::Error::Database(db_err))
                }
            }
            other => UserError::Database(other),
        })?;

        let id: i64 = row.get("id");
        Ok(id)
    }

    /// Looks up a user row by username alone.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, UserError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Looks up the user matching both the username and the password.
    ///
    /// Returns `Ok(None)` when either field does not match an existing row.
    pub async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, UserError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password FROM users WHERE username = ? AND password = ?",
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

/// Data required to create a new row in `users`.
#[derive(Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub created_at: DateTime<Utc>,
}

/// User row as stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Errors that can occur while mutating or querying users.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user with username already exists")]
    UsernameTaken,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:?cache=shared")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    fn new_user<'a>(username: &'a str, password: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            password,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_row_ids() {
        let repo = setup_db().await.users();

        let first = repo.insert(new_user("bob", "pass123")).await.expect("insert");
        let second = repo.insert(new_user("alice", "hunter2")).await.expect("insert");

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_username() {
        let repo = setup_db().await.users();

        repo.insert(new_user("bob", "pass123")).await.expect("insert");
        let err = repo
            .insert(new_user("bob", "different"))
            .await
            .expect_err("duplicate should fail");

        assert!(matches!(err, UserError::UsernameTaken));
        assert_eq!(err.to_string(), "user with username already exists");
    }

    #[tokio::test]
    async fn find_by_username_matches_regardless_of_password() {
        let repo = setup_db().await.users();
        repo.insert(new_user("bob", "pass123")).await.expect("insert");

        let found = repo.find_by_username("bob").await.expect("lookup");
        assert_eq!(found.map(|user| user.id), Some(1));

        let missing = repo.find_by_username("alice").await.expect("lookup");
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn find_by_credentials_requires_both_fields_to_match() {
        let repo = setup_db().await.users();
        repo.insert(new_user("bob", "pass123")).await.expect("insert");

        let found = repo
            .find_by_credentials("bob", "pass123")
            .await
            .expect("lookup");
        assert_eq!(
            found,
            Some(UserRecord {
                id: 1,
                username: "bob".to_string(),
                password: "pass123".to_string(),
            })
        );

        let wrong_password = repo
            .find_by_credentials("bob", "nope")
            .await
            .expect("lookup");
        assert_eq!(wrong_password, None);

        let unknown_user = repo
            .find_by_credentials("carol", "pass123")
            .await
            .expect("lookup");
        assert_eq!(unknown_user, None);
    }

    #[tokio::test]
    async fn migrations_create_users_table() {
        let db = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1);
    }
}

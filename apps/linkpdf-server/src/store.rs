//! Allow-list of bot users backed by SQLite

use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Permitted user row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AllowedUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub added_by: Option<i64>,
    pub added_at: NaiveDateTime,
}

/// User to insert
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub added_by: Option<i64>,
}

#[derive(Clone)]
pub struct AllowList {
    pool: SqlitePool,
}

impl AllowList {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to allow-list database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database; one connection so every query sees it
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
        tracing::debug!("Running allow-list migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS allowed_users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                added_by INTEGER,
                added_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a user record
    pub async fn add_user(&self, user: &NewUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO allowed_users
                (user_id, username, first_name, last_name, added_by, added_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.added_by)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        tracing::info!("Allowed user {} (added by {:?})", user.user_id, user.added_by);
        Ok(())
    }

    /// Returns whether a record was actually removed
    pub async fn remove_user(&self, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM allowed_users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_allowed(&self, user_id: i64) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM allowed_users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// All permitted users, most recently added first
    pub async fn list_users(&self) -> Result<Vec<AllowedUser>, StoreError> {
        let users = sqlx::query_as::<_, AllowedUser>(
            r#"
            SELECT user_id, username, first_name, last_name, added_by, added_at
            FROM allowed_users
            ORDER BY added_at DESC, user_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM allowed_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

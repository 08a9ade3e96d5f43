//! SQLite record sink

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use orgbot_core::{OrgbotError, Record, Result};

use crate::sink::{RecordSink, StoredRecord};

pub struct SqliteSink {
    pool: sqlx::SqlitePool,
}

impl SqliteSink {
    /// Opens (creating if missing) the database at `url` and runs the
    /// idempotent migration. Errors here are fatal to process start.
    pub async fn new(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .connect_with(Self::options(url)?)
            .await
            .map_err(persistence)?;
        let sink = Self { pool };
        sink.run_migrations().await?;
        Ok(sink)
    }

    /// In-memory sink for tests. Pinned to a single connection so every
    /// query sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(Self::options(":memory:")?)
            .await
            .map_err(persistence)?;
        let sink = Self { pool };
        sink.run_migrations().await?;
        Ok(sink)
    }

    fn options(url: &str) -> Result<SqliteConnectOptions> {
        Ok(SqliteConnectOptions::from_str(url)
            .map_err(persistence)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal))
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                username TEXT,
                name TEXT NOT NULL,
                course TEXT NOT NULL,
                motivation TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_records_user_id ON records(user_id)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    async fn append(&self, record: &Record) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO records (user_id, username, name, course, motivation, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.username.as_deref())
        .bind(&record.name)
        .bind(&record.course)
        .bind(record.motivation.as_deref())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, username, name, course, motivation, created_at
            FROM records
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter()
            .map(|row| {
                let created_at: String = row.try_get("created_at").map_err(persistence)?;
                Ok(StoredRecord {
                    id: row.try_get("id").map_err(persistence)?,
                    user_id: row.try_get("user_id").map_err(persistence)?,
                    username: row.try_get("username").map_err(persistence)?,
                    name: row.try_get("name").map_err(persistence)?,
                    course: row.try_get("course").map_err(persistence)?,
                    motivation: row.try_get("motivation").map_err(persistence)?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}

fn persistence(err: impl std::fmt::Display) -> OrgbotError {
    OrgbotError::Persistence(err.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(persistence)
}

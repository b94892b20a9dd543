//! Diary repository
//!
//! Handles diary submission and the exchange:
//! - exchange: insert + count + random pick in one transaction
//! - get_with_comments: diary row plus its comments (two queries, no N+1)

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

use super::comments::{self, Comment};
use crate::models::{AuthorName, DiaryContent};

/// Diary record from database
#[derive(Debug, Clone, FromRow)]
pub struct Diary {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

/// Diary together with its comments, oldest comment first
#[derive(Debug, Clone)]
pub struct DiaryWithComments {
    pub diary: Diary,
    pub comments: Vec<Comment>,
}

/// Outcome of a successful exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Id of the diary that was just stored
    pub submitted_id: i64,
    /// Someone else's diary, picked at random
    pub received: DiaryWithComments,
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("no other diaries available for exchange yet")]
    ExchangePoolEmpty,
}

/// Diary repository
pub struct DiaryRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DiaryRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new diary.
    pub async fn create(
        &self,
        author: &AuthorName,
        content: &DiaryContent,
    ) -> Result<Diary, DbError> {
        Ok(insert(self.pool, author.as_str(), content.as_str()).await?)
    }

    /// Total number of stored diaries.
    pub async fn count(&self) -> Result<i64, DbError> {
        Ok(count(self.pool).await?)
    }

    /// Pick one diary uniformly at random, skipping `exclude_id`.
    ///
    /// Sampling is left to SQLite's `ORDER BY RANDOM()`.
    pub async fn random_excluding(&self, exclude_id: i64) -> Result<Option<Diary>, DbError> {
        Ok(random_excluding(self.pool, exclude_id).await?)
    }

    /// Get a single diary by id.
    pub async fn get(&self, id: i64) -> Result<Diary, DbError> {
        sqlx::query_as::<_, Diary>(
            "SELECT id, author, content, create_time FROM diary WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "diary",
            id: id.to_string(),
        })
    }

    /// Get a diary with all of its comments.
    pub async fn get_with_comments(&self, id: i64) -> Result<DiaryWithComments, DbError> {
        let diary = self.get(id).await?;
        let comments = comments::list_for_diary(self.pool, id).await?;
        Ok(DiaryWithComments { diary, comments })
    }

    /// Submit a diary and receive someone else's in return.
    ///
    /// The submitted diary is committed even when there is nothing to hand
    /// back, so it can be handed to the next submitter.
    ///
    /// # Errors
    ///
    /// `DbError::ExchangePoolEmpty` if fewer than two diaries exist after the
    /// insert.
    pub async fn exchange(
        &self,
        author: &AuthorName,
        content: &DiaryContent,
    ) -> Result<Exchange, DbError> {
        let mut tx = self.pool.begin().await?;

        let submitted = insert(&mut *tx, author.as_str(), content.as_str()).await?;
        let total = count(&mut *tx).await?;

        let picked = if total < 2 {
            None
        } else {
            random_excluding(&mut *tx, submitted.id).await?
        };

        let received = match picked {
            Some(diary) => {
                let comments = comments::list_for_diary(&mut *tx, diary.id).await?;
                Some(DiaryWithComments { diary, comments })
            }
            None => None,
        };

        tx.commit().await?;

        match received {
            Some(received) => Ok(Exchange {
                submitted_id: submitted.id,
                received,
            }),
            None => {
                tracing::info!(submitted_id = submitted.id, total, "exchange pool empty");
                Err(DbError::ExchangePoolEmpty)
            }
        }
    }
}

async fn insert<'e, E>(executor: E, author: &str, content: &str) -> Result<Diary, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Diary>(
        r#"
        INSERT INTO diary (author, content, create_time)
        VALUES (?, ?, ?)
        RETURNING id, author, content, create_time
        "#,
    )
    .bind(author)
    .bind(content)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

async fn count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM diary")
        .fetch_one(executor)
        .await
}

async fn random_excluding<'e, E>(executor: E, exclude_id: i64) -> Result<Option<Diary>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Diary>(
        r#"
        SELECT id, author, content, create_time
        FROM diary
        WHERE id != ?
        ORDER BY RANDOM()
        LIMIT 1
        "#,
    )
    .bind(exclude_id)
    .fetch_optional(executor)
    .await
}

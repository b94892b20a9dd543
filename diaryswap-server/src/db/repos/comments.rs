//! Comment repository
//!
//! Comments are only ever created for an existing diary: the diary is looked
//! up first and a missing one is reported as NotFound before any insert.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

use super::DbError;
use crate::models::{AuthorName, CommentContent};

/// Comment record from database
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub diary_id: i64,
    pub author: String,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

/// Comment repository
pub struct CommentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment to a diary.
    pub async fn create(
        &self,
        diary_id: i64,
        author: &AuthorName,
        content: &CommentContent,
    ) -> Result<Comment, DbError> {
        // Verify diary exists
        let diary_exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM diary WHERE id = ?)")
                .bind(diary_id)
                .fetch_one(self.pool)
                .await?;

        if !diary_exists.0 {
            return Err(DbError::NotFound {
                resource: "diary",
                id: diary_id.to_string(),
            });
        }

        let comment: Comment = sqlx::query_as(
            r#"
            INSERT INTO comment (author, content, create_time, diary_id)
            VALUES (?, ?, ?, ?)
            RETURNING id, diary_id, author, content, create_time
            "#,
        )
        .bind(author.as_str())
        .bind(content.as_str())
        .bind(Utc::now())
        .bind(diary_id)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(comment_id = comment.id, diary_id, "comment created");
        Ok(comment)
    }

    /// List all comments on a diary, oldest first.
    pub async fn list_for_diary(&self, diary_id: i64) -> Result<Vec<Comment>, DbError> {
        Ok(list_for_diary(self.pool, diary_id).await?)
    }
}

pub(super) async fn list_for_diary<'e, E>(
    executor: E,
    diary_id: i64,
) -> Result<Vec<Comment>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, diary_id, author, content, create_time
        FROM comment
        WHERE diary_id = ?
        ORDER BY create_time ASC, id ASC
        "#,
    )
    .bind(diary_id)
    .fetch_all(executor)
    .await
}

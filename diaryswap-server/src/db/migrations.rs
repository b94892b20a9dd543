//! Schema migrations for the diary tables
//!
//! Every statement is idempotent, so this runs on each startup.

use sqlx::SqlitePool;

/// Create the `diary` and `comment` tables if they don't exist yet
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running diary migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS diary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            create_time TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            create_time TEXT NOT NULL,
            diary_id INTEGER NOT NULL REFERENCES diary(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comment_diary_id ON comment(diary_id)")
        .execute(pool)
        .await?;

    tracing::info!("Diary migrations complete");
    Ok(())
}

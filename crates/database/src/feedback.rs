//! User feedback storage.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Feedback;

/// Store a feedback message.
pub async fn record(pool: &SqlitePool, user_id: i64, message: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO feedback (user_id, message)
        VALUES (?, ?)
        "#,
    )
    .bind(user_id)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List all feedback, newest first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Feedback>> {
    let rows = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, user_id, message, sent_at
        FROM feedback
        ORDER BY sent_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

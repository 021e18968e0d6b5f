//! Notification audit records.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Notification;

/// Record a notification attempt and return its ID.
///
/// Written before delivery, so a row exists even when the send later fails.
pub async fn record(
    pool: &SqlitePool,
    user_id: i64,
    route_id: Option<i64>,
    message: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, route_id, message)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(route_id)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List notifications sent to a user, newest first.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, route_id, message, sent_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY sent_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// List notifications recorded for a route, oldest first.
pub async fn list_for_route(pool: &SqlitePool, route_id: i64) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, route_id, message, sent_at
        FROM notifications
        WHERE route_id = ?
        ORDER BY id
        "#,
    )
    .bind(route_id)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database};

    #[tokio::test]
    async fn test_record_and_list() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let owner = user::upsert_language(db.pool(), 5, "en", "USD").await.unwrap();

        let first = record(db.pool(), owner.id, None, "hello").await.unwrap();
        let second = record(db.pool(), owner.id, None, "again").await.unwrap();
        assert!(second > first);

        let listed = list_for_user(db.pool(), owner.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].message, "again");
        assert_eq!(listed[1].message, "hello");
        assert!(listed.iter().all(|n| n.route_id.is_none()));
    }
}

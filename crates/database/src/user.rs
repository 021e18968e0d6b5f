//! User CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Get a user by chat ID.
pub async fn get_by_chat_id(pool: &SqlitePool, chat_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, chat_id, language, currency, created_at
        FROM users
        WHERE chat_id = ?
        "#,
    )
    .bind(chat_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: chat_id.to_string(),
    })
}

/// Get a user by internal ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, chat_id, language, currency, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Set the language for a chat, creating the user when missing.
///
/// `default_currency` only applies to a newly created user; an existing
/// user keeps the currency they already picked.
pub async fn upsert_language(
    pool: &SqlitePool,
    chat_id: i64,
    language: &str,
    default_currency: &str,
) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (chat_id, language, currency)
        VALUES (?, ?, ?)
        ON CONFLICT(chat_id) DO UPDATE SET
            language = excluded.language
        "#,
    )
    .bind(chat_id)
    .bind(language)
    .bind(default_currency)
    .execute(pool)
    .await?;

    get_by_chat_id(pool, chat_id).await
}

/// Set the currency for a chat, creating the user when missing.
pub async fn upsert_currency(
    pool: &SqlitePool,
    chat_id: i64,
    currency: &str,
    default_language: &str,
) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (chat_id, language, currency)
        VALUES (?, ?, ?)
        ON CONFLICT(chat_id) DO UPDATE SET
            currency = excluded.currency
        "#,
    )
    .bind(chat_id)
    .bind(default_language)
    .bind(currency)
    .execute(pool)
    .await?;

    get_by_chat_id(pool, chat_id).await
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

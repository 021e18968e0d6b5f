//! Reference data: currencies, airlines and translation overrides.
//!
//! Seeding is idempotent. Existing rows are left alone so edits made
//! directly in the database survive restarts.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{Airline, Currency, Translation};

/// Insert currencies that are not present yet. Returns how many were added.
pub async fn seed_currencies(pool: &SqlitePool, currencies: &[Currency]) -> Result<u64> {
    let mut added = 0;
    for currency in currencies {
        let result = sqlx::query(
            r#"
            INSERT INTO currencies (code, name, symbol, flag)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(code) DO NOTHING
            "#,
        )
        .bind(&currency.code)
        .bind(&currency.name)
        .bind(&currency.symbol)
        .bind(&currency.flag)
        .execute(pool)
        .await?;
        added += result.rows_affected();
    }
    Ok(added)
}

/// Insert airlines that are not present yet. Returns how many were added.
pub async fn seed_airlines(pool: &SqlitePool, airlines: &[Airline]) -> Result<u64> {
    let mut added = 0;
    for airline in airlines {
        let result = sqlx::query(
            r#"
            INSERT INTO airlines (code, name_ru, name_en)
            VALUES (?, ?, ?)
            ON CONFLICT(code) DO NOTHING
            "#,
        )
        .bind(&airline.code)
        .bind(&airline.name_ru)
        .bind(&airline.name_en)
        .execute(pool)
        .await?;
        added += result.rows_affected();
    }
    Ok(added)
}

/// Insert translations that are not present yet. Returns how many were added.
pub async fn seed_translations(pool: &SqlitePool, translations: &[Translation]) -> Result<u64> {
    let mut added = 0;
    for translation in translations {
        let result = sqlx::query(
            r#"
            INSERT INTO translations (key, lang, value)
            VALUES (?, ?, ?)
            ON CONFLICT(key, lang) DO NOTHING
            "#,
        )
        .bind(&translation.key)
        .bind(&translation.lang)
        .bind(&translation.value)
        .execute(pool)
        .await?;
        added += result.rows_affected();
    }
    Ok(added)
}

/// List all currencies ordered by code.
pub async fn list_currencies(pool: &SqlitePool) -> Result<Vec<Currency>> {
    let rows = sqlx::query_as::<_, Currency>(
        r#"
        SELECT code, name, symbol, flag
        FROM currencies
        ORDER BY code
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List all airlines ordered by code.
pub async fn list_airlines(pool: &SqlitePool) -> Result<Vec<Airline>> {
    let rows = sqlx::query_as::<_, Airline>(
        r#"
        SELECT code, name_ru, name_en
        FROM airlines
        ORDER BY code
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List every stored translation.
pub async fn list_translations(pool: &SqlitePool) -> Result<Vec<Translation>> {
    let rows = sqlx::query_as::<_, Translation>(
        r#"
        SELECT key, lang, value
        FROM translations
        ORDER BY key, lang
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Create or replace a single translation.
pub async fn upsert_translation(pool: &SqlitePool, key: &str, lang: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO translations (key, lang, value)
        VALUES (?, ?, ?)
        ON CONFLICT(key, lang) DO UPDATE SET
            value = excluded.value
        "#,
    )
    .bind(key)
    .bind(lang)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

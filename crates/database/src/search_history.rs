//! Search history and the per-search result rows.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{NewSearchResult, SearchHistory, SearchResult};

/// Insert a search history row and return its ID.
pub async fn record_search(
    pool: &SqlitePool,
    user_id: i64,
    origin_city: &str,
    destination_city: &str,
    depart_date: &str,
    passengers: i64,
    direct_only: bool,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO search_history (
            user_id, origin_city, destination_city, depart_date, passengers, direct_only
        )
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(origin_city)
    .bind(destination_city)
    .bind(depart_date)
    .bind(passengers)
    .bind(direct_only)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert one result row under an existing search.
pub async fn record_result(
    pool: &SqlitePool,
    search_id: i64,
    result: &NewSearchResult,
) -> Result<i64> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO search_results (search_id, airline_code, departure_date, price, currency, link)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(search_id)
    .bind(&result.airline_code)
    .bind(&result.departure_date)
    .bind(result.price)
    .bind(&result.currency)
    .bind(&result.link)
    .execute(pool)
    .await?;

    Ok(inserted.last_insert_rowid())
}

/// List a user's most recent searches, newest first.
pub async fn list_recent(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<SearchHistory>> {
    let searches = sqlx::query_as::<_, SearchHistory>(
        r#"
        SELECT id, user_id, origin_city, destination_city, depart_date,
               passengers, direct_only, search_time
        FROM search_history
        WHERE user_id = ?
        ORDER BY search_time DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(searches)
}

/// List the results stored for a search, cheapest first.
pub async fn list_results(pool: &SqlitePool, search_id: i64) -> Result<Vec<SearchResult>> {
    let results = sqlx::query_as::<_, SearchResult>(
        r#"
        SELECT id, search_id, airline_code, departure_date, price, currency, link
        FROM search_results
        WHERE search_id = ?
        ORDER BY price, id
        "#,
    )
    .bind(search_id)
    .fetch_all(pool)
    .await?;

    Ok(results)
}

/// Delete a search; its results go with it.
pub async fn delete_search(pool: &SqlitePool, search_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM search_history
        WHERE id = ?
        "#,
    )
    .bind(search_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database};

    fn result_row(price: i64) -> NewSearchResult {
        NewSearchResult {
            airline_code: "SU".to_string(),
            departure_date: "2030-06-10".to_string(),
            price,
            currency: "RUB".to_string(),
            link: "https://www.aviasales.ru/search/MOW1006AER1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_with_results() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let owner = user::upsert_language(db.pool(), 9, "ru", "RUB").await.unwrap();

        let search_id = record_search(db.pool(), owner.id, "moscow", "sochi", "2030-06-10", 2, true)
            .await
            .unwrap();
        record_result(db.pool(), search_id, &result_row(7000)).await.unwrap();
        record_result(db.pool(), search_id, &result_row(5000)).await.unwrap();

        let searches = list_recent(db.pool(), owner.id, 5).await.unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].passengers, 2);
        assert!(searches[0].direct_only);

        let results = list_results(db.pool(), search_id).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].price, 5000);

        delete_search(db.pool(), search_id).await.unwrap();
        assert!(list_results(db.pool(), search_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_is_bounded_newest_first() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let owner = user::upsert_language(db.pool(), 9, "ru", "RUB").await.unwrap();

        for day in 10..17 {
            record_search(
                db.pool(),
                owner.id,
                "moscow",
                "sochi",
                &format!("2030-06-{day}"),
                1,
                false,
            )
            .await
            .unwrap();
        }

        let searches = list_recent(db.pool(), owner.id, 5).await.unwrap();
        assert_eq!(searches.len(), 5);
        assert_eq!(searches[0].depart_date, "2030-06-16");
        assert_eq!(searches[4].depart_date, "2030-06-12");
    }
}

//! Tracked route storage.
//!
//! Routes are never deleted. Cancelling flips `active` to false, and the
//! price checker writes its bookkeeping back one row at a time.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{CheckState, NewTrackedRoute, TrackedRoute};
use crate::validation::{validate_city, validate_thresholds, validate_track_date, ValidationError};

const ROUTE_COLUMNS: &str = r#"
    id, user_id, origin_city, destination_city, depart_date, currency,
    notify_below_price, price_drop_percent, active,
    last_checked_price, last_notified_price, last_notified_percent, created_at
"#;

/// Create one route per departure date.
///
/// The whole request is validated before anything is written, and all rows
/// are inserted in a single transaction so a multi-date request lands
/// completely or not at all.
pub async fn create_routes(
    pool: &SqlitePool,
    route: &NewTrackedRoute,
    depart_dates: &[String],
) -> Result<Vec<TrackedRoute>> {
    validate_thresholds(route.notify_below_price, route.price_drop_percent)?;
    validate_city("origin_city", &route.origin_city)?;
    validate_city("destination_city", &route.destination_city)?;
    if depart_dates.is_empty() {
        return Err(ValidationError::NoDates.into());
    }
    for date in depart_dates {
        validate_track_date(date)?;
    }

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(depart_dates.len());

    for date in depart_dates {
        let result = sqlx::query(
            r#"
            INSERT INTO tracked_routes (
                user_id, origin_city, destination_city, depart_date, currency,
                notify_below_price, price_drop_percent
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(route.user_id)
        .bind(&route.origin_city)
        .bind(&route.destination_city)
        .bind(date)
        .bind(&route.currency)
        .bind(route.notify_below_price)
        .bind(route.price_drop_percent)
        .execute(&mut *tx)
        .await?;

        ids.push(result.last_insert_rowid());
    }

    tx.commit().await?;

    tracing::debug!(
        user_id = route.user_id,
        count = ids.len(),
        "Created tracked routes"
    );

    let mut created = Vec::with_capacity(ids.len());
    for id in ids {
        created.push(get_route(pool, id).await?);
    }
    Ok(created)
}

/// Get a route by ID.
pub async fn get_route(pool: &SqlitePool, id: i64) -> Result<TrackedRoute> {
    let sql = format!("SELECT {ROUTE_COLUMNS} FROM tracked_routes WHERE id = ?");
    sqlx::query_as::<_, TrackedRoute>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "TrackedRoute",
            id: id.to_string(),
        })
}

/// List a user's active routes, oldest first.
pub async fn list_active_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<TrackedRoute>> {
    let sql = format!(
        "SELECT {ROUTE_COLUMNS} FROM tracked_routes WHERE user_id = ? AND active = 1 ORDER BY id"
    );
    let routes = sqlx::query_as::<_, TrackedRoute>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(routes)
}

/// List a user's most recent routes regardless of status, newest first.
pub async fn list_recent_for_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<TrackedRoute>> {
    let sql = format!(
        "SELECT {ROUTE_COLUMNS} FROM tracked_routes WHERE user_id = ? \
         ORDER BY created_at DESC, id DESC LIMIT ?"
    );
    let routes = sqlx::query_as::<_, TrackedRoute>(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(routes)
}

/// List every active route in ascending ID order.
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<TrackedRoute>> {
    let sql = format!("SELECT {ROUTE_COLUMNS} FROM tracked_routes WHERE active = 1 ORDER BY id");
    let routes = sqlx::query_as::<_, TrackedRoute>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(routes)
}

/// Deactivate a route on behalf of its owner.
///
/// Returns `NotFound` when the route does not exist, belongs to another
/// user, or is already inactive. Nothing is changed in those cases.
pub async fn deactivate_for_user(pool: &SqlitePool, route_id: i64, user_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tracked_routes
        SET active = 0
        WHERE id = ? AND user_id = ? AND active = 1
        "#,
    )
    .bind(route_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "TrackedRoute",
            id: route_id.to_string(),
        });
    }

    Ok(())
}

/// Deactivate a route without an ownership check (completed-date cleanup).
pub async fn deactivate(pool: &SqlitePool, route_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tracked_routes
        SET active = 0
        WHERE id = ?
        "#,
    )
    .bind(route_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "TrackedRoute",
            id: route_id.to_string(),
        });
    }

    Ok(())
}

/// Persist price-check bookkeeping for a single route.
pub async fn record_check(pool: &SqlitePool, route_id: i64, state: &CheckState) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tracked_routes
        SET last_checked_price = ?,
            last_notified_price = ?,
            last_notified_percent = ?
        WHERE id = ?
        "#,
    )
    .bind(state.last_checked_price)
    .bind(state.last_notified_price)
    .bind(state.last_notified_percent)
    .bind(route_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "TrackedRoute",
            id: route_id.to_string(),
        });
    }

    Ok(())
}

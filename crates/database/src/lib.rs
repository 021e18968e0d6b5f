//! SQLite persistence layer for the fare tracking bot.
//!
//! This crate provides async database operations for users, tracked routes,
//! notifications, search history and the seeded catalog tables using SQLx
//! with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, models::NewTrackedRoute, tracked_route, user};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:aviabot.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register a user and watch a route
//!     let user = user::upsert_language(db.pool(), 123456789, "en", "USD").await?;
//!     let route = NewTrackedRoute {
//!         user_id: user.id,
//!         origin_city: "moscow".to_string(),
//!         destination_city: "sochi".to_string(),
//!         currency: user.currency.clone(),
//!         notify_below_price: Some(5000),
//!         price_drop_percent: None,
//!     };
//!     tracked_route::create_routes(db.pool(), &route, &["17-05-2026".to_string()]).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod feedback;
pub mod models;
pub mod notification;
pub mod search_history;
pub mod tracked_route;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Airline, CheckState, Currency, Feedback, NewSearchResult, NewTrackedRoute, Notification,
    SearchHistory, SearchResult, TrackedRoute, Translation, User,
};
pub use validation::{ValidationError, MAX_DROP_PERCENT};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/aviabot.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        // Every connection to `sqlite::memory:` opens a fresh database, so the
        // in-memory case is pinned to a single connection.
        let pool_size = if url.contains(":memory:") {
            1
        } else {
            Self::DEFAULT_POOL_SIZE
        };
        Self::connect_with_pool_size(url, pool_size).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

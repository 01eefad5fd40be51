use std::{str::FromStr, time::Duration};

use futures::future::BoxFuture;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite, Transaction,
};
use tracing::{debug, info, warn};

use crate::error::StoreError;

pub mod customers;
pub mod orders;
pub mod products;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS Customers (
        customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(320) NOT NULL,
        phone VARCHAR(15) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Products (
        product_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(255) NOT NULL,
        price REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Orders (
        order_id INTEGER PRIMARY KEY AUTOINCREMENT,
        date DATE NOT NULL,
        customer_id INTEGER NOT NULL REFERENCES Customers (customer_id),
        delivery_date DATE NOT NULL,
        ordered_product VARCHAR(255) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Order_Product (
        order_id INTEGER NOT NULL REFERENCES Orders (order_id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES Products (product_id) ON DELETE CASCADE,
        PRIMARY KEY (order_id, product_id)
    )",
];

pub async fn establish_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<Pool<Sqlite>, sqlx::Error> {
    info!("Connecting to {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// A private in-memory database. Every pooled connection would open its own
/// empty database, so the pool is pinned to a single connection that never
/// expires.
pub async fn establish_in_memory() -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
}

/// Creates any missing tables. Existing tables are left as they are.
pub async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}

/// Runs `work` inside a transaction. The transaction commits only when `work`
/// returns `Ok`; any error rolls it back before being handed to the caller.
///
/// The transaction starts deferred. SQLite fails, rather than waits, when a
/// transaction that has already read tries to write while another connection
/// holds the write lock, so `work` must open with a write if it writes at all.
pub async fn in_transaction<T, F>(pool: &Pool<Sqlite>, work: F) -> Result<T, StoreError>
where
    F: for<'t> FnOnce(
        &'t mut Transaction<'static, Sqlite>,
    ) -> BoxFuture<'t, Result<T, StoreError>>,
{
    let mut tx = pool.begin().await?;

    match work(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            debug!("Transaction rolled back: {}", err);
            Err(err)
        }
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    let pool = establish_in_memory().await.unwrap();
    create_schema(&pool).await.unwrap();
    pool
}

/// A pool over a fresh database file inside `dir`, for tests that need more
/// than one connection.
#[cfg(test)]
pub(crate) async fn file_pool(dir: &tempfile::TempDir) -> Pool<Sqlite> {
    let url = format!("sqlite://{}", dir.path().join("shop.db").display());
    let pool = establish_connection(&url, 5).await.unwrap();
    create_schema(&pool).await.unwrap();
    pool
}

use sqlx::{Pool, Sqlite, Transaction};
use tracing::debug;

use crate::{
    db::in_transaction,
    error::{StoreError, StoreResult},
    models::{Entity, Product},
    schemas::ProductInput,
};

pub async fn list(pool: &Pool<Sqlite>) -> StoreResult<Vec<Product>> {
    let products =
        sqlx::query_as("SELECT product_id, name, price FROM Products ORDER BY product_id")
            .fetch_all(pool)
            .await?;

    Ok(products)
}

pub async fn get_by_id(pool: &Pool<Sqlite>, product_id: i64) -> StoreResult<Option<Product>> {
    let product =
        sqlx::query_as("SELECT product_id, name, price FROM Products WHERE product_id = ?")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;

    Ok(product)
}

pub async fn create(pool: &Pool<Sqlite>, input: ProductInput) -> StoreResult<Product> {
    in_transaction(pool, |tx| Box::pin(insert(tx, input))).await
}

pub async fn update(
    pool: &Pool<Sqlite>,
    product_id: i64,
    input: ProductInput,
) -> StoreResult<Product> {
    in_transaction(pool, move |tx| Box::pin(overwrite(tx, product_id, input))).await
}

pub async fn delete(pool: &Pool<Sqlite>, product_id: i64) -> StoreResult<u64> {
    in_transaction(pool, move |tx| Box::pin(remove(tx, product_id))).await
}

async fn insert(tx: &mut Transaction<'_, Sqlite>, input: ProductInput) -> StoreResult<Product> {
    let product_id = sqlx::query("INSERT INTO Products (name, price) VALUES (?, ?)")
        .bind(&input.name)
        .bind(input.price)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    debug!("Inserted product {}", product_id);
    Ok(Product::new(product_id, input))
}

async fn overwrite(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: i64,
    input: ProductInput,
) -> StoreResult<Product> {
    let claimed = sqlx::query("UPDATE Products SET name = name WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        return Err(StoreError::NotFound(Entity::Product));
    }

    let mut product: Product =
        sqlx::query_as("SELECT product_id, name, price FROM Products WHERE product_id = ?")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

    product.merge(input);

    sqlx::query("UPDATE Products SET name = ?, price = ? WHERE product_id = ?")
        .bind(&product.name)
        .bind(product.price)
        .bind(product.product_id)
        .execute(&mut *tx)
        .await?;

    Ok(product)
}

async fn remove(tx: &mut Transaction<'_, Sqlite>, product_id: i64) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM Products WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    Ok(result.rows_affected())
}

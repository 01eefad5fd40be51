use sqlx::{Pool, Sqlite, Transaction};
use tracing::debug;

use crate::{
    db::in_transaction,
    error::{StoreError, StoreResult},
    models::{Customer, Entity, Order},
    schemas::CustomerInput,
};

pub async fn list(pool: &Pool<Sqlite>) -> StoreResult<Vec<Customer>> {
    let customers = sqlx::query_as(
        "SELECT customer_id, name, email, phone FROM Customers ORDER BY customer_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(customers)
}

pub async fn get_by_id(pool: &Pool<Sqlite>, customer_id: i64) -> StoreResult<Option<Customer>> {
    let customer = sqlx::query_as(
        "SELECT customer_id, name, email, phone FROM Customers WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    Ok(customer)
}

pub async fn create(pool: &Pool<Sqlite>, input: CustomerInput) -> StoreResult<Customer> {
    in_transaction(pool, |tx| Box::pin(insert(tx, input))).await
}

pub async fn update(
    pool: &Pool<Sqlite>,
    customer_id: i64,
    input: CustomerInput,
) -> StoreResult<Customer> {
    in_transaction(pool, move |tx| Box::pin(overwrite(tx, customer_id, input))).await
}

/// Returns the number of rows removed; zero means no customer had that id.
pub async fn delete(pool: &Pool<Sqlite>, customer_id: i64) -> StoreResult<u64> {
    in_transaction(pool, move |tx| Box::pin(remove(tx, customer_id))).await
}

/// Orders placed by one customer, oldest first.
pub async fn orders(pool: &Pool<Sqlite>, customer_id: i64) -> StoreResult<Vec<Order>> {
    if get_by_id(pool, customer_id).await?.is_none() {
        return Err(StoreError::NotFound(Entity::Customer));
    }

    let orders = sqlx::query_as(
        "SELECT order_id, date, customer_id, delivery_date, ordered_product
         FROM Orders WHERE customer_id = ? ORDER BY order_id",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

async fn insert(tx: &mut Transaction<'_, Sqlite>, input: CustomerInput) -> StoreResult<Customer> {
    let customer_id = sqlx::query("INSERT INTO Customers (name, email, phone) VALUES (?, ?, ?)")
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    debug!("Inserted customer {}", customer_id);
    Ok(Customer::new(customer_id, input))
}

async fn overwrite(
    tx: &mut Transaction<'_, Sqlite>,
    customer_id: i64,
    input: CustomerInput,
) -> StoreResult<Customer> {
    let claimed = sqlx::query("UPDATE Customers SET name = name WHERE customer_id = ?")
        .bind(customer_id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        return Err(StoreError::NotFound(Entity::Customer));
    }

    let mut customer: Customer = sqlx::query_as(
        "SELECT customer_id, name, email, phone FROM Customers WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_one(&mut *tx)
    .await?;

    customer.merge(input);

    sqlx::query("UPDATE Customers SET name = ?, email = ?, phone = ? WHERE customer_id = ?")
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.customer_id)
        .execute(&mut *tx)
        .await?;

    Ok(customer)
}

async fn remove(tx: &mut Transaction<'_, Sqlite>, customer_id: i64) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM Customers WHERE customer_id = ?")
        .bind(customer_id)
        .execute(&mut *tx)
        .await?;

    Ok(result.rows_affected())
}

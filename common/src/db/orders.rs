use sqlx::{Pool, Sqlite, Transaction};
use tracing::debug;

use crate::{
    db::in_transaction,
    error::{StoreError, StoreResult},
    models::{Entity, Order, Product},
    schemas::OrderInput,
};

pub async fn list(pool: &Pool<Sqlite>) -> StoreResult<Vec<Order>> {
    let orders = sqlx::query_as(
        "SELECT order_id, date, customer_id, delivery_date, ordered_product
         FROM Orders ORDER BY order_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn get_by_id(pool: &Pool<Sqlite>, order_id: i64) -> StoreResult<Option<Order>> {
    let order = sqlx::query_as(
        "SELECT order_id, date, customer_id, delivery_date, ordered_product
         FROM Orders WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Inserts the order as given. A `customer_id` with no matching customer is
/// rejected by the foreign key and comes back as [`StoreError::Database`].
pub async fn create(pool: &Pool<Sqlite>, input: OrderInput) -> StoreResult<Order> {
    in_transaction(pool, |tx| Box::pin(insert(tx, input))).await
}

pub async fn update(pool: &Pool<Sqlite>, order_id: i64, input: OrderInput) -> StoreResult<Order> {
    in_transaction(pool, move |tx| Box::pin(overwrite(tx, order_id, input))).await
}

pub async fn delete(pool: &Pool<Sqlite>, order_id: i64) -> StoreResult<u64> {
    in_transaction(pool, move |tx| Box::pin(remove(tx, order_id))).await
}

pub async fn products(pool: &Pool<Sqlite>, order_id: i64) -> StoreResult<Vec<Product>> {
    if get_by_id(pool, order_id).await?.is_none() {
        return Err(StoreError::NotFound(Entity::Order));
    }

    let products = sqlx::query_as(
        "SELECT p.product_id, p.name, p.price
         FROM Products p
         JOIN Order_Product op ON op.product_id = p.product_id
         WHERE op.order_id = ?
         ORDER BY p.product_id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

/// Links a product to an order. Returns `false` when the pair was already
/// linked.
pub async fn add_product(
    pool: &Pool<Sqlite>,
    order_id: i64,
    product_id: i64,
) -> StoreResult<bool> {
    in_transaction(pool, move |tx| Box::pin(link(tx, order_id, product_id))).await
}

/// Returns the number of links removed; zero means the pair was not linked.
pub async fn remove_product(
    pool: &Pool<Sqlite>,
    order_id: i64,
    product_id: i64,
) -> StoreResult<u64> {
    in_transaction(pool, move |tx| Box::pin(unlink(tx, order_id, product_id))).await
}

async fn insert(tx: &mut Transaction<'_, Sqlite>, input: OrderInput) -> StoreResult<Order> {
    let order_id = sqlx::query(
        "INSERT INTO Orders (date, customer_id, delivery_date, ordered_product)
         VALUES (?, ?, ?, ?)",
    )
    .bind(input.date)
    .bind(input.customer_id)
    .bind(input.delivery_date)
    .bind(&input.ordered_product)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    debug!("Inserted order {} for customer {}", order_id, input.customer_id);
    Ok(Order::new(order_id, input))
}

async fn overwrite(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
    input: OrderInput,
) -> StoreResult<Order> {
    let claimed =
        sqlx::query("UPDATE Orders SET ordered_product = ordered_product WHERE order_id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
    if claimed.rows_affected() == 0 {
        return Err(StoreError::NotFound(Entity::Order));
    }

    let mut order: Order = sqlx::query_as(
        "SELECT order_id, date, customer_id, delivery_date, ordered_product
         FROM Orders WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;

    order.merge(input);

    sqlx::query(
        "UPDATE Orders SET date = ?, customer_id = ?, delivery_date = ?, ordered_product = ?
         WHERE order_id = ?",
    )
    .bind(order.date)
    .bind(order.customer_id)
    .bind(order.delivery_date)
    .bind(&order.ordered_product)
    .bind(order.order_id)
    .execute(&mut *tx)
    .await?;

    Ok(order)
}

async fn remove(tx: &mut Transaction<'_, Sqlite>, order_id: i64) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM Orders WHERE order_id = ?")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    Ok(result.rows_affected())
}

async fn link(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
    product_id: i64,
) -> StoreResult<bool> {
    // Write first so the transaction holds the write lock before it reads
    let result = sqlx::query(
        "INSERT OR IGNORE INTO Order_Product (order_id, product_id)
         SELECT o.order_id, p.product_id FROM Orders o, Products p
         WHERE o.order_id = ? AND p.product_id = ?",
    )
    .bind(order_id)
    .bind(product_id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 1 {
        return Ok(true);
    }

    let order: Option<(i64,)> = sqlx::query_as("SELECT order_id FROM Orders WHERE order_id = ?")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
    if order.is_none() {
        return Err(StoreError::NotFound(Entity::Order));
    }

    let product: Option<(i64,)> =
        sqlx::query_as("SELECT product_id FROM Products WHERE product_id = ?")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
    if product.is_none() {
        return Err(StoreError::NotFound(Entity::Product));
    }

    Ok(false)
}

async fn unlink(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
    product_id: i64,
) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM Order_Product WHERE order_id = ? AND product_id = ?")
        .bind(order_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{customers, file_pool, products as catalog, test_pool},
        schemas::{CustomerInput, ProductInput},
    };
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn customer(pool: &Pool<Sqlite>) -> i64 {
        customers::create(
            pool,
            CustomerInput {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555-0100".to_string(),
            },
        )
        .await
        .unwrap()
        .customer_id
    }

    async fn product(pool: &Pool<Sqlite>, name: &str) -> i64 {
        catalog::create(
            pool,
            ProductInput {
                name: name.to_string(),
                price: 10.0,
            },
        )
        .await
        .unwrap()
        .product_id
    }

    fn input(customer_id: i64) -> OrderInput {
        OrderInput {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            customer_id,
            delivery_date: NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(),
            ordered_product: "Lamp".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let pool = test_pool().await;
        let customer_id = customer(&pool).await;

        let created = create(&pool, input(customer_id)).await.unwrap();

        assert_eq!(
            get_by_id(&pool, created.order_id).await.unwrap(),
            Some(created.clone())
        );
        assert_eq!(
            customers::orders(&pool, customer_id).await.unwrap(),
            vec![created]
        );
    }

    #[tokio::test]
    async fn dangling_customer_is_a_database_error() {
        let pool = test_pool().await;

        let result = create(&pool, input(999)).await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert!(list(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_to_dangling_customer_rolls_back() {
        let pool = test_pool().await;
        let customer_id = customer(&pool).await;
        let created = create(&pool, input(customer_id)).await.unwrap();

        let result = update(&pool, created.order_id, input(999)).await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(
            get_by_id(&pool, created.order_id).await.unwrap(),
            Some(created)
        );
    }

    #[tokio::test]
    async fn products_are_linked_once() {
        let pool = test_pool().await;
        let order_id = create(&pool, input(customer(&pool).await))
            .await
            .unwrap()
            .order_id;
        let lamp = product(&pool, "Lamp").await;
        let desk = product(&pool, "Desk").await;

        assert!(add_product(&pool, order_id, lamp).await.unwrap());
        assert!(!add_product(&pool, order_id, lamp).await.unwrap());
        assert!(add_product(&pool, order_id, desk).await.unwrap());

        let linked: Vec<i64> = products(&pool, order_id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.product_id)
            .collect();
        assert_eq!(linked, [lamp, desk]);

        assert_eq!(remove_product(&pool, order_id, lamp).await.unwrap(), 1);
        assert_eq!(remove_product(&pool, order_id, lamp).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn linking_checks_both_sides() {
        let pool = test_pool().await;
        let order_id = create(&pool, input(customer(&pool).await))
            .await
            .unwrap()
            .order_id;

        let missing_product = add_product(&pool, order_id, 77).await;
        let missing_order = add_product(&pool, 77, order_id).await;

        assert!(matches!(missing_product, Err(StoreError::NotFound(Entity::Product))));
        assert!(matches!(missing_order, Err(StoreError::NotFound(Entity::Order))));
    }

    #[tokio::test]
    async fn deleting_an_order_drops_its_links() {
        let pool = test_pool().await;
        let order_id = create(&pool, input(customer(&pool).await))
            .await
            .unwrap()
            .order_id;
        let lamp = product(&pool, "Lamp").await;
        add_product(&pool, order_id, lamp).await.unwrap();

        assert_eq!(delete(&pool, order_id).await.unwrap(), 1);

        let (links,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Order_Product")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
        assert!(catalog::get_by_id(&pool, lamp).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_a_product_drops_its_links() {
        let pool = test_pool().await;
        let order_id = create(&pool, input(customer(&pool).await))
            .await
            .unwrap()
            .order_id;
        let lamp = product(&pool, "Lamp").await;
        let desk = product(&pool, "Desk").await;
        add_product(&pool, order_id, lamp).await.unwrap();
        add_product(&pool, order_id, desk).await.unwrap();

        assert_eq!(catalog::delete(&pool, lamp).await.unwrap(), 1);

        let linked: Vec<i64> = products(&pool, order_id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.product_id)
            .collect();
        assert_eq!(linked, [desk]);
        assert!(get_by_id(&pool, order_id).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_links_all_succeed() {
        let dir = TempDir::new().unwrap();
        let pool = file_pool(&dir).await;
        let customer_id = customer(&pool).await;
        let mut order_ids = Vec::new();
        for _ in 0..10 {
            order_ids.push(create(&pool, input(customer_id)).await.unwrap().order_id);
        }
        let mut product_ids = Vec::new();
        for n in 0..10 {
            product_ids.push(product(&pool, &format!("Item{}", n)).await);
        }

        let mut tasks = Vec::new();
        for &order_id in &order_ids {
            for &product_id in &product_ids {
                let pool = pool.clone();
                tasks.push(tokio::spawn(async move {
                    add_product(&pool, order_id, product_id).await
                }));
            }
        }

        let mut failures = Vec::new();
        for task in tasks {
            match task.await.unwrap() {
                Ok(true) => {}
                Ok(false) => failures.push("already linked".to_string()),
                Err(err) => failures.push(err.to_string()),
            }
        }
        assert!(failures.is_empty(), "{} links failed: {:?}", failures.len(), failures.first());

        for order_id in order_ids {
            assert_eq!(products(&pool, order_id).await.unwrap().len(), 10);
        }
    }
}

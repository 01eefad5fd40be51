use chrono::NaiveDate;
use serde::Serialize;

use crate::schemas::{CustomerInput, OrderInput, ProductInput};

/// Record types exposed by the API, used to label lookups that miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Product,
    Order,
    OrderProduct,
}

impl_display_for_enum!(
    Entity,
    Customer => "Customer",
    Product => "Product",
    Order => "Order",
    OrderProduct => "Order Product",
);

// Field order here is the order fields appear in response bodies.

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub order_id: i64,
    pub date: NaiveDate,
    pub customer_id: i64,
    pub delivery_date: NaiveDate,
    pub ordered_product: String,
}

impl Customer {
    pub fn new(customer_id: i64, input: CustomerInput) -> Self {
        Customer {
            customer_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
        }
    }

    /// Overwrites the stored fields carried by a validated payload. The key
    /// is never touched.
    pub fn merge(&mut self, input: CustomerInput) {
        let CustomerInput { name, email, phone } = input;
        self.name = name;
        self.email = email;
        self.phone = phone;
    }
}

impl Product {
    pub fn new(product_id: i64, input: ProductInput) -> Self {
        Product {
            product_id,
            name: input.name,
            price: input.price,
        }
    }

    pub fn merge(&mut self, input: ProductInput) {
        let ProductInput { name, price } = input;
        self.name = name;
        self.price = price;
    }
}

impl Order {
    pub fn new(order_id: i64, input: OrderInput) -> Self {
        Order {
            order_id,
            date: input.date,
            customer_id: input.customer_id,
            delivery_date: input.delivery_date,
            ordered_product: input.ordered_product,
        }
    }

    pub fn merge(&mut self, input: OrderInput) {
        let OrderInput {
            date,
            customer_id,
            delivery_date,
            ordered_product,
        } = input;
        self.date = date;
        self.customer_id = customer_id;
        self.delivery_date = delivery_date;
        self.ordered_product = ordered_product;
    }
}

use actix_web::{http::header, web, HttpResponse};
use common::{
    db::orders,
    models::Entity,
    schemas::{Load, OrderInput},
};
use serde_json::{json, Value};
use tracing::info;

use super::success;
use crate::{error::ApiError, AppState};

#[actix_web::get("/orders")]
async fn get_orders(app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let AppState { pool } = &**app_state;

    let orders = orders::list(pool).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[actix_web::get("/orders/{id}")]
async fn get_order_by_id(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let AppState { pool } = &**app_state;

    let order = orders::get_by_id(pool, order_id)
        .await?
        .ok_or(ApiError::NotFound(Entity::Order))?;
    Ok(HttpResponse::Ok().json(order))
}

#[actix_web::post("/orders")]
async fn add_order(
    payload: web::Json<Value>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let order_data = OrderInput::load(&payload)?;
    let AppState { pool } = &**app_state;

    // The customer reference is checked by the store, not here
    let order = orders::create(pool, order_data).await?;
    info!("Order {} added for customer {}", order.order_id, order.customer_id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/orders/{}", order.order_id)))
        .json(success(Entity::Order, "Added")))
}

#[actix_web::put("/orders/{id}")]
async fn update_order(
    path: web::Path<i64>,
    payload: web::Json<Value>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let order_data = OrderInput::load(&payload)?;
    let AppState { pool } = &**app_state;

    orders::update(pool, order_id, order_data).await?;
    info!("Order {} updated", order_id);

    Ok(HttpResponse::Ok().json(success(Entity::Order, "Updated")))
}

#[actix_web::delete("/orders/{id}")]
async fn delete_order(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let AppState { pool } = &**app_state;

    if orders::delete(pool, order_id).await? == 0 {
        return Err(ApiError::NotFound(Entity::Order));
    }
    info!("Order {} deleted", order_id);

    Ok(HttpResponse::Ok().json(success(Entity::Order, "Deleted")))
}

#[actix_web::get("/orders/{id}/products")]
async fn get_order_products(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let AppState { pool } = &**app_state;

    let products = orders::products(pool, order_id).await?;
    Ok(HttpResponse::Ok().json(products))
}

#[actix_web::post("/orders/{id}/products/{product_id}")]
async fn add_order_product(
    path: web::Path<(i64, i64)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, product_id) = path.into_inner();
    let AppState { pool } = &**app_state;

    if orders::add_product(pool, order_id, product_id).await? {
        info!("Product {} added to order {}", product_id, order_id);
        Ok(HttpResponse::Created().json(json!({ "Success": "Product Added To Order" })))
    } else {
        Ok(HttpResponse::Ok().json(json!({ "Success": "Product Already In Order" })))
    }
}

#[actix_web::delete("/orders/{id}/products/{product_id}")]
async fn remove_order_product(
    path: web::Path<(i64, i64)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (order_id, product_id) = path.into_inner();
    let AppState { pool } = &**app_state;

    if orders::remove_product(pool, order_id, product_id).await? == 0 {
        return Err(ApiError::NotFound(Entity::OrderProduct));
    }
    info!("Product {} removed from order {}", product_id, order_id);

    Ok(HttpResponse::Ok().json(json!({ "Success": "Product Removed From Order" })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_orders)
        .service(get_order_by_id)
        .service(add_order)
        .service(update_order)
        .service(delete_order)
        .service(get_order_products)
        .service(add_order_product)
        .service(remove_order_product);
}

use actix_web::{http::header, web, HttpResponse};
use common::{
    db::products,
    models::Entity,
    schemas::{Load, ProductInput},
};
use serde_json::Value;
use tracing::info;

use super::success;
use crate::{error::ApiError, AppState};

#[actix_web::get("/products")]
async fn get_products(app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let AppState { pool } = &**app_state;

    let products = products::list(pool).await?;
    Ok(HttpResponse::Ok().json(products))
}

#[actix_web::get("/products/{id}")]
async fn get_product_by_id(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let product_id = path.into_inner();
    let AppState { pool } = &**app_state;

    let product = products::get_by_id(pool, product_id)
        .await?
        .ok_or(ApiError::NotFound(Entity::Product))?;
    Ok(HttpResponse::Ok().json(product))
}

#[actix_web::post("/products")]
async fn add_product(
    payload: web::Json<Value>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let product_data = ProductInput::load(&payload)?;
    let AppState { pool } = &**app_state;

    let product = products::create(pool, product_data).await?;
    info!("Product {} added", product.product_id);

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            format!("/products/{}", product.product_id),
        ))
        .json(success(Entity::Product, "Added")))
}

#[actix_web::put("/products/{id}")]
async fn update_product(
    path: web::Path<i64>,
    payload: web::Json<Value>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let product_id = path.into_inner();
    let product_data = ProductInput::load(&payload)?;
    let AppState { pool } = &**app_state;

    products::update(pool, product_id, product_data).await?;
    info!("Product {} updated", product_id);

    Ok(HttpResponse::Ok().json(success(Entity::Product, "Updated")))
}

#[actix_web::delete("/products/{id}")]
async fn delete_product(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let product_id = path.into_inner();
    let AppState { pool } = &**app_state;

    if products::delete(pool, product_id).await? == 0 {
        return Err(ApiError::NotFound(Entity::Product));
    }
    info!("Product {} deleted", product_id);

    Ok(HttpResponse::Ok().json(success(Entity::Product, "Deleted")))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_products)
        .service(get_product_by_id)
        .service(add_product)
        .service(update_product)
        .service(delete_product);
}

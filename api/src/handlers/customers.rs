use actix_web::{http::header, web, HttpResponse};
use common::{
    db::customers,
    models::Entity,
    schemas::{CustomerInput, Load},
};
use serde_json::Value;
use tracing::info;

use super::success;
use crate::{error::ApiError, AppState};

#[actix_web::get("/customers")]
async fn get_customers(app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let AppState { pool } = &**app_state;

    let customers = customers::list(pool).await?;
    Ok(HttpResponse::Ok().json(customers))
}

#[actix_web::get("/customers/{id}")]
async fn get_customer_by_id(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let customer_id = path.into_inner();
    let AppState { pool } = &**app_state;

    let customer = customers::get_by_id(pool, customer_id)
        .await?
        .ok_or(ApiError::NotFound(Entity::Customer))?;
    Ok(HttpResponse::Ok().json(customer))
}

#[actix_web::get("/customers/{id}/orders")]
async fn get_customer_orders(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let customer_id = path.into_inner();
    let AppState { pool } = &**app_state;

    let orders = customers::orders(pool, customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[actix_web::post("/customers")]
async fn add_customer(
    payload: web::Json<Value>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let customer_data = CustomerInput::load(&payload)?;
    let AppState { pool } = &**app_state;

    let customer = customers::create(pool, customer_data).await?;
    info!("Customer {} added", customer.customer_id);

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            format!("/customers/{}", customer.customer_id),
        ))
        .json(success(Entity::Customer, "Added")))
}

#[actix_web::put("/customers/{id}")]
async fn update_customer(
    path: web::Path<i64>,
    payload: web::Json<Value>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let customer_id = path.into_inner();
    let customer_data = CustomerInput::load(&payload)?;
    let AppState { pool } = &**app_state;

    customers::update(pool, customer_id, customer_data).await?;
    info!("Customer {} updated", customer_id);

    Ok(HttpResponse::Ok().json(success(Entity::Customer, "Updated")))
}

#[actix_web::delete("/customers/{id}")]
async fn delete_customer(
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let customer_id = path.into_inner();
    let AppState { pool } = &**app_state;

    if customers::delete(pool, customer_id).await? == 0 {
        return Err(ApiError::NotFound(Entity::Customer));
    }
    info!("Customer {} deleted", customer_id);

    Ok(HttpResponse::Ok().json(success(Entity::Customer, "Deleted")))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_customers)
        .service(get_customer_by_id)
        .service(get_customer_orders)
        .service(add_customer)
        .service(update_customer)
        .service(delete_customer);
}

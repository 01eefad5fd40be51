use actix_web::{web, HttpResponse, Responder};
use common::models::Entity;
use serde_json::{json, Value};

pub mod customers;
pub mod orders;
pub mod products;

#[actix_web::get("/")]
async fn home() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("Greetings!")
}

pub(crate) fn success(entity: Entity, action: &str) -> Value {
    json!({ "Success": format!("{} {}", entity, action) })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .configure(customers::configure)
        .configure(products::configure)
        .configure(orders::configure);
}

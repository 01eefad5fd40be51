use actix_web::web;
use sqlx::{Pool, Sqlite};

pub mod config;
pub mod error;
pub mod handlers;
pub mod security;

pub struct AppState {
    pub pool: Pool<Sqlite>,
}

/// Registers every route plus the JSON body error handler. Shared by the
/// server binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .configure(handlers::configure);
}

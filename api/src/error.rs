use actix_web::{
    error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError,
};
use common::{
    error::StoreError,
    models::Entity,
    schemas::{FieldErrors, INVALID_INPUT},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid payload: {0}")]
    Validation(#[from] FieldErrors),

    #[error("{0} Not Found")]
    NotFound(Entity),

    #[error("store failure: {0}")]
    Store(#[source] sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ApiError::NotFound(entity),
            StoreError::Database(err) => ApiError::Store(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(errors) => {
                debug!("Rejected fields: {:?}", errors.fields().collect::<Vec<_>>());
                HttpResponse::BadRequest().json(errors)
            }
            ApiError::NotFound(entity) => {
                HttpResponse::NotFound().json(json!({ "Error": format!("{} Not Found", entity) }))
            }
            ApiError::Store(err) => {
                error!("Unhandled store error: {}", err);
                HttpResponse::InternalServerError()
                    .json(json!({ "Error": "Internal Server Error" }))
            }
        }
    }
}

/// Bodies that are not JSON at all get the same 400 shape as a JSON value of
/// the wrong type.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected body for {} {}: {}", req.method(), req.path(), err);
    ApiError::Validation(FieldErrors::schema(INVALID_INPUT)).into()
}

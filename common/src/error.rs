use thiserror::Error;

use crate::models::Entity;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} Not Found")]
    NotFound(Entity),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

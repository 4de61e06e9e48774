use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::users::dto::ErrorResponse;

/// SQLite extended result codes for UNIQUE and PRIMARY KEY constraint failures.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("user not found")]
    NotFound,
    #[error("email already in use")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if is_unique_violation(db.as_ref()) => RepoError::Conflict,
            _ => RepoError::Database(e),
        }
    }
}

fn is_unique_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.code()
        .map(|c| matches!(c.as_ref(), SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY))
        .unwrap_or(false)
}

/// Strict-status rendering of repository failures.
impl IntoResponse for RepoError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            RepoError::NotFound => (StatusCode::NOT_FOUND, "User not found"),
            RepoError::Conflict => (StatusCode::CONFLICT, "Email already in use"),
            RepoError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

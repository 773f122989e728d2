//! Catalog error types.
//!
//! Every catalog operation returns [`CatalogResult`]; callers branch on the
//! variant (or on [`CatalogError::code`]) rather than on sentinel payloads.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("migration failed")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CatalogError {
    /// Shorthand for a missing product.
    pub fn product_not_found(id: i64) -> Self {
        CatalogError::NotFound {
            entity: "product",
            id,
        }
    }

    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::Validation(_) => "validation",
            CatalogError::Database(_) => "database",
            CatalogError::Migration(_) => "migration",
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Database(_) | CatalogError::Migration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Storage failures are logged here and reported vaguely to the client
        let message = match &self {
            CatalogError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error".to_string()
            }
            CatalogError::Migration(e) => {
                tracing::error!(error = %e, "migration error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = serde_json::json!({
            "error": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

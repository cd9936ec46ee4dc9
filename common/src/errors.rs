//! Error types shared by every layer of the gateway.
//!
//! Descriptor, connection and query failures all answer with 500; clients
//! treat that status as "the database side failed" regardless of cause.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Convenience alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// The connection descriptor could not be decrypted or parsed.
    #[error("{0}")]
    Descriptor(String),

    /// A pool or connection to the target database could not be established.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// The database rejected or failed a statement.
    #[error("{message}")]
    Query {
        message: String,
        /// SQLSTATE reported by the server, when there is one.
        code: Option<String>,
    },

    /// The database work for a request exceeded the configured time budget.
    #[error("query timed out after {0}s")]
    Timeout(u64),

    /// The request body is malformed.
    #[error("{0}")]
    Validation(String),

    /// The addressed object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Descriptor(_) => "DESCRIPTOR_ERROR",
            AppError::DatabaseConnection(_) => "CONNECTION_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            AppError::Timeout(_) => "QUERY_TIMEOUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Descriptor(_)
            | AppError::DatabaseConnection(_)
            | AppError::Query { .. }
            | AppError::Timeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => AppError::Query {
                message: db.message().to_string(),
                code: db.code().map(|c| c.into_owned()),
            },
            sqlx::Error::RowNotFound => AppError::NotFound("row".to_string()),
            sqlx::Error::ColumnDecode { index, source } => AppError::Query {
                message: format!("failed to decode column {}: {}", index, source),
                code: None,
            },
            sqlx::Error::Decode(source) => AppError::Query {
                message: format!("failed to decode value: {}", source),
                code: None,
            },
            sqlx::Error::ColumnNotFound(name) => AppError::Query {
                message: format!("column not found: {}", name),
                code: None,
            },
            other => AppError::DatabaseConnection(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        AppError::Validation(errs.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %message, "Request failed");
        } else {
            tracing::warn!(code = self.code(), error = %message, "Request rejected");
        }

        let body = match &self {
            AppError::Query {
                code: Some(sqlstate),
                ..
            } => ApiResponse::err_with_details(self.code(), message, json!({ "sqlstate": sqlstate })),
            _ => ApiResponse::err(self.code(), message),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_and_query_errors_share_status() {
        let descriptor = AppError::Descriptor("unable to decrypt connection descriptor".into());
        let query = AppError::Query {
            message: "relation \"nope\" does not exist".into(),
            code: Some("42P01".into()),
        };
        assert_eq!(descriptor.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(query.status(), descriptor.status());
        assert_eq!(
            AppError::DatabaseConnection("refused".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("schema 1".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_pool_timeout_is_a_connection_error() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "CONNECTION_ERROR");
    }

    #[test]
    fn test_query_message_is_passed_through() {
        let err = AppError::Query {
            message: "syntax error at or near \"SELEC\"".into(),
            code: Some("42601".into()),
        };
        assert_eq!(err.to_string(), "syntax error at or near \"SELEC\"");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! API response envelope.
//!
//! Successful calls answer with the bare payload (arrays for listings, the
//! object for mutations). Failures use the envelope below.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Error response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse {
    /// Always `false` for this envelope.
    pub success: bool,

    /// Error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// Response metadata.
    pub meta: ResponseMeta,
}

/// API error details.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Error code for client handling (e.g., "QUERY_ERROR", "NOT_FOUND").
    pub code: String,

    /// Human-readable error message.
    pub message: String,

    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Response timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}

impl ApiResponse {
    /// Creates an error response.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
                details: None,
            }),
            meta: ResponseMeta::default(),
        }
    }

    /// Creates an error response with details.
    pub fn err_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            }),
            meta: ResponseMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::err("QUERY_ERROR", "boom")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "QUERY_ERROR");
        assert_eq!(body["error"]["message"], "boom");
        assert!(body["error"].get("details").is_none());
        assert!(body["meta"]["timestamp"].is_string());
    }
}

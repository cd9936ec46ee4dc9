//! SQL query models.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for `/query`.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// SQL to execute. Several `;`-separated statements are allowed.
    #[validate(length(min = 1, message = "query is required"))]
    pub query: String,
}

/// Query-string filter accepted by the listing endpoints.
#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Include `pg_catalog`, `information_schema`, `pg_toast` and temp schemas.
    #[serde(default)]
    pub include_system_schemas: bool,
    /// Include the predefined `pg_*` roles in `/roles`.
    #[serde(default)]
    pub include_default_roles: bool,
    /// Restrict to one schema.
    pub schema: Option<String>,
    /// Restrict to one table (with `schema`).
    pub table: Option<String>,
}

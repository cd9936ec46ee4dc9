//! Schema models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A namespace in the target database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Schema {
    /// Namespace OID.
    pub id: i64,
    /// Schema name.
    pub name: String,
    /// Owning role.
    pub owner: String,
}

/// Request body for `POST /schemas`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchemaRequest {
    /// New schema name.
    #[validate(length(min = 1, max = 63, message = "Name must be 1-63 characters"))]
    pub name: String,
    /// Role to own the schema (defaults to the connected user).
    #[validate(length(min = 1, max = 63, message = "Owner must be 1-63 characters"))]
    pub owner: Option<String>,
}

/// Request body for `PATCH /schemas/{id}`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSchemaRequest {
    /// New schema name.
    #[validate(length(min = 1, max = 63, message = "Name must be 1-63 characters"))]
    pub name: Option<String>,
    /// New owning role.
    #[validate(length(min = 1, max = 63, message = "Owner must be 1-63 characters"))]
    pub owner: Option<String>,
}

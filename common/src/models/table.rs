//! Table models.
//!
//! A [`Table`] is assembled from several flat catalog result sets; every
//! nested sequence is present even when empty.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A table with its columns, keys, grants, policies and relationships.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Table {
    /// Relation OID.
    pub id: i64,
    pub schema: String,
    pub name: String,
    /// Whether row level security is enabled.
    pub rls_enabled: bool,
    /// Whether row level security also applies to the owner.
    pub rls_forced: bool,
    /// `DEFAULT`, `INDEX`, `FULL` or `NOTHING`.
    pub replica_identity: String,
    /// Total on-disk size including indexes and TOAST.
    pub bytes: i64,
    /// Human readable form of `bytes`.
    pub size: String,
    pub live_rows_estimate: i64,
    pub dead_rows_estimate: i64,
    pub comment: Option<String>,
    /// Columns in ordinal order.
    pub columns: Vec<Column>,
    /// Primary key column names in key order.
    pub primary_keys: Vec<String>,
    pub grants: Vec<Grant>,
    pub policies: Vec<Policy>,
    /// Foreign keys where this table is the source or the target.
    pub relationships: Vec<Relationship>,
}

/// A table column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Column {
    pub table_id: i64,
    pub schema: String,
    pub table: String,
    /// `"<table_id>.<ordinal_position>"`.
    pub id: String,
    pub name: String,
    pub ordinal_position: i32,
    /// Type name as printed by `format_type`, e.g. `bigint`.
    pub data_type: String,
    /// Underlying type name, e.g. `int8`.
    pub format: String,
    pub default_value: Option<String>,
    pub is_identity: bool,
    /// `ALWAYS` or `BY DEFAULT` for identity columns.
    pub identity_generation: Option<String>,
    pub is_nullable: bool,
    pub is_updatable: bool,
    /// Labels when the column has an enum type.
    pub enums: Vec<String>,
    pub comment: Option<String>,
}

/// A privilege held on a table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grant {
    pub table_id: i64,
    pub schema: String,
    pub table_name: String,
    pub grantor: String,
    /// Role name, or `PUBLIC`.
    pub grantee: String,
    pub privilege_type: String,
    pub is_grantable: bool,
}

/// A row level security policy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Policy {
    pub id: i64,
    pub schema: String,
    pub table: String,
    pub table_id: i64,
    pub name: String,
    /// `PERMISSIVE` or `RESTRICTIVE`.
    pub action: String,
    /// `SELECT`, `INSERT`, `UPDATE`, `DELETE` or `ALL`.
    pub command: String,
    pub roles: Vec<String>,
    /// `USING` expression.
    pub definition: Option<String>,
    /// `WITH CHECK` expression.
    pub check: Option<String>,
}

/// One column pair of a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Relationship {
    /// Constraint OID.
    pub id: i64,
    pub constraint_name: String,
    pub source_schema: String,
    pub source_table_name: String,
    pub source_column_name: String,
    pub target_table_schema: String,
    pub target_table_name: String,
    pub target_column_name: String,
}

/// Request body for `POST /tables`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTableRequest {
    /// Target schema.
    #[serde(default = "default_schema")]
    #[validate(length(min = 1, max = 63, message = "Schema must be 1-63 characters"))]
    pub schema: String,
    /// Table name.
    #[validate(length(min = 1, max = 63, message = "Name must be 1-63 characters"))]
    pub name: String,
    /// Column definitions in order.
    #[serde(default)]
    #[validate(nested)]
    pub columns: Vec<CreateColumnRequest>,
    /// Columns forming the primary key.
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

/// A column definition inside [`CreateTableRequest`].
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateColumnRequest {
    /// Column name.
    #[validate(length(min = 1, max = 63, message = "Column name must be 1-63 characters"))]
    pub name: String,
    /// Native type name, passed through to the database.
    #[validate(length(min = 1, message = "data_type is required"))]
    pub data_type: String,
    /// Generate values with `GENERATED BY DEFAULT AS IDENTITY`.
    #[serde(default)]
    pub is_identity: bool,
    /// `false` adds `NOT NULL`.
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_nullable() -> bool {
    true
}

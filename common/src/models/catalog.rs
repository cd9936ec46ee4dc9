//! Flat catalog records: types, functions, extensions, settings, version.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A data type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PgType {
    pub id: i64,
    pub name: String,
    pub schema: String,
    /// `format_type` rendering.
    pub format: String,
    /// Labels for enum types, empty otherwise.
    pub enums: Vec<String>,
    pub comment: Option<String>,
}

/// A function or procedure.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Function {
    pub id: i64,
    pub schema: String,
    pub name: String,
    pub language: String,
    /// Full `CREATE FUNCTION` text, or the symbol for internal functions.
    pub definition: Option<String>,
    pub argument_types: String,
    pub return_type: Option<String>,
    /// `IMMUTABLE`, `STABLE` or `VOLATILE`.
    pub behavior: String,
    pub security_definer: bool,
}

/// An available or installed extension.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Extension {
    pub name: String,
    /// Schema the extension is installed in; `null` when not installed.
    pub schema: Option<String>,
    pub default_version: Option<String>,
    pub installed_version: Option<String>,
    pub comment: Option<String>,
}

/// A run-time configuration parameter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfigSetting {
    pub name: String,
    pub setting: Option<String>,
    pub category: String,
    /// First half of `category`.
    pub group: String,
    /// Second half of `category`, when present.
    pub subgroup: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub context: String,
    pub vartype: String,
    pub source: Option<String>,
    pub min_val: Option<String>,
    pub max_val: Option<String>,
    pub enumvals: Option<Vec<String>>,
    pub boot_val: Option<String>,
    pub reset_val: Option<String>,
    pub pending_restart: bool,
}

/// Server version information.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VersionInfo {
    /// Full `version()` text.
    pub version: String,
    /// `server_version_num`, e.g. `120003`.
    pub version_number: String,
    pub active_connections: i64,
    pub max_connections: i64,
}

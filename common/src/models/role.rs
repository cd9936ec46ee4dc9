//! Role models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A database role with its schema-level privileges.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Role {
    /// Role OID.
    pub id: i64,
    pub name: String,
    pub is_superuser: bool,
    pub can_create_db: bool,
    pub can_create_role: bool,
    pub inherit_role: bool,
    pub can_login: bool,
    pub is_replication_role: bool,
    pub can_bypass_rls: bool,
    /// Sessions currently open as this role.
    pub active_connections: i64,
    /// `-1` means unlimited.
    pub connection_limit: i32,
    /// Password expiry, e.g. `2020-01-01T00:00:00.000Z`.
    #[serde(serialize_with = "rfc3339_millis::serialize")]
    pub valid_until: Option<DateTime<Utc>>,
    /// Privileges on non-system schemas.
    pub grants: Vec<RoleGrant>,
}

/// A schema privilege held by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleGrant {
    pub schema: String,
    /// `USAGE` or `CREATE`.
    pub privilege: String,
}

/// Request body for `POST /roles`.
///
/// Omitted attributes keep the database default.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 63, message = "Name must be 1-63 characters"))]
    pub name: String,
    pub password: Option<String>,
    pub is_superuser: Option<bool>,
    pub can_create_db: Option<bool>,
    pub can_create_role: Option<bool>,
    pub inherit_role: Option<bool>,
    pub can_login: Option<bool>,
    pub is_replication_role: Option<bool>,
    pub can_bypass_rls: Option<bool>,
    #[validate(range(min = -1, message = "connection_limit must be -1 or greater"))]
    pub connection_limit: Option<i32>,
    /// RFC 3339 timestamp.
    pub valid_until: Option<DateTime<Utc>>,
}

/// Serializes timestamps as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format(ts)),
            None => serializer.serialize_none(),
        }
    }
}

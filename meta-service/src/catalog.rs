//! Catalog query library.
//!
//! One parameterized template per object class, each paired with a fetch
//! function that binds a [`CatalogFilter`] and decodes typed rows. Every
//! template that lists schema-scoped objects embeds the same system-schema
//! predicate, bound to `$1`.

use sqlx::{FromRow, PgExecutor};

use common::errors::AppResult;
use common::models::{
    Column, ConfigSetting, Extension, Function, Grant, ListParams, PgType, Policy, Relationship,
    Schema, VersionInfo,
};

/// Expands to the system-schema predicate over `n.nspname`.
///
/// `$1` is `include_system_schemas`. Rows whose schema is NULL (an extension
/// that is not installed) always pass.
macro_rules! system_schema_filter {
    () => {
        "($1::boolean OR COALESCE(n.nspname NOT IN ('information_schema', 'pg_catalog', 'pg_toast') \
         AND n.nspname !~ '^pg_(toast_)?temp_', true))"
    };
}

/// The predicate text shared by every schema-scoped template.
pub const SYSTEM_SCHEMA_FILTER: &str = system_schema_filter!();

pub const SCHEMAS: &str = concat!(
    "SELECT n.oid::int8 AS id, n.nspname::text AS name, \
     pg_catalog.pg_get_userbyid(n.nspowner)::text AS owner \
     FROM pg_catalog.pg_namespace n \
     WHERE ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     AND ($3::int8 IS NULL OR n.oid::int8 = $3) \
     ORDER BY n.nspname"
);

pub const TABLES: &str = concat!(
    "SELECT c.oid::int8 AS id, n.nspname::text AS schema, c.relname::text AS name, \
     c.relrowsecurity AS rls_enabled, c.relforcerowsecurity AS rls_forced, \
     CASE c.relreplident WHEN 'd' THEN 'DEFAULT' WHEN 'i' THEN 'INDEX' WHEN 'f' THEN 'FULL' \
     ELSE 'NOTHING' END AS replica_identity, \
     pg_catalog.pg_total_relation_size(c.oid)::int8 AS bytes, \
     pg_catalog.pg_size_pretty(pg_catalog.pg_total_relation_size(c.oid)) AS size, \
     pg_catalog.pg_stat_get_live_tuples(c.oid)::int8 AS live_rows_estimate, \
     pg_catalog.pg_stat_get_dead_tuples(c.oid)::int8 AS dead_rows_estimate, \
     pg_catalog.obj_description(c.oid, 'pg_class') AS comment \
     FROM pg_catalog.pg_class c \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     WHERE c.relkind IN ('r', 'p') AND ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     AND ($3::text IS NULL OR c.relname = $3) \
     ORDER BY n.nspname, c.relname"
);

pub const COLUMNS: &str = concat!(
    "SELECT c.oid::int8 AS table_id, n.nspname::text AS schema, c.relname::text AS \"table\", \
     c.oid::text || '.' || a.attnum::text AS id, \
     a.attname::text AS name, a.attnum::int4 AS ordinal_position, \
     pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type, \
     t.typname::text AS format, \
     pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) AS default_value, \
     a.attidentity IN ('a', 'd') AS is_identity, \
     CASE a.attidentity WHEN 'a' THEN 'ALWAYS' WHEN 'd' THEN 'BY DEFAULT' END AS identity_generation, \
     NOT a.attnotnull AS is_nullable, \
     pg_catalog.pg_column_is_updatable(c.oid, a.attnum, false) AS is_updatable, \
     ARRAY(SELECT e.enumlabel::text FROM pg_catalog.pg_enum e \
     WHERE e.enumtypid = a.atttypid ORDER BY e.enumsortorder) AS enums, \
     pg_catalog.col_description(c.oid, a.attnum) AS comment \
     FROM pg_catalog.pg_attribute a \
     JOIN pg_catalog.pg_class c ON c.oid = a.attrelid \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     JOIN pg_catalog.pg_type t ON t.oid = a.atttypid \
     LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum \
     WHERE a.attnum > 0 AND NOT a.attisdropped AND c.relkind IN ('r', 'p') AND ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     AND ($3::text IS NULL OR c.relname = $3) \
     ORDER BY n.nspname, c.relname, a.attnum"
);

pub const PRIMARY_KEYS: &str = concat!(
    "SELECT n.nspname::text AS schema, c.relname::text AS table_name, a.attname::text AS name \
     FROM pg_catalog.pg_index i \
     JOIN pg_catalog.pg_class c ON c.oid = i.indrelid \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, position) ON true \
     JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum \
     WHERE i.indisprimary AND ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     AND ($3::text IS NULL OR c.relname = $3) \
     ORDER BY n.nspname, c.relname, k.position"
);

/// Foreign key column pairs. The scope matches either end of the key.
pub const RELATIONSHIPS: &str = concat!(
    "SELECT con.oid::int8 AS id, con.conname::text AS constraint_name, \
     n.nspname::text AS source_schema, sc.relname::text AS source_table_name, \
     sa.attname::text AS source_column_name, \
     tn.nspname::text AS target_table_schema, tc.relname::text AS target_table_name, \
     ta.attname::text AS target_column_name \
     FROM pg_catalog.pg_constraint con \
     JOIN pg_catalog.pg_class sc ON sc.oid = con.conrelid \
     JOIN pg_catalog.pg_namespace n ON n.oid = sc.relnamespace \
     JOIN pg_catalog.pg_class tc ON tc.oid = con.confrelid \
     JOIN pg_catalog.pg_namespace tn ON tn.oid = tc.relnamespace \
     JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY \
     AS k(source_attnum, target_attnum, position) ON true \
     JOIN pg_catalog.pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.source_attnum \
     JOIN pg_catalog.pg_attribute ta ON ta.attrelid = con.confrelid AND ta.attnum = k.target_attnum \
     WHERE con.contype = 'f' AND ",
    system_schema_filter!(),
    " AND (\
     (($2::text IS NULL OR n.nspname = $2) AND ($3::text IS NULL OR sc.relname = $3)) \
     OR (($2::text IS NULL OR tn.nspname = $2) AND ($3::text IS NULL OR tc.relname = $3))) \
     ORDER BY n.nspname, sc.relname, con.conname, k.position"
);

pub const GRANTS: &str = concat!(
    "SELECT c.oid::int8 AS table_id, n.nspname::text AS schema, c.relname::text AS table_name, \
     pg_catalog.pg_get_userbyid(acl.grantor)::text AS grantor, \
     CASE WHEN acl.grantee = 0 THEN 'PUBLIC' \
     ELSE pg_catalog.pg_get_userbyid(acl.grantee)::text END AS grantee, \
     acl.privilege_type AS privilege_type, acl.is_grantable AS is_grantable \
     FROM pg_catalog.pg_class c \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     CROSS JOIN LATERAL pg_catalog.aclexplode(\
     COALESCE(c.relacl, pg_catalog.acldefault('r', c.relowner))) AS acl \
     WHERE c.relkind IN ('r', 'p') AND ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     AND ($3::text IS NULL OR c.relname = $3) \
     ORDER BY n.nspname, c.relname, acl.grantee, acl.privilege_type"
);

pub const POLICIES: &str = concat!(
    "SELECT pol.oid::int8 AS id, n.nspname::text AS schema, c.relname::text AS \"table\", \
     c.oid::int8 AS table_id, pol.polname::text AS name, \
     CASE WHEN pol.polpermissive THEN 'PERMISSIVE' ELSE 'RESTRICTIVE' END AS action, \
     CASE pol.polcmd WHEN 'r' THEN 'SELECT' WHEN 'a' THEN 'INSERT' WHEN 'w' THEN 'UPDATE' \
     WHEN 'd' THEN 'DELETE' ELSE 'ALL' END AS command, \
     CASE WHEN pol.polroles = '{0}'::oid[] THEN ARRAY['public']::text[] \
     ELSE ARRAY(SELECT r.rolname::text FROM pg_catalog.pg_roles r \
     WHERE r.oid = ANY(pol.polroles) ORDER BY r.rolname) END AS roles, \
     pg_catalog.pg_get_expr(pol.polqual, pol.polrelid) AS definition, \
     pg_catalog.pg_get_expr(pol.polwithcheck, pol.polrelid) AS \"check\" \
     FROM pg_catalog.pg_policy pol \
     JOIN pg_catalog.pg_class c ON c.oid = pol.polrelid \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     WHERE ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     AND ($3::text IS NULL OR c.relname = $3) \
     ORDER BY n.nspname, c.relname, pol.polname"
);

/// Base, enum, domain, range and standalone composite types. Array types and
/// table row types are left out.
pub const TYPES: &str = concat!(
    "SELECT t.oid::int8 AS id, t.typname::text AS name, n.nspname::text AS schema, \
     pg_catalog.format_type(t.oid, NULL) AS format, \
     ARRAY(SELECT e.enumlabel::text FROM pg_catalog.pg_enum e \
     WHERE e.enumtypid = t.oid ORDER BY e.enumsortorder) AS enums, \
     pg_catalog.obj_description(t.oid, 'pg_type') AS comment \
     FROM pg_catalog.pg_type t \
     JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace \
     WHERE (t.typrelid = 0 OR EXISTS (SELECT 1 FROM pg_catalog.pg_class c \
     WHERE c.oid = t.typrelid AND c.relkind = 'c')) \
     AND NOT EXISTS (SELECT 1 FROM pg_catalog.pg_type el \
     WHERE el.oid = t.typelem AND el.typarray = t.oid) AND ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     ORDER BY n.nspname, t.typname"
);

pub const FUNCTIONS: &str = concat!(
    "SELECT p.oid::int8 AS id, n.nspname::text AS schema, p.proname::text AS name, \
     l.lanname::text AS language, \
     CASE WHEN l.lanname = 'internal' THEN p.prosrc WHEN p.prokind = 'a' THEN NULL \
     ELSE pg_catalog.pg_get_functiondef(p.oid) END AS definition, \
     pg_catalog.pg_get_function_arguments(p.oid) AS argument_types, \
     pg_catalog.pg_get_function_result(p.oid) AS return_type, \
     CASE p.provolatile WHEN 'i' THEN 'IMMUTABLE' WHEN 's' THEN 'STABLE' \
     ELSE 'VOLATILE' END AS behavior, \
     p.prosecdef AS security_definer \
     FROM pg_catalog.pg_proc p \
     JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace \
     JOIN pg_catalog.pg_language l ON l.oid = p.prolang \
     WHERE ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR n.nspname = $2) \
     ORDER BY n.nspname, p.proname, p.oid"
);

/// Available extensions with their install state.
pub const EXTENSIONS: &str = concat!(
    "SELECT e.name::text AS name, n.nspname::text AS schema, \
     e.default_version AS default_version, e.installed_version AS installed_version, \
     e.comment AS comment \
     FROM pg_catalog.pg_available_extensions e \
     LEFT JOIN pg_catalog.pg_extension x ON x.extname = e.name \
     LEFT JOIN pg_catalog.pg_namespace n ON n.oid = x.extnamespace \
     WHERE ",
    system_schema_filter!(),
    " ORDER BY e.name"
);

/// `$1` is `include_default_roles`, `$2` an optional role name.
pub const ROLES: &str = "SELECT r.oid::int8 AS id, r.rolname::text AS name, \
     r.rolsuper AS is_superuser, r.rolcreatedb AS can_create_db, \
     r.rolcreaterole AS can_create_role, r.rolinherit AS inherit_role, \
     r.rolcanlogin AS can_login, r.rolreplication AS is_replication_role, \
     r.rolbypassrls AS can_bypass_rls, \
     (SELECT count(*) FROM pg_catalog.pg_stat_activity a WHERE a.usename = r.rolname)::int8 \
     AS active_connections, \
     r.rolconnlimit AS connection_limit, \
     CASE WHEN isfinite(r.rolvaliduntil) THEN r.rolvaliduntil END AS valid_until \
     FROM pg_catalog.pg_roles r \
     WHERE ($1::boolean OR r.rolname !~ '^pg_') \
     AND ($2::text IS NULL OR r.rolname = $2) \
     ORDER BY r.rolname";

pub const ROLE_GRANTS: &str = concat!(
    "SELECT r.rolname::text AS role_name, n.nspname::text AS schema, p.privilege AS privilege \
     FROM pg_catalog.pg_roles r \
     CROSS JOIN pg_catalog.pg_namespace n \
     CROSS JOIN (VALUES ('USAGE'), ('CREATE')) AS p(privilege) \
     WHERE pg_catalog.has_schema_privilege(r.oid, n.oid, p.privilege) AND ",
    system_schema_filter!(),
    " AND ($2::text IS NULL OR r.rolname = $2) \
     ORDER BY r.rolname, n.nspname, p.privilege DESC"
);

pub const CONFIG: &str = "SELECT name, setting, category, unit, short_desc AS description, \
     context, vartype, source, min_val, max_val, enumvals, boot_val, reset_val, pending_restart \
     FROM pg_catalog.pg_settings \
     ORDER BY category, name";

pub const VERSION: &str = "SELECT version() AS version, \
     current_setting('server_version_num') AS version_number, \
     (SELECT count(*) FROM pg_catalog.pg_stat_activity)::int8 AS active_connections, \
     current_setting('max_connections')::int8 AS max_connections";

/// Parameters shared by the listing templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub include_system_schemas: bool,
    pub include_default_roles: bool,
    pub schema: Option<String>,
    pub table: Option<String>,
    /// Restricts role listings to one role.
    pub role: Option<String>,
}

impl CatalogFilter {
    /// Filter addressing exactly one table, in any schema.
    pub fn table(schema: &str, table: &str) -> Self {
        Self {
            include_system_schemas: true,
            schema: Some(schema.to_string()),
            table: Some(table.to_string()),
            ..Self::default()
        }
    }

    /// Filter addressing exactly one role, default roles included.
    pub fn role(name: &str) -> Self {
        Self {
            include_default_roles: true,
            role: Some(name.to_string()),
            ..Self::default()
        }
    }
}

impl From<ListParams> for CatalogFilter {
    fn from(params: ListParams) -> Self {
        Self {
            include_system_schemas: params.include_system_schemas,
            include_default_roles: params.include_default_roles,
            schema: params.schema,
            table: params.table,
            role: None,
        }
    }
}

/// Table-level attributes, before nesting.
#[derive(Debug, Clone, FromRow)]
pub struct TableRow {
    pub id: i64,
    pub schema: String,
    pub name: String,
    pub rls_enabled: bool,
    pub rls_forced: bool,
    pub replica_identity: String,
    pub bytes: i64,
    pub size: String,
    pub live_rows_estimate: i64,
    pub dead_rows_estimate: i64,
    pub comment: Option<String>,
}

/// One primary key column.
#[derive(Debug, Clone, FromRow)]
pub struct PrimaryKeyRow {
    pub schema: String,
    pub table_name: String,
    pub name: String,
}

/// Role attributes, before grants are attached.
#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub is_superuser: bool,
    pub can_create_db: bool,
    pub can_create_role: bool,
    pub inherit_role: bool,
    pub can_login: bool,
    pub is_replication_role: bool,
    pub can_bypass_rls: bool,
    pub active_connections: i64,
    pub connection_limit: i32,
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
}

/// One schema privilege held by a role.
#[derive(Debug, Clone, FromRow)]
pub struct RoleGrantRow {
    pub role_name: String,
    pub schema: String,
    pub privilege: String,
}

#[derive(Debug, Clone, FromRow)]
struct ConfigRow {
    name: String,
    setting: Option<String>,
    category: String,
    unit: Option<String>,
    description: Option<String>,
    context: String,
    vartype: String,
    source: Option<String>,
    min_val: Option<String>,
    max_val: Option<String>,
    enumvals: Option<Vec<String>>,
    boot_val: Option<String>,
    reset_val: Option<String>,
    pending_restart: bool,
}

impl From<ConfigRow> for ConfigSetting {
    fn from(row: ConfigRow) -> Self {
        let (group, subgroup) = split_category(&row.category);
        Self {
            name: row.name,
            setting: row.setting,
            group,
            subgroup,
            category: row.category,
            unit: row.unit,
            description: row.description,
            context: row.context,
            vartype: row.vartype,
            source: row.source,
            min_val: row.min_val,
            max_val: row.max_val,
            enumvals: row.enumvals,
            boot_val: row.boot_val,
            reset_val: row.reset_val,
            pending_restart: row.pending_restart,
        }
    }
}

/// Splits `"Group / Subgroup"` into its halves.
fn split_category(category: &str) -> (String, Option<String>) {
    match category.split_once(" / ") {
        Some((group, subgroup)) => (group.trim().to_string(), Some(subgroup.trim().to_string())),
        None => (category.trim().to_string(), None),
    }
}

pub async fn fetch_schemas<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<Schema>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Schema>(SCHEMAS)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(None::<i64>)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Looks a schema up by OID, system schemas included.
pub async fn fetch_schema_by_id<'e, E>(executor: E, id: i64) -> AppResult<Option<Schema>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, Schema>(SCHEMAS)
        .bind(true)
        .bind(None::<&str>)
        .bind(Some(id))
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn fetch_tables<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<TableRow>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, TableRow>(TABLES)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(filter.table.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_columns<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<Column>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Column>(COLUMNS)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(filter.table.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_primary_keys<'e, E>(
    executor: E,
    filter: &CatalogFilter,
) -> AppResult<Vec<PrimaryKeyRow>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, PrimaryKeyRow>(PRIMARY_KEYS)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(filter.table.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_relationships<'e, E>(
    executor: E,
    filter: &CatalogFilter,
) -> AppResult<Vec<Relationship>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Relationship>(RELATIONSHIPS)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(filter.table.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_grants<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<Grant>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Grant>(GRANTS)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(filter.table.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_policies<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<Policy>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Policy>(POLICIES)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .bind(filter.table.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_types<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<PgType>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, PgType>(TYPES)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_functions<'e, E>(
    executor: E,
    filter: &CatalogFilter,
) -> AppResult<Vec<Function>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Function>(FUNCTIONS)
        .bind(filter.include_system_schemas)
        .bind(filter.schema.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_extensions<'e, E>(
    executor: E,
    filter: &CatalogFilter,
) -> AppResult<Vec<Extension>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Extension>(EXTENSIONS)
        .bind(filter.include_system_schemas)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_roles<'e, E>(executor: E, filter: &CatalogFilter) -> AppResult<Vec<RoleRow>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, RoleRow>(ROLES)
        .bind(filter.include_default_roles)
        .bind(filter.role.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_role_grants<'e, E>(
    executor: E,
    filter: &CatalogFilter,
) -> AppResult<Vec<RoleGrantRow>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, RoleGrantRow>(ROLE_GRANTS)
        .bind(filter.include_system_schemas)
        .bind(filter.role.as_deref())
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn fetch_config<'e, E>(executor: E) -> AppResult<Vec<ConfigSetting>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, ConfigRow>(CONFIG)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(ConfigSetting::from).collect())
}

pub async fn fetch_version<'e, E>(executor: E) -> AppResult<VersionInfo>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, VersionInfo>(VERSION)
        .fetch_one(executor)
        .await?;
    Ok(row)
}

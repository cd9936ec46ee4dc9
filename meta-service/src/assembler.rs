//! Metadata assembly.
//!
//! Runs the per-class catalog queries inside one read-only snapshot and
//! regroups the flat rows into nested [`Table`] and [`Role`] objects.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use common::errors::AppResult;
use common::models::{Column, Grant, Policy, Relationship, Role, RoleGrant, Table};

use crate::catalog::{self, CatalogFilter, PrimaryKeyRow, RoleGrantRow, RoleRow, TableRow};

/// Flat result sets backing a table listing.
#[derive(Debug, Default)]
pub struct TableRows {
    pub tables: Vec<TableRow>,
    pub columns: Vec<Column>,
    pub primary_keys: Vec<PrimaryKeyRow>,
    pub relationships: Vec<Relationship>,
    pub grants: Vec<Grant>,
    pub policies: Vec<Policy>,
}

type TableKey = (String, String);

fn key(schema: &str, table: &str) -> TableKey {
    (schema.to_string(), table.to_string())
}

/// Groups flat rows into tables.
///
/// Every table row yields exactly one [`Table`], in input order, with empty
/// sequences where nothing matched. Columns are ordered by ordinal position.
/// A relationship is attached to its source and its target table, once when
/// they coincide.
pub fn assemble_tables(rows: TableRows) -> Vec<Table> {
    let mut columns: HashMap<TableKey, Vec<Column>> = HashMap::new();
    for column in rows.columns {
        columns
            .entry(key(&column.schema, &column.table))
            .or_default()
            .push(column);
    }

    let mut primary_keys: HashMap<TableKey, Vec<String>> = HashMap::new();
    for pk in rows.primary_keys {
        primary_keys
            .entry(key(&pk.schema, &pk.table_name))
            .or_default()
            .push(pk.name);
    }

    let mut grants: HashMap<TableKey, Vec<Grant>> = HashMap::new();
    for grant in rows.grants {
        grants
            .entry(key(&grant.schema, &grant.table_name))
            .or_default()
            .push(grant);
    }

    let mut policies: HashMap<TableKey, Vec<Policy>> = HashMap::new();
    for policy in rows.policies {
        policies
            .entry(key(&policy.schema, &policy.table))
            .or_default()
            .push(policy);
    }

    let mut relationships: HashMap<TableKey, Vec<Relationship>> = HashMap::new();
    for rel in rows.relationships {
        let source = key(&rel.source_schema, &rel.source_table_name);
        let target = key(&rel.target_table_schema, &rel.target_table_name);
        if source != target {
            relationships.entry(target).or_default().push(rel.clone());
        }
        relationships.entry(source).or_default().push(rel);
    }

    rows.tables
        .into_iter()
        .map(|row| {
            let k = key(&row.schema, &row.name);
            let mut table_columns = columns.remove(&k).unwrap_or_default();
            table_columns.sort_by_key(|c| c.ordinal_position);

            Table {
                id: row.id,
                schema: row.schema,
                name: row.name,
                rls_enabled: row.rls_enabled,
                rls_forced: row.rls_forced,
                replica_identity: row.replica_identity,
                bytes: row.bytes,
                size: row.size,
                live_rows_estimate: row.live_rows_estimate,
                dead_rows_estimate: row.dead_rows_estimate,
                comment: row.comment,
                columns: table_columns,
                primary_keys: primary_keys.remove(&k).unwrap_or_default(),
                grants: grants.remove(&k).unwrap_or_default(),
                policies: policies.remove(&k).unwrap_or_default(),
                relationships: relationships.remove(&k).unwrap_or_default(),
            }
        })
        .collect()
}

/// Attaches schema grants to their roles, preserving role order.
pub fn assemble_roles(roles: Vec<RoleRow>, grants: Vec<RoleGrantRow>) -> Vec<Role> {
    let mut by_role: HashMap<String, Vec<RoleGrant>> = HashMap::new();
    for grant in grants {
        by_role.entry(grant.role_name).or_default().push(RoleGrant {
            schema: grant.schema,
            privilege: grant.privilege,
        });
    }

    roles
        .into_iter()
        .map(|row| Role {
            grants: by_role.remove(&row.name).unwrap_or_default(),
            id: row.id,
            name: row.name,
            is_superuser: row.is_superuser,
            can_create_db: row.can_create_db,
            can_create_role: row.can_create_role,
            inherit_role: row.inherit_role,
            can_login: row.can_login,
            is_replication_role: row.is_replication_role,
            can_bypass_rls: row.can_bypass_rls,
            active_connections: row.active_connections,
            connection_limit: row.connection_limit,
            valid_until: row.valid_until,
        })
        .collect()
}

/// Opens a transaction that sees one consistent catalog snapshot.
pub async fn begin_snapshot(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Reads every table-related result set on one connection.
pub async fn fetch_table_rows(conn: &mut PgConnection, filter: &CatalogFilter) -> AppResult<TableRows> {
    Ok(TableRows {
        tables: catalog::fetch_tables(&mut *conn, filter).await?,
        columns: catalog::fetch_columns(&mut *conn, filter).await?,
        primary_keys: catalog::fetch_primary_keys(&mut *conn, filter).await?,
        relationships: catalog::fetch_relationships(&mut *conn, filter).await?,
        grants: catalog::fetch_grants(&mut *conn, filter).await?,
        policies: catalog::fetch_policies(&mut *conn, filter).await?,
    })
}

/// Lists tables with their nested objects from a single snapshot.
pub async fn list_tables(pool: &PgPool, filter: &CatalogFilter) -> AppResult<Vec<Table>> {
    let mut tx = begin_snapshot(pool).await?;
    let rows = fetch_table_rows(&mut tx, filter).await?;
    tx.commit().await?;

    tracing::debug!(
        tables = rows.tables.len(),
        columns = rows.columns.len(),
        "Assembling tables"
    );
    Ok(assemble_tables(rows))
}

/// Lists roles with their schema grants from a single snapshot.
pub async fn list_roles(pool: &PgPool, filter: &CatalogFilter) -> AppResult<Vec<Role>> {
    let mut tx = begin_snapshot(pool).await?;
    let roles = catalog::fetch_roles(&mut *tx, filter).await?;
    let grants = catalog::fetch_role_grants(&mut *tx, filter).await?;
    tx.commit().await?;

    Ok(assemble_roles(roles, grants))
}
